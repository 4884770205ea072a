use super::{lookup_slot, PageWidget, Renderable};
use crate::config::GreetingConfig;
use crate::feeds::Dispatcher;
use crate::page::{Document, SlotHandle, GREETING};
use anyhow::{bail, Result};
use jiff::tz::TimeZone;
use jiff::{Timestamp, Zoned};
use rand::Rng;
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// `[0,12)` morning, `[12,17)` afternoon, everything later evening.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        };
        f.write_str(s)
    }
}

/// Where the greeting gets the current hour from.
pub trait HourSource {
    fn current_hour(&self) -> u32;
}

pub struct LocalClock;

impl HourSource for LocalClock {
    fn current_hour(&self) -> u32 {
        hour_of(&Zoned::now())
    }
}

pub struct ZonedClock(pub TimeZone);

impl HourSource for ZonedClock {
    fn current_hour(&self) -> u32 {
        hour_of(&Timestamp::now().to_zoned(self.0.clone()))
    }
}

fn hour_of(zoned: &Zoned) -> u32 {
    // jiff hours are always 0..=23
    zoned.hour().max(0) as u32
}

pub fn compose_message(hour: u32, epithet: &str) -> String {
    format!("Good {}, {}.", TimeOfDay::from_hour(hour), epithet)
}

pub struct GreetingWidget {
    epithet: String,
    clock: Box<dyn HourSource>,
    anchor: OnceCell<SlotHandle>,
}

impl GreetingWidget {
    pub fn new(config: &GreetingConfig) -> Result<Self> {
        let clock: Box<dyn HourSource> = match config.timezone()? {
            Some(tz) => Box::new(ZonedClock(tz)),
            None => Box::new(LocalClock),
        };
        Self::with_rng(&config.names, clock, &mut rand::thread_rng())
    }

    /// Picks the epithet once, uniformly. It never changes afterwards.
    pub fn with_rng<R: Rng + ?Sized>(
        names: &[String],
        clock: Box<dyn HourSource>,
        rng: &mut R,
    ) -> Result<Self> {
        if names.is_empty() {
            bail!("greeting needs at least one name");
        }
        let epithet = names[rng.gen_range(0..names.len())].clone();

        Ok(Self {
            epithet,
            clock,
            anchor: OnceCell::new(),
        })
    }

    pub fn epithet(&self) -> &str {
        &self.epithet
    }

    pub fn message(&self) -> String {
        compose_message(self.clock.current_hour(), &self.epithet)
    }

    fn cache_dom(&self, document: &Document) -> Result<()> {
        let slot = lookup_slot(document, GREETING)?;
        if self.anchor.set(slot).is_err() {
            bail!("greeting widget initialised twice");
        }
        Ok(())
    }
}

impl Renderable for GreetingWidget {
    fn render(&self) {
        let Some(anchor) = self.anchor.get() else {
            tracing::debug!("greeting render requested before init");
            return;
        };
        anchor.borrow_mut().set_text(&self.message());
    }
}

/// The greeting is shared with the quote widget, which triggers its render,
/// so the page holds it behind an `Rc`.
impl PageWidget for Rc<GreetingWidget> {
    fn id(&self) -> &str {
        GREETING
    }

    /// Caches the anchor only. Rendering is triggered from outside.
    fn init(&mut self, document: &Document, _dispatcher: &Dispatcher) -> Result<()> {
        self.cache_dom(document)
    }
}
