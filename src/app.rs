use crate::config::Config;
use crate::feeds::{Dispatcher, FeedMessage};
use crate::page::Document;
use crate::ui;
use crate::ui::widgets::{GreetingWidget, ImageBackdrop, PageWidget, QuoteWidget, Renderable};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{backend::Backend, Terminal};
use std::rc::Rc;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(50);

pub struct App {
    config: Config,
    document: Document,
    widgets: Vec<Box<dyn PageWidget>>,
    greeting: Option<Rc<GreetingWidget>>,
    dispatcher: Dispatcher,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let greeting = Rc::new(GreetingWidget::new(&config.greeting)?);

        let mut widgets: Vec<Box<dyn PageWidget>> = Vec::new();
        if config.backdrop.enabled {
            widgets.push(Box::new(ImageBackdrop::new(&config.backdrop)));
        }
        widgets.push(Box::new(Rc::clone(&greeting)));
        if config.quote.enabled {
            widgets.push(Box::new(QuoteWidget::new(
                &config.quote,
                Rc::clone(&greeting) as Rc<dyn Renderable>,
            )));
        } else {
            // Nothing else will trigger the greeting.
            tracing::debug!("quote widget disabled, greeting renders on init");
        }

        Ok(Self::with_widgets(
            config,
            Document::standard(),
            widgets,
            Some(greeting),
        ))
    }

    pub fn with_widgets(
        config: Config,
        document: Document,
        widgets: Vec<Box<dyn PageWidget>>,
        greeting: Option<Rc<GreetingWidget>>,
    ) -> Self {
        Self {
            config,
            document,
            widgets,
            greeting,
            dispatcher: Dispatcher::new(),
            should_quit: false,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Initialises every widget independently. One widget failing to start
    /// does not stop the others.
    pub fn init(&mut self) {
        for widget in &mut self.widgets {
            if let Err(e) = widget.init(&self.document, &self.dispatcher) {
                tracing::error!(widget = widget.id(), error = %e, "widget init failed");
            }
        }

        if !self.config.quote.enabled {
            self.render_greeting();
        }
    }

    pub fn dispatch(&mut self, message: FeedMessage) {
        let Some(widget) = self
            .widgets
            .iter_mut()
            .find(|w| w.id() == message.widget_id)
        else {
            tracing::warn!(widget = %message.widget_id, "completion for unknown widget");
            return;
        };

        match message.result {
            Ok(data) => widget.on_success(data),
            Err(e) => widget.on_failure(&e),
        }
    }

    /// Dispatches every completion that has already arrived.
    pub fn pump(&mut self) {
        while let Some(message) = self.dispatcher.try_next() {
            self.dispatch(message);
        }
    }

    /// Waits until every started acquisition has completed or failed.
    pub async fn settle(&mut self) {
        while let Some(message) = self.dispatcher.next().await {
            self.dispatch(message);
        }
    }

    pub fn render_greeting(&self) {
        if let Some(greeting) = &self.greeting {
            greeting.render();
        }
    }

    fn quote_link(&self) -> Option<String> {
        ui::quote_link(&self.document)
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        self.init();

        while !self.should_quit {
            self.pump();
            terminal.draw(|frame| ui::draw(frame, &self.document, &self.config))?;

            if event::poll(TICK)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            self.should_quit = true
                        }
                        KeyCode::Char('g') => self.render_greeting(),
                        KeyCode::Char('o') | KeyCode::Enter => {
                            if let Some(link) = self.quote_link() {
                                if let Err(e) = open::that(&link) {
                                    tracing::warn!(link = %link, error = %e, "failed to open link");
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        Ok(())
    }
}
