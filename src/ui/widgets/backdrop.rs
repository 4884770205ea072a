use super::{lookup_slot, PageWidget};
use crate::config::BackdropConfig;
use crate::feeds::{BackdropFetcher, Dispatcher, FeedData, FeedFetcher};
use crate::page::{Document, Node, SlotHandle, BACKGROUND};
use anyhow::{bail, Result};
use std::sync::Arc;

/// Loads one photograph and fades it into the background slot.
pub struct ImageBackdrop {
    fetcher: Arc<dyn FeedFetcher>,
    background: Option<SlotHandle>,
}

impl ImageBackdrop {
    pub fn new(config: &BackdropConfig) -> Self {
        Self::with_fetcher(Arc::new(BackdropFetcher::new(config)))
    }

    pub fn with_fetcher(fetcher: Arc<dyn FeedFetcher>) -> Self {
        Self {
            fetcher,
            background: None,
        }
    }
}

impl PageWidget for ImageBackdrop {
    fn id(&self) -> &str {
        BACKGROUND
    }

    fn init(&mut self, document: &Document, dispatcher: &Dispatcher) -> Result<()> {
        if self.background.is_some() {
            bail!("backdrop widget initialised twice");
        }
        self.background = Some(lookup_slot(document, BACKGROUND)?);

        dispatcher.spawn(self.id(), Arc::clone(&self.fetcher));
        Ok(())
    }

    fn on_success(&mut self, data: FeedData) {
        let FeedData::Backdrop(picture) = data else {
            tracing::warn!(widget = self.id(), "ignoring data meant for another widget");
            return;
        };
        let Some(background) = &self.background else {
            return;
        };

        tracing::debug!(
            width = picture.source_width,
            height = picture.source_height,
            "backdrop loaded"
        );
        background
            .borrow_mut()
            .append(Node::Image(picture))
            .css("opacity", "1");
    }
}
