pub mod backdrop;
pub mod greeting;
pub mod quote;

use crate::feeds::{Dispatcher, FeedData, FetchError};
use crate::page::{Document, SlotHandle};
use anyhow::{anyhow, Result};

pub use backdrop::ImageBackdrop;
pub use greeting::GreetingWidget;
pub use quote::QuoteWidget;

/// A page widget: caches its slots once, starts at most one acquisition and
/// renders when the completion arrives.
pub trait PageWidget {
    fn id(&self) -> &str;

    /// Caches slot handles and kicks off the widget's acquisition, if any.
    /// Must be called exactly once; a second call is an error.
    fn init(&mut self, document: &Document, dispatcher: &Dispatcher) -> Result<()>;

    /// Success path. Only called with the data this widget's own fetcher
    /// produced.
    fn on_success(&mut self, _data: FeedData) {}

    /// Failure path. Reports only; never touches the page.
    fn on_failure(&mut self, reason: &FetchError) {
        tracing::warn!(widget = self.id(), error = %reason, "acquisition failed");
    }
}

/// The narrow capability one widget exposes so another can ask it to redraw.
pub trait Renderable {
    fn render(&self);
}

pub(crate) fn lookup_slot(document: &Document, id: &str) -> Result<SlotHandle> {
    document
        .query(id)
        .ok_or_else(|| anyhow!("page has no #{} slot", id))
}
