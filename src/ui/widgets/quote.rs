use super::{lookup_slot, PageWidget, Renderable};
use crate::config::QuoteConfig;
use crate::feeds::{Dispatcher, FeedData, FeedFetcher, QuoteFetcher, QuoteRecord};
use crate::page::{Document, Element, Node, SlotHandle, QUOTE};
use anyhow::{bail, Result};
use std::rc::Rc;
use std::sync::Arc;

pub const FEATURE_BACKGROUND: &str = "rgba(0, 0, 0, .2)";

struct QuoteDom {
    feature: SlotHandle,
    /// Detached until a quote arrives.
    link: Element,
    author: Element,
}

/// Fetches one random quote and, once it arrives, refreshes the greeting and
/// fills the quote feature.
pub struct QuoteWidget {
    fetcher: Arc<dyn FeedFetcher>,
    greeting: Rc<dyn Renderable>,
    dom: Option<QuoteDom>,
}

impl QuoteWidget {
    pub fn new(config: &QuoteConfig, greeting: Rc<dyn Renderable>) -> Self {
        Self::with_fetcher(Arc::new(QuoteFetcher::new(config)), greeting)
    }

    pub fn with_fetcher(fetcher: Arc<dyn FeedFetcher>, greeting: Rc<dyn Renderable>) -> Self {
        Self {
            fetcher,
            greeting,
            dom: None,
        }
    }

    fn render_quote(&mut self, quote: QuoteRecord) {
        let Some(dom) = self.dom.as_mut() else {
            return;
        };

        self.greeting.render();

        dom.link
            .set_attr("target", "_blank")
            .set_attr("href", &quote.link)
            .set_html(&quote.content);

        dom.author.set_html(&quote.title);

        dom.feature
            .borrow_mut()
            .css("background-color", FEATURE_BACKGROUND)
            .add_class("quoteFeature")
            .set_attr("href", &quote.link)
            .set_attr("target", "_blank")
            .replace_children(vec![Node::Element(dom.link.clone())])
            .append(Node::Element(dom.author.clone()));
    }
}

impl PageWidget for QuoteWidget {
    fn id(&self) -> &str {
        QUOTE
    }

    fn init(&mut self, document: &Document, dispatcher: &Dispatcher) -> Result<()> {
        if self.dom.is_some() {
            bail!("quote widget initialised twice");
        }
        self.dom = Some(QuoteDom {
            feature: lookup_slot(document, QUOTE)?,
            link: Element::new("a"),
            author: Element::new("p"),
        });

        dispatcher.spawn(self.id(), Arc::clone(&self.fetcher));
        Ok(())
    }

    fn on_success(&mut self, data: FeedData) {
        match data {
            FeedData::Quote(quote) => self.render_quote(quote),
            _ => tracing::warn!(widget = self.id(), "ignoring data meant for another widget"),
        }
    }
}
