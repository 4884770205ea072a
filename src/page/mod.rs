//! A small retained element tree standing in for the page markup.
//!
//! The layout owns a fixed set of named slots. Widgets look their slots up
//! once during `init` and keep the returned [`SlotHandle`]s; the renderer
//! reads the same tree every frame.

pub mod markup;

use crate::feeds::Picture;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

pub const BACKGROUND: &str = "background";
pub const GREETING: &str = "greeting";
pub const QUOTE: &str = "quote";

pub type SlotHandle = Rc<RefCell<Element>>;

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
    Image(Arc<Picture>),
}

#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
    children: Vec<Node>,
    /// When `opacity` last changed, for the fade.
    transitioned_at: Option<Instant>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            styles: BTreeMap::new(),
            children: Vec::new(),
            transitioned_at: None,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: &str) -> &mut Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn add_class(&mut self, class: &str) -> &mut Self {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.styles.get(property).map(String::as_str)
    }

    pub fn css(&mut self, property: &str, value: &str) -> &mut Self {
        let changed = self.style(property) != Some(value);
        self.styles.insert(property.to_string(), value.to_string());
        if changed && property == "opacity" {
            self.transitioned_at = Some(Instant::now());
        }
        self
    }

    /// Computed opacity. Unset or unparseable means fully opaque.
    pub fn opacity(&self) -> f32 {
        self.style("opacity")
            .and_then(|v| v.trim().parse::<f32>().ok())
            .map(|v| v.clamp(0.0, 1.0))
            .unwrap_or(1.0)
    }

    pub fn transitioned_at(&self) -> Option<Instant> {
        self.transitioned_at
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn append(&mut self, node: Node) -> &mut Self {
        self.children.push(node);
        self
    }

    /// Replaces all children, like assigning `innerHTML` a single node.
    pub fn replace_children(&mut self, nodes: Vec<Node>) -> &mut Self {
        self.children = nodes;
        self
    }

    pub fn set_text(&mut self, text: &str) -> &mut Self {
        self.replace_children(vec![Node::Text(text.to_string())])
    }

    /// Replaces the children with the parsed `markup` fragment.
    pub fn set_html(&mut self, markup: &str) -> &mut Self {
        self.replace_children(markup::parse_fragment(markup))
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// First descendant element with `tag`, depth first.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find_map(|child| match child {
            Node::Element(el) if el.tag == tag => Some(el),
            Node::Element(el) => el.find(tag),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = &Arc<Picture>> {
        self.children.iter().filter_map(|child| match child {
            Node::Image(picture) => Some(picture),
            _ => None,
        })
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(&el.children, out),
            Node::Image(_) => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct Document {
    slots: BTreeMap<String, SlotHandle>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// The start page layout: a hidden backdrop, a greeting line and a quote
    /// feature.
    pub fn standard() -> Self {
        let mut document = Self::new();

        let mut background = Element::new("div");
        background.set_attr("id", BACKGROUND).css("opacity", "0");
        document.insert(BACKGROUND, background);

        let mut greeting = Element::new("h1");
        greeting.set_attr("id", GREETING);
        document.insert(GREETING, greeting);

        let mut quote = Element::new("a");
        quote.set_attr("id", QUOTE);
        document.insert(QUOTE, quote);

        document
    }

    pub fn insert(&mut self, id: &str, element: Element) -> SlotHandle {
        let handle = Rc::new(RefCell::new(element));
        self.slots.insert(id.to_string(), Rc::clone(&handle));
        handle
    }

    pub fn query(&self, id: &str) -> Option<SlotHandle> {
        self.slots.get(id).cloned()
    }
}
