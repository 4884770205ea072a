use super::{Element, Node};
use scraper::{ElementRef, Html};

/// Parses an HTML fragment into page nodes. Entities are decoded, comments
/// and doctypes are dropped.
pub fn parse_fragment(markup: &str) -> Vec<Node> {
    let fragment = Html::parse_fragment(markup);
    convert_children(fragment.root_element())
}

fn convert_children(source: ElementRef<'_>) -> Vec<Node> {
    let mut nodes = Vec::new();
    for child in source.children() {
        if let Some(el) = ElementRef::wrap(child) {
            nodes.push(Node::Element(convert_element(el)));
        } else if let Some(text) = child.value().as_text() {
            nodes.push(Node::Text(String::from(&**text)));
        }
    }
    nodes
}

fn convert_element(source: ElementRef<'_>) -> Element {
    let mut element = Element::new(source.value().name());
    for (name, value) in source.value().attrs() {
        element.set_attr(name, value);
    }
    element.replace_children(convert_children(source));
    element
}

/// Collapses runs of whitespace so fragments read as one flowing line.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
