pub mod widgets;

use crate::config::Config;
use crate::page::markup::normalize_whitespace;
use crate::page::{Document, Element, Node, BACKGROUND, GREETING, QUOTE};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::time::{Duration, Instant};

pub fn draw(frame: &mut Frame, document: &Document, config: &Config) {
    let area = frame.area();

    if let Some(background) = document.query(BACKGROUND) {
        let fade = Duration::from_millis(config.backdrop.fade_ms);
        paint_backdrop(frame.buffer_mut(), area, &background.borrow(), fade, Instant::now());
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .split(area);

    if let Some(greeting) = document.query(GREETING) {
        let text = greeting.borrow().text_content();
        let paragraph = Paragraph::new(Line::from(Span::styled(
            text,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, chunks[1]);
    }

    if let Some(quote) = document.query(QUOTE) {
        render_quote(frame, chunks[3], &quote.borrow());
    }

    let help = Paragraph::new(Line::from(Span::styled(
        "q: quit | o: open quote | g: greet",
        Style::default().fg(Color::DarkGray),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(help, chunks[4]);
}

fn render_quote(frame: &mut Frame, area: Rect, feature: &Element) {
    let (content, author) = quote_parts(feature);
    if content.is_empty() && author.is_empty() {
        return;
    }

    let width = (area.width as usize).saturating_sub(8).clamp(20, 80);
    let mut lines: Vec<Line> = textwrap::wrap(&content, width)
        .into_iter()
        .map(|line| {
            Line::from(Span::styled(
                line.into_owned(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::ITALIC),
            ))
        })
        .collect();
    if !author.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("— {}", author),
            Style::default().fg(Color::Gray),
        )));
    }

    let height = (lines.len() as u16).min(area.height);
    let block_width = (width as u16 + 4).min(area.width);
    let target = Rect {
        x: area.x + (area.width - block_width) / 2,
        y: area.y,
        width: block_width,
        height,
    };

    if let Some(alpha) = feature.style("background-color").and_then(parse_rgba_alpha) {
        darken(frame.buffer_mut(), target, alpha);
    }

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, target);
}

/// Quote text and author from the feature slot, whitespace normalised.
pub fn quote_parts(feature: &Element) -> (String, String) {
    let mut elements = feature.children().iter().filter_map(|node| match node {
        Node::Element(el) => Some(el),
        _ => None,
    });
    let content = elements
        .next()
        .map(|el| normalize_whitespace(&el.text_content()))
        .unwrap_or_default();
    let author = elements
        .next()
        .map(|el| normalize_whitespace(&el.text_content()))
        .unwrap_or_default();
    (content, author)
}

pub fn quote_link(document: &Document) -> Option<String> {
    let quote = document.query(QUOTE)?;
    let link = quote.borrow().attr("href").map(str::to_string);
    link
}

/// Plain rendering of the page, for `--print`.
pub fn plain_text(document: &Document) -> String {
    let mut out = String::new();

    if let Some(greeting) = document.query(GREETING) {
        let text = greeting.borrow().text_content();
        if !text.is_empty() {
            out.push_str(&text);
            out.push('\n');
        }
    }

    if let Some(quote) = document.query(QUOTE) {
        let (content, author) = quote_parts(&quote.borrow());
        if !content.is_empty() {
            out.push('\n');
            for line in textwrap::wrap(&content, 72) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        if !author.is_empty() {
            out.push_str(&format!("  — {}\n", author));
        }
    }

    out
}

/// Share of the fade completed at `now`. Zero while the slot is hidden.
pub fn fade_progress(background: &Element, fade: Duration, now: Instant) -> f32 {
    let opacity = background.opacity();
    if opacity <= 0.0 {
        return 0.0;
    }
    let Some(started) = background.transitioned_at() else {
        return opacity;
    };
    if fade.is_zero() {
        return opacity;
    }
    let elapsed = now.saturating_duration_since(started).as_secs_f32();
    opacity * (elapsed / fade.as_secs_f32()).min(1.0)
}

/// Draws the first picture of the slot with half blocks: the glyph takes the
/// upper pixel, the cell background the lower one.
fn paint_backdrop(
    buf: &mut Buffer,
    area: Rect,
    background: &Element,
    fade: Duration,
    now: Instant,
) {
    let Some(picture) = background.images().next() else {
        return;
    };
    let progress = fade_progress(background, fade, now);
    if progress <= 0.0 || area.width == 0 || area.height == 0 {
        return;
    }

    let rows = area.height as f64 * 2.0;
    let cols = area.width as f64;
    for y in 0..area.height {
        for x in 0..area.width {
            let fx = x as f64 / cols;
            let upper = picture.sample(fx, (y as f64 * 2.0) / rows);
            let lower = picture.sample(fx, (y as f64 * 2.0 + 1.0) / rows);
            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol("▀")
                    .set_fg(scale(upper, progress))
                    .set_bg(scale(lower, progress));
            }
        }
    }
}

fn scale(rgb: [u8; 3], factor: f32) -> Color {
    let f = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
    Color::Rgb(f(rgb[0]), f(rgb[1]), f(rgb[2]))
}

/// Darkens painted cells in `area` as if overlaid with black at `alpha`.
fn darken(buf: &mut Buffer, area: Rect, alpha: f32) {
    let keep = 1.0 - alpha.clamp(0.0, 1.0);
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            if let Some(cell) = buf.cell_mut((x, y)) {
                if let Color::Rgb(r, g, b) = cell.fg {
                    cell.fg = scale([r, g, b], keep);
                }
                if let Color::Rgb(r, g, b) = cell.bg {
                    cell.bg = scale([r, g, b], keep);
                }
            }
        }
    }
}

/// Alpha channel of an `rgba(r, g, b, a)` value.
pub fn parse_rgba_alpha(value: &str) -> Option<f32> {
    let inner = value
        .trim()
        .strip_prefix("rgba(")?
        .strip_suffix(')')?;
    let alpha = inner.split(',').nth(3)?.trim();
    alpha.parse::<f32>().ok().map(|a| a.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::Picture;
    use image::{Rgb, RgbImage};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn filled_quote() -> Document {
        let document = Document::standard();
        {
            let slot = document.query(QUOTE).unwrap();
            let mut slot = slot.borrow_mut();
            let mut link = Element::new("a");
            link.set_attr("href", "https://x").set_html("<p>Stay\n  hungry.</p>");
            let mut author = Element::new("p");
            author.set_text("Jane");
            slot.set_attr("href", "https://x")
                .css("background-color", "rgba(0, 0, 0, .2)")
                .replace_children(vec![Node::Element(link)])
                .append(Node::Element(author));
        }
        document
            .query(GREETING)
            .unwrap()
            .borrow_mut()
            .set_text("Good morning, classy.");
        document
    }

    #[test]
    fn test_parse_rgba_alpha() {
        assert_eq!(parse_rgba_alpha("rgba(0, 0, 0, .2)"), Some(0.2));
        assert_eq!(parse_rgba_alpha("rgba(1,2,3,1)"), Some(1.0));
        assert_eq!(parse_rgba_alpha("rgb(1, 2, 3)"), None);
        assert_eq!(parse_rgba_alpha("rgba(1, 2, 3)"), None);
    }

    #[test]
    fn test_quote_parts_and_link() {
        let document = filled_quote();
        let (content, author) = quote_parts(&document.query(QUOTE).unwrap().borrow());
        assert_eq!(content, "Stay hungry.");
        assert_eq!(author, "Jane");
        assert_eq!(quote_link(&document).as_deref(), Some("https://x"));
    }

    #[test]
    fn test_empty_page_has_no_link_or_text() {
        let document = Document::standard();
        assert!(quote_link(&document).is_none());
        assert_eq!(plain_text(&document), "");
    }

    #[test]
    fn test_plain_text() {
        let document = filled_quote();
        assert_eq!(
            plain_text(&document),
            "Good morning, classy.\n\nStay hungry.\n  — Jane\n"
        );
    }

    #[test]
    fn test_fade_progress() {
        let mut el = Element::new("div");
        el.css("opacity", "0");
        let now = Instant::now();
        assert_eq!(fade_progress(&el, Duration::from_secs(1), now), 0.0);

        el.css("opacity", "1");
        let start = el.transitioned_at().unwrap();
        let half = fade_progress(&el, Duration::from_secs(2), start + Duration::from_secs(1));
        assert!((half - 0.5).abs() < 1e-3);
        assert_eq!(
            fade_progress(&el, Duration::from_secs(2), start + Duration::from_secs(5)),
            1.0
        );
        assert_eq!(fade_progress(&el, Duration::ZERO, start), 1.0);
    }

    #[test]
    fn test_hidden_backdrop_is_not_painted() {
        let document = Document::standard();
        let background = document.query(BACKGROUND).unwrap();
        background.borrow_mut().append(Node::Image(Arc::new(Picture {
            pixels: RgbImage::from_pixel(2, 2, Rgb([200, 0, 0])),
            source_width: 2,
            source_height: 2,
        })));

        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        paint_backdrop(&mut buf, area, &background.borrow(), Duration::ZERO, Instant::now());
        assert_eq!(buf[(0, 0)].symbol(), " ");

        background.borrow_mut().css("opacity", "1");
        paint_backdrop(&mut buf, area, &background.borrow(), Duration::ZERO, Instant::now());
        assert_eq!(buf[(0, 0)].symbol(), "▀");
        assert_eq!(buf[(0, 0)].fg, Color::Rgb(200, 0, 0));
    }

    #[test]
    fn test_draw_shows_greeting_and_quote() {
        let document = filled_quote();
        let backend = TestBackend::new(60, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| draw(frame, &document, &Config::default()))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.contains("Good morning, classy."));
        assert!(text.contains("Stay hungry."));
        assert!(text.contains("— Jane"));
    }
}
