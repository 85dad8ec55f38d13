//! Terminal surface drawn with ratatui.

use std::str::FromStr;

use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};

use super::Surface;
use crate::cursor::CursorOptions;
use crate::markup::{decode_entities, strip_tags};
use crate::render::{Content, RenderMode};

/// Holds the current frame's text and cursor state; draw it as a widget.
///
/// HTML content is shown as its text with tags removed, since a terminal has
/// no fragment parser.
#[derive(Debug, Clone)]
pub struct TerminalSurface {
    text: String,
    cursor_symbol: String,
    cursor_style: Style,
    cursor_visible: bool,
    blink_on: bool,
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            cursor_symbol: String::new(),
            cursor_style: Style::default(),
            cursor_visible: false,
            blink_on: true,
        }
    }

    /// Update the blink phase from the cursor opacity.
    pub fn set_blink_opacity(&mut self, opacity: f32) {
        self.blink_on = opacity >= 0.5;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn lines(&self) -> Vec<Line<'_>> {
        let mut lines: Vec<Line<'_>> = self.text.split('\n').map(Line::raw).collect();
        if self.cursor_visible && self.blink_on {
            let cursor = Span::styled(self.cursor_symbol.as_str(), self.cursor_style);
            if let Some(last) = lines.last_mut() {
                last.push_span(cursor);
            }
        }
        lines
    }
}

fn cursor_style(options: &CursorOptions) -> Style {
    let mut style = Style::default();
    if let Some(color) = options.style_value("color").and_then(|c| Color::from_str(c).ok()) {
        style = style.fg(color);
    }
    if options.style_value("font-weight") == Some("bold") {
        style = style.add_modifier(Modifier::BOLD);
    }
    style
}

impl Surface for TerminalSurface {
    fn mount(&mut self, _mode: RenderMode, cursor: &CursorOptions) {
        self.cursor_symbol.clone_from(&cursor.symbol);
        self.cursor_style = cursor_style(cursor);
        self.cursor_visible = true;
    }

    fn replace_text(&mut self, content: &Content) {
        self.text = match content {
            Content::Text(text) => text.clone(),
            Content::Html(html) => decode_entities(strip_tags(html).trim_end_matches('\n')),
        };
    }

    fn clear_text(&mut self) {
        self.text.clear();
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
    }
}

impl Widget for &TerminalSurface {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.lines())
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
