//! The host boundary: one mutable container per engine.
//!
//! A surface owns two children: a text region, which is wiped and refilled
//! on every update, and a long-lived cursor indicator that survives those
//! refills. The engine never reads back from a surface.

mod terminal;

pub use terminal::TerminalSurface;

use crate::cursor::CursorOptions;
use crate::render::{Content, RenderMode};

pub trait Surface {
    /// Create the text region and cursor. Called once, at engine construction.
    fn mount(&mut self, mode: RenderMode, cursor: &CursorOptions);

    /// Add a global stylesheet to the host document.
    fn install_stylesheet(&mut self, _css: &str) {}

    /// Replace everything in the text region with `content`.
    fn replace_text(&mut self, content: &Content);

    /// Empty the text region. The cursor stays put.
    fn clear_text(&mut self);

    fn set_cursor_visible(&mut self, visible: bool);
}

impl<S: Surface + ?Sized> Surface for &mut S {
    fn mount(&mut self, mode: RenderMode, cursor: &CursorOptions) {
        (**self).mount(mode, cursor);
    }

    fn install_stylesheet(&mut self, css: &str) {
        (**self).install_stylesheet(css);
    }

    fn replace_text(&mut self, content: &Content) {
        (**self).replace_text(content);
    }

    fn clear_text(&mut self) {
        (**self).clear_text();
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        (**self).set_cursor_visible(visible);
    }
}

/// A surface that records what it was asked to show.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    mode: Option<RenderMode>,
    cursor: Option<CursorOptions>,
    stylesheets: Vec<String>,
    content: Option<Content>,
    history: Vec<Content>,
    clears: usize,
    cursor_visible: bool,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn mode(&self) -> Option<RenderMode> {
        self.mode
    }

    pub const fn cursor(&self) -> Option<&CursorOptions> {
        self.cursor.as_ref()
    }

    pub fn stylesheets(&self) -> &[String] {
        &self.stylesheets
    }

    /// What the text region currently holds.
    pub const fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    /// The text region as a string, empty when cleared.
    pub fn text(&self) -> &str {
        self.content.as_ref().map_or("", Content::as_str)
    }

    /// Every content ever rendered, oldest first.
    pub fn history(&self) -> &[Content] {
        &self.history
    }

    pub const fn clears(&self) -> usize {
        self.clears
    }

    pub const fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }
}

impl Surface for MemorySurface {
    fn mount(&mut self, mode: RenderMode, cursor: &CursorOptions) {
        self.mode = Some(mode);
        self.cursor = Some(cursor.clone());
        self.cursor_visible = true;
    }

    fn install_stylesheet(&mut self, css: &str) {
        self.stylesheets.push(css.to_string());
    }

    fn replace_text(&mut self, content: &Content) {
        self.content = Some(content.clone());
        self.history.push(content.clone());
    }

    fn clear_text(&mut self) {
        self.content = None;
        self.clears += 1;
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
    }
}
