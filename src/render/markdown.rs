//! Markdown to HTML conversion with comrak.

use comrak::{Options, markdown_to_html};

use crate::Result;

/// Converts Markdown source into an HTML string.
///
/// Implementations must be deterministic and free of side effects on their
/// input: the engine calls them again on every revealed character.
pub trait MarkdownConverter {
    /// # Errors
    ///
    /// Returns an error if the source cannot be converted.
    fn to_html(&self, source: &str) -> Result<String>;
}

impl<F> MarkdownConverter for F
where
    F: Fn(&str) -> Result<String>,
{
    fn to_html(&self, source: &str) -> Result<String> {
        self(source)
    }
}

/// GitHub-flavoured Markdown via comrak. Raw HTML is passed through.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComrakConverter;

impl ComrakConverter {
    pub const fn new() -> Self {
        Self
    }
}

impl MarkdownConverter for ComrakConverter {
    fn to_html(&self, source: &str) -> Result<String> {
        let mut options = create_options();
        options.render.unsafe_ = true;
        Ok(markdown_to_html(source, &options))
    }
}

pub(super) fn create_options() -> Options {
    let mut options = Options::default();

    // Enable GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;

    options
}
