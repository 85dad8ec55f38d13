//! Turning revealed text into displayable content.
//!
//! Every update is rendered from scratch: the renderer is a pure function of
//! the revealed text and keeps no state between calls. Parsing HTML into a
//! node tree is the host surface's job; this module only decides whether the
//! text is plain text or HTML, converting Markdown to HTML on the way.

mod markdown;

pub use markdown::{ComrakConverter, MarkdownConverter};

use std::sync::LazyLock;

use comrak::nodes::NodeValue;
use comrak::{Arena, parse_document};
use regex::Regex;

/// How revealed text is interpreted.
#[derive(clap::ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Plain text, markup is shown verbatim.
    #[default]
    Text,
    /// An HTML fragment.
    Html,
    /// Markdown, converted to HTML.
    #[value(alias = "md")]
    Markdown,
    /// Sniff every update and pick one of the above.
    Auto,
}

impl RenderMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Html => "html",
            Self::Markdown => "markdown",
            Self::Auto => "auto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "html" => Some(Self::Html),
            "markdown" | "md" => Some(Self::Markdown),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }
}

/// Output of one render pass, handed to the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// A single text node.
    Text(String),
    /// Markup for the host's fragment parser. Not sanitized.
    Html(String),
}

impl Content {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) | Self::Html(text) => text,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

/// Something an HTML parser would turn into an element: `<` then a tag name.
static ELEMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z][^>]*>").expect("valid element regex"));

/// Classify `text` as HTML, Markdown or plain text.
///
/// HTML wins over Markdown. Detection only looks at the current text, so a
/// growing reveal may switch modes part way through.
pub fn classify(text: &str) -> RenderMode {
    if looks_like_html(text) {
        RenderMode::Html
    } else if looks_like_markdown(text) {
        RenderMode::Markdown
    } else {
        RenderMode::Text
    }
}

pub fn looks_like_html(text: &str) -> bool {
    ELEMENT_RE.is_match(text)
}

pub fn looks_like_markdown(text: &str) -> bool {
    let arena = Arena::new();
    let options = markdown::create_options();
    let root = parse_document(&arena, text, &options);
    root.descendants().any(|node| {
        matches!(
            node.data.borrow().value,
            NodeValue::CodeBlock(_)
                | NodeValue::Heading(_)
                | NodeValue::ThematicBreak
                | NodeValue::Link(_)
                | NodeValue::Image(_)
                | NodeValue::BlockQuote
                | NodeValue::List(_)
                | NodeValue::HtmlBlock(_)
                | NodeValue::HtmlInline(_)
                | NodeValue::Table(_)
                | NodeValue::Strong
                | NodeValue::Emph
                | NodeValue::Strikethrough
                | NodeValue::Code(_)
                | NodeValue::FootnoteDefinition(_)
        )
    })
}

/// Render strategy selected by [`RenderMode`].
pub struct Renderer {
    mode: RenderMode,
    converter: Box<dyn MarkdownConverter>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer").field("mode", &self.mode).finish_non_exhaustive()
    }
}

impl Renderer {
    pub fn new(mode: RenderMode) -> Self {
        Self::with_converter(mode, Box::new(ComrakConverter::new()))
    }

    pub fn with_converter(mode: RenderMode, converter: Box<dyn MarkdownConverter>) -> Self {
        Self { mode, converter }
    }

    pub const fn mode(&self) -> RenderMode {
        self.mode
    }

    /// The concrete mode used for `text`, resolving [`RenderMode::Auto`].
    pub fn resolve(&self, text: &str) -> RenderMode {
        match self.mode {
            RenderMode::Auto => classify(text),
            mode => mode,
        }
    }

    /// Render `text`.
    ///
    /// A converter failure falls back to plain text for this update.
    pub fn render(&self, text: &str) -> Content {
        match self.resolve(text) {
            RenderMode::Text | RenderMode::Auto => Content::Text(text.to_string()),
            RenderMode::Html => Content::Html(text.to_string()),
            RenderMode::Markdown => match self.converter.to_html(text) {
                Ok(html) => Content::Html(html),
                Err(err) => {
                    tracing::warn!(%err, "markdown render failed, showing plain text");
                    crate::perf::log_event("render.fallback", format!("err={err}"));
                    Content::Text(text.to_string())
                }
            },
        }
    }
}
