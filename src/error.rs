//! Library error type.

use thiserror::Error;

/// Errors surfaced by the typecast library.
///
/// Most engine operations never fail: misuse is logged and ignored so calls
/// can be chained. This type exists for the fallible edges (the `try_*`
/// variants and pluggable Markdown converters).
#[derive(Debug, Error)]
pub enum Error {
    /// Text was enqueued on an engine configured for Loop Mode.
    #[error("add_text is disabled when loop mode is enabled")]
    LoopModeQueue,

    /// The Markdown converter rejected its input.
    #[error("markdown conversion failed: {0}")]
    Markdown(String),
}

pub type Result<T> = std::result::Result<T, Error>;
