// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. render::RenderMode)
    clippy::module_name_repetitions
)]

//! # Typecast
//!
//! A typewriter text animation engine.
//!
//! Typecast reveals text one character at a time on a display surface:
//! - Queue Mode plays enqueued segments in order, each with an optional delay
//! - Loop Mode types one text forward, erases it, and repeats
//! - Tag-aware stepping skips over whole `<...>` tags
//! - Output is rendered as plain text, HTML, or Markdown
//! - A blinking cursor hides itself after a period of inactivity
//!
//! ## Architecture
//!
//! The engine is passive. The host calls [`Typecast::tick`] from its frame
//! loop and the engine commits steps when enough time has passed on its
//! [`Clock`]. All waits live in the engine's [`Phase`], so pausing or
//! resetting cancels them without leftover timers.
//!
//! ## Modules
//!
//! - [`engine`]: The state machine and its options
//! - [`queue`]: FIFO of pending segments
//! - [`markup`]: Character and tag-aware stepping
//! - [`render`]: Text, HTML and Markdown output
//! - [`cursor`]: Cursor styling, blinking and auto-hide
//! - [`surface`]: Display targets (in-memory and terminal)
//! - [`clock`]: Time sources
//! - [`config`]: Saved flag defaults for the demo binary
//! - [`perf`]: Debug event log

pub mod clock;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod markup;
pub mod perf;
pub mod queue;
pub mod render;
pub mod surface;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Phase, Resume, Typecast, TypecastOptions};
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::cursor::CursorOptions;
    pub use crate::engine::{Typecast, TypecastOptions};
    pub use crate::render::{Content, RenderMode};
    pub use crate::surface::{MemorySurface, Surface, TerminalSurface};
}
