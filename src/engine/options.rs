use std::time::Duration;

use crate::cursor::CursorOptions;
use crate::render::{MarkdownConverter, RenderMode};

pub type TypeCallback = Box<dyn FnMut(&str)>;
pub type CompleteCallback = Box<dyn FnMut()>;

/// Engine configuration, fixed at construction.
pub struct TypecastOptions {
    /// Time per forward character step.
    pub speed: Duration,
    /// Initial text. Loop Mode cycles it; Queue Mode enqueues it.
    pub text: String,
    /// Wait before the initial text, and before each looped forward pass.
    pub delay: Duration,
    pub loop_mode: bool,
    /// Time per reverse step, defaulting to `speed`.
    pub reverse_speed: Option<Duration>,
    /// Wait after a full reveal before reversing (Loop Mode).
    pub reverse_delay: Duration,
    pub render_mode: RenderMode,
    /// Step over whole `<...>` tags instead of single characters.
    pub tag_aware: bool,
    pub cursor: CursorOptions,
    pub(crate) on_type: Option<TypeCallback>,
    pub(crate) on_complete: Option<CompleteCallback>,
    pub(crate) converter: Option<Box<dyn MarkdownConverter>>,
}

impl Default for TypecastOptions {
    fn default() -> Self {
        Self {
            speed: Duration::from_millis(100),
            text: String::new(),
            delay: Duration::ZERO,
            loop_mode: false,
            reverse_speed: None,
            reverse_delay: Duration::from_millis(1000),
            render_mode: RenderMode::Text,
            tag_aware: false,
            cursor: CursorOptions::default(),
            on_type: None,
            on_complete: None,
            converter: None,
        }
    }
}

impl std::fmt::Debug for TypecastOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypecastOptions")
            .field("speed", &self.speed)
            .field("text", &self.text)
            .field("delay", &self.delay)
            .field("loop_mode", &self.loop_mode)
            .field("reverse_speed", &self.reverse_speed)
            .field("reverse_delay", &self.reverse_delay)
            .field("render_mode", &self.render_mode)
            .field("tag_aware", &self.tag_aware)
            .field("cursor", &self.cursor)
            .field("on_type", &self.on_type.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}

impl TypecastOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_speed(mut self, speed: Duration) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub const fn with_loop(mut self, enabled: bool) -> Self {
        self.loop_mode = enabled;
        self
    }

    pub const fn with_reverse_speed(mut self, speed: Duration) -> Self {
        self.reverse_speed = Some(speed);
        self
    }

    pub const fn with_reverse_delay(mut self, delay: Duration) -> Self {
        self.reverse_delay = delay;
        self
    }

    pub const fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }

    pub const fn with_tag_aware(mut self, enabled: bool) -> Self {
        self.tag_aware = enabled;
        self
    }

    pub fn with_cursor(mut self, cursor: CursorOptions) -> Self {
        self.cursor = cursor;
        self
    }

    /// Called after every committed step with the full revealed text.
    pub fn on_type(mut self, callback: impl FnMut(&str) + 'static) -> Self {
        self.on_type = Some(Box::new(callback));
        self
    }

    /// Called once each time Queue Mode drains.
    pub fn on_complete(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Replace the default comrak Markdown converter.
    pub fn with_markdown_converter(mut self, converter: Box<dyn MarkdownConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn effective_reverse_speed(&self) -> Duration {
        self.reverse_speed.unwrap_or(self.speed)
    }
}
