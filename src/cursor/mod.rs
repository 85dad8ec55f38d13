//! Cursor indicator: visibility, blink timing and the idle-hide timer.
//!
//! The blink itself is a continuous opacity oscillation owned by the host
//! (a CSS animation in a browser, [`CursorController::opacity`] in a
//! terminal). The controller only toggles visibility, and hides the cursor
//! once the engine has been idle for `hide_delay`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::surface::Surface;

/// Keyframes shared by every cursor in the process.
pub const BLINK_KEYFRAMES: &str = "@keyframes blink {\n  0%, 100% { opacity: 1; }\n  50% { opacity: 0; }\n}\n";

static KEYFRAMES_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Install [`BLINK_KEYFRAMES`] into `surface` unless some cursor already did.
///
/// Returns true if this call performed the install.
pub fn install_blink_keyframes<S: Surface + ?Sized>(surface: &mut S) -> bool {
    if KEYFRAMES_INSTALLED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return false;
    }
    surface.install_stylesheet(BLINK_KEYFRAMES);
    true
}

/// Presentation settings for the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorOptions {
    /// Text shown as the cursor.
    pub symbol: String,
    /// Full period of one blink.
    pub blink_speed: Duration,
    /// Extra style declarations, property name to value.
    pub style: BTreeMap<String, String>,
    /// Idle time before the cursor hides.
    pub hide_delay: Duration,
    pub auto_hide: bool,
}

impl Default for CursorOptions {
    fn default() -> Self {
        let style = BTreeMap::from([
            ("color".to_string(), "inherit".to_string()),
            ("margin-left".to_string(), "2px".to_string()),
        ]);
        Self {
            symbol: "|".to_string(),
            blink_speed: Duration::from_millis(800),
            style,
            hide_delay: Duration::from_millis(2000),
            auto_hide: true,
        }
    }
}

impl CursorOptions {
    /// The `animation` property value driving the blink.
    pub fn animation(&self) -> String {
        format!("blink {}ms infinite", self.blink_speed.as_millis())
    }

    /// Inline style for the cursor element. User style entries come last so
    /// they can override the animation.
    pub fn inline_style(&self) -> String {
        let mut decls = vec![format!("animation: {}", self.animation())];
        decls.extend(self.style.iter().map(|(name, value)| format!("{name}: {value}")));
        decls.join("; ")
    }

    pub fn style_value(&self, name: &str) -> Option<&str> {
        self.style.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct CursorController {
    options: CursorOptions,
    visible: bool,
    hide_at: Option<Duration>,
}

impl CursorController {
    pub const fn new(options: CursorOptions) -> Self {
        Self {
            options,
            visible: true,
            hide_at: None,
        }
    }

    pub const fn options(&self) -> &CursorOptions {
        &self.options
    }

    /// Attach the cursor to `surface`.
    pub fn mount<S: Surface + ?Sized>(&self, surface: &mut S) {
        install_blink_keyframes(surface);
        surface.set_cursor_visible(self.visible);
    }

    /// Make the cursor visible and restart the idle-hide timer.
    pub fn show<S: Surface + ?Sized>(&mut self, surface: &mut S, now: Duration, playing: bool) {
        self.visible = true;
        surface.set_cursor_visible(true);
        self.restart_idle_timer(now, playing);
    }

    /// Hide immediately. A pending idle-hide deadline is left alone.
    pub fn hide<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        self.visible = false;
        surface.set_cursor_visible(false);
    }

    /// Arm the idle-hide timer when the engine is not playing, or disarm it
    /// while it is.
    pub fn restart_idle_timer(&mut self, now: Duration, playing: bool) {
        self.hide_at = (!playing && self.options.auto_hide).then(|| now + self.options.hide_delay);
    }

    /// Fire the idle-hide timer if its deadline has passed.
    pub fn poll<S: Surface + ?Sized>(&mut self, surface: &mut S, now: Duration) {
        if self.hide_at.is_some_and(|at| now >= at) {
            self.hide_at = None;
            self.hide(surface);
        }
    }

    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    pub const fn hide_deadline(&self) -> Option<Duration> {
        self.hide_at
    }

    /// Blink opacity at `now`: 1.0 at the start and end of each period, 0.0
    /// half way through.
    #[allow(clippy::cast_precision_loss)]
    pub fn opacity(&self, now: Duration) -> f32 {
        let period = self.options.blink_speed.as_millis();
        if period == 0 {
            return 1.0;
        }
        let phase = (now.as_millis() % period) as f32 / period as f32;
        (1.0 - 2.0 * phase).abs()
    }
}
