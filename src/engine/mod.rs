//! The animation engine.
//!
//! [`Typecast`] is a passive value: it only changes when the host calls
//! [`Typecast::tick`] (once per frame) or one of the public operations. Every
//! pending wait lives in [`Phase`], so cancelling a timer is just replacing
//! the phase and nothing stale can fire afterwards.
//!
//! Two modes share one scheduler:
//! - **Queue Mode** reveals each queued segment once, appending to the
//!   revealed text, and calls `on_complete` when the queue drains.
//! - **Loop Mode** reveals the configured text, waits `reverse_delay`,
//!   conceals it, waits `delay`, and starts over for as long as it runs.

mod options;

pub use options::{CompleteCallback, TypeCallback, TypecastOptions};

use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::cursor::CursorController;
use crate::error::{Error, Result};
use crate::markup::{step_backward, step_forward};
use crate::queue::{QueueItem, TextQueue};
use crate::render::Renderer;
use crate::surface::Surface;

/// What happens when a [`Phase::Delay`] runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Start a forward pass over the loop text.
    Forward,
    /// Start concealing the loop text.
    Reverse,
    /// Begin revealing the current queue item.
    Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Forward,
    Reverse,
    Delay { until: Duration, next: Resume },
}

pub struct Typecast<S: Surface, C: Clock = SystemClock> {
    surface: S,
    clock: C,
    options: TypecastOptions,
    renderer: Renderer,
    cursor: CursorController,
    on_type: Option<TypeCallback>,
    on_complete: Option<CompleteCallback>,
    queue: TextQueue,
    current: Option<QueueItem>,
    current_text: String,
    current_index: usize,
    last_step: Option<Duration>,
    phase: Phase,
    reverse: bool,
}

impl<S: Surface, C: Clock> std::fmt::Debug for Typecast<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Typecast")
            .field("phase", &self.phase)
            .field("current_text", &self.current_text)
            .field("current_index", &self.current_index)
            .field("reverse", &self.reverse)
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl<S: Surface> Typecast<S> {
    /// Create an engine on the wall clock.
    pub fn new(surface: S, options: TypecastOptions) -> Self {
        Self::with_clock(surface, options, SystemClock::new())
    }
}

impl<S: Surface, C: Clock> Typecast<S, C> {
    /// Create an engine bound to `surface`, reading time from `clock`.
    ///
    /// A non-empty `options.text` starts typing right away: Loop Mode waits
    /// `delay` first if one is set, Queue Mode enqueues it with `delay`.
    pub fn with_clock(mut surface: S, mut options: TypecastOptions, clock: C) -> Self {
        let renderer = match options.converter.take() {
            Some(converter) => Renderer::with_converter(options.render_mode, converter),
            None => Renderer::new(options.render_mode),
        };
        surface.mount(options.render_mode, &options.cursor);
        let cursor = CursorController::new(options.cursor.clone());
        cursor.mount(&mut surface);

        let mut engine = Self {
            surface,
            clock,
            on_type: options.on_type.take(),
            on_complete: options.on_complete.take(),
            options,
            renderer,
            cursor,
            queue: TextQueue::new(),
            current: None,
            current_text: String::new(),
            current_index: 0,
            last_step: None,
            phase: Phase::Idle,
            reverse: false,
        };
        let now = engine.clock.now();
        engine.cursor.restart_idle_timer(now, false);

        if !engine.options.text.is_empty() {
            let text = engine.options.text.clone();
            let delay = engine.options.delay;
            if engine.options.loop_mode {
                engine.current = Some(QueueItem::new(text, Some(delay)));
                if delay.is_zero() {
                    engine.start();
                } else {
                    engine.wait(now, now + delay, Resume::Forward);
                }
            } else {
                engine.add_text(text, Some(delay));
            }
        }
        engine
    }

    /// Queue `text` for typing after everything already queued.
    ///
    /// Starts the engine if it is idle. Ignored with a warning in Loop Mode.
    pub fn add_text(&mut self, text: impl Into<String>, delay: Option<Duration>) -> &mut Self {
        if self.options.loop_mode {
            tracing::warn!("add_text is disabled when loop mode is enabled");
            return self;
        }
        self.queue.enqueue(text, delay);
        if self.phase == Phase::Idle {
            self.start();
        }
        self
    }

    /// Like [`add_text`](Self::add_text), but reports Loop Mode misuse.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LoopModeQueue`] when the engine is in Loop Mode.
    pub fn try_add_text(
        &mut self,
        text: impl Into<String>,
        delay: Option<Duration>,
    ) -> Result<&mut Self> {
        if self.options.loop_mode {
            return Err(Error::LoopModeQueue);
        }
        Ok(self.add_text(text, delay))
    }

    /// Start or resume typing. Does nothing unless the engine is idle.
    ///
    /// Queue Mode resumes a paused segment where it stopped. Loop Mode always
    /// begins a fresh forward pass.
    pub fn start(&mut self) -> &mut Self {
        if self.phase != Phase::Idle {
            return self;
        }
        let now = self.clock.now();

        if self.options.loop_mode {
            if self.current.as_ref().is_none_or(|item| item.text.is_empty()) {
                tracing::debug!("start ignored: no loop text");
                return self;
            }
            if self.current_index > 0 || !self.current_text.is_empty() {
                self.current_text.clear();
                self.surface.clear_text();
            }
            self.current_index = 0;
            self.reverse = false;
            self.set_phase(Phase::Forward);
        } else if let Some(item) = self.current.as_mut() {
            self.current_index = item.start_index.take().unwrap_or(self.current_index);
            self.set_phase(Phase::Forward);
        } else if self.queue.is_empty() {
            tracing::debug!("start ignored: queue is empty");
            return self;
        } else {
            self.advance(now);
            if self.phase == Phase::Idle {
                return self;
            }
        }
        self.cursor.show(&mut self.surface, now, true);
        self
    }

    /// Stop typing and cancel any pending wait.
    ///
    /// In Queue Mode the current position is remembered so [`start`]
    /// continues mid-segment. Pausing during a segment's pre-reveal delay
    /// puts the segment back at the head of the queue.
    ///
    /// [`start`]: Self::start
    pub fn pause(&mut self) -> &mut Self {
        let now = self.clock.now();
        let was = self.phase;
        self.set_phase(Phase::Idle);

        if !self.options.loop_mode {
            if matches!(was, Phase::Delay { next: Resume::Item, .. }) {
                if let Some(item) = self.current.take() {
                    self.queue.requeue_front(item);
                }
            } else if let Some(item) = self.current.as_mut() {
                item.start_index = Some(self.current_index);
            }
        }
        self.cursor.restart_idle_timer(now, false);
        self
    }

    /// Stop and forget everything: queue, revealed text and direction.
    ///
    /// Loop Mode re-seeds the configured text so a later [`start`] runs it
    /// again from the beginning.
    ///
    /// [`start`]: Self::start
    pub fn reset(&mut self) -> &mut Self {
        self.pause();
        let now = self.clock.now();
        self.current_text.clear();
        self.current_index = 0;
        self.queue.clear();
        self.current = self
            .options
            .loop_mode
            .then(|| QueueItem::new(self.options.text.clone(), Some(self.options.delay)));
        self.reverse = false;
        self.last_step = None;
        self.surface.clear_text();
        self.cursor.restart_idle_timer(now, false);
        tracing::debug!("reset");
        self
    }

    /// Advance the animation to the clock's current time.
    ///
    /// Commits at most one character step, and only once the active
    /// direction's speed has elapsed since the last qualifying tick. Returns
    /// true if a step was committed.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now();
        self.cursor.poll(&mut self.surface, now);

        match self.phase {
            Phase::Idle => false,
            Phase::Delay { until, next } => {
                if now >= until {
                    self.finish_delay(next, now);
                }
                false
            }
            Phase::Forward | Phase::Reverse => self.step(now),
        }
    }

    /// When the next tick could change something: a step, the end of a
    /// delay, or the cursor hiding.
    pub fn next_deadline(&self) -> Option<Duration> {
        let timer = match self.phase {
            Phase::Idle => None,
            Phase::Delay { until, .. } => Some(until),
            Phase::Forward | Phase::Reverse => Some(
                self.last_step
                    .map_or_else(|| self.clock.now(), |last| last + self.active_speed()),
            ),
        };
        match (timer, self.cursor.hide_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Whether the engine counts as running for the cursor idle timer.
    ///
    /// Queue Mode waits between segments count as playing; Loop Mode waits at
    /// either end of a pass do not.
    pub const fn is_playing(&self) -> bool {
        matches!(
            self.phase,
            Phase::Forward | Phase::Reverse | Phase::Delay { next: Resume::Item, .. }
        )
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_text(&self) -> &str {
        &self.current_text
    }

    /// Byte offset into the current segment.
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    pub const fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub const fn current_item(&self) -> Option<&QueueItem> {
        self.current.as_ref()
    }

    pub const fn queue(&self) -> &TextQueue {
        &self.queue
    }

    pub const fn options(&self) -> &TypecastOptions {
        &self.options
    }

    pub const fn cursor(&self) -> &CursorController {
        &self.cursor
    }

    pub const fn surface(&self) -> &S {
        &self.surface
    }

    pub const fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub const fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    fn active_speed(&self) -> Duration {
        if self.phase == Phase::Reverse {
            self.options.effective_reverse_speed()
        } else {
            self.options.speed
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            tracing::debug!(from = ?self.phase, to = ?phase, "phase");
            crate::perf::log_event(
                "engine.phase",
                format!("from={:?} to={phase:?}", self.phase),
            );
        }
        self.phase = phase;
    }

    fn wait(&mut self, now: Duration, until: Duration, next: Resume) {
        self.set_phase(Phase::Delay { until, next });
        self.cursor.restart_idle_timer(now, self.is_playing());
    }

    fn finish_delay(&mut self, next: Resume, now: Duration) {
        match next {
            Resume::Forward => self.set_phase(Phase::Forward),
            Resume::Reverse => self.set_phase(Phase::Reverse),
            Resume::Item => self.begin_item(),
        }
        self.cursor.show(&mut self.surface, now, true);
    }

    fn begin_item(&mut self) {
        if let Some(item) = self.current.as_mut() {
            self.current_index = item.start_index.take().unwrap_or(0);
            tracing::debug!(len = item.text.len(), start = self.current_index, "begin segment");
        }
        self.set_phase(Phase::Forward);
    }

    /// Move on to the next queued segment, or finish the drain.
    fn advance(&mut self, now: Duration) {
        let Some(item) = self.queue.dequeue_next() else {
            self.current = None;
            self.set_phase(Phase::Idle);
            self.cursor.restart_idle_timer(now, false);
            crate::perf::log_event("engine.complete", format!("len={}", self.current_text.len()));
            if let Some(on_complete) = self.on_complete.as_mut() {
                on_complete();
            }
            return;
        };
        let delay = item.pending_delay();
        self.current = Some(item);
        match delay {
            Some(delay) => self.wait(now, now + delay, Resume::Item),
            None => self.begin_item(),
        }
    }

    fn step(&mut self, now: Duration) -> bool {
        if let Some(last) = self.last_step
            && now.saturating_sub(last) < self.active_speed()
        {
            return false;
        }
        self.last_step = Some(now);
        self.cursor.show(&mut self.surface, now, true);

        let stepped = if self.options.loop_mode {
            self.loop_step(now)
        } else {
            self.queue_step(now)
        };
        if stepped {
            self.emit();
        }
        stepped
    }

    fn queue_step(&mut self, now: Duration) -> bool {
        let Some(item) = self.current.as_ref() else {
            self.advance(now);
            return false;
        };
        let index = self.current_index;
        if index >= item.text.len() {
            self.advance(now);
            return false;
        }
        let next = step_forward(&item.text, index, self.options.tag_aware);
        self.current_text.push_str(&item.text[index..next]);
        self.current_index = next;
        true
    }

    fn loop_step(&mut self, now: Duration) -> bool {
        let Some(item) = self.current.as_ref() else {
            return false;
        };
        let text = item.text.as_str();
        let index = self.current_index;

        if self.reverse {
            if index == 0 {
                self.reverse = false;
                self.wait(now, now + self.options.delay, Resume::Forward);
                return false;
            }
            let prev = step_backward(text, index, self.options.tag_aware);
            self.current_text = text[..prev].to_string();
            self.current_index = prev;
        } else {
            if index >= text.len() {
                self.reverse = true;
                self.wait(now, now + self.options.reverse_delay, Resume::Reverse);
                return false;
            }
            let next = step_forward(text, index, self.options.tag_aware);
            self.current_text.push_str(&text[index..next]);
            self.current_index = next;
        }
        true
    }

    /// Re-render the revealed text and notify the observer.
    fn emit(&mut self) {
        let content = self.renderer.render(&self.current_text);
        self.surface.replace_text(&content);
        tracing::trace!(index = self.current_index, "step");
        crate::perf::log_event(
            "engine.step",
            format!("index={} reverse={}", self.current_index, self.reverse),
        );
        if let Some(on_type) = self.on_type.as_mut() {
            on_type(&self.current_text);
        }
    }
}

#[cfg(test)]
mod tests;
