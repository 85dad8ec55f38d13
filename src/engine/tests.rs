use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::clock::{Clock, ManualClock};
use crate::render::{Content, RenderMode};
use crate::surface::MemorySurface;

use super::{Phase, Resume, Typecast, TypecastOptions};

type Engine = Typecast<MemorySurface, ManualClock>;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[derive(Clone, Default)]
struct Recorder {
    typed: Rc<RefCell<Vec<String>>>,
    stamps: Rc<RefCell<Vec<Duration>>>,
    completes: Rc<RefCell<usize>>,
}

impl Recorder {
    fn attach(&self, options: TypecastOptions, clock: &ManualClock) -> TypecastOptions {
        let typed = Rc::clone(&self.typed);
        let stamps = Rc::clone(&self.stamps);
        let completes = Rc::clone(&self.completes);
        let clock = clock.clone();
        options
            .on_type(move |text| {
                typed.borrow_mut().push(text.to_string());
                stamps.borrow_mut().push(clock.now());
            })
            .on_complete(move || *completes.borrow_mut() += 1)
    }

    fn typed(&self) -> Vec<String> {
        self.typed.borrow().clone()
    }

    fn completes(&self) -> usize {
        *self.completes.borrow()
    }
}

fn create_engine(options: TypecastOptions) -> (Engine, ManualClock, Recorder) {
    let clock = ManualClock::new();
    let recorder = Recorder::default();
    let options = recorder.attach(options, &clock);
    let engine = Typecast::with_clock(MemorySurface::new(), options, clock.clone());
    (engine, clock, recorder)
}

/// Tick every `frame` ms for `total` ms.
fn run_for(engine: &mut Engine, clock: &ManualClock, frame: u64, total: u64) {
    let mut elapsed = 0;
    while elapsed < total {
        clock.advance_ms(frame);
        elapsed += frame;
        engine.tick();
    }
}

/// Tick every `frame` ms until the engine goes idle, with a safety cap.
fn run_until_idle(engine: &mut Engine, clock: &ManualClock, frame: u64) {
    for _ in 0..10_000 {
        if engine.phase() == Phase::Idle {
            return;
        }
        clock.advance_ms(frame);
        engine.tick();
    }
    panic!("engine never went idle: {engine:?}");
}

#[test]
fn test_queue_mode_reveals_segments_in_order_and_completes_once() {
    let (mut engine, clock, recorder) =
        create_engine(TypecastOptions::new().with_speed(ms(10)));
    engine.add_text("ab", None).add_text("cd", None);
    engine.tick();

    run_until_idle(&mut engine, &clock, 5);

    assert_eq!(recorder.typed(), vec!["a", "ab", "abc", "abcd"]);
    assert_eq!(recorder.completes(), 1);
    assert_eq!(engine.current_text(), "abcd");
    assert!(engine.queue().is_empty());
    assert!(engine.current_item().is_none());

    // More idle ticks never complete again
    run_for(&mut engine, &clock, 5, 200);
    assert_eq!(recorder.completes(), 1);
}

#[test]
fn test_on_type_count_matches_total_chars() {
    let (mut engine, clock, recorder) =
        create_engine(TypecastOptions::new().with_speed(ms(1)));
    engine
        .add_text("你好", None)
        .add_text("", None)
        .add_text("🐥 hi", None);
    engine.tick();
    run_until_idle(&mut engine, &clock, 1);

    assert_eq!(recorder.typed().len(), "你好".chars().count() + "🐥 hi".chars().count());
    assert_eq!(recorder.typed().last().map(String::as_str), Some("你好🐥 hi"));
}

#[test]
fn test_steps_are_never_closer_than_speed() {
    let (mut engine, clock, recorder) =
        create_engine(TypecastOptions::new().with_speed(ms(30)));
    engine.add_text("abcdefghij", None);

    let mut steps_per_tick = Vec::new();
    for _ in 0..400 {
        clock.advance_ms(1);
        let before = recorder.typed().len();
        engine.tick();
        steps_per_tick.push(recorder.typed().len() - before);
    }

    assert!(steps_per_tick.iter().all(|&n| n <= 1));
    let stamps = recorder.stamps.borrow();
    assert_eq!(stamps.len(), 10);
    for pair in stamps.windows(2) {
        assert!(pair[1] - pair[0] >= ms(30), "steps too close: {pair:?}");
    }
}

#[test]
fn test_speed_zero_steps_every_tick() {
    let (mut engine, clock, recorder) =
        create_engine(TypecastOptions::new().with_speed(Duration::ZERO));
    engine.add_text("abc", None);
    for _ in 0..3 {
        clock.advance_ms(16);
        assert!(engine.tick());
    }
    assert_eq!(recorder.typed(), vec!["a", "ab", "abc"]);
}

#[test]
fn test_item_delay_waits_then_reveals_that_item() {
    let (mut engine, clock, recorder) =
        create_engine(TypecastOptions::new().with_speed(ms(10)));
    engine.add_text("x", None).add_text("y", Some(ms(500)));

    run_for(&mut engine, &clock, 10, 30);
    assert_eq!(recorder.typed(), vec!["x"]);
    assert!(matches!(
        engine.phase(),
        Phase::Delay {
            next: Resume::Item,
            ..
        }
    ));
    assert!(engine.is_playing());

    run_for(&mut engine, &clock, 10, 400);
    assert_eq!(recorder.typed(), vec!["x"]);

    run_until_idle(&mut engine, &clock, 10);
    assert_eq!(recorder.typed(), vec!["x", "xy"]);
    assert_eq!(recorder.completes(), 1);
}

#[test]
fn test_pause_and_start_resume_mid_segment() {
    let (mut engine, clock, recorder) =
        create_engine(TypecastOptions::new().with_speed(ms(10)));
    engine.add_text("hello", None);
    run_for(&mut engine, &clock, 10, 30);
    assert_eq!(engine.current_text(), "hel");

    engine.pause();
    let index = engine.current_index();
    let text = engine.current_text().to_string();
    assert_eq!(engine.current_item().and_then(|i| i.start_index), Some(index));

    run_for(&mut engine, &clock, 10, 500);
    assert_eq!(engine.current_text(), text);

    engine.start();
    assert_eq!(engine.current_index(), index);
    assert_eq!(engine.current_text(), text);

    run_until_idle(&mut engine, &clock, 10);
    assert_eq!(recorder.typed(), vec!["h", "he", "hel", "hell", "hello"]);
}

#[test]
fn test_pause_during_item_delay_requeues_item() {
    let (mut engine, clock, recorder) =
        create_engine(TypecastOptions::new().with_speed(ms(10)));
    engine.add_text("a", Some(ms(100)));
    clock.advance_ms(50);
    engine.tick();
    engine.pause();

    assert!(engine.current_item().is_none());
    assert_eq!(engine.queue().len(), 1);

    engine.start();
    // The full delay applies again
    run_for(&mut engine, &clock, 10, 90);
    assert!(recorder.typed().is_empty());
    run_until_idle(&mut engine, &clock, 10);
    assert_eq!(recorder.typed(), vec!["a"]);
}

#[test]
fn test_start_with_nothing_queued_is_noop() {
    let (mut engine, clock, recorder) = create_engine(TypecastOptions::new());
    engine.start();
    run_for(&mut engine, &clock, 10, 100);
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(recorder.completes(), 0);
}

#[test]
fn test_add_text_after_drain_starts_again() {
    let (mut engine, clock, recorder) =
        create_engine(TypecastOptions::new().with_speed(ms(10)));
    engine.add_text("a", None);
    run_until_idle(&mut engine, &clock, 10);
    engine.add_text("b", None);
    run_until_idle(&mut engine, &clock, 10);

    assert_eq!(recorder.typed(), vec!["a", "ab"]);
    assert_eq!(recorder.completes(), 2);
}

#[test]
fn test_reset_in_queue_mode_clears_everything() {
    let (mut engine, clock, _recorder) =
        create_engine(TypecastOptions::new().with_speed(ms(10)));
    engine.add_text("abc", None).add_text("def", None);
    run_for(&mut engine, &clock, 10, 20);
    engine.reset();

    assert_eq!(engine.current_text(), "");
    assert_eq!(engine.current_index(), 0);
    assert!(engine.queue().is_empty());
    assert!(engine.current_item().is_none());
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(engine.surface().text(), "");
    assert!(engine.surface().clears() >= 1);
}

#[test]
fn test_initial_text_in_queue_mode_starts_typing() {
    let (mut engine, clock, recorder) = create_engine(
        TypecastOptions::new()
            .with_text("ok")
            .with_speed(ms(10)),
    );
    assert!(engine.is_playing());
    run_until_idle(&mut engine, &clock, 10);
    assert_eq!(recorder.typed(), vec!["o", "ok"]);
}

#[test]
fn test_loop_mode_cycles_forward_and_reverse() {
    let (mut engine, clock, recorder) = create_engine(
        TypecastOptions::new()
            .with_text("hi")
            .with_loop(true)
            .with_speed(ms(10))
            .with_reverse_delay(ms(300))
            .with_delay(Duration::ZERO),
    );
    assert_eq!(engine.phase(), Phase::Forward);

    // "h", "hi"
    engine.tick();
    run_for(&mut engine, &clock, 10, 10);
    assert_eq!(recorder.typed(), vec!["h", "hi"]);
    let full_at = *recorder.stamps.borrow().last().unwrap();
    assert!(!engine.is_reverse());

    // Boundary reached on the next qualifying tick, then the reverse delay
    run_for(&mut engine, &clock, 10, 200);
    assert!(engine.is_reverse());
    assert!(!engine.is_playing());
    assert_eq!(recorder.typed().len(), 2);

    run_for(&mut engine, &clock, 10, 130);
    assert_eq!(
        recorder.typed(),
        vec!["h", "hi", "h", ""],
        "reverse pass should conceal one char per step"
    );
    let first_reverse = recorder.stamps.borrow()[2];
    assert!(first_reverse - full_at >= ms(300));

    // Back at the start: direction flips and the forward pass repeats
    run_for(&mut engine, &clock, 10, 30);
    assert!(!engine.is_reverse());
    assert_eq!(&recorder.typed()[4..6], ["h", "hi"]);
    assert_eq!(recorder.completes(), 0);
}

#[test]
fn test_loop_mode_reverse_speed_is_used() {
    let (mut engine, clock, recorder) = create_engine(
        TypecastOptions::new()
            .with_text("abcd")
            .with_loop(true)
            .with_speed(ms(50))
            .with_reverse_speed(ms(5))
            .with_reverse_delay(Duration::ZERO),
    );
    engine.tick();
    // Four forward steps 50ms apart, then the boundary tick at 200ms
    run_for(&mut engine, &clock, 5, 200);
    assert!(engine.is_reverse());
    let reverse_start = recorder.typed().len();

    run_for(&mut engine, &clock, 5, 25);
    assert_eq!(
        recorder.typed(),
        vec!["a", "ab", "abc", "abcd", "abc", "ab", "a", ""]
    );
    let stamps = recorder.stamps.borrow();
    for pair in stamps[reverse_start..].windows(2) {
        assert_eq!(pair[1] - pair[0], ms(5));
    }
}

#[test]
fn test_loop_mode_rejects_add_text() {
    let (mut engine, _clock, _recorder) = create_engine(
        TypecastOptions::new().with_text("loop").with_loop(true),
    );
    engine.add_text("nope", None);
    assert!(engine.queue().is_empty());
    assert!(matches!(
        engine.try_add_text("nope", None),
        Err(crate::Error::LoopModeQueue)
    ));
    assert_eq!(engine.current_item().map(|i| i.text.as_str()), Some("loop"));
}

#[test]
fn test_loop_mode_initial_delay_waits_before_first_step() {
    let (mut engine, clock, recorder) = create_engine(
        TypecastOptions::new()
            .with_text("x")
            .with_loop(true)
            .with_delay(ms(200))
            .with_speed(ms(10)),
    );
    assert!(matches!(
        engine.phase(),
        Phase::Delay {
            next: Resume::Forward,
            ..
        }
    ));
    run_for(&mut engine, &clock, 10, 190);
    assert!(recorder.typed().is_empty());
    run_for(&mut engine, &clock, 10, 30);
    assert_eq!(recorder.typed(), vec!["x"]);
}

#[test]
fn test_loop_mode_pause_then_start_restarts_forward_pass() {
    let (mut engine, clock, recorder) = create_engine(
        TypecastOptions::new()
            .with_text("abc")
            .with_loop(true)
            .with_speed(ms(10)),
    );
    engine.tick();
    run_for(&mut engine, &clock, 10, 10);
    assert_eq!(engine.current_text(), "ab");

    engine.pause();
    assert!(engine.current_item().unwrap().start_index.is_none());
    engine.start();
    assert_eq!(engine.current_index(), 0);
    assert_eq!(engine.current_text(), "");
    assert_eq!(engine.surface().text(), "");

    run_for(&mut engine, &clock, 10, 10);
    assert_eq!(recorder.typed().last().map(String::as_str), Some("a"));
}

#[test]
fn test_reset_in_loop_mode_reseeds_configured_text() {
    let (mut engine, clock, _recorder) = create_engine(
        TypecastOptions::new()
            .with_text("abc")
            .with_loop(true)
            .with_delay(ms(40))
            .with_speed(ms(10)),
    );
    run_for(&mut engine, &clock, 10, 80);
    engine.reset();

    assert_eq!(engine.current_text(), "");
    assert_eq!(engine.current_index(), 0);
    assert!(!engine.is_reverse());
    assert_eq!(engine.phase(), Phase::Idle);
    let item = engine.current_item().expect("loop text is re-seeded");
    assert_eq!(item.text, "abc");
    assert_eq!(item.delay, Some(ms(40)));

    engine.start();
    assert_eq!(engine.phase(), Phase::Forward);
}

#[test]
fn test_loop_mode_with_empty_text_never_starts() {
    let (mut engine, _clock, _recorder) =
        create_engine(TypecastOptions::new().with_loop(true));
    engine.start();
    assert_eq!(engine.phase(), Phase::Idle);
}

#[test]
fn test_tag_aware_stepping_never_splits_a_tag() {
    let (mut engine, clock, recorder) = create_engine(
        TypecastOptions::new()
            .with_speed(ms(10))
            .with_render_mode(RenderMode::Html)
            .with_tag_aware(true),
    );
    engine.add_text("a<b>c", None);
    run_until_idle(&mut engine, &clock, 10);

    assert_eq!(recorder.typed(), vec!["a", "a<b>", "a<b>c"]);
    assert_eq!(
        engine.surface().content(),
        Some(&Content::Html("a<b>c".to_string()))
    );
}

#[test]
fn test_tag_aware_reverse_removes_whole_tag() {
    let (mut engine, clock, recorder) = create_engine(
        TypecastOptions::new()
            .with_text("<i>x</i>")
            .with_loop(true)
            .with_tag_aware(true)
            .with_speed(ms(10))
            .with_reverse_delay(Duration::ZERO),
    );
    engine.tick();
    run_for(&mut engine, &clock, 10, 100);
    let typed = recorder.typed();
    assert_eq!(
        &typed[..6],
        ["<i>", "<i>x", "<i>x</i>", "<i>x", "<i>", ""]
    );
}

#[test]
fn test_tag_aware_reverse_mirrors_forward_with_plain_arrow() {
    let (mut engine, clock, recorder) = create_engine(
        TypecastOptions::new()
            .with_text("<b>a</b> -> b")
            .with_loop(true)
            .with_tag_aware(true)
            .with_speed(ms(10))
            .with_reverse_delay(Duration::ZERO),
    );
    engine.tick();
    run_for(&mut engine, &clock, 10, 200);
    let typed = recorder.typed();

    let forward = [
        "<b>",
        "<b>a",
        "<b>a</b>",
        "<b>a</b> ",
        "<b>a</b> -",
        "<b>a</b> ->",
        "<b>a</b> -> ",
        "<b>a</b> -> b",
    ];
    assert_eq!(&typed[..8], forward);

    let mut expected: Vec<&str> = forward[..7].iter().rev().copied().collect();
    expected.push("");
    assert_eq!(&typed[8..16], expected.as_slice());
}

#[test]
fn test_markdown_mode_renders_html_to_surface() {
    let (mut engine, clock, _recorder) = create_engine(
        TypecastOptions::new()
            .with_speed(ms(1))
            .with_render_mode(RenderMode::Markdown),
    );
    engine.add_text("# Title", None);
    run_until_idle(&mut engine, &clock, 1);

    let Some(Content::Html(html)) = engine.surface().content() else {
        panic!("expected html content");
    };
    assert!(html.contains("<h1>Title</h1>"), "got {html}");
    assert_eq!(engine.surface().mode(), Some(RenderMode::Markdown));
}

#[test]
fn test_custom_converter_failure_falls_back_to_text() {
    let failing =
        |_: &str| -> crate::Result<String> { Err(crate::Error::Markdown("bad".into())) };
    let (mut engine, clock, _recorder) = create_engine(
        TypecastOptions::new()
            .with_speed(ms(1))
            .with_render_mode(RenderMode::Markdown)
            .with_markdown_converter(Box::new(failing)),
    );
    engine.add_text("**x**", None);
    run_until_idle(&mut engine, &clock, 1);
    assert_eq!(
        engine.surface().content(),
        Some(&Content::Text("**x**".to_string()))
    );
}

#[test]
fn test_auto_mode_switches_content_kind_as_text_grows() {
    let (mut engine, clock, _recorder) = create_engine(
        TypecastOptions::new()
            .with_speed(ms(1))
            .with_render_mode(RenderMode::Auto),
    );
    engine.add_text("hi <b>x</b>", None);
    run_until_idle(&mut engine, &clock, 1);

    let history = engine.surface().history();
    assert!(matches!(history.first(), Some(Content::Text(_))));
    assert!(matches!(history.last(), Some(Content::Html(_))));
}

#[test]
fn test_cursor_hides_after_idle_delay() {
    let mut options = TypecastOptions::new().with_speed(ms(10));
    options.cursor.hide_delay = ms(500);
    let (mut engine, clock, _recorder) = create_engine(options);
    engine.add_text("ab", None);
    run_until_idle(&mut engine, &clock, 10);
    let stopped_at = clock.now();
    assert!(engine.surface().cursor_visible());

    while clock.now() < stopped_at + ms(490) {
        clock.advance_ms(10);
        engine.tick();
        assert!(engine.surface().cursor_visible());
    }
    run_for(&mut engine, &clock, 10, 20);
    assert!(!engine.surface().cursor_visible());
    assert!(!engine.cursor().is_visible());
}

#[test]
fn test_cursor_stays_visible_while_playing() {
    let mut options = TypecastOptions::new().with_speed(ms(100));
    options.cursor.hide_delay = ms(50);
    let (mut engine, clock, _recorder) = create_engine(options);
    engine.add_text("abcdef", None);
    for _ in 0..50 {
        clock.advance_ms(10);
        engine.tick();
        if engine.is_playing() {
            assert!(engine.surface().cursor_visible());
        }
    }
}

#[test]
fn test_cursor_reappears_when_typing_resumes() {
    let mut options = TypecastOptions::new().with_speed(ms(10));
    options.cursor.hide_delay = ms(20);
    let (mut engine, clock, _recorder) = create_engine(options);
    engine.add_text("a", None);
    run_until_idle(&mut engine, &clock, 10);
    run_for(&mut engine, &clock, 10, 50);
    assert!(!engine.surface().cursor_visible());

    engine.add_text("b", None);
    assert!(engine.surface().cursor_visible());
}

#[test]
fn test_next_deadline_tracks_step_and_delay() {
    let (mut engine, clock, _recorder) =
        create_engine(TypecastOptions::new().with_speed(ms(100)));
    // Idle with the initial idle-hide timer armed
    assert_eq!(engine.next_deadline(), Some(ms(2000)));

    engine.add_text("ab", None);
    engine.tick();
    assert_eq!(engine.next_deadline(), Some(ms(100)));

    engine.add_text("c", Some(ms(1000)));
    clock.advance_ms(100);
    engine.tick();
    clock.advance_ms(100);
    engine.tick();
    // Waiting before "c"; queue waits keep the cursor timer disarmed
    assert!(matches!(engine.phase(), Phase::Delay { .. }));
    assert_eq!(engine.next_deadline(), Some(ms(1200)));
}

#[test]
fn test_surface_mounted_with_cursor_options() {
    let mut options = TypecastOptions::new();
    options.cursor.symbol = "🐥".to_string();
    let (engine, _clock, _recorder) = create_engine(options);
    let cursor = engine.surface().cursor().expect("cursor mounted");
    assert_eq!(cursor.symbol, "🐥");
    assert_eq!(engine.surface().mode(), Some(RenderMode::Text));
}
