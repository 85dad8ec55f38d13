//! Typecast - typewriter text animation in the terminal.
//!
//! # Usage
//!
//! ```bash
//! typecast "Hello, world!" "Second line"
//! typecast --loop --reverse-speed 30 "Deleting soon"
//! some-command | typecast --stdin --render markdown
//! ```

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::DefaultTerminal;

use typecast::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use typecast::render::RenderMode;
use typecast::surface::TerminalSurface;
use typecast::{Clock, Phase, Typecast, perf};

const FRAME: Duration = Duration::from_millis(16);

/// Typewriter text animation in the terminal
#[derive(Parser, Debug)]
#[command(name = "typecast", version, about, long_about = None)]
struct Cli {
    /// Text segments to type, in order (the first one is the loop text with --loop)
    #[arg(value_name = "TEXT")]
    text: Vec<String>,

    /// Milliseconds per typed character
    #[arg(long, value_name = "MS")]
    speed: Option<u64>,

    /// Milliseconds per erased character (defaults to --speed)
    #[arg(long, value_name = "MS")]
    reverse_speed: Option<u64>,

    /// Milliseconds to wait before typing starts
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Milliseconds to wait before erasing in loop mode
    #[arg(long, value_name = "MS")]
    reverse_delay: Option<u64>,

    /// Type, erase and repeat the first text
    #[arg(long = "loop")]
    loop_mode: bool,

    /// How revealed text is interpreted
    #[arg(long, value_enum, value_name = "MODE")]
    render: Option<RenderMode>,

    /// Step over whole <...> tags
    #[arg(long)]
    tag_aware: bool,

    /// Cursor symbol
    #[arg(long, value_name = "CHAR")]
    cursor: Option<String>,

    /// Milliseconds per cursor blink
    #[arg(long, value_name = "MS")]
    blink_speed: Option<u64>,

    /// Milliseconds of inactivity before the cursor hides
    #[arg(long, value_name = "MS")]
    hide_delay: Option<u64>,

    /// Keep the cursor visible while idle
    #[arg(long)]
    no_auto_hide: bool,

    /// Write step and phase events to a file
    #[arg(long, value_name = "PATH")]
    debug_log: Option<PathBuf>,

    /// Queue each line read from stdin as it arrives
    #[arg(long)]
    stdin: bool,

    /// Quit once everything queued has been typed
    #[arg(long)]
    exit: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Start,
    Pause,
    Reset,
    Quit,
}

fn key_action(key: &KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('s') => Some(Action::Start),
        KeyCode::Char('p') => Some(Action::Pause),
        KeyCode::Char('r') => Some(Action::Reset),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        _ => None,
    }
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(format!("{line}\n")).is_err() {
                break;
            }
        }
    });
    rx
}

struct Session {
    engine: Typecast<TerminalSurface>,
    lines: Option<Receiver<String>>,
    exit_when_done: bool,
}

impl Session {
    /// Stdin is closed and everything queued has been typed. A paused
    /// segment or a loop text still counts as work left.
    fn finished(&self) -> bool {
        self.lines.is_none()
            && self.engine.phase() == Phase::Idle
            && self.engine.queue().is_empty()
            && self.engine.current_item().is_none()
    }

    fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            self.drain_stdin();
            self.engine.tick();

            let now = self.engine.clock().now();
            let opacity = self.engine.cursor().opacity(now);
            self.engine.surface_mut().set_blink_opacity(opacity);
            terminal.draw(|frame| frame.render_widget(self.engine.surface(), frame.area()))?;

            if self.exit_when_done && self.finished() {
                return Ok(());
            }

            let timeout = self
                .engine
                .next_deadline()
                .map_or(FRAME, |deadline| deadline.saturating_sub(now).min(FRAME));
            if event::poll(timeout)?
                && let Event::Key(key) = event::read()?
                && let Some(action) = key_action(&key)
            {
                perf::log_event("event.action", format!("{action:?}"));
                match action {
                    Action::Start => {
                        self.engine.start();
                    }
                    Action::Pause => {
                        self.engine.pause();
                    }
                    Action::Reset => {
                        self.engine.reset();
                    }
                    Action::Quit => return Ok(()),
                }
            }
        }
    }

    fn drain_stdin(&mut self) {
        let Some(lines) = self.lines.as_ref() else {
            return;
        };
        loop {
            match lines.try_recv() {
                Ok(line) => {
                    self.engine.add_text(line, None);
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    tracing::debug!("stdin closed");
                    self.lines = None;
                    return;
                }
            }
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    let debug_log_path = effective
        .debug_log
        .clone()
        .or_else(|| std::env::var_os("TYPECAST_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(debug_log_path.as_deref()) {
        tracing::warn!(
            path = %debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            %err,
            "failed to initialize debug log"
        );
    }

    if cli.text.is_empty() && !cli.stdin {
        if cli.save || cli.clear {
            return Ok(());
        }
        anyhow::bail!("Nothing to type: pass TEXT or --stdin");
    }

    let mut options = effective.to_options();
    let mut texts = cli.text.into_iter();
    if let Some(first) = texts.next() {
        options = options.with_text(first);
    }

    let mut terminal = ratatui::try_init()
        .context("Failed to initialize terminal, typecast requires an interactive terminal")?;
    let mut engine = Typecast::new(TerminalSurface::new(), options);
    for text in texts {
        engine.add_text(text, None);
    }
    let mut session = Session {
        engine,
        lines: cli.stdin.then(spawn_stdin_reader),
        exit_when_done: cli.exit,
    };

    let result = session.run(&mut terminal);
    ratatui::restore();
    result.context("Application error")
}
