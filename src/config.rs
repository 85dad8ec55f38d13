use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::cursor::CursorOptions;
use crate::engine::TypecastOptions;
use crate::render::RenderMode;

/// Saved defaults for the demo host, one field per command-line flag.
///
/// Unset numeric fields fall back to the engine defaults.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub speed: Option<u64>,
    pub reverse_speed: Option<u64>,
    pub delay: Option<u64>,
    pub reverse_delay: Option<u64>,
    pub loop_mode: bool,
    pub render: Option<RenderMode>,
    pub tag_aware: bool,
    pub cursor: Option<String>,
    pub blink_speed: Option<u64>,
    pub hide_delay: Option<u64>,
    pub no_auto_hide: bool,
    pub debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            speed: other.speed.or(self.speed),
            reverse_speed: other.reverse_speed.or(self.reverse_speed),
            delay: other.delay.or(self.delay),
            reverse_delay: other.reverse_delay.or(self.reverse_delay),
            loop_mode: self.loop_mode || other.loop_mode,
            render: other.render.or(self.render),
            tag_aware: self.tag_aware || other.tag_aware,
            cursor: other.cursor.clone().or_else(|| self.cursor.clone()),
            blink_speed: other.blink_speed.or(self.blink_speed),
            hide_delay: other.hide_delay.or(self.hide_delay),
            no_auto_hide: self.no_auto_hide || other.no_auto_hide,
            debug_log: other.debug_log.clone().or_else(|| self.debug_log.clone()),
        }
    }

    /// Build engine options from these flags. Callbacks and text are left
    /// for the caller.
    pub fn to_options(&self) -> TypecastOptions {
        let defaults = TypecastOptions::default();
        let cursor_defaults = CursorOptions::default();
        let cursor = CursorOptions {
            symbol: self.cursor.clone().unwrap_or(cursor_defaults.symbol),
            blink_speed: self
                .blink_speed
                .map_or(cursor_defaults.blink_speed, Duration::from_millis),
            hide_delay: self
                .hide_delay
                .map_or(cursor_defaults.hide_delay, Duration::from_millis),
            auto_hide: !self.no_auto_hide,
            style: cursor_defaults.style,
        };
        let mut options = TypecastOptions::new()
            .with_speed(self.speed.map_or(defaults.speed, Duration::from_millis))
            .with_delay(self.delay.map_or(defaults.delay, Duration::from_millis))
            .with_reverse_delay(
                self.reverse_delay
                    .map_or(defaults.reverse_delay, Duration::from_millis),
            )
            .with_loop(self.loop_mode)
            .with_render_mode(self.render.unwrap_or(defaults.render_mode))
            .with_tag_aware(self.tag_aware)
            .with_cursor(cursor);
        if let Some(ms) = self.reverse_speed {
            options = options.with_reverse_speed(Duration::from_millis(ms));
        }
        options
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("typecast").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("typecast")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("typecast").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("typecast")
                .join("config");
        }
    }

    PathBuf::from(".typecastrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".typecastrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// Write `flags` as a flag file.
///
/// # Errors
///
/// The file is split on whitespace when loaded, so a `--cursor` or
/// `--debug-log` value that is empty or contains whitespace is refused
/// rather than saved in a form that would read back differently.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    if let Some(cursor) = &flags.cursor {
        ensure_single_token("--cursor", cursor)?;
    }
    if let Some(debug_log) = &flags.debug_log {
        ensure_single_token("--debug-log", &debug_log.to_string_lossy())?;
    }
    let mut lines = Vec::new();
    lines.push("# typecast defaults (saved with --save)".to_string());
    let numbers = [
        ("--speed", flags.speed),
        ("--reverse-speed", flags.reverse_speed),
        ("--delay", flags.delay),
        ("--reverse-delay", flags.reverse_delay),
        ("--blink-speed", flags.blink_speed),
        ("--hide-delay", flags.hide_delay),
    ];
    for (flag, value) in numbers {
        if let Some(value) = value {
            lines.push(format!("{flag} {value}"));
        }
    }
    if flags.loop_mode {
        lines.push("--loop".to_string());
    }
    if let Some(mode) = flags.render {
        lines.push(format!("--render {}", mode.as_str()));
    }
    if flags.tag_aware {
        lines.push("--tag-aware".to_string());
    }
    if let Some(cursor) = &flags.cursor {
        lines.push(format!("--cursor {cursor}"));
    }
    if flags.no_auto_hide {
        lines.push("--no-auto-hide".to_string());
    }
    if let Some(path) = &flags.debug_log {
        lines.push(format!("--debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

fn ensure_single_token(flag: &str, value: &str) -> Result<()> {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        anyhow::bail!(
            "Cannot save {flag} {value:?}: saved values must not be empty or contain whitespace"
        );
    }
    Ok(())
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick known flags out of `tokens`, ignoring everything else.
///
/// Valued flags accept both `--flag value` and `--flag=value`; values that
/// fail to parse leave the field unset.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        match name {
            "--loop" => flags.loop_mode = true,
            "--tag-aware" => flags.tag_aware = true,
            "--no-auto-hide" => flags.no_auto_hide = true,
            "--speed" | "--reverse-speed" | "--delay" | "--reverse-delay" | "--blink-speed"
            | "--hide-delay" | "--render" | "--cursor" | "--debug-log" => {
                let value = match inline {
                    Some(value) => Some(value),
                    None => {
                        let next = tokens.get(i + 1).map(String::as_str);
                        if next.is_some() {
                            i += 1;
                        }
                        next
                    }
                };
                if let Some(value) = value {
                    apply_value(&mut flags, name, value);
                }
            }
            _ => {}
        }
        i += 1;
    }
    flags
}

fn apply_value(flags: &mut ConfigFlags, name: &str, value: &str) {
    let millis = value.parse::<u64>().ok();
    match name {
        "--speed" => flags.speed = millis,
        "--reverse-speed" => flags.reverse_speed = millis,
        "--delay" => flags.delay = millis,
        "--reverse-delay" => flags.reverse_delay = millis,
        "--blink-speed" => flags.blink_speed = millis,
        "--hide-delay" => flags.hide_delay = millis,
        "--render" => flags.render = RenderMode::parse(value),
        "--cursor" => flags.cursor = Some(value.to_string()),
        "--debug-log" => flags.debug_log = Some(PathBuf::from(value)),
        _ => {}
    }
}
