//! CLI output formatting.
//!
//! Provides consistent terminal output with support for JSON mode (for
//! scripting) and quiet mode. In JSON mode every helper emits one
//! `{"type": ..., "payload": ...}` line instead of styled text.

use std::fmt::Display;
use std::io::IsTerminal;
use std::sync::{OnceLock, RwLock};

use owo_colors::{OwoColorize, Style};
use serde::Serialize;
use serde_json::json;

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit machine-readable JSON output instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
    /// Style human-readable output with ANSI colors.
    pub color: bool,
}

impl OutputConfig {
    /// Create a new output configuration.
    #[must_use]
    pub const fn new(json: bool, quiet: bool, color: bool) -> Self {
        Self { json, quiet, color }
    }
}

/// Resolve the `--color` choice against the environment.
///
/// `auto` colors only a terminal stdout with `NO_COLOR` unset.
#[must_use]
pub fn resolve_color(always: bool, never: bool) -> bool {
    if never {
        return false;
    }
    always || (std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none())
}

/// Global output configuration singleton.
static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<OutputConfig> {
    OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()))
}

fn read_config() -> OutputConfig {
    match config_cell().read() {
        Ok(config) => *config,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

fn write_config(config: OutputConfig) {
    match config_cell().write() {
        Ok(mut current) => *current = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// Check if regular (non-JSON) output should be suppressed.
fn regular_output_suppressed(config: OutputConfig) -> bool {
    !config.json && config.quiet
}

/// Emit a JSON line with type and payload structure.
fn emit_json_line(kind: &str, payload: serde_json::Value) {
    println!(
        "{}",
        json!({
            "type": kind,
            "payload": payload,
        })
    );
}

fn paint(config: OutputConfig, text: &str, style: Style) -> String {
    if config.color {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

/// Apply output settings from global CLI flags.
///
/// Call this early in the CLI entry point.
pub fn configure(config: OutputConfig) {
    write_config(config);
}

/// Return whether machine-readable JSON output is enabled.
#[must_use]
pub fn is_json() -> bool {
    read_config().json
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    let config = read_config();
    let value = value.to_string();

    if config.json {
        emit_json_line(
            "field",
            json!({
                "label": label,
                "value": value,
            }),
        );
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("  {:<14} {}", paint(config, label, Style::new().dimmed()), value);
}

/// Print a success line.
pub fn success(message: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("success", json!({ "message": message }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("  {} {}", paint(config, "✓", Style::new().green()), message);
}

/// Print a warning line. Shown even in quiet mode.
pub fn warning(message: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("warning", json!({ "message": message }));
        return;
    }

    println!("  {} {}", paint(config, "⚠", Style::new().yellow()), message);
}

/// Print an error line to stderr. Shown even in quiet mode.
pub fn error(message: &str) {
    let config = read_config();

    if config.json {
        eprintln!(
            "{}",
            json!({
                "type": "error",
                "payload": { "message": message },
            })
        );
        return;
    }

    eprintln!("  {} {}", paint(config, "×", Style::new().red()), message);
}

/// Print a section header.
pub fn section(title: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("section", json!({ "title": title }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!();
    println!("{}", paint(config, title, Style::new().bold()));
}

/// Emit a serializable result.
///
/// In JSON mode this is the single `result` line scripts consume; in
/// human mode nothing is printed and the caller renders its own summary.
pub fn result<T: Serialize>(kind: &str, value: &T) {
    if !is_json() {
        return;
    }
    match serde_json::to_value(value) {
        Ok(payload) => emit_json_line(
            "result",
            json!({
                "kind": kind,
                "value": payload,
            }),
        ),
        Err(e) => error(&format!("failed to serialize result: {e}")),
    }
}

/// Format a highlighted value in cyan.
pub fn highlight(value: impl Display) -> String {
    let config = read_config();
    let value = value.to_string();
    if config.json {
        return value;
    }
    paint(config, &value, Style::new().cyan())
}

/// Format a risk score, colored by severity.
pub fn score(value: u32) -> String {
    let config = read_config();
    let text = format!("{value}/100");
    if config.json {
        return text;
    }
    let style = match value {
        0..=29 => Style::new().green(),
        30..=69 => Style::new().yellow(),
        _ => Style::new().red(),
    };
    paint(config, &text, style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_disables_color() {
        assert!(!resolve_color(true, true));
        assert!(!resolve_color(false, true));
    }

    #[test]
    fn always_enables_color() {
        assert!(resolve_color(true, false));
    }

    #[test]
    fn paint_respects_color_flag() {
        let plain = OutputConfig::new(false, false, false);
        assert_eq!(paint(plain, "ok", Style::new().green()), "ok");

        let colored = OutputConfig::new(false, false, true);
        let painted = paint(colored, "ok", Style::new().green());
        assert!(painted.contains("ok"));
        assert_ne!(painted, "ok");
    }
}
