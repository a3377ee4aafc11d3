use std::path::Path;

use anyhow::Context;
use channel_core::models::RawChannel;
use channel_core::settings::Settings;
use channel_data::analysis::ChannelAnalysis;
use channel_data::reader::{load_channel, read_channel};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a Python-style level name onto a `tracing` filter directive.
///
/// Unrecognised names are passed through so `EnvFilter` syntax such as
/// `"channel_data=debug"` also works.
pub fn log_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Logs go to stderr so stdout carries nothing but the analysis document.
/// Falls back to `"info"` if the directive does not parse.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(log_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .init();

    Ok(())
}

// ── Input / output ─────────────────────────────────────────────────────────────

/// Read the scraped channel document named by `--input` (or stdin for `-`).
pub fn load_input(settings: &Settings) -> anyhow::Result<RawChannel> {
    if settings.reads_stdin() {
        let stdin = std::io::stdin();
        return read_channel(stdin.lock()).context("failed to read channel document from stdin");
    }
    load_channel(&settings.input)
        .with_context(|| format!("failed to load {}", settings.input.display()))
}

/// Serialise the analysis, optionally bundled with the canonical table.
///
/// Serialises straight to text: `total_views` may not fit a `serde_json::Value`.
pub fn render_output(
    analysis: &ChannelAnalysis,
    include_table: bool,
    pretty: bool,
) -> anyhow::Result<String> {
    let rendered = match (include_table, pretty) {
        (true, true) => serde_json::to_string_pretty(analysis)?,
        (true, false) => serde_json::to_string(analysis)?,
        (false, true) => serde_json::to_string_pretty(&analysis.analysis)?,
        (false, false) => serde_json::to_string(&analysis.analysis)?,
    };
    Ok(rendered)
}

/// Write `document` to `output`, or stdout when no path is given.
pub fn write_output(output: Option<&Path>, document: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(path, format!("{document}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => println!("{document}"),
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
