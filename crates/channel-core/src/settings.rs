use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::Parser;
use std::path::PathBuf;

use crate::dates::{LocaleTable, BUILTIN_LOCALES};
use crate::error::Result;
use crate::time_utils::{parse_reference_time, resolve_timezone};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Normalise, rank and summarise scraped video-channel metrics
#[derive(Parser, Debug, Clone)]
#[command(
    name = "channel-analyzer",
    about = "Normalise, rank and summarise scraped video-channel metrics",
    version
)]
pub struct Settings {
    /// Scraped channel document (JSON); "-" reads stdin
    #[arg(long, short, default_value = "-")]
    pub input: PathBuf,

    /// Output file for the analysis document (stdout if omitted)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Built-in relative-date locale
    #[arg(
        long,
        default_value = "ar",
        env = "CHANNEL_ANALYZER_LOCALE",
        value_parser = clap::builder::PossibleValuesParser::new(BUILTIN_LOCALES.iter().copied())
    )]
    pub locale: String,

    /// JSON locale unit table (overrides --locale)
    #[arg(long)]
    pub locale_file: Option<PathBuf>,

    /// Timezone for calendar arithmetic (auto-detected if "auto")
    #[arg(long, default_value = "auto", env = "CHANNEL_ANALYZER_TIMEZONE")]
    pub timezone: String,

    /// Reference time for relative dates, RFC 3339 (defaults to now)
    #[arg(long)]
    pub now: Option<String>,

    /// Also emit the per-record canonical table
    #[arg(long)]
    pub include_table: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// `--debug` wins over `--log-level`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }

    /// Whether input should be read from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }
}

// ── PipelineConfig ─────────────────────────────────────────────────────────────

/// Everything the analysis pipeline needs, resolved and validated up front.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Relative-date vocabulary of the scraped pages.
    pub locale: LocaleTable,
    /// Timezone in which calendar arithmetic and naive dates are interpreted.
    pub timezone: Tz,
    /// Fixed "now" for relative dates; `None` means the wall clock at run time.
    pub reference_time: Option<DateTime<Utc>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(LocaleTable::arabic(), Tz::UTC)
    }
}

impl PipelineConfig {
    pub fn new(locale: LocaleTable, timezone: Tz) -> Self {
        Self {
            locale,
            timezone,
            reference_time: None,
        }
    }

    /// Pin the reference time so repeated runs are reproducible.
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    /// Resolve CLI settings, failing on the first invalid value.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let locale = match &settings.locale_file {
            Some(path) => LocaleTable::from_file(path)?,
            None => LocaleTable::builtin(&settings.locale)?,
        };
        let timezone = resolve_timezone(&settings.timezone)?;
        let reference_time = settings
            .now
            .as_deref()
            .map(parse_reference_time)
            .transpose()?;

        let config = Self {
            locale,
            timezone,
            reference_time,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.locale.validate()
    }
}
