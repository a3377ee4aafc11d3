//! Relative and absolute upload-date normalisation.
//!
//! Relative phrases are matched against a [`LocaleTable`], a swappable
//! description of one locale's "ago" vocabulary. The normaliser itself holds
//! no locale strings.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Days, Months, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalyzerError, NormalizeError, Result};
use crate::models::UploadDate;
use crate::numeric::parse_decimal;

// ── CalendarUnit ──────────────────────────────────────────────────────────────

/// A unit of relative time a unit word can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarUnit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
}

impl CalendarUnit {
    /// Step `amount` units back from `from`.
    ///
    /// Years and months use calendar arithmetic and clamp to the last valid
    /// day of the target month. Returns `None` on overflow or when the result
    /// falls in a local-time gap.
    pub fn subtract<Z: TimeZone>(self, from: DateTime<Z>, amount: u32) -> Option<DateTime<Z>> {
        match self {
            CalendarUnit::Years => from.checked_sub_months(Months::new(amount.checked_mul(12)?)),
            CalendarUnit::Months => from.checked_sub_months(Months::new(amount)),
            CalendarUnit::Weeks => from.checked_sub_days(Days::new(u64::from(amount) * 7)),
            CalendarUnit::Days => from.checked_sub_days(Days::new(u64::from(amount))),
            CalendarUnit::Hours => {
                from.checked_sub_signed(TimeDelta::try_hours(i64::from(amount))?)
            }
            CalendarUnit::Minutes => {
                from.checked_sub_signed(TimeDelta::try_minutes(i64::from(amount))?)
            }
        }
    }
}

// ── LocaleTable ───────────────────────────────────────────────────────────────

/// Where the "ago" marker sits relative to `<amount> <unit>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerPosition {
    /// `<marker> <amount> <unit>`, e.g. `قبل 3 سنوات`.
    #[default]
    Before,
    /// `<amount> <unit> <marker>`, e.g. `3 years ago`.
    After,
}

/// Relative-date vocabulary for one source locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleTable {
    pub name: String,
    pub ago_marker: String,
    #[serde(default)]
    pub marker_position: MarkerPosition,
    /// Match the marker and unit words ignoring case.
    #[serde(default)]
    pub case_insensitive: bool,
    /// Unit word (singular or plural) → calendar unit.
    pub units: BTreeMap<String, CalendarUnit>,
    /// Dual unit word → calendar unit. The phrase carries no number; the
    /// amount is two (`قبل يومين` is two days ago).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub duals: BTreeMap<String, CalendarUnit>,
}

/// Amount implied by a dual unit word.
const DUAL_AMOUNT: u32 = 2;

/// Names accepted by [`LocaleTable::builtin`].
pub const BUILTIN_LOCALES: &[&str] = &["ar", "en"];

impl LocaleTable {
    fn from_pairs(
        name: &str,
        ago_marker: &str,
        marker_position: MarkerPosition,
        case_insensitive: bool,
        pairs: &[(&str, CalendarUnit)],
        duals: &[(&str, CalendarUnit)],
    ) -> Self {
        fn to_map(words: &[(&str, CalendarUnit)]) -> BTreeMap<String, CalendarUnit> {
            words
                .iter()
                .map(|(word, unit)| ((*word).to_string(), *unit))
                .collect()
        }
        Self {
            name: name.to_string(),
            ago_marker: ago_marker.to_string(),
            marker_position,
            case_insensitive,
            units: to_map(pairs),
            duals: to_map(duals),
        }
    }

    /// Arabic: `قبل <n> <unit>`.
    pub fn arabic() -> Self {
        use CalendarUnit::*;
        Self::from_pairs(
            "ar",
            "قبل",
            MarkerPosition::Before,
            false,
            &[
                ("سنة", Years),
                ("سنوات", Years),
                ("عام", Years),
                ("أعوام", Years),
                ("شهر", Months),
                ("أشهر", Months),
                ("شهور", Months),
                ("أسبوع", Weeks),
                ("أسابيع", Weeks),
                ("يوم", Days),
                ("أيام", Days),
                ("ساعة", Hours),
                ("ساعات", Hours),
                ("دقيقة", Minutes),
                ("دقائق", Minutes),
            ],
            &[
                ("سنتين", Years),
                ("سنتان", Years),
                ("عامين", Years),
                ("عامان", Years),
                ("شهرين", Months),
                ("شهران", Months),
                ("أسبوعين", Weeks),
                ("أسبوعان", Weeks),
                ("يومين", Days),
                ("يومان", Days),
                ("ساعتين", Hours),
                ("ساعتان", Hours),
                ("دقيقتين", Minutes),
                ("دقيقتان", Minutes),
            ],
        )
    }

    /// English: `<n> <unit> ago`.
    pub fn english() -> Self {
        use CalendarUnit::*;
        Self::from_pairs(
            "en",
            "ago",
            MarkerPosition::After,
            true,
            &[
                ("year", Years),
                ("years", Years),
                ("month", Months),
                ("months", Months),
                ("week", Weeks),
                ("weeks", Weeks),
                ("day", Days),
                ("days", Days),
                ("hour", Hours),
                ("hours", Hours),
                ("minute", Minutes),
                ("minutes", Minutes),
            ],
            &[],
        )
    }

    /// Look up a built-in table by name (see [`BUILTIN_LOCALES`]).
    pub fn builtin(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "ar" | "arabic" => Ok(Self::arabic()),
            "en" | "english" => Ok(Self::english()),
            _ => Err(AnalyzerError::UnknownLocale(name.to_string())),
        }
    }

    /// Parse and validate a table from its JSON form.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Load and validate a table from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AnalyzerError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Reject tables that could never match a phrase.
    pub fn validate(&self) -> Result<()> {
        if self.ago_marker.trim().is_empty() {
            return Err(AnalyzerError::Config(format!(
                "locale \"{}\" has an empty ago marker",
                self.name
            )));
        }
        if self.units.is_empty() {
            return Err(AnalyzerError::Config(format!(
                "locale \"{}\" defines no unit words",
                self.name
            )));
        }
        if let Some(word) = self
            .units
            .keys()
            .chain(self.duals.keys())
            .find(|w| w.is_empty() || w.chars().any(char::is_whitespace))
        {
            return Err(AnalyzerError::Config(format!(
                "locale \"{}\" has invalid unit word {:?}",
                self.name, word
            )));
        }
        Ok(())
    }

    /// Resolve a unit word, honouring `case_insensitive`.
    pub fn unit_for(&self, word: &str) -> Option<CalendarUnit> {
        self.lookup(&self.units, word)
    }

    /// Resolve a dual unit word, honouring `case_insensitive`.
    pub fn dual_for(&self, word: &str) -> Option<CalendarUnit> {
        self.lookup(&self.duals, word)
    }

    fn lookup(&self, words: &BTreeMap<String, CalendarUnit>, word: &str) -> Option<CalendarUnit> {
        if let Some(unit) = words.get(word) {
            return Some(*unit);
        }
        if self.case_insensitive {
            let lower = word.to_lowercase();
            return words
                .iter()
                .find(|(w, _)| w.to_lowercase() == lower)
                .map(|(_, unit)| *unit);
        }
        None
    }

    /// `<marker> <amount> <unit>` (or the suffix form).
    fn phrase_pattern(&self) -> Result<Regex> {
        let marker = regex::escape(self.ago_marker.trim());
        self.compile(match self.marker_position {
            MarkerPosition::Before => format!(r"{marker}\s+(\d+)\s+(\S+)"),
            MarkerPosition::After => format!(r"(\d+)\s+(\S+)\s+{marker}"),
        })
    }

    /// `<marker> <dual>` (or the suffix form); `None` without dual words.
    fn dual_pattern(&self) -> Result<Option<Regex>> {
        if self.duals.is_empty() {
            return Ok(None);
        }
        let marker = regex::escape(self.ago_marker.trim());
        self.compile(match self.marker_position {
            MarkerPosition::Before => format!(r"{marker}\s+(\S+)"),
            MarkerPosition::After => format!(r"(\S+)\s+{marker}"),
        })
        .map(Some)
    }

    fn compile(&self, body: String) -> Result<Regex> {
        let flags = if self.case_insensitive { "(?i)" } else { "" };
        Regex::new(&format!("{flags}{body}")).map_err(|e| {
            AnalyzerError::Config(format!("locale \"{}\" pattern: {e}", self.name))
        })
    }
}

// ── DateNormalizer ────────────────────────────────────────────────────────────

/// Absolute date-time formats tried after RFC 3339 / RFC 2822.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Absolute date-only formats, interpreted as local midnight.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%b %d, %Y", "%d %b %Y", "%B %d, %Y",
];

/// Converts upload-date text into a UTC timestamp or [`UploadDate::Unknown`].
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    table: LocaleTable,
    pattern: Regex,
    dual_pattern: Option<Regex>,
    timezone: Tz,
}

impl DateNormalizer {
    /// Build a normaliser for `table`, doing calendar arithmetic in `timezone`.
    pub fn new(table: LocaleTable, timezone: Tz) -> Result<Self> {
        table.validate()?;
        let pattern = table.phrase_pattern()?;
        let dual_pattern = table.dual_pattern()?;
        Ok(Self {
            table,
            pattern,
            dual_pattern,
            timezone,
        })
    }

    /// Normalise a raw upload date relative to `now`, never failing.
    ///
    /// `None` stands for a raw value that was not text.
    pub fn normalize(&self, text: Option<&str>, now: DateTime<Utc>) -> UploadDate {
        match self.try_normalize(text, now) {
            Ok(ts) => UploadDate::Known(ts),
            Err(err) => {
                debug!("DateNormalizer: {err}, marking unknown");
                UploadDate::Unknown
            }
        }
    }

    /// Normalise a raw upload date, reporting failure instead of absorbing it.
    pub fn try_normalize(
        &self,
        text: Option<&str>,
        now: DateTime<Utc>,
    ) -> std::result::Result<DateTime<Utc>, NormalizeError> {
        let Some(text) = text else {
            return Err(NormalizeError::UnparsableDate("<non-text>".to_string()));
        };
        self.parse_relative(text, now)
            .or_else(|| self.parse_absolute(text))
            .ok_or_else(|| NormalizeError::UnparsableDate(text.to_string()))
    }

    /// Relative-phrase path: `now` minus `<amount> <unit>`, or minus two
    /// units for a dual word.
    ///
    /// Returns `None` when the phrase does not match or the amount or unit
    /// word is not recognised.
    pub fn parse_relative(&self, text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let (unit, amount) = self
            .counted_phrase(text)
            .or_else(|| self.dual_phrase(text))?;

        let local_now = now.with_timezone(&self.timezone);
        unit.subtract(local_now, amount)
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn counted_phrase(&self, text: &str) -> Option<(CalendarUnit, u32)> {
        let caps = self.pattern.captures(text)?;
        let amount = u32::try_from(parse_decimal(caps.get(1)?.as_str())?).ok()?;
        let unit = self.table.unit_for(unit_word(caps.get(2)?.as_str()))?;
        Some((unit, amount))
    }

    fn dual_phrase(&self, text: &str) -> Option<(CalendarUnit, u32)> {
        let caps = self.dual_pattern.as_ref()?.captures(text)?;
        let unit = self.table.dual_for(unit_word(caps.get(1)?.as_str()))?;
        Some((unit, DUAL_AMOUNT))
    }

    /// Absolute-date path using locale-agnostic formats.
    ///
    /// Naive values are interpreted in the configured timezone.
    pub fn parse_absolute(&self, text: &str) -> Option<DateTime<Utc>> {
        let s = text.trim();
        if s.is_empty() {
            return None;
        }

        let normalised = match s.strip_suffix('Z') {
            Some(stripped) => format!("{stripped}+00:00"),
            None => s.to_string(),
        };
        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
            return Some(dt.with_timezone(&Utc));
        }

        let naive = DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .or_else(|| {
                DATE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })?;

        self.timezone
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Strip trailing or leading punctuation (including the Arabic comma).
fn unit_word(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_ascii_punctuation() || c == '\u{060C}')
}
