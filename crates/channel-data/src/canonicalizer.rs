//! Per-record normalisation: one [`RawRecord`] in, one [`CanonicalRecord`] out.

use chrono::{DateTime, Utc};
use channel_core::dates::DateNormalizer;
use channel_core::error::Result;
use channel_core::models::{CanonicalRecord, RawRecord};
use channel_core::numeric::NumericExtractor;
use channel_core::settings::PipelineConfig;

/// Applies the numeric and date normalisers across whole records.
#[derive(Debug, Clone)]
pub struct RecordCanonicalizer {
    dates: DateNormalizer,
}

impl RecordCanonicalizer {
    pub fn new(dates: DateNormalizer) -> Self {
        Self { dates }
    }

    /// Build the date normaliser described by `config`.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(Self::new(DateNormalizer::new(
            config.locale.clone(),
            config.timezone,
        )?))
    }

    /// Normalise one record. Relative dates are resolved against `now`.
    pub fn canonicalize(&self, raw: &RawRecord, now: DateTime<Utc>) -> CanonicalRecord {
        CanonicalRecord {
            title: raw.title.clone(),
            url: raw.url.clone(),
            views: NumericExtractor::extract(raw.raw_views.as_deref()),
            likes: NumericExtractor::extract(raw.raw_likes.as_deref()),
            upload_date: self.dates.normalize(raw.raw_upload_date.as_deref(), now),
        }
    }

    /// Normalise every record, preserving scrape order.
    pub fn canonicalize_all(&self, raws: &[RawRecord], now: DateTime<Utc>) -> Vec<CanonicalRecord> {
        raws.iter().map(|raw| self.canonicalize(raw, now)).collect()
    }
}
