use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::DataCondition;

/// Marker emitted in place of a timestamp when an upload date is not known.
pub const UNKNOWN_DATE_MARKER: &str = "unknown";

/// Maximum number of entries in each ranking list.
pub const RANKING_LIMIT: usize = 5;

// ── Raw input ─────────────────────────────────────────────────────────────────

/// One video as scraped from the channel page, before any normalisation.
///
/// Text fields that arrive as something other than a JSON string (a number,
/// `null`, or missing entirely) are stored as `None` and treated as "not text"
/// by the normalisers. Title and URL pass through as empty text instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "text_or_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub url: String,
    /// Locale-formatted view count, e.g. `"1,234 views"`.
    #[serde(default, alias = "views", deserialize_with = "text_or_none")]
    pub raw_views: Option<String>,
    /// Locale-formatted like count.
    #[serde(default, alias = "likes", deserialize_with = "text_or_none")]
    pub raw_likes: Option<String>,
    /// Relative phrase (`"قبل 3 سنوات"`, `"2 days ago"`) or an absolute date.
    #[serde(default, alias = "upload_date", deserialize_with = "text_or_none")]
    pub raw_upload_date: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub description: Option<String>,
}

/// Channel-level document handed over by the scraping collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChannel {
    #[serde(deserialize_with = "text_or_empty")]
    pub name: String,
    /// Locale-formatted subscriber count, when the scraper captured it.
    #[serde(default, deserialize_with = "text_or_none")]
    pub subscriber_count: Option<String>,
    /// Videos in scrape order.
    #[serde(default)]
    pub videos: Vec<RawRecord>,
}

/// Accept a JSON string as text; anything else becomes `None`.
fn text_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

/// Accept a JSON string as text; anything else becomes `""`.
fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_or_none(deserializer)?.unwrap_or_default())
}

// ── Canonical records ─────────────────────────────────────────────────────────

/// A normalised upload date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadDate {
    Known(DateTime<Utc>),
    Unknown,
}

impl UploadDate {
    /// The timestamp, if known.
    pub fn known(&self) -> Option<DateTime<Utc>> {
        match self {
            UploadDate::Known(ts) => Some(*ts),
            UploadDate::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, UploadDate::Known(_))
    }
}

impl From<Option<DateTime<Utc>>> for UploadDate {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(UploadDate::Unknown, UploadDate::Known)
    }
}

impl Serialize for UploadDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            UploadDate::Known(ts) => {
                serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            UploadDate::Unknown => serializer.serialize_str(UNKNOWN_DATE_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for UploadDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == UNKNOWN_DATE_MARKER {
            return Ok(UploadDate::Unknown);
        }
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| UploadDate::Known(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom)
    }
}

/// One video after normalisation. Exactly one per [`RawRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub title: String,
    pub url: String,
    pub views: u64,
    pub likes: u64,
    pub upload_date: UploadDate,
}

// ── Rankings ──────────────────────────────────────────────────────────────────

/// Which metric a ranking list is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankMetric {
    Views,
    Likes,
}

impl RankMetric {
    /// Field name used for the metric value in serialised entries.
    pub fn field_name(self) -> &'static str {
        match self {
            RankMetric::Views => "views",
            RankMetric::Likes => "likes",
        }
    }

    /// Read this metric off a canonical record.
    pub fn value_of(self, record: &CanonicalRecord) -> u64 {
        match self {
            RankMetric::Views => record.views,
            RankMetric::Likes => record.likes,
        }
    }
}

/// One row of a top/bottom list: `{title, <metric>, url}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub title: String,
    pub metric: RankMetric,
    pub value: u64,
    pub url: String,
}

impl RankedEntry {
    pub fn from_record(record: &CanonicalRecord, metric: RankMetric) -> Self {
        Self {
            title: record.title.clone(),
            metric,
            value: metric.value_of(record),
            url: record.url.clone(),
        }
    }
}

impl Serialize for RankedEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("title", &self.title)?;
        map.serialize_entry(self.metric.field_name(), &self.value)?;
        map.serialize_entry("url", &self.url)?;
        map.end()
    }
}

// ── Analysis result ───────────────────────────────────────────────────────────

/// A statistic that is either computed or explicitly undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Ok { value: T },
    EmptyDataset,
    InsufficientDateData { known_dates: usize },
}

impl<T> Outcome<T> {
    /// The computed value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Ok { value } => Some(value),
            _ => None,
        }
    }

    /// The condition that left this statistic undefined, if any.
    pub fn condition(&self) -> Option<DataCondition> {
        match self {
            Outcome::Ok { .. } => None,
            Outcome::EmptyDataset => Some(DataCondition::EmptyDataset),
            Outcome::InsufficientDateData { known_dates } => {
                Some(DataCondition::InsufficientDateData {
                    known_dates: *known_dates,
                })
            }
        }
    }
}

impl<T> From<std::result::Result<T, DataCondition>> for Outcome<T> {
    fn from(result: std::result::Result<T, DataCondition>) -> Self {
        match result {
            Ok(value) => Outcome::Ok { value },
            Err(DataCondition::EmptyDataset) => Outcome::EmptyDataset,
            Err(DataCondition::InsufficientDateData { known_dates }) => {
                Outcome::InsufficientDateData { known_dates }
            }
        }
    }
}

/// The structured analysis handed to report and visualisation consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub channel_name: String,
    /// Subscriber count, present only when the scraper captured one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriber_count: Option<u64>,
    pub total_videos: usize,
    /// Exact sum of canonical views; may exceed `u64::MAX`.
    pub total_views: u128,
    pub average_views: Outcome<f64>,
    pub most_viewed: Vec<RankedEntry>,
    pub least_viewed: Vec<RankedEntry>,
    pub most_liked: Vec<RankedEntry>,
    pub upload_frequency_days: Outcome<f64>,
}

impl AnalysisResult {
    /// Every batch-level condition reported anywhere in the result, deduplicated.
    pub fn conditions(&self) -> Vec<DataCondition> {
        let mut out = Vec::new();
        for condition in [
            self.average_views.condition(),
            self.upload_frequency_days.condition(),
        ]
        .into_iter()
        .flatten()
        {
            if !out.contains(&condition) {
                out.push(condition);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(title: &str, views: u64, likes: u64) -> CanonicalRecord {
        CanonicalRecord {
            title: title.to_string(),
            url: format!("https://example.com/{title}"),
            views,
            likes,
            upload_date: UploadDate::Unknown,
        }
    }

    // ── RawRecord deserialisation ─────────────────────────────────────────────

    #[test]
    fn test_raw_record_accepts_scraper_field_names() {
        let json = r#"{
            "title": "Intro",
            "url": "https://example.com/v/1",
            "views": "1,234 views",
            "likes": "56",
            "upload_date": "قبل 3 سنوات",
            "duration": "10:01",
            "description": "first"
        }"#;
        let rec: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.raw_views.as_deref(), Some("1,234 views"));
        assert_eq!(rec.raw_likes.as_deref(), Some("56"));
        assert_eq!(rec.raw_upload_date.as_deref(), Some("قبل 3 سنوات"));
        assert_eq!(rec.duration.as_deref(), Some("10:01"));
    }

    #[test]
    fn test_raw_record_non_text_fields_become_none() {
        let json = r#"{"title": "t", "url": "u", "raw_views": 1234, "raw_likes": null}"#;
        let rec: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.raw_views, None);
        assert_eq!(rec.raw_likes, None);
        assert_eq!(rec.raw_upload_date, None);
    }

    #[test]
    fn test_raw_record_non_text_title_and_url_become_empty() {
        let json = r#"{"title": null, "url": 7, "views": "5"}"#;
        let rec: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.title, "");
        assert_eq!(rec.url, "");
        assert_eq!(rec.raw_views.as_deref(), Some("5"));
    }

    #[test]
    fn test_raw_channel_videos_default_empty() {
        let ch: RawChannel = serde_json::from_str(r#"{"name": "Empty"}"#).unwrap();
        assert_eq!(ch.name, "Empty");
        assert!(ch.videos.is_empty());
    }

    // ── UploadDate serde ──────────────────────────────────────────────────────

    #[test]
    fn test_upload_date_serialises_iso_or_marker() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let known = serde_json::to_string(&UploadDate::Known(ts)).unwrap();
        assert_eq!(known, r#""2024-03-01T12:00:00Z""#);
        let unknown = serde_json::to_string(&UploadDate::Unknown).unwrap();
        assert_eq!(unknown, r#""unknown""#);
    }

    #[test]
    fn test_upload_date_keeps_sub_second_precision() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
            + chrono::TimeDelta::milliseconds(250);
        let json = serde_json::to_string(&UploadDate::Known(ts)).unwrap();
        assert_eq!(json, r#""2024-03-01T12:00:00.250Z""#);
        let back: UploadDate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, UploadDate::Known(ts));
    }

    #[test]
    fn test_upload_date_deserialises_marker() {
        let back: UploadDate = serde_json::from_str(r#""unknown""#).unwrap();
        assert_eq!(back, UploadDate::Unknown);
        let back: UploadDate = serde_json::from_str(r#""2024-03-01T12:00:00Z""#).unwrap();
        assert!(back.is_known());
    }

    // ── RankedEntry ───────────────────────────────────────────────────────────

    #[test]
    fn test_ranked_entry_uses_metric_field_name() {
        let rec = record("a", 100, 7);
        let views = serde_json::to_value(RankedEntry::from_record(&rec, RankMetric::Views)).unwrap();
        assert_eq!(views["views"], 100);
        assert!(views.get("likes").is_none());

        let likes = serde_json::to_value(RankedEntry::from_record(&rec, RankMetric::Likes)).unwrap();
        assert_eq!(likes["likes"], 7);
        assert_eq!(likes["title"], "a");
        assert_eq!(likes["url"], "https://example.com/a");
    }

    // ── Outcome ───────────────────────────────────────────────────────────────

    #[test]
    fn test_outcome_serialises_with_status_tag() {
        let ok: Outcome<f64> = Outcome::Ok { value: 2.5 };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({"status": "ok", "value": 2.5})
        );

        let empty: Outcome<f64> = Outcome::EmptyDataset;
        assert_eq!(
            serde_json::to_value(&empty).unwrap(),
            serde_json::json!({"status": "empty_dataset"})
        );

        let sparse: Outcome<f64> = Outcome::InsufficientDateData { known_dates: 1 };
        assert_eq!(
            serde_json::to_value(&sparse).unwrap(),
            serde_json::json!({"status": "insufficient_date_data", "known_dates": 1})
        );
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: Outcome<u32> = Ok(3).into();
        assert_eq!(ok.value(), Some(&3));
        assert_eq!(ok.condition(), None);

        let err: Outcome<u32> = Err(DataCondition::EmptyDataset).into();
        assert_eq!(err.value(), None);
        assert_eq!(err.condition(), Some(DataCondition::EmptyDataset));
    }

    fn empty_result() -> AnalysisResult {
        AnalysisResult {
            channel_name: "c".to_string(),
            subscriber_count: None,
            total_videos: 0,
            total_views: 0,
            average_views: Outcome::EmptyDataset,
            most_viewed: vec![],
            least_viewed: vec![],
            most_liked: vec![],
            upload_frequency_days: Outcome::EmptyDataset,
        }
    }

    #[test]
    fn test_conditions_deduplicated() {
        assert_eq!(empty_result().conditions(), vec![DataCondition::EmptyDataset]);
    }

    #[test]
    fn test_conditions_lists_distinct_conditions() {
        let mut result = empty_result();
        result.total_videos = 1;
        result.average_views = Outcome::Ok { value: 3.0 };
        result.most_viewed = vec![RankedEntry::from_record(&record("a", 3, 0), RankMetric::Views)];
        result.upload_frequency_days = Outcome::InsufficientDateData { known_dates: 0 };
        assert_eq!(
            result.conditions(),
            vec![DataCondition::InsufficientDateData { known_dates: 0 }]
        );
    }
}
