//! Loading of scraped channel documents.
//!
//! Accepts the scraper's wrapped shape (`{"channel": {...}}`) as well as a bare
//! channel object, from a string, any reader, or a file on disk.

use std::io::Read;
use std::path::Path;

use channel_core::error::{AnalyzerError, Result};
use channel_core::models::RawChannel;
use serde_json::Value;
use tracing::{debug, warn};

/// Parse a channel document from a JSON string.
pub fn parse_channel_document(json: &str) -> Result<RawChannel> {
    let value: Value = serde_json::from_str(json)?;
    channel_from_value(value)
}

/// Parse a channel document from any reader (e.g. stdin).
pub fn read_channel<R: Read>(reader: R) -> Result<RawChannel> {
    let value: Value = serde_json::from_reader(reader)?;
    channel_from_value(value)
}

/// Load a channel document from a file.
pub fn load_channel(path: &Path) -> Result<RawChannel> {
    let content = std::fs::read_to_string(path).map_err(|source| AnalyzerError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let channel = parse_channel_document(&content)?;
    debug!(
        "Loaded channel \"{}\" with {} videos from {}",
        channel.name,
        channel.videos.len(),
        path.display()
    );
    Ok(channel)
}

/// Unwrap the optional `channel` envelope and deserialise the channel object.
fn channel_from_value(value: Value) -> Result<RawChannel> {
    let channel = match value {
        Value::Object(mut map) if map.contains_key("channel") => map
            .remove("channel")
            .unwrap_or(Value::Null),
        other => other,
    };

    let Value::Object(ref fields) = channel else {
        return Err(AnalyzerError::InvalidInput(
            "expected a channel object".to_string(),
        ));
    };
    if !fields.contains_key("name") {
        return Err(AnalyzerError::InvalidInput(
            "channel object has no \"name\"".to_string(),
        ));
    }
    match fields.get("videos") {
        None => warn!("Channel document has no \"videos\" list; treating it as empty"),
        Some(Value::Array(_)) => {}
        Some(_) => {
            return Err(AnalyzerError::InvalidInput(
                "\"videos\" must be a list".to_string(),
            ))
        }
    }

    Ok(serde_json::from_value(channel)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const WRAPPED: &str = r#"{
        "channel": {
            "name": "Math Corner",
            "subscriber_count": "12.4K subscribers",
            "videos": [
                {"title": "A", "url": "https://v/a", "views": "1,234 views", "likes": "56", "upload_date": "قبل 3 سنوات"},
                {"title": "B", "url": "https://v/b", "views": "99 views", "likes": null, "upload_date": "2024-01-01"}
            ]
        }
    }"#;

    #[test]
    fn test_parse_wrapped_document() {
        let channel = parse_channel_document(WRAPPED).unwrap();
        assert_eq!(channel.name, "Math Corner");
        assert_eq!(channel.subscriber_count.as_deref(), Some("12.4K subscribers"));
        assert_eq!(channel.videos.len(), 2);
        assert_eq!(channel.videos[0].raw_views.as_deref(), Some("1,234 views"));
        assert_eq!(channel.videos[1].raw_likes, None);
    }

    #[test]
    fn test_null_pass_through_fields_keep_the_batch() {
        let json = r#"{
            "channel": {
                "name": null,
                "videos": [
                    {"title": "A", "url": "https://v/a", "views": "10 views"},
                    {"title": null, "url": 42, "views": "20 views", "likes": "3"}
                ]
            }
        }"#;
        let channel = parse_channel_document(json).unwrap();
        assert_eq!(channel.name, "");
        assert_eq!(channel.videos.len(), 2);
        assert_eq!(channel.videos[0].title, "A");
        assert_eq!(channel.videos[1].title, "");
        assert_eq!(channel.videos[1].url, "");
        assert_eq!(channel.videos[1].raw_views.as_deref(), Some("20 views"));
    }

    #[test]
    fn test_parse_bare_channel_object() {
        let json = r#"{"name": "Bare", "videos": [{"title": "x", "url": "u", "raw_views": "5"}]}"#;
        let channel = parse_channel_document(json).unwrap();
        assert_eq!(channel.name, "Bare");
        assert_eq!(channel.videos[0].raw_views.as_deref(), Some("5"));
    }

    #[test]
    fn test_parse_preserves_scrape_order() {
        let channel = parse_channel_document(WRAPPED).unwrap();
        let titles: Vec<&str> = channel.videos.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_missing_videos_is_empty() {
        let channel = parse_channel_document(r#"{"channel": {"name": "Quiet"}}"#).unwrap();
        assert!(channel.videos.is_empty());
    }

    #[test]
    fn test_videos_not_a_list_is_invalid() {
        let err = parse_channel_document(r#"{"name": "X", "videos": "none"}"#).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidInput(_)));
    }

    #[test]
    fn test_missing_name_is_invalid() {
        let err = parse_channel_document(r#"{"videos": []}"#).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidInput(_)));
    }

    #[test]
    fn test_non_object_is_invalid() {
        let err = parse_channel_document("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidInput(_)));
        // The scraper reports failures as a plain string.
        let err = parse_channel_document(r#""Error scraping channel data""#).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidInput(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_channel_document("{not json").unwrap_err();
        assert!(matches!(err, AnalyzerError::JsonParse(_)));
    }

    #[test]
    fn test_read_channel_from_reader() {
        let channel = read_channel(WRAPPED.as_bytes()).unwrap();
        assert_eq!(channel.videos.len(), 2);
    }

    #[test]
    fn test_load_channel_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("channel.json");
        std::fs::write(&path, WRAPPED).unwrap();

        let channel = load_channel(&path).unwrap();
        assert_eq!(channel.name, "Math Corner");
    }

    #[test]
    fn test_load_channel_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = load_channel(&tmp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, AnalyzerError::FileRead { .. }));
    }
}
