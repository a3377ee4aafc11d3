use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the channel analyzer crates.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The scraped document parsed as JSON but does not have the expected shape.
    #[error("Invalid channel document: {0}")]
    InvalidInput(String),

    /// A locale name does not match any built-in unit table.
    #[error("Unknown locale: {0}")]
    UnknownLocale(String),

    /// A timezone string is not a recognised IANA identifier.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// The reference time override is not valid RFC 3339.
    #[error("Invalid reference time: {0}")]
    InvalidReferenceTime(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the analyzer crates.
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Leaf-level parse failures.
///
/// These never reach the caller of the pipeline: the numeric extractor turns
/// them into `0` and the date normalizer turns them into
/// [`UploadDate::Unknown`](crate::models::UploadDate::Unknown).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Unparsable numeric value: {0:?}")]
    UnparsableNumeric(String),

    #[error("Unparsable date value: {0:?}")]
    UnparsableDate(String),
}

/// Batch-level conditions under which a statistic is undefined.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataCondition {
    /// The channel has no videos at all.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Fewer than two records carry a known upload date.
    #[error("Insufficient date data: {known_dates} known upload date(s), need at least 2")]
    InsufficientDateData { known_dates: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = AnalyzerError::FileRead {
            path: PathBuf::from("/some/channel.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/some/channel.json"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_unknown_locale() {
        let err = AnalyzerError::UnknownLocale("xx".to_string());
        assert_eq!(err.to_string(), "Unknown locale: xx");
    }

    #[test]
    fn test_error_display_invalid_timezone() {
        let err = AnalyzerError::InvalidTimezone("Mars/Olympus".to_string());
        assert_eq!(err.to_string(), "Invalid timezone: Mars/Olympus");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = AnalyzerError::InvalidInput("missing videos".to_string());
        assert_eq!(err.to_string(), "Invalid channel document: missing videos");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AnalyzerError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: AnalyzerError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }

    #[test]
    fn test_data_condition_display() {
        assert_eq!(DataCondition::EmptyDataset.to_string(), "Dataset is empty");
        let msg = DataCondition::InsufficientDateData { known_dates: 1 }.to_string();
        assert!(msg.contains("1 known upload date"));
    }

    #[test]
    fn test_normalize_error_display() {
        let err = NormalizeError::UnparsableNumeric("views".to_string());
        assert_eq!(err.to_string(), "Unparsable numeric value: \"views\"");
    }
}
