use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{AnalyzerError, Result};

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly. Falls back to `"UTC"` if
/// detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Resolve a user-supplied timezone setting.
///
/// `"auto"` (any case) selects the system timezone, falling back to UTC when
/// the detected name is not in the tz database. Any other value must be a
/// valid IANA identifier.
pub fn resolve_timezone(name: &str) -> Result<Tz> {
    if name.eq_ignore_ascii_case("auto") {
        let detected = get_system_timezone();
        return Ok(detected.parse::<Tz>().unwrap_or_else(|_| {
            debug!("resolve_timezone: system timezone \"{detected}\" unknown, using UTC");
            Tz::UTC
        }));
    }
    name.parse::<Tz>()
        .map_err(|_| AnalyzerError::InvalidTimezone(name.to_string()))
}

/// Parse an RFC 3339 reference-time override into UTC.
///
/// A trailing `Z` is accepted as well as any fixed offset.
pub fn parse_reference_time(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AnalyzerError::InvalidReferenceTime(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_get_system_timezone_not_empty() {
        assert!(!get_system_timezone().is_empty());
    }

    #[test]
    fn test_resolve_timezone_explicit() {
        assert_eq!(resolve_timezone("Asia/Riyadh").unwrap(), Tz::Asia__Riyadh);
        assert_eq!(resolve_timezone("UTC").unwrap(), Tz::UTC);
    }

    #[test]
    fn test_resolve_timezone_auto_never_fails() {
        assert!(resolve_timezone("auto").is_ok());
        assert!(resolve_timezone("AUTO").is_ok());
    }

    #[test]
    fn test_resolve_timezone_invalid() {
        let err = resolve_timezone("Not/AZone").unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidTimezone(_)));
    }

    #[test]
    fn test_parse_reference_time_z_suffix() {
        let dt = parse_reference_time("2024-06-01T10:00:00Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_reference_time_offset() {
        let dt = parse_reference_time("2024-06-01T13:00:00+03:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_reference_time_invalid() {
        assert!(matches!(
            parse_reference_time("yesterday"),
            Err(AnalyzerError::InvalidReferenceTime(_))
        ));
    }
}
