use tracing::debug;

use crate::error::NormalizeError;

/// Characters used as digit-group separators by the locales we scrape.
const GROUP_SEPARATORS: &[char] = &[',', '\u{066C}', '\''];

/// Map an ASCII, Arabic-Indic or Extended Arabic-Indic digit to its value.
pub fn decimal_digit(c: char) -> Option<u32> {
    match c {
        '0'..='9' => c.to_digit(10),
        '\u{0660}'..='\u{0669}' => Some(c as u32 - 0x0660),
        '\u{06F0}'..='\u{06F9}' => Some(c as u32 - 0x06F0),
        _ => None,
    }
}

/// Parse a run of decimal digits (any supported script) into an integer.
///
/// Returns `None` for an empty string, any non-digit character, or overflow.
pub fn parse_decimal(s: &str) -> Option<u64> {
    if s.is_empty() {
        return None;
    }
    s.chars().try_fold(0u64, |acc, c| {
        let d = decimal_digit(c)?;
        acc.checked_mul(10)?.checked_add(u64::from(d))
    })
}

// ── NumericExtractor ──────────────────────────────────────────────────────────

/// Turns locale-formatted count strings such as `"1,234 views"` into integers.
///
/// Only the first whitespace-delimited token is considered and only its digit
/// characters are kept, so magnitude suffixes are not understood: `"1.2M"`
/// yields `12` because both the decimal point and the `M` are discarded.
pub struct NumericExtractor;

impl NumericExtractor {
    /// Extract a count, falling back to `0` for anything unparsable.
    ///
    /// `None` stands for a raw value that was not text.
    pub fn extract(text: Option<&str>) -> u64 {
        match Self::try_extract(text) {
            Ok(n) => n,
            Err(err) => {
                debug!("NumericExtractor: {err}, using 0");
                0
            }
        }
    }

    /// Extract a count, reporting why it failed instead of falling back.
    pub fn try_extract(text: Option<&str>) -> Result<u64, NormalizeError> {
        let Some(text) = text else {
            return Err(NormalizeError::UnparsableNumeric("<non-text>".to_string()));
        };
        let fail = || NormalizeError::UnparsableNumeric(text.to_string());

        let token = text.split_whitespace().next().ok_or_else(fail)?;
        let digits: String = token
            .chars()
            .filter(|c| !GROUP_SEPARATORS.contains(c))
            .filter(|c| decimal_digit(*c).is_some())
            .collect();

        parse_decimal(&digits).ok_or_else(fail)
    }
}
