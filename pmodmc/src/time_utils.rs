//! Conversions between millisecond offsets and the UPnP `HH:MM:SS` form.
//!
//! AVTransport carries positions and durations as `H+:MM:SS[.F+]` strings
//! while callers work in milliseconds.

use crate::errors::ControlError;

/// Formats a millisecond offset as `HH:MM:SS`.
///
/// The sub-second part is truncated; hours are not wrapped.
///
/// # Examples
/// ```
/// # use pmodmc::time_utils::format_hhmmss_ms;
/// assert_eq!(format_hhmmss_ms(0), "00:00:00");
/// assert_eq!(format_hhmmss_ms(5_000), "00:00:05");
/// assert_eq!(format_hhmmss_ms(3_661_999), "01:01:01");
/// ```
pub fn format_hhmmss_ms(milliseconds: u64) -> String {
    let total_seconds = milliseconds / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Parses `HH:MM:SS` into milliseconds, returning 0 for anything unusable.
///
/// Renderers report `NOT_IMPLEMENTED`, empty strings or partial values
/// often enough that a lenient parse is the useful default for display.
/// A fractional second part is dropped.
pub fn parse_hhmmss_ms(input: &str) -> u64 {
    parse_components(input.trim()).unwrap_or(0)
}

/// Strict variant of [`parse_hhmmss_ms`].
///
/// # Errors
/// Fails if the input is not `H+:MM:SS[.F+]` or minutes/seconds are >= 60.
pub fn parse_hhmmss_strict(input: &str) -> Result<u64, ControlError> {
    let trimmed = input.trim();
    let millis = parse_components(trimmed).ok_or_else(|| {
        ControlError::InvalidTimeFormat(format!(
            "'{}': expected HH:MM:SS",
            input
        ))
    })?;

    let mut parts = trimmed.split(':').skip(1);
    let minutes: u64 = parts.next().and_then(|m| m.parse().ok()).unwrap_or(0);
    let seconds: u64 = parts
        .next()
        .and_then(|s| s.split('.').next())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    if minutes >= 60 || seconds >= 60 {
        return Err(ControlError::InvalidTimeFormat(format!(
            "'{}': minutes and seconds must be < 60",
            input
        )));
    }

    Ok(millis)
}

fn parse_components(input: &str) -> Option<u64> {
    let parts: Vec<&str> = input.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: u64 = parts[0].parse().ok()?;
    let minutes: u64 = parts[1].parse().ok()?;
    let seconds_part = parts[2].split('.').next()?;
    let seconds: u64 = seconds_part.parse().ok()?;

    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)?
        .checked_mul(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hhmmss_ms() {
        assert_eq!(format_hhmmss_ms(999), "00:00:00");
        assert_eq!(format_hhmmss_ms(60_000), "00:01:00");
        assert_eq!(format_hhmmss_ms(3_600_000), "01:00:00");
        assert_eq!(format_hhmmss_ms(86_399_000), "23:59:59");
        assert_eq!(format_hhmmss_ms(100 * 3_600_000), "100:00:00");
    }

    #[test]
    fn test_parse_hhmmss_ms() {
        assert_eq!(parse_hhmmss_ms("01:02:03"), 3_723_000);
        assert_eq!(parse_hhmmss_ms("0:00:05.500"), 5_000);
        assert_eq!(parse_hhmmss_ms(" 00:10:00 "), 600_000);

        // unusable values
        assert_eq!(parse_hhmmss_ms(""), 0);
        assert_eq!(parse_hhmmss_ms("02:03"), 0);
        assert_eq!(parse_hhmmss_ms("NOT_IMPLEMENTED"), 0);
        assert_eq!(parse_hhmmss_ms("aa:bb:cc"), 0);
        assert_eq!(parse_hhmmss_ms("99999999999999999:00:00"), 0);
    }

    #[test]
    fn test_parse_hhmmss_strict() {
        assert_eq!(parse_hhmmss_strict("01:02:03").unwrap(), 3_723_000);
        assert_eq!(parse_hhmmss_strict("10:00:00.25").unwrap(), 36_000_000);

        assert!(parse_hhmmss_strict("02:03").is_err());
        assert!(parse_hhmmss_strict("00:60:00").is_err());
        assert!(parse_hhmmss_strict("00:00:60").is_err());
        assert!(parse_hhmmss_strict("NOT_IMPLEMENTED").is_err());
        assert!(matches!(
            parse_hhmmss_strict("99999999999999999:00:00"),
            Err(ControlError::InvalidTimeFormat(_))
        ));
    }
}
