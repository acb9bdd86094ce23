//! Parsing of `interval` query values such as `90s`, `10m`, `1h30m` or
//! `1.5h`.

use chrono::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseDurationError {
    #[error("empty duration")]
    Empty,
    #[error("invalid duration {0:?}")]
    Invalid(String),
    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },
    #[error("duration {0:?} out of range")]
    OutOfRange(String),
}

fn unit_nanos(unit: &str) -> Option<f64> {
    Some(match unit {
        "ns" => 1.0,
        "us" | "µs" => 1e3,
        "ms" => 1e6,
        "s" => 1e9,
        "m" => 60e9,
        "h" => 3600e9,
        _ => return None,
    })
}

/// Parse a sequence of decimal numbers, each with a unit (`ns`, `us`, `ms`,
/// `s`, `m`, `h`). `"0"` is accepted without a unit. Negative durations are
/// rejected.
pub fn parse_duration(input: &str) -> Result<Duration, ParseDurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ParseDurationError::Empty);
    }
    if s == "0" {
        return Ok(Duration::zero());
    }
    let invalid = || ParseDurationError::Invalid(input.to_string());

    let mut total_nanos = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        if unit_len == 0 {
            return Err(invalid());
        }
        let unit = &rest[..unit_len];
        let scale = unit_nanos(unit).ok_or_else(|| ParseDurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;
        rest = &rest[unit_len..];

        total_nanos += value * scale;
    }

    if !total_nanos.is_finite() || total_nanos > i64::MAX as f64 {
        return Err(ParseDurationError::OutOfRange(input.to_string()));
    }
    Ok(Duration::nanoseconds(total_nanos.round() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_units() {
        assert_eq!(parse_duration("90s"), Ok(Duration::seconds(90)));
        assert_eq!(parse_duration("10m"), Ok(Duration::minutes(10)));
        assert_eq!(parse_duration("2h"), Ok(Duration::hours(2)));
        assert_eq!(parse_duration("500ms"), Ok(Duration::milliseconds(500)));
        assert_eq!(parse_duration("0"), Ok(Duration::zero()));
    }

    #[test]
    fn test_parse_compound_and_fractional() {
        assert_eq!(parse_duration("1h30m"), Ok(Duration::minutes(90)));
        assert_eq!(parse_duration("1.5h"), Ok(Duration::minutes(90)));
        assert_eq!(parse_duration(" 3s "), Ok(Duration::seconds(3)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_duration(""), Err(ParseDurationError::Empty));
        assert!(matches!(parse_duration("10"), Err(ParseDurationError::Invalid(_))));
        assert!(matches!(parse_duration("-1s"), Err(ParseDurationError::Invalid(_))));
        assert!(matches!(parse_duration("h"), Err(ParseDurationError::Invalid(_))));
        assert!(matches!(
            parse_duration("3d"),
            Err(ParseDurationError::UnknownUnit { .. })
        ));
        assert!(matches!(
            parse_duration("99999999999999999h"),
            Err(ParseDurationError::OutOfRange(_))
        ));
    }
}
