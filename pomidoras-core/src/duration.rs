//! Parsing of the daemon's initial-duration argument.
//!
//! Two forms are accepted: a bare integer count of seconds (`90`) and a
//! unit-suffixed duration string made of one or more `<integer><unit>`
//! components with units `h`, `m`, `s` (`90s`, `5m`, `1h30m`).

use crate::error::DurationParseError;

/// Parse `input` into a whole number of seconds.
pub fn parse_duration_secs(input: &str) -> Result<u64, DurationParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DurationParseError::Empty);
    }
    if input.starts_with('-') {
        return Err(DurationParseError::Negative(input.to_string()));
    }

    if input.bytes().all(|b| b.is_ascii_digit()) {
        return input
            .parse::<u64>()
            .map_err(|_| DurationParseError::Overflow(input.to_string()));
    }

    let mut total: u64 = 0;
    let mut rest = input;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(DurationParseError::InvalidNumber(input.to_string()));
        }
        let value: u64 = rest[..digits_end]
            .parse()
            .map_err(|_| DurationParseError::Overflow(input.to_string()))?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        let factor = match unit {
            "" => return Err(DurationParseError::MissingUnit(input.to_string())),
            "h" => 3600,
            "m" => 60,
            "s" => 1,
            other => {
                return Err(DurationParseError::UnknownUnit {
                    unit: other.to_string(),
                    input: input.to_string(),
                })
            }
        };
        total = value
            .checked_mul(factor)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| DurationParseError::Overflow(input.to_string()))?;
        rest = &rest[unit_end..];
    }

    Ok(total)
}
