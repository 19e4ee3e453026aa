//! Human-readable durations such as `100ms`, `1.5s` or `1h30m`.
//!
//! A duration is one or more `<number><unit>` groups. Numbers may carry a
//! decimal fraction; units are `ns`, `us` (`µs`), `ms`, `s`, `m` and `h`.
//! The total must be positive: a job interval of zero never ticks.

use std::time::Duration;

use thiserror::Error;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Fraction digits past this are below nanosecond resolution for every unit.
const MAX_FRACTION_DIGITS: usize = 18;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    #[error("duration {0:?} must be greater than zero")]
    NotPositive(String),

    #[error("duration {0:?} is out of range")]
    Overflow(String),
}

pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }
    if s.starts_with('-') {
        return Err(DurationError::NotPositive(input.to_string()));
    }
    let mut rest = s.strip_prefix('+').unwrap_or(s);
    if rest.is_empty() {
        return Err(DurationError::Invalid(input.to_string()));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_end);
        if number.is_empty() || number == "." {
            return Err(DurationError::Invalid(input.to_string()));
        }

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let group = group_nanos(number, scale, input)?;
        total = total
            .checked_add(group)
            .ok_or_else(|| DurationError::Overflow(input.to_string()))?;
        rest = tail;
    }

    if total == 0 {
        return Err(DurationError::NotPositive(input.to_string()));
    }
    let nanos = u64::try_from(total).map_err(|_| DurationError::Overflow(input.to_string()))?;
    Ok(Duration::from_nanos(nanos))
}

fn unit_nanos(unit: &str) -> Option<u128> {
    let scale = match unit {
        "ns" => 1,
        // U+00B5 micro sign and U+03BC greek mu are both in use.
        "us" | "µs" | "μs" => NANOS_PER_MICRO,
        "ms" => NANOS_PER_MILLI,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    };
    Some(scale)
}

/// Nanoseconds in one `<number><unit>` group. Sub-nanosecond remainders are
/// truncated.
fn group_nanos(number: &str, scale: u128, input: &str) -> Result<u128, DurationError> {
    let invalid = || DurationError::Invalid(input.to_string());
    let overflow = || DurationError::Overflow(input.to_string());

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if fraction.contains('.') {
        return Err(invalid());
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let mut nanos = whole.checked_mul(scale).ok_or_else(overflow)?;

    let digits = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
    if !digits.is_empty() {
        let value: u128 = digits.parse().map_err(|_| invalid())?;
        let denom = 10u128.pow(digits.len() as u32);
        nanos = nanos
            .checked_add(value * scale / denom)
            .ok_or_else(overflow)?;
    }
    Ok(nanos)
}
