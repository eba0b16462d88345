//! Parsers for the values wizard steps actually ask for.
//!
//! Each `*_validator` helper returns a closure shaped for
//! [`RetryPrompt::ask`](crate::collect::RetryPrompt::ask): `Ok` carries the
//! typed value, `Err` carries the short "expected" description shown in the
//! invalid-input notice.

use std::ops::RangeInclusive;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

/// Extract a snowflake id from a raw mention or bare digits.
///
/// Accepts user mentions (`<@123>`, `<@!123>`), role mentions (`<@&123>`),
/// channel mentions (`<#123>`), and plain `123`.
pub fn mention_or_id(raw: &str) -> Option<u64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(?:<@[!&]?(\d{1,20})>|<#(\d{1,20})>|(\d{1,20}))$").expect("static regex")
    });
    let caps = re.captures(raw.trim())?;
    let digits = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))?;
    digits.as_str().parse().ok()
}

/// Parse an integer and require it to fall within `range`.
pub fn int_in_range(raw: &str, range: &RangeInclusive<i64>) -> Option<i64> {
    let value: i64 = raw.trim().parse().ok()?;
    range.contains(&value).then_some(value)
}

/// Parse a compact duration string such as `90s`, `10m`, `1h30m`, `2d`.
///
/// Unit order is free but each unit may appear at most once; the whole
/// input must be consumed.
pub fn duration(raw: &str) -> Option<Duration> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(\d{1,9})([dhms])").expect("static regex"));

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut seen = [false; 4];
    let mut total = Duration::ZERO;
    let mut consumed = 0;
    for caps in re.captures_iter(trimmed) {
        let whole = caps.get(0)?;
        if whole.start() != consumed {
            return None;
        }
        consumed = whole.end();

        let amount: u64 = caps[1].parse().ok()?;
        let (slot, secs_per_unit) = match &caps[2] {
            "d" => (0, 86_400),
            "h" => (1, 3_600),
            "m" => (2, 60),
            _ => (3, 1),
        };
        if seen[slot] {
            return None;
        }
        seen[slot] = true;
        total += Duration::from_secs(amount.checked_mul(secs_per_unit)?);
    }
    (consumed == trimmed.len()).then_some(total)
}

/// Validator closure: role/user/channel mention or bare snowflake.
pub fn mention_validator() -> impl FnMut(&str) -> Result<u64, String> {
    |raw| mention_or_id(raw).ok_or_else(|| "mention or id".to_string())
}

/// Validator closure: integer within `range`.
pub fn int_validator(range: RangeInclusive<i64>) -> impl FnMut(&str) -> Result<i64, String> {
    move |raw| {
        int_in_range(raw, &range)
            .ok_or_else(|| format!("integer between {} and {}", range.start(), range.end()))
    }
}

/// Validator closure: duration string (`1h30m` forms).
pub fn duration_validator() -> impl FnMut(&str) -> Result<Duration, String> {
    |raw| duration(raw).ok_or_else(|| "duration like 1h30m".to_string())
}
