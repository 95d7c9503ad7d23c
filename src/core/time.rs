//! Duration parsing and formatting for configuration values
//!
//! Accepts `"500ms"`, `"5s"`, `"2m"`, `"1h"`, a fractional form such as
//! `"1.5s"`, or a bare number which is read as seconds.

use std::time::Duration;

/// Parse a human-written duration
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("Duration cannot be empty".to_string());
    }

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let amount: f64 = number
        .parse()
        .map_err(|_| format!("'{}' is not a valid duration", value))?;

    let seconds = match unit.trim() {
        "ms" => amount / 1000.0,
        "" | "s" | "sec" | "secs" => amount,
        "m" | "min" | "mins" => amount * 60.0,
        "h" | "hr" | "hrs" => amount * 3600.0,
        other => {
            return Err(format!(
                "Unknown duration unit '{}' in '{}' (use ms, s, m or h)",
                other, value
            ))
        }
    };

    if !seconds.is_finite() {
        return Err(format!("'{}' is not a valid duration", value));
    }
    Ok(Duration::from_secs_f64(seconds))
}

/// Format a duration the way [`parse_duration`] reads it back
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis % 3_600_000 == 0 && millis > 0 {
        format!("{}h", millis / 3_600_000)
    } else if millis % 60_000 == 0 && millis > 0 {
        format!("{}m", millis / 60_000)
    } else if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{}ms", millis)
    }
}

/// serde adapter for duration fields in TOML configuration
///
/// Accepts either a duration string or an integer number of seconds.
pub mod serde_duration {
    use super::{format_duration, parse_duration};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Seconds(u64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
            Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        }
    }

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*duration))
    }
}
