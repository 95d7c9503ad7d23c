//! Validation utilities for configuration values and CLI arguments

/// Validate positive integer value
pub fn validate_positive_int(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err("Value must be greater than 0".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is not a valid positive integer", value)),
    }
}

/// Validate a bare queue name (without any `+`/`-` direction prefix)
pub fn validate_queue_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Queue name cannot be empty".to_string());
    }

    if let Some(bad) = name.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(format!(
            "Queue name '{}' contains an invalid character {:?}",
            name, bad
        ));
    }

    Ok(())
}

/// Split repeatable, comma-separated argument values into trimmed items
///
/// Empty items are kept so that a stray `,` surfaces as an invalid name
/// rather than being silently ignored.
pub fn split_comma_separated(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| value.split(','))
        .map(|item| item.trim().to_string())
        .collect()
}
