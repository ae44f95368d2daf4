use std::time::Duration;

use crate::error::ConfigError;

/// Parse a duration string of concatenated `<number><unit>` segments,
/// e.g. `"10s"`, `"1m30s"`, `"1.5h"`, `"300ms"`.
///
/// Supported units: `ns`, `us`, `ms`, `s`, `m`, `h`.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let input = s.trim();
    if input.is_empty() {
        return Err(ConfigError::InvalidDuration(s.to_string()));
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .ok_or_else(|| ConfigError::InvalidDuration(s.to_string()))?;
        if num_end == 0 {
            return Err(ConfigError::InvalidDuration(s.to_string()));
        }
        let value: f64 = rest[..num_end]
            .parse()
            .map_err(|_| ConfigError::InvalidDuration(s.to_string()))?;
        rest = &rest[num_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let nanos_per_unit: f64 = match unit {
            "ns" => 1.0,
            "us" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => 1_000_000_000.0,
            "m" => 60.0 * 1_000_000_000.0,
            "h" => 3_600.0 * 1_000_000_000.0,
            _ => return Err(ConfigError::InvalidDuration(s.to_string())),
        };
        total += Duration::from_nanos((value * nanos_per_unit) as u64);
    }
    Ok(total)
}

/// Like [`parse_duration`] but treats an empty string as absent.
pub fn parse_optional_duration(s: &str) -> Result<Option<Duration>, ConfigError> {
    if s.trim().is_empty() {
        return Ok(None);
    }
    parse_duration(s).map(Some)
}
