//! Lenient cell parsers for the exported CSV tables.
//!
//! The exports write missing floats as empty cells, booleans as `True` /
//! `False`, and occasionally integer codes as floats (`6.0`). These helpers
//! accept all of those shapes and are wired into the row types via
//! `#[serde(deserialize_with = "...")]`.

use serde::{Deserialize as _, Deserializer, de::Error as _};

/// Parses a float cell. Empty cells and `NaN` become [`f64::NAN`].
///
/// # Errors
///
/// Returns a message if the cell is neither empty nor a number.
pub fn parse_f64(raw: &str) -> Result<f64, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    trimmed
        .parse::<f64>()
        .map_err(|e| format!("invalid number '{trimmed}': {e}"))
}

/// Parses a FIPS code cell (`"6"`, `"06"` or `"6.0"`).
///
/// # Errors
///
/// Returns a message if the cell is not a non-negative whole number.
pub fn parse_code(raw: &str) -> Result<u32, String> {
    let trimmed = raw.trim();
    if let Ok(code) = trimmed.parse::<u32>() {
        return Ok(code);
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|e| format!("invalid code '{trimmed}': {e}"))?;
    if value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(format!("invalid code '{trimmed}'"));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(value as u32)
}

/// Parses a boolean cell (`True`, `false`, `1`, `0`, `yes`, `no`).
///
/// # Errors
///
/// Returns a message for any other value.
pub fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "1.0" | "yes" | "y" => Ok(true),
        "false" | "0" | "0.0" | "no" | "n" | "" => Ok(false),
        other => Err(format!("invalid boolean '{other}'")),
    }
}

/// Serde adapter for [`parse_f64`].
///
/// # Errors
///
/// Propagates the deserializer error or the parse failure.
pub fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_f64(&raw).map_err(D::Error::custom)
}

/// Serde adapter for optional float columns. Empty and `NaN` cells become
/// `None`.
///
/// # Errors
///
/// Propagates the deserializer error or the parse failure.
pub fn optional_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let value = parse_f64(&raw).map_err(D::Error::custom)?;
    Ok(if value.is_nan() { None } else { Some(value) })
}

/// Serde adapter for [`parse_code`].
///
/// # Errors
///
/// Propagates the deserializer error or the parse failure.
pub fn code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_code(&raw).map_err(D::Error::custom)
}

/// Serde adapter for [`parse_flag`].
///
/// # Errors
///
/// Propagates the deserializer error or the parse failure.
pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).map_err(D::Error::custom)
}

/// Serde adapter for year cells, which may arrive as `2019` or `2019.0`.
///
/// # Errors
///
/// Propagates the deserializer error or the parse failure.
pub fn year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let code = parse_code(&raw).map_err(D::Error::custom)?;
    i32::try_from(code).map_err(D::Error::custom)
}
