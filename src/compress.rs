//! Sensor payload compression and size-cost estimation.
//!
//! Sensor readings tend to be verbose: high-precision floats and nested
//! structures burn context budget without adding decision value. This module
//! provides a pure, idempotent compression pass applied before entry
//! construction, and the length-based size-cost estimator used for every
//! payload.
//!
//! Size costs are a serialized-length proxy, not a tokenizer output. They are
//! deterministic and cheap, which is what the budget accounting needs; they
//! are never token-exact.

use serde_json::{Map, Number, Value};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::CompressionError;

/// Scale factor for two-decimal rounding of float readings.
const FLOAT_ROUND_SCALE: f64 = 100.0;

/// Decimal places kept when collapsing coordinates.
const COORD_FORMAT_DECIMALS: usize = 4;

/// Maximum length (in grapheme clusters) of a truncated nested structure.
pub const NESTED_TRUNCATE_LEN: usize = 50;

/// Compresses a map of sensor readings.
///
/// Rules, applied per field:
/// - floats are rounded to two decimal places;
/// - nested objects with a latitude/longitude shape are collapsed to a
///   compact `"lat,lon"` string;
/// - other nested objects are serialized and truncated to
///   [`NESTED_TRUNCATE_LEN`] grapheme clusters;
/// - everything else passes through unchanged.
///
/// The transform is idempotent: compressing already-compressed readings
/// yields an identical map.
///
/// # Errors
///
/// Returns [`CompressionError::NonFiniteNumber`] if a rounded value cannot be
/// represented as a JSON number. Callers fall back to a truncated string
/// form of the payload rather than failing the insertion.
pub fn compress_readings(
    readings: &Map<String, Value>,
) -> Result<Map<String, Value>, CompressionError> {
    let mut compressed = Map::with_capacity(readings.len());

    for (key, value) in readings {
        let slimmed = match value {
            Value::Number(n) if n.as_i64().is_none() && n.as_u64().is_none() => {
                let rounded = round_reading(n.as_f64().unwrap_or(0.0));
                let number = Number::from_f64(rounded).ok_or_else(|| {
                    CompressionError::NonFiniteNumber { field: key.clone() }
                })?;
                Value::Number(number)
            }
            Value::Object(obj) => collapse_coordinates(obj).map_or_else(
                || Value::String(truncate_graphemes(&Value::Object(obj.clone()).to_string(), NESTED_TRUNCATE_LEN)),
                Value::String,
            ),
            other => other.clone(),
        };
        compressed.insert(key.clone(), slimmed);
    }

    Ok(compressed)
}

/// Estimates the token cost of a payload value.
///
/// The estimate is `serialized length / chars_per_token`, a deterministic
/// approximation (roughly four characters per token for English-like text).
///
/// # Errors
///
/// Returns [`CompressionError::Serialization`] if the value cannot be
/// serialized.
pub fn estimate_size_cost(
    value: &Value,
    chars_per_token: usize,
) -> Result<usize, CompressionError> {
    let serialized = serde_json::to_string(value)?;
    Ok(serialized.len() / chars_per_token.max(1))
}

/// Truncates a string to at most `max` grapheme clusters.
///
/// Grapheme-aware so multi-byte readings (callsigns, place names) are never
/// split mid-character.
#[must_use]
pub fn truncate_graphemes(s: &str, max: usize) -> String {
    match s.grapheme_indices(true).nth(max) {
        Some((offset, _)) => s[..offset].to_string(),
        None => s.to_string(),
    }
}

/// Rounds a float reading to two decimal places.
fn round_reading(value: f64) -> f64 {
    (value * FLOAT_ROUND_SCALE).round() / FLOAT_ROUND_SCALE
}

/// Collapses an object with a recognizable latitude/longitude shape into a
/// compact `"lat,lon"` string. Returns `None` for other shapes.
fn collapse_coordinates(obj: &Map<String, Value>) -> Option<String> {
    let lat = coordinate_field(obj, "lat", "latitude")?;
    let lon = coordinate_field(obj, "lon", "longitude")?;
    Some(format!(
        "{lat:.prec$},{lon:.prec$}",
        prec = COORD_FORMAT_DECIMALS
    ))
}

/// Reads a numeric coordinate under either the short or the long key name.
fn coordinate_field(obj: &Map<String, Value>, short: &str, long: &str) -> Option<f64> {
    obj.get(short)
        .or_else(|| obj.get(long))
        .and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn readings(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_floats_rounded_to_two_decimals() {
        let input = readings(&[("altitude", json!(103.4567))]);
        let out = compress_readings(&input).unwrap();
        assert_eq!(out["altitude"], json!(103.46));
    }

    #[test]
    fn test_integers_pass_through() {
        let input = readings(&[("battery", json!(75))]);
        let out = compress_readings(&input).unwrap();
        assert_eq!(out["battery"], json!(75));
    }

    #[test]
    fn test_coordinates_collapsed() {
        let input = readings(&[("gps", json!({"lat": 50.123456, "lon": 24.456789}))]);
        let out = compress_readings(&input).unwrap();
        assert_eq!(out["gps"], json!("50.1235,24.4568"));
    }

    #[test]
    fn test_long_key_coordinates_collapsed() {
        let input = readings(&[("gps", json!({"latitude": 50.1, "longitude": 24.4}))]);
        let out = compress_readings(&input).unwrap();
        assert_eq!(out["gps"], json!("50.1000,24.4000"));
    }

    #[test]
    fn test_other_nested_objects_truncated() {
        let nested: Value = json!({"a": "x".repeat(200)});
        let input = readings(&[("blob", nested)]);
        let out = compress_readings(&input).unwrap();

        let s = out["blob"].as_str().unwrap();
        assert!(s.graphemes(true).count() <= NESTED_TRUNCATE_LEN);
    }

    #[test]
    fn test_strings_and_bools_pass_through() {
        let input = readings(&[("mode", json!("loiter")), ("armed", json!(true))]);
        let out = compress_readings(&input).unwrap();
        assert_eq!(out["mode"], json!("loiter"));
        assert_eq!(out["armed"], json!(true));
    }

    #[test]
    fn test_compression_idempotent() {
        let input = readings(&[
            ("gps", json!({"lat": 50.123456, "lon": 24.456789})),
            ("altitude", json!(103.4567)),
            ("battery", json!(75)),
            ("nested", json!({"weather": {"wind": 12.3456}})),
        ]);

        let once = compress_readings(&input).unwrap();
        let twice = compress_readings(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_truncate_graphemes_multibyte() {
        let s = "héllo wörld";
        let t = truncate_graphemes(s, 6);
        assert_eq!(t, "héllo ");

        // Shorter than the limit passes through whole.
        assert_eq!(truncate_graphemes("abc", 50), "abc");
    }

    #[test]
    fn test_estimate_size_cost() {
        let value = json!("abcdefgh");
        // Serialized as "\"abcdefgh\"" (10 chars) at 4 chars/token.
        assert_eq!(estimate_size_cost(&value, 4).unwrap(), 2);

        // Divisor is guarded against zero.
        assert_eq!(estimate_size_cost(&value, 0).unwrap(), 10);
    }

    #[test]
    fn test_estimate_deterministic() {
        let value = json!({"gps": "50.1235,24.4568", "battery": 75});
        let a = estimate_size_cost(&value, 4).unwrap();
        let b = estimate_size_cost(&value, 4).unwrap();
        assert_eq!(a, b);
    }
}
