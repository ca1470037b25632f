//! Coordinate and role normalization for raw entity records.
//!
//! Source coordinates are hand-entered and arrive in several shapes:
//! plain decimal degrees, decimal degrees with a comma separator
//! (`"45,5"`), or degrees/minutes/seconds with a hemisphere letter
//! (`"40°26'46\"N"`). Everything is repaired into decimal degrees;
//! values that cannot be repaired reject the whole record.

use serde_json::Value;

use crate::fields;

/// Parse a raw coordinate string into finite decimal degrees.
///
/// Returns `None` for blank input and for anything that fails to parse
/// after comma and DMS repair.
pub fn normalize_coordinate(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let value = trimmed.replace(',', ".");
    let degrees = if value.chars().any(|c| c.is_ascii_alphabetic()) {
        parse_dms(&value)?
    } else {
        value.parse::<f64>().ok()?
    };

    degrees.is_finite().then_some(degrees)
}

/// Parse a degrees/minutes/seconds coordinate with a trailing
/// hemisphere letter, e.g. `40°26'46"N`.
///
/// Tokens are split on runs of anything that is neither alphanumeric
/// nor `.`, so the exact punctuation between components doesn't matter.
/// `S` and `W` negate the result.
fn parse_dms(input: &str) -> Option<f64> {
    let mut parts = input
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '.')
        .filter(|s| !s.is_empty());

    let degrees: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    let direction = parts.next()?;

    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    match direction {
        "S" | "W" => Some(-decimal),
        _ => Some(decimal),
    }
}

/// Normalize a role field into a list of non-blank labels.
///
/// The field is an array of labels in current exports, but older rows
/// carry a single string; blanks and non-strings are dropped rather
/// than treated as a role.
pub fn normalize_roles(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Resolve a record's color reference: the first element of the color
/// array, or the fallback color when the field is empty or absent.
pub fn record_color(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_array)
        .and_then(|colors| colors.first())
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| fields::FALLBACK_COLOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_decimal() {
        assert_eq!(normalize_coordinate("37.7649"), Some(37.7649));
        assert_eq!(normalize_coordinate("-122.3998"), Some(-122.3998));
    }

    #[test]
    fn test_comma_decimal() {
        assert_eq!(normalize_coordinate("45,5"), Some(45.5));
        assert_eq!(normalize_coordinate("-0,25"), Some(-0.25));
    }

    #[test]
    fn test_blank_rejected() {
        assert_eq!(normalize_coordinate(""), None);
        assert_eq!(normalize_coordinate("   "), None);
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(normalize_coordinate("not a number"), None);
        assert_eq!(normalize_coordinate("12.3.4"), None);
    }

    #[test]
    fn test_non_finite_rejected() {
        assert_eq!(normalize_coordinate("NaN"), None);
        assert_eq!(normalize_coordinate("inf"), None);
    }

    #[test]
    fn test_dms_north_positive() {
        let dd = normalize_coordinate("40°26'46\"N").unwrap();
        assert!((dd - 40.446_111).abs() < 1e-4);
    }

    #[test]
    fn test_dms_south_negative() {
        let dd = normalize_coordinate("37°46'30\"S").unwrap();
        assert!(dd < 0.0);
        assert!((dd + 37.775).abs() < 1e-4);
    }

    #[test]
    fn test_dms_east_west() {
        let east = normalize_coordinate("122°23'55\"E").unwrap();
        let west = normalize_coordinate("122°23'55\"W").unwrap();
        assert!(east > 0.0);
        assert!((east + west).abs() < 1e-9);
    }

    #[test]
    fn test_dms_missing_direction_tokens_rejected() {
        assert_eq!(normalize_coordinate("40°26'N"), None);
    }

    #[test]
    fn test_dms_fractional_seconds() {
        // 30.6 seconds must not be truncated to 30
        let dd = normalize_coordinate("10°0'30.6\"N").unwrap();
        assert!((dd - (10.0 + 30.6 / 3600.0)).abs() < 1e-9);
    }

    #[test]
    fn test_roles_from_array() {
        let value = json!(["Funder", " Research ", ""]);
        assert_eq!(normalize_roles(Some(&value)), vec!["Funder", "Research"]);
    }

    #[test]
    fn test_roles_from_scalar_string() {
        let value = json!("Manufacturer");
        assert_eq!(normalize_roles(Some(&value)), vec!["Manufacturer"]);
    }

    #[test]
    fn test_roles_blank_and_absent() {
        assert!(normalize_roles(Some(&json!(""))).is_empty());
        assert!(normalize_roles(Some(&json!(null))).is_empty());
        assert!(normalize_roles(None).is_empty());
    }

    #[test]
    fn test_roles_non_string_entries_dropped() {
        let value = json!(["Funder", 42, null]);
        assert_eq!(normalize_roles(Some(&value)), vec!["Funder"]);
    }

    #[test]
    fn test_record_color_first_element() {
        let value = json!(["#a1b2c3", "#ffffff"]);
        assert_eq!(record_color(Some(&value)), "#a1b2c3");
    }

    #[test]
    fn test_record_color_fallback() {
        assert_eq!(record_color(None), "#333");
        assert_eq!(record_color(Some(&json!([]))), "#333");
        assert_eq!(record_color(Some(&json!("#fff"))), "#333");
    }
}
