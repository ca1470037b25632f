//! Turning raw records into renderable point features.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields;
use crate::normalize;

/// A raw entity record: field name → string/array value, as delivered
/// by the data source.
pub type Record = serde_json::Map<String, Value>;

/// One renderable point derived from a record.
///
/// Exists only if both coordinates parsed to finite decimal degrees.
/// Geometry is longitude-first, matching point-geometry convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub lon: f64,
    pub lat: f64,
    /// Normalized role labels, primary then secondary, deduplicated.
    pub roles: Vec<String>,
    pub properties: Record,
}

impl Feature {
    /// Marker fill color from the record's color reference.
    pub fn color(&self) -> String {
        normalize::record_color(self.properties.get(fields::COLOR))
    }

    pub fn property_str(&self, field: &str) -> Option<&str> {
        self.properties.get(field).and_then(Value::as_str)
    }
}

/// Read a field as text, accepting both JSON strings and numbers
/// (some exports serialize coordinates as numbers).
fn field_text(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Build a feature from a single record, or reject it when either
/// coordinate is missing or unparseable.
pub fn build_feature(record: &Record) -> Option<Feature> {
    let lat = normalize_field(record, fields::LAT)?;
    let lon = normalize_field(record, fields::LON)?;

    let mut roles = normalize::normalize_roles(record.get(fields::PRIMARY_ROLE));
    for role in normalize::normalize_roles(record.get(fields::SECONDARY_ROLE)) {
        if !roles.contains(&role) {
            roles.push(role);
        }
    }

    Some(Feature {
        lon,
        lat,
        roles,
        properties: record.clone(),
    })
}

fn normalize_field(record: &Record, field: &str) -> Option<f64> {
    normalize::normalize_coordinate(&field_text(record, field)?)
}

/// Build features for a whole batch. Rejected records are logged with
/// their row index and skipped; one bad row never aborts the batch.
pub fn build_features(records: &[Record]) -> Vec<Feature> {
    let mut features = Vec::with_capacity(records.len());
    for (row, record) in records.iter().enumerate() {
        match build_feature(record) {
            Some(feature) => features.push(feature),
            None => {
                tracing::debug!(
                    row,
                    entity = field_text(record, fields::ENTITY).as_deref(),
                    "skipping record with unparseable coordinates"
                );
            }
        }
    }
    tracing::debug!(
        received = records.len(),
        parsed = features.len(),
        "built features"
    );
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(lat: &str, lon: &str) -> Record {
        let value = json!({
            fields::LAT: lat,
            fields::LON: lon,
            fields::ENTITY: "Test Entity",
            fields::REGION: "Bay Area",
            fields::PRIMARY_ROLE: ["Funder"],
            fields::COLOR: ["#ff0000"],
        });
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_geometry_is_longitude_first() {
        let f = build_feature(&record("37.76", "-122.39")).unwrap();
        assert!((f.lon + 122.39).abs() < 1e-9);
        assert!((f.lat - 37.76).abs() < 1e-9);
    }

    #[test]
    fn test_missing_coordinate_rejects_record() {
        let mut r = record("37.76", "-122.39");
        r.remove(fields::LON);
        assert!(build_feature(&r).is_none());
    }

    #[test]
    fn test_blank_coordinate_rejects_record() {
        assert!(build_feature(&record("", "-122.39")).is_none());
        assert!(build_feature(&record("37.76", "  ")).is_none());
    }

    #[test]
    fn test_comma_decimal_coordinates_accepted() {
        let f = build_feature(&record("45,5", "9,19")).unwrap();
        assert!((f.lat - 45.5).abs() < 1e-9);
        assert!((f.lon - 9.19).abs() < 1e-9);
    }

    #[test]
    fn test_numeric_json_coordinates_accepted() {
        let mut r = record("0", "0");
        r.insert(fields::LAT.to_string(), json!(51.5));
        r.insert(fields::LON.to_string(), json!(-0.12));
        let f = build_feature(&r).unwrap();
        assert!((f.lat - 51.5).abs() < 1e-9);
    }

    #[test]
    fn test_roles_merge_primary_then_secondary() {
        let mut r = record("1.0", "2.0");
        r.insert(fields::PRIMARY_ROLE.to_string(), json!(["Funder", "Research"]));
        r.insert(fields::SECONDARY_ROLE.to_string(), json!(["Research", "Manufacturer"]));
        let f = build_feature(&r).unwrap();
        assert_eq!(f.roles, vec!["Funder", "Research", "Manufacturer"]);
    }

    #[test]
    fn test_empty_role_list_allowed() {
        let mut r = record("1.0", "2.0");
        r.remove(fields::PRIMARY_ROLE);
        let f = build_feature(&r).unwrap();
        assert!(f.roles.is_empty());
    }

    #[test]
    fn test_color_and_fallback() {
        let f = build_feature(&record("1.0", "2.0")).unwrap();
        assert_eq!(f.color(), "#ff0000");

        let mut r = record("1.0", "2.0");
        r.remove(fields::COLOR);
        let f = build_feature(&r).unwrap();
        assert_eq!(f.color(), "#333");
    }

    #[test]
    fn test_batch_skips_bad_rows_without_aborting() {
        let records = vec![
            record("37.76", "-122.39"),
            record("not a latitude", "-122.39"),
            record("40°26'46\"N", "79°58'56\"W"),
            record("", ""),
        ];
        let features = build_features(&records);
        assert_eq!(features.len(), 2);
        assert!((features[1].lat - 40.446_111).abs() < 1e-4);
        assert!(features[1].lon < 0.0);
    }
}
