//! World-image projection and bounding boxes.
//!
//! The basemap is a fixed equirectangular world image; longitude maps
//! linearly to x and latitude to y, so the conversions stay exact and
//! cheap. Image dimensions are 2:1 to keep degrees square.

use crate::feature::Feature;
use crate::fields;

// Basemap image dimensions in pixels
pub const MAP_WIDTH_PX: f64 = 2048.0;
pub const MAP_HEIGHT_PX: f64 = 1024.0;

/// Sentinel region name meaning "fit to every loaded feature".
pub const REGION_ALL: &str = "all";

/// Project decimal degrees onto basemap image pixels.
pub fn lat_lon_to_px(lat: f64, lon: f64) -> (f64, f64) {
    (
        (lon + 180.0) / 360.0 * MAP_WIDTH_PX,
        (90.0 - lat) / 180.0 * MAP_HEIGHT_PX,
    )
}

/// Inverse of [`lat_lon_to_px`].
pub fn px_to_lat_lon(x: f64, y: f64) -> (f64, f64) {
    (
        90.0 - y / MAP_HEIGHT_PX * 180.0,
        x / MAP_WIDTH_PX * 360.0 - 180.0,
    )
}

/// Geographic bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub fn of_point(lon: f64, lat: f64) -> Self {
        Bounds {
            min_lon: lon,
            min_lat: lat,
            max_lon: lon,
            max_lat: lat,
        }
    }

    pub fn extend(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lon = self.max_lon.max(lon);
        self.max_lat = self.max_lat.max(lat);
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Bounding box of a feature collection; `None` when empty.
    pub fn from_features<'a>(features: impl IntoIterator<Item = &'a Feature>) -> Option<Self> {
        let mut iter = features.into_iter();
        let first = iter.next()?;
        let mut bounds = Bounds::of_point(first.lon, first.lat);
        for f in iter {
            bounds.extend(f.lon, f.lat);
        }
        Some(bounds)
    }
}

/// Bounding box for a named region, or for everything when the region
/// is the case-insensitive sentinel `"all"`. Region names themselves
/// match exactly.
pub fn bounds_for_region(features: &[Feature], region: &str) -> Option<Bounds> {
    if region.eq_ignore_ascii_case(REGION_ALL) {
        return Bounds::from_features(features);
    }
    Bounds::from_features(
        features
            .iter()
            .filter(|f| f.property_str(fields::REGION) == Some(region)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(lat: f64, lon: f64, region: &str) -> Feature {
        Feature {
            lon,
            lat,
            roles: vec![],
            properties: json!({ fields::REGION: region })
                .as_object()
                .unwrap()
                .clone(),
        }
    }

    #[test]
    fn test_projection_corners() {
        assert_eq!(lat_lon_to_px(90.0, -180.0), (0.0, 0.0));
        assert_eq!(lat_lon_to_px(-90.0, 180.0), (MAP_WIDTH_PX, MAP_HEIGHT_PX));
    }

    #[test]
    fn test_projection_equator_meridian() {
        let (x, y) = lat_lon_to_px(0.0, 0.0);
        assert!((x - MAP_WIDTH_PX / 2.0).abs() < 1e-9);
        assert!((y - MAP_HEIGHT_PX / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_projection_roundtrip() {
        let (x, y) = lat_lon_to_px(37.76, -122.39);
        let (lat, lon) = px_to_lat_lon(x, y);
        assert!((lat - 37.76).abs() < 1e-9);
        assert!((lon + 122.39).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_extend() {
        let mut b = Bounds::of_point(10.0, 20.0);
        b.extend(-5.0, 45.0);
        b.extend(12.0, -3.0);
        assert_eq!(b.min_lon, -5.0);
        assert_eq!(b.max_lon, 12.0);
        assert_eq!(b.min_lat, -3.0);
        assert_eq!(b.max_lat, 45.0);
    }

    #[test]
    fn test_bounds_from_empty_is_none() {
        assert!(Bounds::from_features([]).is_none());
    }

    #[test]
    fn test_bounds_center() {
        let mut b = Bounds::of_point(0.0, 0.0);
        b.extend(10.0, 20.0);
        assert_eq!(b.center(), (5.0, 10.0));
    }

    #[test]
    fn test_region_all_is_case_insensitive() {
        let features = vec![feature(1.0, 1.0, "North"), feature(5.0, 5.0, "South")];
        let all = bounds_for_region(&features, "ALL").unwrap();
        assert_eq!(all.max_lat, 5.0);
        assert_eq!(all.min_lat, 1.0);
    }

    #[test]
    fn test_region_filters_by_name() {
        let features = vec![
            feature(1.0, 1.0, "North"),
            feature(5.0, 5.0, "South"),
            feature(3.0, -7.0, "North"),
        ];
        let north = bounds_for_region(&features, "North").unwrap();
        assert_eq!(north.min_lon, -7.0);
        assert_eq!(north.max_lat, 3.0);
    }

    #[test]
    fn test_unknown_region_is_none() {
        let features = vec![feature(1.0, 1.0, "North")];
        assert!(bounds_for_region(&features, "Atlantis").is_none());
    }
}
