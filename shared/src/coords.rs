use std::fmt;

use serde::{Deserialize, Serialize};

/// WGS84 coordinate in longitude/latitude order, as MapLibre and GeoJSON use it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    pub fn key(&self) -> CoordKey {
        CoordKey(format!("{},{}", self.lng, self.lat))
    }
}

impl From<LngLat> for geo::Point<f64> {
    fn from(value: LngLat) -> Self {
        geo::Point::new(value.lng, value.lat)
    }
}

impl fmt::Display for LngLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lng, self.lat)
    }
}

/// `"lng,lat"` string used to recognise repeated route requests for the same target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoordKey(String);

impl CoordKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
