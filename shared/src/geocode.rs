use serde::{Deserialize, Serialize};

use crate::coords::LngLat;

pub const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_COUNTRY_CODES: &str = "nl";

/// One Nominatim search hit. Coordinates arrive as decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    pub lon: String,
    pub lat: String,
}

impl GeocodeCandidate {
    pub fn location(&self) -> Option<LngLat> {
        let lng = self.lon.trim().parse::<f64>().ok()?;
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let location = LngLat::new(lng, lat);
        location.is_finite().then_some(location)
    }
}

/// Free-text search restricted to one country, asking for a single result.
pub fn search_params<'a>(query: &'a str, country_codes: &'a str) -> [(&'static str, &'a str); 4] {
    [
        ("q", query),
        ("format", "json"),
        ("limit", "1"),
        ("countrycodes", country_codes),
    ]
}

/// Only the first candidate counts; an unusable first hit is treated as no match.
pub fn first_match(candidates: &[GeocodeCandidate]) -> Option<LngLat> {
    candidates.first().and_then(GeocodeCandidate::location)
}
