use serde::{Deserialize, Deserializer, Serialize};

use crate::coords::LngLat;
use crate::travel::{DEFAULT_MINUTES, TravelMode, TravelParams};

pub const ISOCHRONE_PATH: &str = "/api/isochrone";
pub const POIS_PATH: &str = "/api/pois";
pub const DIRECTIONS_PATH: &str = "/api/directions";
pub const ANALYSIS_PATH: &str = "/api/analysis";

fn default_minutes() -> u32 {
    DEFAULT_MINUTES
}

/// Unknown profiles are treated as walking rather than rejected.
fn lenient_mode<'de, D>(deserializer: D) -> Result<TravelMode, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(TravelMode::from_profile_lossy)
        .unwrap_or_default())
}

/// Query string shared by `/api/isochrone`, `/api/pois` and `/api/analysis`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaQuery {
    pub lng: f64,
    pub lat: f64,
    #[serde(default = "default_minutes")]
    pub minutes: u32,
    #[serde(default, deserialize_with = "lenient_mode")]
    pub profile: TravelMode,
}

impl AreaQuery {
    pub fn new(center: LngLat, params: TravelParams) -> Self {
        Self {
            lng: center.lng,
            lat: center.lat,
            minutes: params.minutes,
            profile: params.mode,
        }
    }

    pub fn center(&self) -> LngLat {
        LngLat::new(self.lng, self.lat)
    }

    pub fn params(&self) -> TravelParams {
        TravelParams {
            mode: self.profile,
            minutes: self.minutes,
        }
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("lng", self.lng.to_string()),
            ("lat", self.lat.to_string()),
            ("minutes", self.minutes.to_string()),
            ("profile", self.profile.as_str().to_string()),
        ]
    }
}

/// Query string for `/api/directions`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionsQuery {
    pub start_lng: f64,
    pub start_lat: f64,
    pub end_lng: f64,
    pub end_lat: f64,
    #[serde(default, deserialize_with = "lenient_mode")]
    pub mode: TravelMode,
}

impl DirectionsQuery {
    pub fn new(start: LngLat, end: LngLat, mode: TravelMode) -> Self {
        Self {
            start_lng: start.lng,
            start_lat: start.lat,
            end_lng: end.lng,
            end_lat: end.lat,
            mode,
        }
    }

    pub fn start(&self) -> LngLat {
        LngLat::new(self.start_lng, self.start_lat)
    }

    pub fn end(&self) -> LngLat {
        LngLat::new(self.end_lng, self.end_lat)
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("start_lng", self.start_lng.to_string()),
            ("start_lat", self.start_lat.to_string()),
            ("end_lng", self.end_lng.to_string()),
            ("end_lat", self.end_lat.to_string()),
            ("mode", self.mode.as_str().to_string()),
        ]
    }
}

/// Combined payload of `/api/analysis`; both halves are upstream JSON passed through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub iso: serde_json::Value,
    pub pois: serde_json::Value,
}

/// Error body returned by every backend endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::{AreaQuery, DirectionsQuery};
    use crate::coords::LngLat;
    use crate::travel::{TravelMode, TravelParams};

    #[test]
    fn area_query_pairs_carry_center_and_params() {
        let query = AreaQuery::new(LngLat::new(4.9, 52.35), TravelParams::default());
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("lng", "4.9".to_string()),
                ("lat", "52.35".to_string()),
                ("minutes", "10".to_string()),
                ("profile", "walking".to_string()),
            ]
        );
    }

    #[test]
    fn area_query_defaults_minutes_and_profile() {
        let query: AreaQuery =
            serde_json::from_str(r#"{"lng": 4.9, "lat": 52.35}"#).expect("parse query");
        assert_eq!(query.minutes, 10);
        assert_eq!(query.profile, TravelMode::Walking);
    }

    #[test]
    fn unknown_profile_is_accepted_as_walking() {
        let query: AreaQuery = serde_json::from_str(
            r#"{"lng": 4.9, "lat": 52.35, "minutes": 15, "profile": "hovercraft"}"#,
        )
        .expect("parse query");
        assert_eq!(query.profile, TravelMode::Walking);
        assert_eq!(query.minutes, 15);
    }

    #[test]
    fn directions_query_pairs_use_backend_names() {
        let query = DirectionsQuery::new(
            LngLat::new(4.9, 52.35),
            LngLat::new(4.91, 52.36),
            TravelMode::Cycling,
        );
        let pairs = query.to_query_pairs();
        assert_eq!(pairs[0], ("start_lng", "4.9".to_string()));
        assert_eq!(pairs[3], ("end_lat", "52.36".to_string()));
        assert_eq!(pairs[4], ("mode", "cycling".to_string()));
        assert_eq!(query.end(), LngLat::new(4.91, 52.36));
    }
}
