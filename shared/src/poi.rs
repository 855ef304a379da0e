use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::coords::LngLat;

pub type PoiId = u64;
pub type Tags = HashMap<String, String>;

const UNNAMED: &str = "Unnamed";

/// A tagged OpenStreetMap node returned by `/api/pois`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: PoiId,
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub tags: Tags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoiKind {
    Shop,
    Gym,
}

impl PoiKind {
    pub const fn label(self) -> &'static str {
        match self {
            PoiKind::Shop => "\u{1F6D2} Shop",
            PoiKind::Gym => "\u{1F3CB}\u{FE0F} Gym",
        }
    }
}

impl Poi {
    pub fn location(&self) -> LngLat {
        LngLat::new(self.lon, self.lat)
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .map(String::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn name(&self) -> &str {
        self.tag("name").unwrap_or(UNNAMED)
    }

    /// Anything carrying a `shop` tag is a shop; the query only returns gyms otherwise.
    pub fn kind(&self) -> PoiKind {
        if self.tag("shop").is_some() {
            PoiKind::Shop
        } else {
            PoiKind::Gym
        }
    }

    pub fn opening_hours(&self) -> Option<&str> {
        self.tag("opening_hours")
    }

    /// "Street 12, 1112XC Diemen" from the `addr:*` tags, if any are present.
    pub fn address_line(&self) -> Option<String> {
        let street = match (self.tag("addr:street"), self.tag("addr:housenumber")) {
            (Some(street), Some(number)) => Some(format!("{street} {number}")),
            (Some(street), None) => Some(street.to_string()),
            (None, _) => None,
        };
        let locality = match (self.tag("addr:postcode"), self.tag("addr:city")) {
            (Some(postcode), Some(city)) => Some(format!("{postcode} {city}")),
            (Some(postcode), None) => Some(postcode.to_string()),
            (None, Some(city)) => Some(city.to_string()),
            (None, None) => None,
        };
        match (street, locality) {
            (Some(street), Some(locality)) => Some(format!("{street}, {locality}")),
            (Some(line), None) | (None, Some(line)) => Some(line),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawElement {
    id: PoiId,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    tags: Tags,
}

/// Overpass-shaped payload: `{ "elements": [ {id, lon, lat, tags} ] }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoiResponse {
    #[serde(default)]
    elements: Vec<RawElement>,
}

impl PoiResponse {
    /// Elements without a coordinate (ways, relations) are dropped.
    pub fn into_pois(self) -> Vec<Poi> {
        self.elements
            .into_iter()
            .filter_map(|raw| {
                let (lon, lat) = (raw.lon?, raw.lat?);
                Some(Poi {
                    id: raw.id,
                    lon,
                    lat,
                    tags: raw.tags,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Poi, PoiKind, PoiResponse, Tags};

    fn poi_with(tags: &[(&str, &str)]) -> Poi {
        Poi {
            id: 1,
            lon: 4.9,
            lat: 52.35,
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Tags>(),
        }
    }

    #[test]
    fn classifies_shops_and_gyms() {
        assert_eq!(poi_with(&[("shop", "supermarket")]).kind(), PoiKind::Shop);
        assert_eq!(
            poi_with(&[("leisure", "fitness_centre")]).kind(),
            PoiKind::Gym
        );
        assert_eq!(poi_with(&[("amenity", "gym")]).kind(), PoiKind::Gym);
    }

    #[test]
    fn missing_or_blank_name_falls_back() {
        assert_eq!(poi_with(&[]).name(), "Unnamed");
        assert_eq!(poi_with(&[("name", "  ")]).name(), "Unnamed");
        assert_eq!(poi_with(&[("name", "Albert Heijn")]).name(), "Albert Heijn");
    }

    #[test]
    fn address_line_combines_available_parts() {
        let full = poi_with(&[
            ("addr:street", "Ouddiemerlaan"),
            ("addr:housenumber", "104"),
            ("addr:postcode", "1111HL"),
            ("addr:city", "Diemen"),
        ]);
        assert_eq!(
            full.address_line().as_deref(),
            Some("Ouddiemerlaan 104, 1111HL Diemen")
        );

        let city_only = poi_with(&[("addr:city", "Diemen")]);
        assert_eq!(city_only.address_line().as_deref(), Some("Diemen"));
        assert_eq!(poi_with(&[]).address_line(), None);
    }

    #[test]
    fn response_skips_elements_without_coordinates() {
        let payload = r#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 11, "lat": 52.35, "lon": 4.9, "tags": {"shop": "convenience"}},
                {"type": "way", "id": 12, "tags": {"leisure": "fitness_centre"}},
                {"type": "node", "id": 13, "lat": 52.36, "lon": 4.91}
            ]
        }"#;
        let pois = serde_json::from_str::<PoiResponse>(payload)
            .expect("overpass payload should parse")
            .into_pois();
        assert_eq!(pois.iter().map(|p| p.id).collect::<Vec<_>>(), vec![11, 13]);
        assert!(pois[1].tags.is_empty());
    }

    #[test]
    fn response_without_elements_is_empty() {
        let pois = serde_json::from_str::<PoiResponse>("{}")
            .expect("empty payload should parse")
            .into_pois();
        assert!(pois.is_empty());
    }
}
