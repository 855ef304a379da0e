//! Reachable-area geometry and the point-in-polygon filter that narrows POIs to it.

use geo::{Intersects, MultiPolygon, Point, Polygon};
use geojson::{FeatureCollection, GeoJson};
use serde::{Deserialize, Serialize};

use crate::coords::LngLat;
use crate::poi::Poi;

#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("isochrone has no features")]
    Empty,
    #[error("isochrone feature has no geometry")]
    MissingGeometry,
    #[error("unsupported isochrone geometry type {0}")]
    Unsupported(&'static str),
    #[error(transparent)]
    Conversion(#[from] geojson::Error),
}

/// Isochrone payload as returned by `/api/isochrone`, kept verbatim so it can be
/// handed back to the map engine unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Isochrone(FeatureCollection);

impl Isochrone {
    pub fn is_empty(&self) -> bool {
        self.0.features.is_empty()
    }

    /// The area covered by the first feature; with a single time range there is only one.
    pub fn area(&self) -> Result<ReachableArea, GeometryError> {
        let feature = self.0.features.first().ok_or(GeometryError::Empty)?;
        let geometry = feature
            .geometry
            .clone()
            .ok_or(GeometryError::MissingGeometry)?;
        let geometry = geo::Geometry::<f64>::try_from(GeoJson::from(geometry))?;
        ReachableArea::try_from(geometry)
    }

    /// Keeps the POIs whose coordinate lies inside the area, boundary included.
    pub fn filter_within(&self, pois: &[Poi]) -> Result<Vec<Poi>, GeometryError> {
        if self.is_empty() || pois.is_empty() {
            return Ok(Vec::new());
        }
        let area = self.area()?;
        Ok(pois
            .iter()
            .filter(|poi| area.contains(poi.location()))
            .cloned()
            .collect())
    }
}

/// Polygonal isochrone geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum ReachableArea {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl ReachableArea {
    pub fn contains(&self, location: LngLat) -> bool {
        if !location.is_finite() {
            return false;
        }
        let point = Point::from(location);
        match self {
            ReachableArea::Polygon(polygon) => point.intersects(polygon),
            ReachableArea::MultiPolygon(polygons) => point.intersects(polygons),
        }
    }
}

impl TryFrom<geo::Geometry<f64>> for ReachableArea {
    type Error = GeometryError;

    fn try_from(geometry: geo::Geometry<f64>) -> Result<Self, Self::Error> {
        match geometry {
            geo::Geometry::Polygon(polygon) => Ok(ReachableArea::Polygon(polygon)),
            geo::Geometry::MultiPolygon(polygons) => Ok(ReachableArea::MultiPolygon(polygons)),
            geo::Geometry::Point(_) => Err(GeometryError::Unsupported("Point")),
            geo::Geometry::MultiPoint(_) => Err(GeometryError::Unsupported("MultiPoint")),
            geo::Geometry::Line(_) | geo::Geometry::LineString(_) => {
                Err(GeometryError::Unsupported("LineString"))
            }
            geo::Geometry::MultiLineString(_) => {
                Err(GeometryError::Unsupported("MultiLineString"))
            }
            geo::Geometry::GeometryCollection(_) => {
                Err(GeometryError::Unsupported("GeometryCollection"))
            }
            geo::Geometry::Rect(rect) => Ok(ReachableArea::Polygon(rect.to_polygon())),
            geo::Geometry::Triangle(triangle) => Ok(ReachableArea::Polygon(triangle.to_polygon())),
        }
    }
}

/// POIs inside the isochrone. No isochrone or no POIs yields an empty list.
pub fn pois_within(isochrone: Option<&Isochrone>, pois: &[Poi]) -> Result<Vec<Poi>, GeometryError> {
    match isochrone {
        Some(isochrone) => isochrone.filter_within(pois),
        None => Ok(Vec::new()),
    }
}

/// Like [`pois_within`], but any geometry failure degrades to an empty list.
pub fn filter_pois(isochrone: Option<&Isochrone>, pois: &[Poi]) -> Vec<Poi> {
    pois_within(isochrone, pois).unwrap_or_default()
}
