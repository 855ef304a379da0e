pub mod api;
pub mod coords;
pub mod geocode;
pub mod hours;
pub mod isochrone;
pub mod poi;
pub mod travel;

pub use coords::{CoordKey, LngLat};
pub use hours::{HoursError, OpenStatus};
pub use isochrone::{GeometryError, Isochrone, ReachableArea, filter_pois, pois_within};
pub use poi::{Poi, PoiId, PoiKind, PoiResponse};
pub use travel::{TravelMode, TravelParams};
