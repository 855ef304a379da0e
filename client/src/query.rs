//! Query orchestration state: the center, travel parameters and the data fetched
//! for them, plus the transient hover route.
//!
//! Every fetch cycle is stamped with a generation number. Only the response for
//! the most recently issued cycle is applied; anything older is dropped.

use geojson::GeoJson;
use mapscale_shared::api::AreaQuery;
use mapscale_shared::{GeometryError, Isochrone, LngLat, Poi, TravelMode, TravelParams, pois_within};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Both halves of one fetch cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaData {
    pub isochrone: Isochrone,
    pub pois: Vec<Poi>,
}

/// Issued when a cycle starts; handed back with the response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchTicket {
    pub generation: u64,
    pub center: LngLat,
    pub params: TravelParams,
}

impl FetchTicket {
    pub fn area_query(&self) -> AreaQuery {
        AreaQuery::new(self.center, self.params)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Stale,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    center: Option<LngLat>,
    params: TravelParams,
    isochrone: Option<Isochrone>,
    /// Mode of the cycle that produced `isochrone`.
    isochrone_mode: TravelMode,
    pois: Vec<Poi>,
    phase: Phase,
    generation: u64,
    hovered_route: Option<GeoJson>,
}

impl QueryState {
    pub fn center(&self) -> Option<LngLat> {
        self.center
    }

    pub fn params(&self) -> TravelParams {
        self.params
    }

    pub fn isochrone(&self) -> Option<&Isochrone> {
        self.isochrone.as_ref()
    }

    pub fn isochrone_mode(&self) -> TravelMode {
        self.isochrone_mode
    }

    pub fn pois(&self) -> &[Poi] {
        &self.pois
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn hovered_route(&self) -> Option<&GeoJson> {
        self.hovered_route.as_ref()
    }

    /// New center from a map click or a geocoded address.
    pub fn start(&mut self, center: LngLat) -> FetchTicket {
        self.center = Some(center);
        self.issue(center)
    }

    /// Outcome of an address search. A match starts a cycle there; no match
    /// leaves the current view and data untouched.
    pub fn geocoded(&mut self, found: Option<LngLat>) -> Option<FetchTicket> {
        found.map(|center| self.start(center))
    }

    /// Returns a ticket only when the mode actually changed and a center is set.
    pub fn set_mode(&mut self, mode: TravelMode) -> Option<FetchTicket> {
        if self.params.mode == mode {
            return None;
        }
        self.params = self.params.with_mode(mode);
        self.reissue()
    }

    /// Budget is snapped onto the 5..=30 minute grid first.
    pub fn set_minutes(&mut self, minutes: u32) -> Option<FetchTicket> {
        let params = self.params.with_minutes(minutes);
        if params == self.params {
            return None;
        }
        self.params = params;
        self.reissue()
    }

    fn reissue(&mut self) -> Option<FetchTicket> {
        let center = self.center?;
        Some(self.issue(center))
    }

    fn issue(&mut self, center: LngLat) -> FetchTicket {
        self.generation += 1;
        self.phase = Phase::Loading;
        self.hovered_route = None;
        FetchTicket {
            generation: self.generation,
            center,
            params: self.params,
        }
    }

    /// Applies a cycle's outcome unless a newer cycle has been issued since.
    pub fn resolve(&mut self, ticket: &FetchTicket, outcome: Result<AreaData, String>) -> Resolution {
        if ticket.generation != self.generation {
            return Resolution::Stale;
        }
        match outcome {
            Ok(data) => {
                self.isochrone = Some(data.isochrone);
                self.isochrone_mode = ticket.params.mode;
                self.pois = data.pois;
                self.phase = Phase::Loaded;
            }
            Err(_) => {
                self.isochrone = None;
                self.pois.clear();
                self.hovered_route = None;
                self.phase = Phase::Failed;
            }
        }
        Resolution::Applied
    }

    /// Fetched POIs narrowed to the current isochrone.
    pub fn filtered_pois(&self) -> Result<Vec<Poi>, GeometryError> {
        pois_within(self.isochrone.as_ref(), &self.pois)
    }

    /// Publishes a route, but only if it still starts at the current center.
    pub fn show_route(&mut self, from: LngLat, route: GeoJson) -> bool {
        if self.center != Some(from) {
            return false;
        }
        self.hovered_route = Some(route);
        true
    }

    pub fn clear_route(&mut self) {
        self.hovered_route = None;
    }
}
