//! Per-marker hover bookkeeping for route previews.

use mapscale_shared::api::DirectionsQuery;
use mapscale_shared::{CoordKey, LngLat, TravelMode};

/// A route fetch issued by one hover. Only publishable while that hover lasts.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub query: DirectionsQuery,
    epoch: u64,
}

impl RouteRequest {
    pub fn from(&self) -> LngLat {
        self.query.start()
    }
}

#[derive(Debug, Default)]
pub struct HoverTracker {
    /// Target key of the last issued request; cleared on leave.
    last_key: Option<CoordKey>,
    epoch: u64,
    hovering: bool,
}

impl HoverTracker {
    /// Pointer entered the marker. Yields a request unless there is no center or
    /// this target was already requested during the current hover.
    pub fn enter(&mut self, center: Option<LngLat>, target: LngLat, mode: TravelMode) -> Option<RouteRequest> {
        self.hovering = true;
        let center = center?;
        let key = target.key();
        if self.last_key.as_ref() == Some(&key) {
            return None;
        }
        self.last_key = Some(key);
        Some(RouteRequest {
            query: DirectionsQuery::new(center, target, mode),
            epoch: self.epoch,
        })
    }

    pub fn leave(&mut self) {
        self.hovering = false;
        self.last_key = None;
        self.epoch += 1;
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    /// Whether a finished request may still be shown.
    pub fn accepts(&self, request: &RouteRequest) -> bool {
        self.hovering && request.epoch == self.epoch
    }
}

#[cfg(test)]
mod tests {
    use mapscale_shared::{LngLat, TravelMode};

    use super::HoverTracker;

    const CENTER: LngLat = LngLat::new(4.90, 52.35);
    const TARGET: LngLat = LngLat::new(4.91, 52.36);

    #[test]
    fn repeated_enter_without_leave_issues_one_request() {
        let mut tracker = HoverTracker::default();
        let first = tracker.enter(Some(CENTER), TARGET, TravelMode::Walking);
        assert!(first.is_some());
        assert!(tracker.enter(Some(CENTER), TARGET, TravelMode::Walking).is_none());
    }

    #[test]
    fn leave_resets_dedup_key() {
        let mut tracker = HoverTracker::default();
        assert!(tracker.enter(Some(CENTER), TARGET, TravelMode::Walking).is_some());
        tracker.leave();
        assert!(!tracker.is_hovering());
        assert!(tracker.enter(Some(CENTER), TARGET, TravelMode::Walking).is_some());
    }

    #[test]
    fn no_center_means_no_request() {
        let mut tracker = HoverTracker::default();
        assert!(tracker.enter(None, TARGET, TravelMode::Cycling).is_none());
        assert!(tracker.is_hovering());
        // A later hover with a center is not blocked by the earlier one.
        let request = tracker
            .enter(Some(CENTER), TARGET, TravelMode::Cycling)
            .expect("request once a center exists");
        assert_eq!(request.from(), CENTER);
        assert_eq!(request.query.end(), TARGET);
        assert_eq!(request.query.mode, TravelMode::Cycling);
    }

    #[test]
    fn response_after_leave_is_rejected() {
        let mut tracker = HoverTracker::default();
        let pending = tracker
            .enter(Some(CENTER), TARGET, TravelMode::Walking)
            .expect("request");
        assert!(tracker.accepts(&pending));

        tracker.leave();
        assert!(!tracker.accepts(&pending));

        // Re-entering starts a new hover; the old response still does not count.
        let fresh = tracker
            .enter(Some(CENTER), TARGET, TravelMode::Walking)
            .expect("request");
        assert!(!tracker.accepts(&pending));
        assert!(tracker.accepts(&fresh));
    }
}
