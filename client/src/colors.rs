use mapscale_shared::{PoiKind, TravelMode};

pub const CENTER_MARKER: &str = "#6a0dad";
pub const ROUTE_PREVIEW: &str = "#3b82f6";
pub const ISOCHRONE_FILL_OPACITY: f64 = 0.15;

/// Fill colour of the reachable area for a travel mode.
pub fn mode_fill(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Walking => "#6a0dad",
        TravelMode::Cycling => "#f1c40f",
        TravelMode::Driving => "#3498db",
    }
}

pub fn kind_marker(kind: PoiKind) -> &'static str {
    match kind {
        PoiKind::Shop => "#FFD700",
        PoiKind::Gym => "#FF4500",
    }
}
