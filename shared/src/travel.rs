use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const MIN_MINUTES: u32 = 5;
pub const MAX_MINUTES: u32 = 30;
pub const MINUTES_STEP: u32 = 5;
pub const DEFAULT_MINUTES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Walking,
    Cycling,
    Driving,
}

impl TravelMode {
    pub const ALL: [TravelMode; 3] = [TravelMode::Walking, TravelMode::Cycling, TravelMode::Driving];

    /// Profile name the backend endpoints accept.
    pub const fn as_str(self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
            TravelMode::Cycling => "cycling",
            TravelMode::Driving => "driving",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            TravelMode::Walking => "\u{1F6B6} Walking",
            TravelMode::Cycling => "\u{1F6B2} Cycling",
            TravelMode::Driving => "\u{1F697} Driving",
        }
    }

    /// OpenRouteService routing profile.
    pub const fn ors_profile(self) -> &'static str {
        match self {
            TravelMode::Walking => "foot-walking",
            TravelMode::Cycling => "cycling-regular",
            TravelMode::Driving => "driving-car",
        }
    }

    /// Rough travel speed in metres per minute, used to size the POI search radius.
    pub const fn metres_per_minute(self) -> u32 {
        match self {
            TravelMode::Walking => 80,
            TravelMode::Cycling => 250,
            TravelMode::Driving => 800,
        }
    }

    /// Parses a profile, falling back to walking for anything unrecognised.
    pub fn from_profile_lossy(profile: &str) -> Self {
        profile.parse().unwrap_or_default()
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walking" => Ok(TravelMode::Walking),
            "cycling" => Ok(TravelMode::Cycling),
            "driving" => Ok(TravelMode::Driving),
            other => Err(format!("unknown travel mode: {other}")),
        }
    }
}

/// User-editable query parameters: how and for how long the user is willing to travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelParams {
    pub mode: TravelMode,
    pub minutes: u32,
}

impl Default for TravelParams {
    fn default() -> Self {
        Self {
            mode: TravelMode::default(),
            minutes: DEFAULT_MINUTES,
        }
    }
}

impl TravelParams {
    /// Snaps a time budget onto the slider grid (5..=30, step 5).
    pub fn normalize_minutes(minutes: u32) -> u32 {
        let clamped = minutes.clamp(MIN_MINUTES, MAX_MINUTES);
        let snapped = ((clamped + MINUTES_STEP / 2) / MINUTES_STEP) * MINUTES_STEP;
        snapped.clamp(MIN_MINUTES, MAX_MINUTES)
    }

    pub fn with_mode(self, mode: TravelMode) -> Self {
        Self { mode, ..self }
    }

    pub fn with_minutes(self, minutes: u32) -> Self {
        Self {
            minutes: Self::normalize_minutes(minutes),
            ..self
        }
    }

    /// Search radius in metres for the POI query.
    pub fn search_radius_m(&self) -> u32 {
        self.minutes.saturating_mul(self.mode.metres_per_minute())
    }
}
