use std::fmt;

use chrono::NaiveDateTime;
use opening_hours::OpeningHours;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HoursError {
    #[error("invalid opening_hours {raw:?}: {reason}")]
    Syntax { raw: String, reason: String },
}

/// Display status shown in a POI popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenStatus {
    Open,
    Closed,
    /// No `opening_hours` tag at all.
    Unknown,
    /// A tag is present but could not be evaluated.
    Info,
}

impl OpenStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OpenStatus::Open => "Open Now",
            OpenStatus::Closed => "Closed",
            OpenStatus::Unknown => "Unknown",
            OpenStatus::Info => "Info",
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            OpenStatus::Open => "#27ae60",
            OpenStatus::Closed => "#e74c3c",
            OpenStatus::Unknown => "#999",
            OpenStatus::Info => "#3498db",
        }
    }
}

/// A parsed OSM `opening_hours` expression.
pub struct Schedule {
    raw: String,
    rules: OpeningHours,
}

impl Schedule {
    pub fn is_open_at(&self, at: NaiveDateTime) -> bool {
        self.rules.is_open(at)
    }

    pub fn status_at(&self, at: NaiveDateTime) -> OpenStatus {
        if self.is_open_at(at) {
            OpenStatus::Open
        } else {
            OpenStatus::Closed
        }
    }
}

impl fmt::Debug for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schedule").field("raw", &self.raw).finish()
    }
}

pub fn parse(text: &str) -> Result<Schedule, HoursError> {
    let raw = text.trim();
    let rules = OpeningHours::parse(raw).map_err(|e| HoursError::Syntax {
        raw: raw.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Schedule {
        raw: raw.to_string(),
        rules,
    })
}

/// Status for an optional tag value. A missing or blank tag is `Unknown`; a tag
/// that fails to parse is returned as an error so the caller can log it and
/// fall back to [`OpenStatus::Info`].
pub fn status_for(tag: Option<&str>, at: NaiveDateTime) -> Result<OpenStatus, HoursError> {
    match tag.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(OpenStatus::Unknown),
        Some(raw) => parse(raw).map(|schedule| schedule.status_at(at)),
    }
}
