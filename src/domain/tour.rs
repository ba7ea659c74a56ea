//! Read-only views of tours and their key points.
//!
//! Both records are owned by the tour-authoring subsystem; the tracker only
//! resolves them through [`crate::persistence::ExecutionRepository`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::geo::GeoPoint;
use super::{KeyPointId, TourId};
use crate::error::TrackerError;

/// Publication status of a tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TourStatus {
    /// Being authored; cannot be executed.
    Draft,
    /// Visible and executable.
    Published,
    /// Withdrawn by its author.
    Archived,
}

impl TourStatus {
    /// Returns the wire/database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for TourStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TourStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            other => Err(TrackerError::InvalidInput(format!(
                "unknown tour status: {other}"
            ))),
        }
    }
}

/// A tour as seen by the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    /// Tour identifier.
    pub id: TourId,
    /// Author's user ID.
    pub author_id: String,
    /// Display name.
    pub name: String,
    /// Publication status.
    pub status: TourStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Tour {
    /// Returns `true` if executions may be started against this tour.
    #[must_use]
    pub fn is_executable(&self) -> bool {
        self.status != TourStatus::Draft
    }
}

/// A waypoint belonging to a tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyPoint {
    /// Key point identifier.
    pub id: KeyPointId,
    /// Owning tour.
    pub tour_id: TourId,
    /// Display name.
    pub name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Position in the tour sequence (ascending).
    pub order: i32,
    /// Creation timestamp, used to break ties in `order`.
    pub created_at: DateTime<Utc>,
}

impl KeyPoint {
    /// Returns the key point's coordinates.
    #[must_use]
    pub const fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_draft_is_not_executable() {
        let mut tour = Tour {
            id: TourId::new(),
            author_id: "author".to_string(),
            name: "Petrovaradin".to_string(),
            status: TourStatus::Draft,
            created_at: Utc::now(),
        };
        assert!(!tour.is_executable());
        tour.status = TourStatus::Published;
        assert!(tour.is_executable());
        tour.status = TourStatus::Archived;
        assert!(tour.is_executable());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [TourStatus::Draft, TourStatus::Published, TourStatus::Archived] {
            assert!(matches!(status.as_str().parse::<TourStatus>(), Ok(s) if s == status));
        }
        assert!("deleted".parse::<TourStatus>().is_err());
    }
}
