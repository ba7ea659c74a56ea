//! Tour execution aggregate and its lifecycle rules.
//!
//! A [`TourExecution`] starts `active` and moves exactly once to one of the
//! terminal states `completed` or `abandoned`. Terminal executions reject
//! every further mutation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::geo::GeoPoint;
use super::{ExecutionId, KeyPointId, TourId};
use crate::error::TrackerError;

/// Lifecycle status of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Tourist is walking the tour.
    Active,
    /// Tourist declared the tour finished.
    Completed,
    /// Tourist gave up on the tour.
    Abandoned,
}

impl ExecutionStatus {
    /// Returns the wire/database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }

    /// Returns `true` for `completed` and `abandoned`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "abandoned" => Ok(Self::Abandoned),
            other => Err(TrackerError::InvalidInput(format!(
                "unknown execution status: {other}"
            ))),
        }
    }
}

/// One entry of the tourist's track log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Server time at which the sample was accepted.
    pub timestamp: DateTime<Utc>,
}

impl Location {
    /// Returns the sample's coordinates.
    #[must_use]
    pub const fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// A key point the tourist has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPoint {
    /// The reached key point.
    pub key_point_id: KeyPointId,
    /// When it was recorded.
    pub reached_at: DateTime<Utc>,
}

/// One tourist's attempt at one tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TourExecution {
    /// Execution identifier (immutable).
    pub id: ExecutionId,
    /// Tour being executed.
    pub tour_id: TourId,
    /// Owning tourist's user ID.
    pub tourist_id: String,
    /// Current lifecycle status.
    pub status: ExecutionStatus,
    /// Creation timestamp (immutable).
    pub started_at: DateTime<Utc>,
    /// Timestamp of the latest state change.
    pub last_activity: DateTime<Utc>,
    /// Set once, when the execution reaches a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Reached key points in the order they were recorded.
    #[serde(default)]
    pub completed_points: Vec<CompletedPoint>,
    /// Accepted location samples in the order they were recorded.
    #[serde(default)]
    pub locations: Vec<Location>,
}

impl TourExecution {
    /// Starts a new active execution of `tour_id` for `tourist_id`.
    #[must_use]
    pub fn start(tour_id: TourId, tourist_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: ExecutionId::new(),
            tour_id,
            tourist_id: tourist_id.into(),
            status: ExecutionStatus::Active,
            started_at: now,
            last_activity: now,
            finished_at: None,
            completed_points: Vec::new(),
            locations: Vec::new(),
        }
    }

    /// Returns `true` while the execution accepts mutations.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ExecutionStatus::Active
    }

    /// Returns `true` if `tourist_id` owns this execution.
    #[must_use]
    pub fn is_owned_by(&self, tourist_id: &str) -> bool {
        self.tourist_id == tourist_id
    }

    /// Most recently recorded location, if any.
    #[must_use]
    pub fn last_location(&self) -> Option<&Location> {
        self.locations.last()
    }

    /// Returns `true` if `key_point_id` is already among the completed points.
    #[must_use]
    pub fn has_completed(&self, key_point_id: KeyPointId) -> bool {
        self.completed_points
            .iter()
            .any(|cp| cp.key_point_id == key_point_id)
    }

    /// Fails with [`TrackerError::InvalidState`] unless the execution is active.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidState`] for terminal executions.
    pub fn ensure_active(&self) -> Result<(), TrackerError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(TrackerError::InvalidState(format!(
                "execution {} is {}",
                self.id, self.status
            )))
        }
    }

    /// Moves the execution to a terminal `status`, replacing its completed
    /// points and stamping `last_activity` and `finished_at` with `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidState`] if the execution is already
    /// terminal or `status` is `active`.
    pub fn finish(
        &mut self,
        status: ExecutionStatus,
        completed_points: Vec<CompletedPoint>,
        now: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        self.ensure_active()?;
        if !status.is_terminal() {
            return Err(TrackerError::InvalidState(format!(
                "cannot move execution {} from active to {status}",
                self.id
            )));
        }
        self.status = status;
        self.completed_points = completed_points;
        self.last_activity = now;
        self.finished_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn execution() -> TourExecution {
        TourExecution::start(TourId::new(), "tourist-1", Utc::now())
    }

    #[test]
    fn start_is_active_and_empty() {
        let exec = execution();
        assert!(exec.is_active());
        assert_eq!(exec.started_at, exec.last_activity);
        assert!(exec.finished_at.is_none());
        assert!(exec.completed_points.is_empty());
        assert!(exec.locations.is_empty());
        assert!(exec.last_location().is_none());
    }

    #[test]
    fn finish_sets_terminal_fields() {
        let mut exec = execution();
        let kp = KeyPointId::new();
        let now = Utc::now();
        let points = vec![CompletedPoint {
            key_point_id: kp,
            reached_at: now,
        }];

        let result = exec.finish(ExecutionStatus::Completed, points, now);
        assert!(result.is_ok());
        assert_eq!(exec.status, ExecutionStatus::Completed);
        assert_eq!(exec.finished_at, Some(now));
        assert_eq!(exec.last_activity, now);
        assert!(exec.has_completed(kp));
    }

    #[test]
    fn finish_rejects_active_target() {
        let mut exec = execution();
        let result = exec.finish(ExecutionStatus::Active, Vec::new(), Utc::now());
        assert!(matches!(result, Err(TrackerError::InvalidState(_))));
        assert!(exec.finished_at.is_none());
    }

    #[test]
    fn terminal_states_are_final() {
        let mut exec = execution();
        let Ok(()) = exec.finish(ExecutionStatus::Abandoned, Vec::new(), Utc::now()) else {
            panic!("first transition must succeed");
        };
        let first_finish = exec.finished_at;

        let result = exec.finish(ExecutionStatus::Completed, Vec::new(), Utc::now());
        assert!(matches!(result, Err(TrackerError::InvalidState(_))));
        assert_eq!(exec.status, ExecutionStatus::Abandoned);
        assert_eq!(exec.finished_at, first_finish);
        assert!(exec.ensure_active().is_err());
    }

    #[test]
    fn json_uses_camel_case_and_omits_unfinished() {
        let exec = execution();
        let Ok(value) = serde_json::to_value(&exec) else {
            panic!("serialization failed");
        };
        assert!(value.get("tourId").is_some());
        assert!(value.get("touristId").is_some());
        assert!(value.get("lastActivity").is_some());
        assert!(value.get("finishedAt").is_none());
        assert_eq!(value.get("status"), Some(&serde_json::json!("active")));
    }

    #[test]
    fn status_parsing() {
        assert!(matches!(
            "completed".parse::<ExecutionStatus>(),
            Ok(ExecutionStatus::Completed)
        ));
        assert!(matches!(
            "paused".parse::<ExecutionStatus>(),
            Err(TrackerError::InvalidInput(_))
        ));
    }
}
