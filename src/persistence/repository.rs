//! The storage contract the execution service depends on.

use std::fmt;

use async_trait::async_trait;

use crate::domain::{
    CompletedPoint, ExecutionId, KeyPoint, Location, Tour, TourExecution, TourId,
};
use crate::error::TrackerError;

/// Durable storage for tour executions, plus read access to the tours and
/// key points owned by the tour-authoring subsystem.
///
/// ## Consistency
///
/// Each method is a single logical write or read. Implementations are not
/// required to serialize concurrent mutations of the same execution:
/// appends may interleave and the last writer of `last_activity` wins.
///
/// Every write applies only while the stored execution is still `active`,
/// checked atomically with the write itself. Once an execution has been
/// finished, later writes fail with [`TrackerError::InvalidState`] and
/// `finished_at` is never overwritten.
///
/// ## Uniqueness
///
/// The repository does not enforce "one active execution per tourist and
/// tour"; callers check [`ExecutionRepository::get_active_execution`]
/// before creating.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` to live behind an `Arc`
/// in axum application state.
#[async_trait]
pub trait ExecutionRepository: Send + Sync + fmt::Debug + 'static {
    // ── Tour catalog (read-only) ─────────────────────────────────────────────

    /// Looks up a tour by ID.
    async fn get_tour(&self, tour_id: TourId) -> Result<Option<Tour>, TrackerError>;

    /// Returns the tour's key points ordered by `order`, then `created_at`.
    async fn key_points_by_tour(&self, tour_id: TourId) -> Result<Vec<KeyPoint>, TrackerError>;

    // ── Executions ───────────────────────────────────────────────────────────

    /// Persists a freshly started execution.
    async fn create_execution(&self, execution: &TourExecution) -> Result<(), TrackerError>;

    /// Looks up an execution by ID, including its locations and completed points.
    async fn get_execution(
        &self,
        execution_id: ExecutionId,
    ) -> Result<Option<TourExecution>, TrackerError>;

    /// Returns the active execution of `tour_id` owned by `tourist_id`, if any.
    async fn get_active_execution(
        &self,
        tourist_id: &str,
        tour_id: TourId,
    ) -> Result<Option<TourExecution>, TrackerError>;

    /// Overwrites `status`, `finished_at`, `last_activity`, and
    /// `completed_points` of an active execution.
    ///
    /// Returns [`TrackerError::NotFound`] if the execution does not exist
    /// and [`TrackerError::InvalidState`] if it is no longer active.
    async fn update_execution(&self, execution: &TourExecution) -> Result<(), TrackerError>;

    /// Appends a location sample and sets `last_activity` to its timestamp.
    ///
    /// Returns [`TrackerError::NotFound`] if the execution does not exist
    /// and [`TrackerError::InvalidState`] if it is no longer active.
    async fn append_location(
        &self,
        execution_id: ExecutionId,
        location: &Location,
    ) -> Result<(), TrackerError>;

    /// Appends a completed point and sets `last_activity` to its `reached_at`.
    ///
    /// Returns [`TrackerError::NotFound`] if the execution does not exist
    /// and [`TrackerError::InvalidState`] if it is no longer active.
    async fn append_completed_point(
        &self,
        execution_id: ExecutionId,
        point: &CompletedPoint,
    ) -> Result<(), TrackerError>;
}
