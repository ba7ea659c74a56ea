//! Execution service: the tour-execution state machine.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::domain::{
    CompletedPoint, ExecutionId, ExecutionStatus, GeoPoint, KeyPoint, KeyPointId, Location,
    TourExecution, TourId, is_nearby,
};
use crate::error::TrackerError;
use crate::persistence::ExecutionRepository;

/// Result of [`ExecutionService::create_execution`].
#[derive(Debug, Clone)]
pub struct StartedExecution {
    /// The caller's active execution of the tour.
    pub execution: TourExecution,
    /// `false` when an already active execution was returned instead of a
    /// new one.
    pub created: bool,
}

/// Orchestration layer for all execution operations.
///
/// Stateless coordinator: owns a shared [`ExecutionRepository`] and the
/// per-operation deadline. Every operation follows the pattern:
/// resolve records → check ownership and status → check geography →
/// perform at most one logical write.
#[derive(Debug, Clone)]
pub struct ExecutionService {
    repository: Arc<dyn ExecutionRepository>,
    timeout: Duration,
}

impl ExecutionService {
    /// Creates a new `ExecutionService`.
    #[must_use]
    pub fn new(repository: Arc<dyn ExecutionRepository>, timeout: Duration) -> Self {
        Self {
            repository,
            timeout,
        }
    }

    /// Returns the inner repository.
    #[must_use]
    pub fn repository(&self) -> &Arc<dyn ExecutionRepository> {
        &self.repository
    }

    /// Starts executing `tour_id` for `tourist_id`.
    ///
    /// If the tourist already has an active execution of the tour, that
    /// execution is returned with `created == false`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] if the tour does not exist,
    /// [`TrackerError::InvalidState`] if it is still a draft.
    pub async fn create_execution(
        &self,
        tourist_id: &str,
        tour_id: TourId,
    ) -> Result<StartedExecution, TrackerError> {
        self.bounded(async {
            require_caller(tourist_id)?;

            let tour = self
                .repository
                .get_tour(tour_id)
                .await?
                .ok_or_else(|| TrackerError::NotFound(format!("tour {tour_id}")))?;

            if !tour.is_executable() {
                return Err(TrackerError::InvalidState(format!(
                    "tour {tour_id} is a draft"
                )));
            }

            if let Some(existing) = self
                .repository
                .get_active_execution(tourist_id, tour_id)
                .await?
            {
                tracing::debug!(execution_id = %existing.id, %tour_id, "reusing active execution");
                return Ok(StartedExecution {
                    execution: existing,
                    created: false,
                });
            }

            let execution = TourExecution::start(tour_id, tourist_id, Utc::now());
            self.repository.create_execution(&execution).await?;

            tracing::info!(execution_id = %execution.id, %tour_id, tourist_id, "execution started");
            Ok(StartedExecution {
                execution,
                created: true,
            })
        })
        .await
    }

    /// Returns the tourist's active execution of `tour_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] if there is none.
    pub async fn get_active_execution(
        &self,
        tourist_id: &str,
        tour_id: TourId,
    ) -> Result<TourExecution, TrackerError> {
        self.bounded(async {
            require_caller(tourist_id)?;
            self.repository
                .get_active_execution(tourist_id, tour_id)
                .await?
                .ok_or_else(|| {
                    TrackerError::NotFound(format!("active execution for tour {tour_id}"))
                })
        })
        .await
    }

    /// Returns an execution owned by `tourist_id`, in any status.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] if the execution does not exist
    /// or belongs to someone else.
    pub async fn get_execution(
        &self,
        tourist_id: &str,
        execution_id: ExecutionId,
    ) -> Result<TourExecution, TrackerError> {
        self.bounded(async {
            require_caller(tourist_id)?;
            self.owned_execution(tourist_id, execution_id).await
        })
        .await
    }

    /// Records a location sample for an active execution.
    ///
    /// The sample is accepted only if it lies within the proximity
    /// threshold of at least one key point of the execution's tour.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidInput`] for out-of-range coordinates,
    /// [`TrackerError::NotFound`] if the execution is unknown,
    /// [`TrackerError::InvalidState`] if it is no longer active, and
    /// [`TrackerError::ValidationFailed`] if no key point is nearby.
    pub async fn add_location(
        &self,
        tourist_id: &str,
        execution_id: ExecutionId,
        position: GeoPoint,
    ) -> Result<Location, TrackerError> {
        self.bounded(async {
            require_caller(tourist_id)?;
            if !position.is_valid() {
                return Err(TrackerError::InvalidInput(format!(
                    "coordinates out of range: ({}, {})",
                    position.latitude, position.longitude
                )));
            }

            let execution = self.owned_execution(tourist_id, execution_id).await?;
            execution.ensure_active()?;

            let key_points = self.repository.key_points_by_tour(execution.tour_id).await?;
            let near_any = key_points.iter().any(|kp| is_nearby(position, kp.position()));
            if !near_any {
                tracing::debug!(
                    %execution_id,
                    lat = position.latitude,
                    lon = position.longitude,
                    "location rejected"
                );
                return Err(TrackerError::ValidationFailed(
                    "location too far from any keypoint".to_string(),
                ));
            }

            let location = Location {
                latitude: position.latitude,
                longitude: position.longitude,
                timestamp: Utc::now(),
            };
            self.repository
                .append_location(execution_id, &location)
                .await?;

            tracing::debug!(%execution_id, "location recorded");
            Ok(location)
        })
        .await
    }

    /// Marks a key point as reached.
    ///
    /// Requires the most recent recorded location to be near the key point.
    /// Completing every key point does not finish the execution; callers
    /// use [`ExecutionService::update_status`] for that.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] if the caller has no such active
    /// execution or the key point is not part of the tour,
    /// [`TrackerError::ValidationFailed`] if no location was recorded yet or
    /// the last one is too far, and [`TrackerError::InvalidState`] if the
    /// key point was already completed.
    pub async fn complete_key_point(
        &self,
        tourist_id: &str,
        execution_id: ExecutionId,
        key_point_id: KeyPointId,
    ) -> Result<CompletedPoint, TrackerError> {
        self.bounded(async {
            require_caller(tourist_id)?;

            let execution = self
                .repository
                .get_execution(execution_id)
                .await?
                .filter(|e| e.is_owned_by(tourist_id) && e.is_active())
                .ok_or_else(|| {
                    TrackerError::NotFound(format!("active execution {execution_id}"))
                })?;

            let key_points = self.repository.key_points_by_tour(execution.tour_id).await?;
            let key_point = find_key_point(&key_points, key_point_id)
                .ok_or_else(|| TrackerError::NotFound(format!("keypoint {key_point_id}")))?;

            let last = execution.last_location().ok_or_else(|| {
                TrackerError::ValidationFailed("no location recorded".to_string())
            })?;
            if !is_nearby(last.position(), key_point.position()) {
                return Err(TrackerError::ValidationFailed(
                    "too far from keypoint".to_string(),
                ));
            }

            if execution.has_completed(key_point_id) {
                return Err(TrackerError::InvalidState(format!(
                    "keypoint {key_point_id} already completed"
                )));
            }

            let point = CompletedPoint {
                key_point_id,
                reached_at: Utc::now(),
            };
            self.repository
                .append_completed_point(execution_id, &point)
                .await?;

            tracing::info!(%execution_id, %key_point_id, "keypoint completed");
            Ok(point)
        })
        .await
    }

    /// Finishes an active execution with a caller-declared terminal status.
    ///
    /// `completed_point_ids` replaces the completed points: malformed IDs
    /// and IDs not belonging to the tour are skipped, duplicates collapse,
    /// and every kept point is stamped with the current time. Proximity is
    /// not revalidated.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] if the caller owns no such
    /// execution and [`TrackerError::InvalidState`] if the execution is
    /// already terminal or `status` is `active`.
    pub async fn update_status(
        &self,
        tourist_id: &str,
        execution_id: ExecutionId,
        status: ExecutionStatus,
        completed_point_ids: &[String],
    ) -> Result<TourExecution, TrackerError> {
        self.bounded(async {
            require_caller(tourist_id)?;

            let mut execution = self.owned_execution(tourist_id, execution_id).await?;
            let key_points = self.repository.key_points_by_tour(execution.tour_id).await?;

            let now = Utc::now();
            let mut completed: Vec<CompletedPoint> = Vec::with_capacity(completed_point_ids.len());
            for raw in completed_point_ids {
                let Ok(key_point_id) = raw.parse::<KeyPointId>() else {
                    continue;
                };
                if find_key_point(&key_points, key_point_id).is_none()
                    || completed.iter().any(|cp| cp.key_point_id == key_point_id)
                {
                    continue;
                }
                completed.push(CompletedPoint {
                    key_point_id,
                    reached_at: now,
                });
            }

            execution.finish(status, completed, now)?;
            self.repository.update_execution(&execution).await?;

            tracing::info!(
                %execution_id,
                %status,
                completed_points = execution.completed_points.len(),
                "execution finished"
            );
            Ok(execution)
        })
        .await
    }

    /// Resolves an execution and checks that `tourist_id` owns it.
    async fn owned_execution(
        &self,
        tourist_id: &str,
        execution_id: ExecutionId,
    ) -> Result<TourExecution, TrackerError> {
        self.repository
            .get_execution(execution_id)
            .await?
            .filter(|e| e.is_owned_by(tourist_id))
            .ok_or_else(|| TrackerError::NotFound(format!("execution {execution_id}")))
    }

    /// Runs `operation` under the configured deadline.
    async fn bounded<T, F>(&self, operation: F) -> Result<T, TrackerError>
    where
        F: Future<Output = Result<T, TrackerError>>,
    {
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis(), "operation timed out");
                Err(TrackerError::Timeout(self.timeout))
            }
        }
    }
}

fn require_caller(tourist_id: &str) -> Result<(), TrackerError> {
    if tourist_id.trim().is_empty() {
        return Err(TrackerError::Unauthorized("missing caller identity".to_string()));
    }
    Ok(())
}

fn find_key_point(key_points: &[KeyPoint], id: KeyPointId) -> Option<&KeyPoint> {
    key_points.iter().find(|kp| kp.id == id)
}
