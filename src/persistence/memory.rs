//! In-process execution store.
//!
//! [`InMemoryRepository`] keeps tours, key points, and executions in
//! `HashMap`s behind [`tokio::sync::RwLock`]s. It is the default backend
//! when no database is configured and the backend used by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::models::SeedData;
use super::repository::ExecutionRepository;
use crate::domain::{
    CompletedPoint, ExecutionId, KeyPoint, Location, Tour, TourExecution, TourId,
};
use crate::error::TrackerError;

/// Volatile [`ExecutionRepository`] implementation.
///
/// # Concurrency
///
/// - Reads of different executions proceed concurrently.
/// - Each append holds the executions write lock only for the push itself,
///   so two appends to the same execution are applied one after the other
///   in whatever order they reach the lock.
/// - Every write rechecks `status` under that lock, so nothing lands on an
///   execution after it has been finished.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tours: RwLock<HashMap<TourId, Tour>>,
    key_points: RwLock<HashMap<TourId, Vec<KeyPoint>>>,
    executions: RwLock<HashMap<ExecutionId, TourExecution>>,
}

impl InMemoryRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a tour.
    pub async fn insert_tour(&self, tour: Tour) {
        self.tours.write().await.insert(tour.id, tour);
    }

    /// Registers a key point under its tour.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] if the key point's tour has not
    /// been registered.
    pub async fn insert_key_point(&self, key_point: KeyPoint) -> Result<(), TrackerError> {
        if !self.tours.read().await.contains_key(&key_point.tour_id) {
            return Err(TrackerError::NotFound(format!("tour {}", key_point.tour_id)));
        }
        self.key_points
            .write()
            .await
            .entry(key_point.tour_id)
            .or_default()
            .push(key_point);
        Ok(())
    }

    /// Loads a seed document: tours first, then their key points.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] if a key point references a tour
    /// missing from both the seed and the store.
    pub async fn load_seed(&self, seed: SeedData) -> Result<(), TrackerError> {
        let tour_count = seed.tours.len();
        let key_point_count = seed.key_points.len();
        for tour in seed.tours {
            self.insert_tour(tour).await;
        }
        for key_point in seed.key_points {
            self.insert_key_point(key_point).await?;
        }
        tracing::info!(tours = tour_count, key_points = key_point_count, "seed loaded");
        Ok(())
    }

    /// Returns the number of stored executions.
    pub async fn execution_count(&self) -> usize {
        self.executions.read().await.len()
    }
}

#[async_trait]
impl ExecutionRepository for InMemoryRepository {
    async fn get_tour(&self, tour_id: TourId) -> Result<Option<Tour>, TrackerError> {
        Ok(self.tours.read().await.get(&tour_id).cloned())
    }

    async fn key_points_by_tour(&self, tour_id: TourId) -> Result<Vec<KeyPoint>, TrackerError> {
        let mut points = self
            .key_points
            .read()
            .await
            .get(&tour_id)
            .cloned()
            .unwrap_or_default();
        points.sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));
        Ok(points)
    }

    async fn create_execution(&self, execution: &TourExecution) -> Result<(), TrackerError> {
        let mut map = self.executions.write().await;
        if map.contains_key(&execution.id) {
            return Err(TrackerError::Internal(format!(
                "execution {} already exists",
                execution.id
            )));
        }
        map.insert(execution.id, execution.clone());
        Ok(())
    }

    async fn get_execution(
        &self,
        execution_id: ExecutionId,
    ) -> Result<Option<TourExecution>, TrackerError> {
        Ok(self.executions.read().await.get(&execution_id).cloned())
    }

    async fn get_active_execution(
        &self,
        tourist_id: &str,
        tour_id: TourId,
    ) -> Result<Option<TourExecution>, TrackerError> {
        let map = self.executions.read().await;
        Ok(map
            .values()
            .find(|e| e.tour_id == tour_id && e.is_owned_by(tourist_id) && e.is_active())
            .cloned())
    }

    async fn update_execution(&self, execution: &TourExecution) -> Result<(), TrackerError> {
        let mut map = self.executions.write().await;
        let stored = active_entry(&mut map, execution.id)?;
        stored.status = execution.status;
        stored.finished_at = execution.finished_at;
        stored.last_activity = execution.last_activity;
        stored.completed_points.clone_from(&execution.completed_points);
        Ok(())
    }

    async fn append_location(
        &self,
        execution_id: ExecutionId,
        location: &Location,
    ) -> Result<(), TrackerError> {
        let mut map = self.executions.write().await;
        let stored = active_entry(&mut map, execution_id)?;
        stored.locations.push(*location);
        stored.last_activity = location.timestamp;
        Ok(())
    }

    async fn append_completed_point(
        &self,
        execution_id: ExecutionId,
        point: &CompletedPoint,
    ) -> Result<(), TrackerError> {
        let mut map = self.executions.write().await;
        let stored = active_entry(&mut map, execution_id)?;
        stored.completed_points.push(*point);
        stored.last_activity = point.reached_at;
        Ok(())
    }
}

/// Resolves a stored execution that may still be written to.
fn active_entry(
    map: &mut HashMap<ExecutionId, TourExecution>,
    execution_id: ExecutionId,
) -> Result<&mut TourExecution, TrackerError> {
    let stored = map
        .get_mut(&execution_id)
        .ok_or_else(|| TrackerError::NotFound(format!("execution {execution_id}")))?;
    stored.ensure_active()?;
    Ok(stored)
}
