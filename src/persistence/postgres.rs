//! PostgreSQL implementation of the execution repository.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::repository::ExecutionRepository;
use crate::config::TrackerConfig;
use crate::domain::{
    CompletedPoint, ExecutionId, ExecutionStatus, KeyPoint, KeyPointId, Location, Tour,
    TourExecution, TourId, TourStatus,
};
use crate::error::TrackerError;

/// `(id, tour_id, tourist_id, status, started_at, last_activity, finished_at)`
type ExecutionRow = (
    Uuid,
    Uuid,
    String,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

/// PostgreSQL-backed repository using `sqlx::PgPool`.
///
/// Locations and completed points live in child tables ordered by a
/// `BIGSERIAL` sequence column, which preserves append order.
///
/// Every write starts with an `UPDATE … WHERE status = 'active'` on the
/// execution row. The row lock taken by that statement orders concurrent
/// writers, and a writer that finds the row already finished changes
/// nothing.
#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a repository over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool from `config`, applies the bundled
    /// migrations, and returns the repository.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Internal`] if no database URL is configured,
    /// the database is unreachable, or a migration fails.
    pub async fn connect(config: &TrackerConfig) -> Result<Self, TrackerError> {
        let url = config
            .postgres_url()
            .ok_or_else(|| TrackerError::Internal("DATABASE_URL is not configured".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(url)
            .await
            .map_err(storage_error)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| TrackerError::Internal(format!("migration failed: {e}")))?;

        tracing::info!(
            max_connections = config.database_max_connections,
            "connected to postgres"
        );
        Ok(Self::new(pool))
    }

    /// Loads the child collections of an execution row.
    async fn hydrate(&self, row: ExecutionRow) -> Result<TourExecution, TrackerError> {
        let (id, tour_id, tourist_id, status, started_at, last_activity, finished_at) = row;

        let status = status
            .parse::<ExecutionStatus>()
            .map_err(|e| TrackerError::Internal(format!("corrupt execution {id}: {e}")))?;

        let locations = sqlx::query_as::<_, (f64, f64, DateTime<Utc>)>(
            "SELECT latitude, longitude, recorded_at FROM execution_locations \
             WHERE execution_id = $1 ORDER BY seq ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?
        .into_iter()
        .map(|(latitude, longitude, timestamp)| Location {
            latitude,
            longitude,
            timestamp,
        })
        .collect();

        let completed_points = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            "SELECT key_point_id, reached_at FROM execution_completed_points \
             WHERE execution_id = $1 ORDER BY seq ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?
        .into_iter()
        .map(|(key_point_id, reached_at)| CompletedPoint {
            key_point_id: KeyPointId::from_uuid(key_point_id),
            reached_at,
        })
        .collect();

        Ok(TourExecution {
            id: ExecutionId::from_uuid(id),
            tour_id: TourId::from_uuid(tour_id),
            tourist_id,
            status,
            started_at,
            last_activity,
            finished_at,
            completed_points,
            locations,
        })
    }
}

#[async_trait]
impl ExecutionRepository for PostgresRepository {
    async fn get_tour(&self, tour_id: TourId) -> Result<Option<Tour>, TrackerError> {
        let row = sqlx::query_as::<_, (Uuid, String, String, String, DateTime<Utc>)>(
            "SELECT id, author_id, name, status, created_at FROM tours WHERE id = $1",
        )
        .bind(Uuid::from(tour_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        let Some((id, author_id, name, status, created_at)) = row else {
            return Ok(None);
        };
        let status = status
            .parse::<TourStatus>()
            .map_err(|e| TrackerError::Internal(format!("corrupt tour {id}: {e}")))?;

        Ok(Some(Tour {
            id: TourId::from_uuid(id),
            author_id,
            name,
            status,
            created_at,
        }))
    }

    async fn key_points_by_tour(&self, tour_id: TourId) -> Result<Vec<KeyPoint>, TrackerError> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, String, f64, f64, i32, DateTime<Utc>)>(
            "SELECT id, tour_id, name, latitude, longitude, sort_order, created_at \
             FROM key_points WHERE tour_id = $1 ORDER BY sort_order ASC, created_at ASC",
        )
        .bind(Uuid::from(tour_id))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows
            .into_iter()
            .map(
                |(id, tour_id, name, latitude, longitude, order, created_at)| KeyPoint {
                    id: KeyPointId::from_uuid(id),
                    tour_id: TourId::from_uuid(tour_id),
                    name,
                    latitude,
                    longitude,
                    order,
                    created_at,
                },
            )
            .collect())
    }

    async fn create_execution(&self, execution: &TourExecution) -> Result<(), TrackerError> {
        sqlx::query(
            "INSERT INTO tour_executions \
             (id, tour_id, tourist_id, status, started_at, last_activity, finished_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::from(execution.id))
        .bind(Uuid::from(execution.tour_id))
        .bind(&execution.tourist_id)
        .bind(execution.status.as_str())
        .bind(execution.started_at)
        .bind(execution.last_activity)
        .bind(execution.finished_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn get_execution(
        &self,
        execution_id: ExecutionId,
    ) -> Result<Option<TourExecution>, TrackerError> {
        let row = sqlx::query_as::<_, ExecutionRow>(
            "SELECT id, tour_id, tourist_id, status, started_at, last_activity, finished_at \
             FROM tour_executions WHERE id = $1",
        )
        .bind(Uuid::from(execution_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        match row {
            Some(row) => self.hydrate(row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn get_active_execution(
        &self,
        tourist_id: &str,
        tour_id: TourId,
    ) -> Result<Option<TourExecution>, TrackerError> {
        let row = sqlx::query_as::<_, ExecutionRow>(
            "SELECT id, tour_id, tourist_id, status, started_at, last_activity, finished_at \
             FROM tour_executions \
             WHERE tourist_id = $1 AND tour_id = $2 AND status = 'active' \
             ORDER BY started_at DESC LIMIT 1",
        )
        .bind(tourist_id)
        .bind(Uuid::from(tour_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        match row {
            Some(row) => self.hydrate(row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn update_execution(&self, execution: &TourExecution) -> Result<(), TrackerError> {
        let id = Uuid::from(execution.id);
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let updated = sqlx::query(
            "UPDATE tour_executions SET status = $2, finished_at = $3, last_activity = $4 \
             WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .bind(execution.status.as_str())
        .bind(execution.finished_at)
        .bind(execution.last_activity)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        if updated.rows_affected() == 0 {
            return Err(rejected_write(&mut *tx, execution.id).await);
        }

        sqlx::query("DELETE FROM execution_completed_points WHERE execution_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        for point in &execution.completed_points {
            sqlx::query(
                "INSERT INTO execution_completed_points (execution_id, key_point_id, reached_at) \
                 VALUES ($1, $2, $3)",
            )
            .bind(id)
            .bind(Uuid::from(point.key_point_id))
            .bind(point.reached_at)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)
    }

    async fn append_location(
        &self,
        execution_id: ExecutionId,
        location: &Location,
    ) -> Result<(), TrackerError> {
        let id = Uuid::from(execution_id);
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let updated = sqlx::query(
            "UPDATE tour_executions SET last_activity = $2 WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .bind(location.timestamp)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        if updated.rows_affected() == 0 {
            return Err(rejected_write(&mut *tx, execution_id).await);
        }

        sqlx::query(
            "INSERT INTO execution_locations (execution_id, latitude, longitude, recorded_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(location.timestamp)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)
    }

    async fn append_completed_point(
        &self,
        execution_id: ExecutionId,
        point: &CompletedPoint,
    ) -> Result<(), TrackerError> {
        let id = Uuid::from(execution_id);
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let updated = sqlx::query(
            "UPDATE tour_executions SET last_activity = $2 WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .bind(point.reached_at)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        if updated.rows_affected() == 0 {
            return Err(rejected_write(&mut *tx, execution_id).await);
        }

        sqlx::query(
            "INSERT INTO execution_completed_points (execution_id, key_point_id, reached_at) \
             VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(Uuid::from(point.key_point_id))
        .bind(point.reached_at)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)
    }
}

/// Explains why a guarded `UPDATE` matched no row: the execution is either
/// missing or already finished.
async fn rejected_write(conn: &mut PgConnection, execution_id: ExecutionId) -> TrackerError {
    let status = sqlx::query_as::<_, (String,)>("SELECT status FROM tour_executions WHERE id = $1")
        .bind(Uuid::from(execution_id))
        .fetch_optional(conn)
        .await;

    match status {
        Ok(Some((status,))) => {
            TrackerError::InvalidState(format!("execution {execution_id} is {status}"))
        }
        Ok(None) => TrackerError::NotFound(format!("execution {execution_id}")),
        Err(e) => storage_error(e),
    }
}

/// Maps a driver error to [`TrackerError::Internal`].
fn storage_error(e: sqlx::Error) -> TrackerError {
    TrackerError::Internal(format!("persistence error: {e}"))
}
