//! Execution request DTOs.
//!
//! Identifiers arrive as strings and are parsed in the handlers so that a
//! malformed ID yields a specific `invalid …` message instead of a generic
//! deserialization error.

use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for `POST /executions`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateExecutionRequest {
    /// Tour to execute (UUID string).
    pub tour_id: String,
}

/// Request body for `PUT /executions/{execId}`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExecutionRequest {
    /// Target status: `completed` or `abandoned`.
    pub status: String,
    /// Key point IDs to record as completed. Malformed or foreign IDs are
    /// skipped.
    #[serde(default)]
    pub completed_points: Vec<String>,
}

/// Request body for `POST /executions/{execId}/location`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddLocationRequest {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// Request body for `POST /executions/{execId}/complete`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletePointRequest {
    /// Key point to mark as reached (UUID string).
    pub key_point_id: String,
}
