//! Tour execution handlers: create, read, location, completion, status.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::AuthContext;
use crate::api::dto::{
    AddLocationRequest, CompletePointRequest, CreateExecutionRequest, UpdateExecutionRequest,
};
use crate::api::extract::{ApiJson, parse_id};
use crate::app_state::AppState;
use crate::domain::{ExecutionId, ExecutionStatus, GeoPoint, KeyPointId, TourExecution, TourId};
use crate::error::{ErrorResponse, TrackerError};

/// `POST /executions` — Start (or resume) executing a tour.
///
/// # Errors
///
/// Returns [`TrackerError`] on a bad tour ID, a missing tour, or a draft tour.
#[utoipa::path(
    post,
    path = "/api/v1/executions",
    tag = "Executions",
    summary = "Start a tour execution",
    description = "Starts executing a published tour for the caller. If the caller already has an active execution of the tour, it is returned with status 200 instead.",
    request_body = CreateExecutionRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Execution started", body = TourExecution),
        (status = 200, description = "Existing active execution", body = TourExecution),
        (status = 400, description = "Invalid tour ID or draft tour", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 404, description = "Tour not found", body = ErrorResponse),
    )
)]
pub async fn create_execution(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(req): ApiJson<CreateExecutionRequest>,
) -> Result<impl IntoResponse, TrackerError> {
    let tour_id: TourId = parse_id(&req.tour_id, "tourId")?;

    let started = state
        .execution_service
        .create_execution(&auth.user_id, tour_id)
        .await?;

    let status = if started.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(started.execution)))
}

/// `GET /executions/{id}/active` — The caller's active execution of a tour.
///
/// # Errors
///
/// Returns [`TrackerError::NotFound`] if the caller has no active execution.
#[utoipa::path(
    get,
    path = "/api/v1/executions/{id}/active",
    tag = "Executions",
    summary = "Get active execution for a tour",
    params(
        ("id" = String, Path, description = "Tour UUID"),
    ),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Active execution", body = TourExecution),
        (status = 400, description = "Invalid tour ID", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 404, description = "No active execution", body = ErrorResponse),
    )
)]
pub async fn get_active_execution(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, TrackerError> {
    let tour_id: TourId = parse_id(&id, "tourId")?;
    let execution = state
        .execution_service
        .get_active_execution(&auth.user_id, tour_id)
        .await?;
    Ok(Json(execution))
}

/// `GET /executions/{id}` — One of the caller's executions.
///
/// # Errors
///
/// Returns [`TrackerError::NotFound`] if the execution is unknown or not the caller's.
#[utoipa::path(
    get,
    path = "/api/v1/executions/{id}",
    tag = "Executions",
    summary = "Get execution",
    params(
        ("id" = String, Path, description = "Execution UUID"),
    ),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Execution", body = TourExecution),
        (status = 400, description = "Invalid execution ID", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 404, description = "Execution not found", body = ErrorResponse),
    )
)]
pub async fn get_execution(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, TrackerError> {
    let execution_id: ExecutionId = parse_id(&id, "execution ID")?;
    let execution = state
        .execution_service
        .get_execution(&auth.user_id, execution_id)
        .await?;
    Ok(Json(execution))
}

/// `PUT /executions/{id}` — Finish an execution.
///
/// # Errors
///
/// Returns [`TrackerError`] on a bad ID or body, an unknown execution, or
/// an illegal status transition.
#[utoipa::path(
    put,
    path = "/api/v1/executions/{id}",
    tag = "Executions",
    summary = "Update execution status",
    description = "Moves an active execution to `completed` or `abandoned` and replaces its completed key points. Proximity is not revalidated.",
    params(
        ("id" = String, Path, description = "Execution UUID"),
    ),
    request_body = UpdateExecutionRequest,
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Execution updated"),
        (status = 400, description = "Invalid ID, body, or transition", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 404, description = "Execution not found", body = ErrorResponse),
    )
)]
pub async fn update_execution(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateExecutionRequest>,
) -> Result<impl IntoResponse, TrackerError> {
    let execution_id: ExecutionId = parse_id(&id, "execution ID")?;
    let status: ExecutionStatus = req.status.parse()?;

    state
        .execution_service
        .update_status(&auth.user_id, execution_id, status, &req.completed_points)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /executions/{id}/location` — Record the tourist's position.
///
/// # Errors
///
/// Returns [`TrackerError::ValidationFailed`] if the position is not near
/// any key point of the tour.
#[utoipa::path(
    post,
    path = "/api/v1/executions/{id}/location",
    tag = "Executions",
    summary = "Add location sample",
    description = "Appends a location to the execution's track log. Only positions within 15 m of a key point of the tour are accepted.",
    params(
        ("id" = String, Path, description = "Execution UUID"),
    ),
    request_body = AddLocationRequest,
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Location recorded"),
        (status = 400, description = "Invalid input or too far from any key point", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 404, description = "Execution not found", body = ErrorResponse),
    )
)]
pub async fn add_location(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AddLocationRequest>,
) -> Result<impl IntoResponse, TrackerError> {
    let execution_id: ExecutionId = parse_id(&id, "execution ID")?;
    state
        .execution_service
        .add_location(
            &auth.user_id,
            execution_id,
            GeoPoint::new(req.latitude, req.longitude),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /executions/{id}/complete` — Mark a key point as reached.
///
/// # Errors
///
/// Returns [`TrackerError`] if there is no active execution, the key point
/// is unknown, no location was recorded, or the last location is too far.
#[utoipa::path(
    post,
    path = "/api/v1/executions/{id}/complete",
    tag = "Executions",
    summary = "Complete key point",
    description = "Records a key point as reached. The most recent location sample must be within 15 m of it.",
    params(
        ("id" = String, Path, description = "Execution UUID"),
    ),
    request_body = CompletePointRequest,
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Key point completed"),
        (status = 400, description = "Invalid input, no location, or too far", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 404, description = "Active execution or key point not found", body = ErrorResponse),
    )
)]
pub async fn complete_key_point(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CompletePointRequest>,
) -> Result<impl IntoResponse, TrackerError> {
    let execution_id: ExecutionId = parse_id(&id, "execution ID")?;
    let key_point_id: KeyPointId = parse_id(&req.key_point_id, "keyPointId")?;
    state
        .execution_service
        .complete_key_point(&auth.user_id, execution_id, key_point_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Execution routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/executions", post(create_execution))
        .route("/executions/{id}", get(get_execution).put(update_execution))
        .route("/executions/{id}/active", get(get_active_execution))
        .route("/executions/{id}/location", post(add_location))
        .route("/executions/{id}/complete", post(complete_key_point))
}
