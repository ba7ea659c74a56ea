//! OpenAPI document for the tracker's REST surface.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::dto::{
    AddLocationRequest, CompletePointRequest, CreateExecutionRequest, UpdateExecutionRequest,
};
use crate::api::handlers::{execution, system};
use crate::domain::{CompletedPoint, ExecutionStatus, Location, TourExecution};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI specification, served at `/api-docs/openapi.json`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "tour-tracker", description = "Tour execution tracking API"),
    paths(
        system::health_handler,
        execution::create_execution,
        execution::get_active_execution,
        execution::get_execution,
        execution::update_execution,
        execution::add_location,
        execution::complete_key_point,
    ),
    components(schemas(
        system::HealthResponse,
        CreateExecutionRequest,
        UpdateExecutionRequest,
        AddLocationRequest,
        CompletePointRequest,
        TourExecution,
        ExecutionStatus,
        Location,
        CompletedPoint,
        ErrorResponse,
        ErrorBody,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Executions", description = "Tour execution lifecycle"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` JWT security scheme referenced by the paths.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
