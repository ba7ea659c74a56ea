//! REST API layer: authentication, route handlers, DTOs, and router
//! composition.
//!
//! All execution endpoints are mounted under `/api/v1` and require a
//! bearer token. `/health` is public.

pub mod auth;
pub mod dto;
pub mod extract;
pub mod handlers;
pub mod openapi;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the servable application: routes, docs, middleware, and state.
pub fn build_app(state: AppState) -> Router {
    let router = build_router();

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        router.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
