//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::api::auth::TokenVerifier;
use crate::service::ExecutionService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Execution service for all business logic.
    pub execution_service: Arc<ExecutionService>,
    /// Bearer token verifier backing the [`crate::api::auth::AuthContext`] extractor.
    pub token_verifier: Arc<TokenVerifier>,
}
