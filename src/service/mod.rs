//! Service layer: business logic orchestration.
//!
//! [`ExecutionService`] runs the tour-execution state machine, delegating
//! distance checks to [`crate::domain::geo`] and storage to an
//! [`crate::persistence::ExecutionRepository`].

pub mod execution_service;

pub use execution_service::{ExecutionService, StartedExecution};
