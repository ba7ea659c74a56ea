//! # tour-tracker
//!
//! REST service that tracks tourists while they walk a published tour.
//!
//! A tourist starts an *execution* of a tour, streams location samples
//! that must fall near one of the tour's key points, marks key points as
//! reached once their latest location is close enough, and finally
//! completes or abandons the execution.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP + Bearer JWT)
//!     │
//!     ├── REST Handlers + AuthContext (api/)
//!     │
//!     ├── ExecutionService (service/)
//!     ├── Geo proximity rules (domain/)
//!     │
//!     └── ExecutionRepository (persistence/)
//!             ├── InMemoryRepository
//!             └── PostgresRepository
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
