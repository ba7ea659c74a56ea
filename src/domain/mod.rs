//! Domain layer: identifiers, geography, tours, and the execution aggregate.
//!
//! This module holds the tracker's server-side model. Nothing here performs
//! I/O; the service layer combines these types with a repository.

pub mod execution;
pub mod geo;
pub mod ids;
pub mod tour;

pub use execution::{CompletedPoint, ExecutionStatus, Location, TourExecution};
pub use geo::{GeoPoint, haversine_distance, is_nearby};
pub use ids::{ExecutionId, KeyPointId, TourId};
pub use tour::{KeyPoint, Tour, TourStatus};
