//! Data Transfer Objects for REST request deserialization.
//!
//! Responses reuse the domain types directly
//! ([`crate::domain::TourExecution`]), which already serialize with the
//! camelCase field names clients expect.

pub mod execution_dto;

pub use execution_dto::*;
