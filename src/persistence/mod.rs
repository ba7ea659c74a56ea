//! Persistence layer: the execution repository contract and its backends.
//!
//! [`ExecutionRepository`] is the only seam between the execution state
//! machine and storage. Two implementations ship with the crate:
//! [`InMemoryRepository`] (default, used by tests) and
//! [`PostgresRepository`] backed by `sqlx::PgPool`.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

pub use memory::InMemoryRepository;
pub use models::SeedData;
pub use postgres::PostgresRepository;
pub use repository::ExecutionRepository;
