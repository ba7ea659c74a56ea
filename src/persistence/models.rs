//! Seed data for the tour catalog.

use serde::{Deserialize, Serialize};

use crate::domain::{KeyPoint, Tour};

/// Tours and key points loaded into the in-memory store at startup.
///
/// The tracker never authors tours itself; in deployments without
/// PostgreSQL this file stands in for the tour-authoring subsystem.
///
/// ```json
/// {
///   "tours": [{ "id": "…", "authorId": "a1", "name": "Fortress", "status": "published",
///               "createdAt": "2024-05-01T10:00:00Z" }],
///   "keyPoints": [{ "id": "…", "tourId": "…", "name": "Clock tower", "latitude": 45.2523,
///                   "longitude": 19.8617, "order": 0, "createdAt": "2024-05-01T10:00:00Z" }]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    /// Tours to register.
    #[serde(default)]
    pub tours: Vec<Tour>,
    /// Key points to register; each must reference a tour.
    #[serde(default)]
    pub key_points: Vec<KeyPoint>,
}
