//! Database-facing image types.

use crate::types::ImageId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Persisted image metadata row.
///
/// The uploaded bytes never land here; they are forwarded to the tiling
/// provider during the create request.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Image {
    pub id: ImageId,
    pub tileset_name: String,
    pub description: Option<String>,
    pub camera_type: Option<String>,
    pub date_taken: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to insert an image record
#[derive(Debug, Clone)]
pub struct ImageCreateDBRequest {
    pub tileset_name: String,
    pub description: Option<String>,
    pub camera_type: Option<String>,
    pub date_taken: Option<NaiveDate>,
}
