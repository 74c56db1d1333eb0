use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;
use validator::Validate;

/// A link to course material shared with a batch. Only references are kept;
/// hosting the files themselves is out of scope.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub uploaded_by: Uuid,
    pub title: String,
    pub url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewMaterial {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(url)]
    pub url: String,
}
