use serde::Serialize;
use sqlx::types::Uuid;
use time::OffsetDateTime;

/// A logged-in browser session. The token travels in an HttpOnly cookie and
/// is the only thing the client ever sees.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Session {
    pub token: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}
