use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    Pending,
    Processed,
    Invoiced,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub client_name: String,
    pub po_number: String,
    pub amount: f64,
    pub document_url: Option<String>,
    pub status: PurchaseOrderStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Intake payload. Every purchase order enters the system PENDING; status is
/// driven exclusively by the accounts workflow afterwards.
#[derive(Debug, Deserialize, Validate)]
pub struct NewPurchaseOrder {
    #[validate(length(min = 1))]
    pub client_name: String,
    #[validate(length(min = 1))]
    pub po_number: String,
    #[validate(range(min = 0.0))]
    pub amount: f64,
    #[validate(url)]
    pub document_url: Option<String>,
}
