use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    /// PAID is terminal; an OVERDUE invoice can still be settled.
    pub fn may_become(self, next: InvoiceStatus) -> bool {
        matches!(
            (self, next),
            (InvoiceStatus::Pending, InvoiceStatus::Paid)
                | (InvoiceStatus::Pending, InvoiceStatus::Overdue)
                | (InvoiceStatus::Overdue, InvoiceStatus::Paid)
        )
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub invoice_number: String,
    pub amount: f64,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct NewInvoice {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceStatus {
    pub status: InvoiceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_is_terminal_and_overdue_can_settle() {
        use InvoiceStatus::*;

        assert!(Pending.may_become(Paid));
        assert!(Pending.may_become(Overdue));
        assert!(Overdue.may_become(Paid));

        assert!(!Paid.may_become(Pending));
        assert!(!Paid.may_become(Overdue));
        assert!(!Overdue.may_become(Pending));
        assert!(!Pending.may_become(Pending));
    }
}
