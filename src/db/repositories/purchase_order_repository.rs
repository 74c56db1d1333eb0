use sqlx::types::Uuid;
use sqlx::{Sqlite, SqlitePool, Transaction};
use time::OffsetDateTime;

use crate::db::error::DatabaseError;
use crate::db::models::{
    Invoice, InvoiceStatus, NewPurchaseOrder, PurchaseOrder, PurchaseOrderStatus,
};

pub struct PurchaseOrderRepository;

impl PurchaseOrderRepository {
    /// Intake. Every purchase order starts PENDING regardless of the payload.
    pub async fn create(
        pool: &SqlitePool,
        data: &NewPurchaseOrder,
    ) -> Result<PurchaseOrder, DatabaseError> {
        let now = OffsetDateTime::now_utc();
        let po = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            INSERT INTO purchase_orders
                (id, client_name, po_number, amount, document_url, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.client_name)
        .bind(&data.po_number)
        .bind(data.amount)
        .bind(&data.document_url)
        .bind(PurchaseOrderStatus::Pending)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;
        Ok(po)
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Option<PurchaseOrder>, DatabaseError> {
        let po = sqlx::query_as::<_, PurchaseOrder>("SELECT * FROM purchase_orders WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(po)
    }

    pub async fn find_by_id_tx(
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
    ) -> Result<Option<PurchaseOrder>, DatabaseError> {
        let po = sqlx::query_as::<_, PurchaseOrder>("SELECT * FROM purchase_orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(po)
    }

    pub async fn list(pool: &SqlitePool) -> Result<Vec<PurchaseOrder>, DatabaseError> {
        let orders = sqlx::query_as::<_, PurchaseOrder>(
            "SELECT * FROM purchase_orders ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await?;
        Ok(orders)
    }

    /// Status change guarded by the expected current status. `None` means the
    /// order was not in `from` when the update ran.
    pub async fn transition_status(
        pool: &SqlitePool,
        id: Uuid,
        from: PurchaseOrderStatus,
        to: PurchaseOrderStatus,
    ) -> Result<Option<PurchaseOrder>, DatabaseError> {
        let po = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            UPDATE purchase_orders SET status = ?, updated_at = ?
            WHERE id = ? AND status = ?
            RETURNING *
            "#,
        )
        .bind(to)
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .bind(from)
        .fetch_optional(pool)
        .await?;
        Ok(po)
    }

    pub async fn set_status_tx(
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        to: PurchaseOrderStatus,
    ) -> Result<PurchaseOrder, DatabaseError> {
        let po = sqlx::query_as::<_, PurchaseOrder>(
            "UPDATE purchase_orders SET status = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(to)
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(DatabaseError::NotFound)?;
        Ok(po)
    }

    /// Sequential `INV-NNNN` numbers. The count and the insert share one
    /// transaction; SQLite's single writer keeps the sequence gap-free.
    pub async fn next_invoice_number_tx(
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<String, DatabaseError> {
        let issued = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invoices")
            .fetch_one(&mut **tx)
            .await?;
        Ok(format!("INV-{:04}", issued + 1))
    }

    /// The invoice amount is copied from the purchase order at generation
    /// time; later edits to the order do not reach the invoice.
    pub async fn create_invoice_tx(
        tx: &mut Transaction<'_, Sqlite>,
        po: &PurchaseOrder,
        invoice_number: &str,
        notes: Option<&str>,
    ) -> Result<Invoice, DatabaseError> {
        let now = OffsetDateTime::now_utc();
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices
                (id, purchase_order_id, invoice_number, amount, status, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(po.id)
        .bind(invoice_number)
        .bind(po.amount)
        .bind(InvoiceStatus::Pending)
        .bind(notes)
        .bind(now)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;
        Ok(invoice)
    }

    pub async fn list_invoices(pool: &SqlitePool) -> Result<Vec<Invoice>, DatabaseError> {
        let invoices =
            sqlx::query_as::<_, Invoice>("SELECT * FROM invoices ORDER BY created_at DESC")
                .fetch_all(pool)
                .await?;
        Ok(invoices)
    }

    pub async fn find_invoice(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Option<Invoice>, DatabaseError> {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(invoice)
    }

    pub async fn transition_invoice_status(
        pool: &SqlitePool,
        id: Uuid,
        from: InvoiceStatus,
        to: InvoiceStatus,
    ) -> Result<Option<Invoice>, DatabaseError> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices SET status = ?, updated_at = ?
            WHERE id = ? AND status = ?
            RETURNING *
            "#,
        )
        .bind(to)
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .bind(from)
        .fetch_optional(pool)
        .await?;
        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_pool() -> SqlitePool {
        crate::db::connect_pool("sqlite::memory:", 1, 1).await.unwrap()
    }

    fn sample_po(number: &str) -> NewPurchaseOrder {
        NewPurchaseOrder {
            client_name: "Initech".into(),
            po_number: number.into(),
            amount: 12_500.0,
            document_url: None,
        }
    }

    async fn generate(pool: &SqlitePool, po: &PurchaseOrder) -> Result<Invoice, DatabaseError> {
        let mut tx = pool.begin().await?;
        let number = PurchaseOrderRepository::next_invoice_number_tx(&mut tx).await?;
        let invoice =
            PurchaseOrderRepository::create_invoice_tx(&mut tx, po, &number, None).await?;
        PurchaseOrderRepository::set_status_tx(&mut tx, po.id, PurchaseOrderStatus::Invoiced)
            .await?;
        tx.commit().await?;
        Ok(invoice)
    }

    #[tokio::test]
    async fn invoice_numbers_are_sequential() {
        let pool = setup_pool().await;
        let first = PurchaseOrderRepository::create(&pool, &sample_po("PO-100"))
            .await
            .unwrap();
        let second = PurchaseOrderRepository::create(&pool, &sample_po("PO-101"))
            .await
            .unwrap();

        let a = generate(&pool, &first).await.unwrap();
        let b = generate(&pool, &second).await.unwrap();
        assert_eq!(a.invoice_number, "INV-0001");
        assert_eq!(b.invoice_number, "INV-0002");
        assert_eq!(a.amount, 12_500.0);
    }

    #[tokio::test]
    async fn a_purchase_order_gets_at_most_one_invoice() {
        let pool = setup_pool().await;
        let po = PurchaseOrderRepository::create(&pool, &sample_po("PO-200"))
            .await
            .unwrap();

        generate(&pool, &po).await.unwrap();
        let err = generate(&pool, &po).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate));
    }

    #[tokio::test]
    async fn duplicate_po_numbers_are_rejected() {
        let pool = setup_pool().await;
        PurchaseOrderRepository::create(&pool, &sample_po("PO-300"))
            .await
            .unwrap();
        let err = PurchaseOrderRepository::create(&pool, &sample_po("PO-300"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate));
    }

    #[tokio::test]
    async fn guarded_transitions_miss_when_the_status_moved() {
        let pool = setup_pool().await;
        let po = PurchaseOrderRepository::create(&pool, &sample_po("PO-400"))
            .await
            .unwrap();

        let processed = PurchaseOrderRepository::transition_status(
            &pool,
            po.id,
            PurchaseOrderStatus::Pending,
            PurchaseOrderStatus::Processed,
        )
        .await
        .unwrap();
        assert_eq!(
            processed.map(|p| p.status),
            Some(PurchaseOrderStatus::Processed)
        );

        // Second attempt finds no PENDING row to move.
        let missed = PurchaseOrderRepository::transition_status(
            &pool,
            po.id,
            PurchaseOrderStatus::Pending,
            PurchaseOrderStatus::Processed,
        )
        .await
        .unwrap();
        assert!(missed.is_none());
    }
}
