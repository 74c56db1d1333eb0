use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use sqlx::types::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::{
    NewInvoice, NewPurchaseOrder, PurchaseOrder, PurchaseOrderRepository, PurchaseOrderStatus,
    UserRole,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_role, CurrentUser};

const FINANCE_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Operations, UserRole::Accounts];

pub async fn list_purchase_orders(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<PurchaseOrder>>> {
    require_role(&user, FINANCE_ROLES)?;
    let orders = PurchaseOrderRepository::list(&state.db).await?;
    Ok(Json(orders))
}

pub async fn create_purchase_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<NewPurchaseOrder>,
) -> AppResult<impl IntoResponse> {
    require_role(&user, FINANCE_ROLES)?;
    payload.validate()?;
    let po = PurchaseOrderRepository::create(&state.db, &payload).await?;
    tracing::info!(po_id = %po.id, po_number = %po.po_number, "registered purchase order");
    Ok((StatusCode::CREATED, Json(po)))
}

pub async fn get_purchase_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrder>> {
    require_role(&user, FINANCE_ROLES)?;
    let po = PurchaseOrderRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("purchase order {id}")))?;
    Ok(Json(po))
}

/// Accounts moves a PENDING order to PROCESSED, the precondition for
/// generating its invoice.
pub async fn process_purchase_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrder>> {
    require_role(&user, &[UserRole::Accounts])?;
    let po = PurchaseOrderRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("purchase order {id}")))?;
    if po.status != PurchaseOrderStatus::Pending {
        return Err(AppError::Conflict(format!(
            "purchase order is {:?}, only PENDING orders can be processed",
            po.status
        )));
    }

    let po = PurchaseOrderRepository::transition_status(
        &state.db,
        id,
        PurchaseOrderStatus::Pending,
        PurchaseOrderStatus::Processed,
    )
    .await?
    .ok_or_else(|| AppError::Conflict("purchase order is no longer PENDING".to_string()))?;
    tracing::info!(po_id = %po.id, "purchase order processed");
    Ok(Json(po))
}

/// Generates the order's single invoice: number it, copy the amount, and move
/// the order to INVOICED, all in one transaction.
pub async fn generate_invoice(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewInvoice>,
) -> AppResult<impl IntoResponse> {
    require_role(&user, &[UserRole::Accounts])?;

    let mut tx = state.db.begin().await?;
    let po = PurchaseOrderRepository::find_by_id_tx(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("purchase order {id}")))?;
    match po.status {
        PurchaseOrderStatus::Processed => {}
        PurchaseOrderStatus::Pending => {
            return Err(AppError::Conflict(
                "the purchase order must be processed before invoicing".to_string(),
            ));
        }
        PurchaseOrderStatus::Invoiced => {
            return Err(AppError::Conflict(
                "an invoice was already generated for this purchase order".to_string(),
            ));
        }
    }

    let number = PurchaseOrderRepository::next_invoice_number_tx(&mut tx).await?;
    let invoice =
        PurchaseOrderRepository::create_invoice_tx(&mut tx, &po, &number, payload.notes.as_deref())
            .await?;
    PurchaseOrderRepository::set_status_tx(&mut tx, id, PurchaseOrderStatus::Invoiced).await?;
    tx.commit().await?;

    tracing::info!(po_id = %id, invoice_number = %invoice.invoice_number, "invoice generated");
    Ok((StatusCode::CREATED, Json(invoice)))
}
