use axum::{
    extract::{Path, State},
    response::Json,
};
use sqlx::types::Uuid;

use crate::app_state::AppState;
use crate::db::{Invoice, PurchaseOrderRepository, UpdateInvoiceStatus, UserRole};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_role, CurrentUser};

const FINANCE_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Operations, UserRole::Accounts];

pub async fn list_invoices(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Invoice>>> {
    require_role(&user, FINANCE_ROLES)?;
    let invoices = PurchaseOrderRepository::list_invoices(&state.db).await?;
    Ok(Json(invoices))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Invoice>> {
    require_role(&user, FINANCE_ROLES)?;
    let invoice = PurchaseOrderRepository::find_invoice(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("invoice {id}")))?;
    Ok(Json(invoice))
}

/// Settlement bookkeeping: PENDING → PAID | OVERDUE, OVERDUE → PAID. PAID is
/// final; anything else is a conflict.
pub async fn update_invoice_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceStatus>,
) -> AppResult<Json<Invoice>> {
    require_role(&user, &[UserRole::Accounts])?;
    let invoice = PurchaseOrderRepository::find_invoice(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("invoice {id}")))?;
    if !invoice.status.may_become(payload.status) {
        return Err(AppError::Conflict(format!(
            "invoice cannot move from {:?} to {:?}",
            invoice.status, payload.status
        )));
    }

    let invoice = PurchaseOrderRepository::transition_invoice_status(
        &state.db,
        id,
        invoice.status,
        payload.status,
    )
    .await?
    .ok_or_else(|| AppError::Conflict("the invoice status changed underneath".to_string()))?;
    tracing::info!(invoice_id = %id, status = ?invoice.status, "invoice status updated");
    Ok(Json(invoice))
}
