use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{get_invoice, list_invoices, update_invoice_status};
use crate::app_state::AppState;

pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices))
        .route("/invoices/{id}", get(get_invoice))
        .route("/invoices/{id}/status", post(update_invoice_status))
}
