use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_purchase_order, generate_invoice, get_purchase_order, list_purchase_orders,
    process_purchase_order,
};
use crate::app_state::AppState;

pub fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/purchase-orders",
            get(list_purchase_orders).post(create_purchase_order),
        )
        .route("/purchase-orders/{id}", get(get_purchase_order))
        .route("/purchase-orders/{id}/process", post(process_purchase_order))
        .route("/purchase-orders/{id}/invoice", post(generate_invoice))
}
