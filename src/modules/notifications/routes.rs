use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::{delete_notification, list_notifications, mark_notification_read};
use crate::app_state::AppState;

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/{id}/read", post(mark_notification_read))
        .route("/notifications/{id}", delete(delete_notification))
}
