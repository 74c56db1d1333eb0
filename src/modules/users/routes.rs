use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{create_test_trainer, create_user, list_trainers, list_users};
use crate::app_state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/trainers", get(list_trainers))
        .route("/test-trainer", post(create_test_trainer))
}
