use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::{
    accept_assignment, add_material, add_trainee, complete_assignment, create_batch,
    decline_assignment, delete_batch, get_attendance, get_batch, list_batches, list_materials,
    list_trainees, record_attendance, remove_trainee, update_batch,
};
use crate::app_state::AppState;

pub fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/batches", get(list_batches).post(create_batch))
        .route(
            "/batches/{id}",
            get(get_batch).put(update_batch).delete(delete_batch),
        )
        .route("/batches/{id}/trainees", get(list_trainees).post(add_trainee))
        .route("/batches/{id}/trainees/{trainee_id}", delete(remove_trainee))
        .route("/batches/{id}/assignment/accept", post(accept_assignment))
        .route("/batches/{id}/assignment/decline", post(decline_assignment))
        .route("/batches/{id}/assignment/complete", post(complete_assignment))
        .route("/batches/{id}/materials", get(list_materials).post(add_material))
        .route("/batches/{id}/attendance", get(get_attendance).post(record_attendance))
}
