use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use secrecy::SecretBox;
use serde::Serialize;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::{NewUser, User, UserRepository, UserRole};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_role, CurrentUser};

pub async fn list_users(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<User>>> {
    require_role(&user, &[UserRole::Admin])?;
    let users = UserRepository::list(&state.db).await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<NewUser>,
) -> AppResult<impl IntoResponse> {
    require_role(&user, &[UserRole::Admin])?;
    payload.validate()?;
    let created = UserRepository::create(&state.db, &payload).await?;
    tracing::info!(user_id = %created.id, role = ?created.role, "admin created user");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_trainers(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<User>>> {
    require_role(&user, &[UserRole::Admin, UserRole::Operations])?;
    let trainers = UserRepository::list_by_role(&state.db, UserRole::Trainer).await?;
    Ok(Json(trainers))
}

#[derive(Debug, Serialize)]
pub struct TestTrainerResponse {
    pub user: User,
    pub password: String,
}

/// Development helper: mints a ready-to-use trainer account and hands back
/// its credentials. Outside development environments the route plays dead.
pub async fn create_test_trainer(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    if !state.env.is_development() {
        return Err(AppError::NotFound("not found".to_string()));
    }

    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let password = "trainer123".to_string();
    let data = NewUser {
        email: format!("trainer-{}@test.local", &suffix[..8]),
        password: SecretBox::new(Box::new(password.clone())),
        first_name: "Test".to_string(),
        last_name: "Trainer".to_string(),
        role: UserRole::Trainer,
        specialization: Some("General".to_string()),
        availability: Some("weekdays".to_string()),
        department: None,
    };
    let user = UserRepository::create(&state.db, &data).await?;
    tracing::info!(user_id = %user.id, email = %user.email, "created test trainer");

    Ok((
        StatusCode::CREATED,
        Json(TestTrainerResponse { user, password }),
    ))
}
