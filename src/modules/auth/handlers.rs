use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse, Json},
};
use secrecy::ExposeSecret;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::{NewUser, User, UserLogin, UserRepository};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{session_token_from_headers, CurrentUser, SESSION_COOKIE};

/// Self-service registration. The chosen role is fixed for the account's
/// lifetime.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let user = UserRepository::create(&state.db, &payload).await?;
    tracing::info!(user_id = %user.id, role = ?user.role, "registered user");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<UserLogin>,
) -> AppResult<impl IntoResponse> {
    let user = UserRepository::verify_credentials(
        &state.db,
        &payload.email,
        payload.password.expose_secret(),
    )
    .await?
    .ok_or_else(|| AppError::Authentication("invalid email or password".to_string()))?;

    let ttl_hours = state.env.app.session_ttl_hours;
    let session = UserRepository::create_session(&state.db, user.id, ttl_hours).await?;

    let cookie = format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.token,
        ttl_hours * 3600
    );
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Json(user)))
}

/// Revokes the presented session, if any. Always clears the cookie, so a
/// stale browser state cannot keep a dead token around.
pub async fn logout(State(state): State<AppState>, request: Request) -> AppResult<impl IntoResponse> {
    if let Some(token) = session_token_from_headers(request.headers()) {
        UserRepository::delete_session(&state.db, token).await?;
    }
    let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(SET_COOKIE, cookie)]),
    ))
}

pub async fn me(user: CurrentUser) -> Json<User> {
    Json(user.0)
}
