use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::COOKIE, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use sqlx::types::Uuid;

use crate::app_state::AppState;
use crate::db::{User, UserRepository, UserRole};
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "tms_session";

/// The authenticated user for this request. Inserted into the request
/// extensions by `session_middleware`; handlers pull it back out through the
/// extractor impl below.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Resolves the session cookie to a user on every request. Requests without
/// a (valid, unexpired) session simply carry no `CurrentUser`; rejecting them
/// is the extractor's job, so that public routes stay public.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = session_token_from_headers(request.headers()) {
        match UserRepository::find_user_by_session(&state.db, token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(CurrentUser(user));
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!("session lookup failed: {err}");
            }
        }
    }
    next.run(request).await
}

pub(crate) fn session_token_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    for value in headers.get_all(COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        for pair in raw.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            if parts.next() == Some(SESSION_COOKIE) {
                if let Some(token) = parts.next().and_then(|v| Uuid::parse_str(v.trim()).ok()) {
                    return Some(token);
                }
            }
        }
    }
    None
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Authentication("a valid session is required".to_string()))
    }
}

/// Role gate for handlers whose route is limited to an allow-list.
pub fn require_role(user: &CurrentUser, allowed: &[UserRole]) -> Result<(), AppError> {
    if allowed.contains(&user.0.role) {
        Ok(())
    } else {
        Err(AppError::Authorization(format!(
            "the {:?} role may not perform this operation",
            user.0.role
        )))
    }
}
