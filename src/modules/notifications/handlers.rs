use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use sqlx::types::Uuid;

use crate::app_state::AppState;
use crate::db::{Notification, NotificationRepository, UserRole};
use crate::error::AppResult;
use crate::middleware::auth::{require_role, CurrentUser};

const NOTIFICATION_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Operations];

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub unread_only: Option<bool>,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    require_role(&user, NOTIFICATION_ROLES)?;
    let notifications =
        NotificationRepository::list(&state.db, query.unread_only.unwrap_or(false)).await?;
    Ok(Json(notifications))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Notification>> {
    require_role(&user, NOTIFICATION_ROLES)?;
    let notification = NotificationRepository::mark_read(&state.db, id).await?;
    Ok(Json(notification))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_role(&user, NOTIFICATION_ROLES)?;
    NotificationRepository::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
