use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use sqlx::types::Uuid;
use sqlx::{Sqlite, Transaction};
use time::{Date, OffsetDateTime};
use validator::Validate;

use crate::app_state::AppState;
use crate::db::{
    check_batch_shape, AssignmentStatus, AttendanceRecord, AttendanceSheet, Batch,
    BatchRepository, BatchView, Material, NewBatch, NewMaterial, NewNotification, NewTrainee,
    Notification, NotificationRepository, NotificationType, PurchaseOrderRepository, Trainee,
    UpdateBatch, UserRepository, UserRole,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_role, CurrentUser};

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Admin and operations see every batch; a trainer sees a batch only when it
/// is assigned to them.
fn ensure_batch_access(user: &CurrentUser, batch: &Batch) -> Result<(), AppError> {
    match user.0.role {
        UserRole::Admin | UserRole::Operations => Ok(()),
        UserRole::Trainer if batch.trainer_id == Some(user.0.id) => Ok(()),
        UserRole::Trainer => Err(AppError::Authorization(
            "trainers can only access their own batches".to_string(),
        )),
        role => Err(AppError::Authorization(format!(
            "the {role:?} role may not access batches"
        ))),
    }
}

fn ensure_assigned_trainer(user: &CurrentUser, batch: &Batch) -> Result<(), AppError> {
    require_role(user, &[UserRole::Trainer])?;
    if batch.trainer_id != Some(user.0.id) {
        return Err(AppError::Authorization(
            "only the assigned trainer may do this".to_string(),
        ));
    }
    Ok(())
}

/// Referential checks for the create/update payloads: the trainer must be an
/// existing TRAINER account, the purchase order must exist.
async fn ensure_references(
    state: &AppState,
    trainer_id: Option<Uuid>,
    purchase_order_id: Option<Uuid>,
) -> Result<(), AppError> {
    if let Some(id) = trainer_id {
        let trainer = UserRepository::find_by_id(&state.db, id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("unknown trainer {id}")))?;
        if trainer.role != UserRole::Trainer {
            return Err(AppError::Validation(format!(
                "user {id} is not a trainer"
            )));
        }
    }
    if let Some(id) = purchase_order_id {
        PurchaseOrderRepository::find_by_id(&state.db, id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("unknown purchase order {id}")))?;
    }
    Ok(())
}

/// Appends a PURCHASE_ORDER_NEEDED notification for a batch that has no
/// purchase order, unless an unread one for the batch is already waiting.
async fn note_missing_purchase_order(
    tx: &mut Transaction<'_, Sqlite>,
    batch: &Batch,
) -> Result<Option<Notification>, AppError> {
    if batch.purchase_order_id.is_some() {
        return Ok(None);
    }
    let already_waiting = NotificationRepository::exists_unread_for_batch_tx(
        tx,
        batch.id,
        NotificationType::PurchaseOrderNeeded,
    )
    .await?;
    if already_waiting {
        return Ok(None);
    }
    let notification = NotificationRepository::create_tx(
        tx,
        &NewNotification {
            notification_type: NotificationType::PurchaseOrderNeeded,
            message: format!("Batch \"{}\" has no purchase order attached", batch.name),
            batch_id: Some(batch.id),
            trainer_id: None,
        },
    )
    .await?;
    Ok(Some(notification))
}

pub async fn list_batches(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<BatchView>>> {
    require_role(
        &user,
        &[UserRole::Admin, UserRole::Operations, UserRole::Trainer],
    )?;
    let batches = match user.0.role {
        UserRole::Trainer => BatchRepository::list_by_trainer(&state.db, user.0.id).await?,
        _ => BatchRepository::list_all(&state.db).await?,
    };
    let now = today();
    let views = batches.into_iter().map(|b| b.into_view(now)).collect();
    Ok(Json(views))
}

pub async fn create_batch(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<NewBatch>,
) -> AppResult<impl IntoResponse> {
    require_role(&user, &[UserRole::Admin, UserRole::Operations])?;
    payload.validate()?;
    check_batch_shape(
        payload.training_mode,
        payload.meeting_link.as_deref(),
        payload.venue.as_deref(),
        payload.start_date,
        payload.end_date,
    )
    .map_err(AppError::Validation)?;
    ensure_references(&state, payload.trainer_id, payload.purchase_order_id).await?;

    let mut tx = state.db.begin().await?;
    let batch = BatchRepository::create_tx(&mut tx, &payload).await?;
    let notification = note_missing_purchase_order(&mut tx, &batch).await?;
    tx.commit().await?;

    if let Some(notification) = &notification {
        state.broadcast_notification(notification);
    }
    tracing::info!(batch_id = %batch.id, name = %batch.name, "created batch");
    Ok((StatusCode::CREATED, Json(batch.into_view(today()))))
}

#[derive(Debug, Serialize)]
pub struct BatchDetail {
    #[serde(flatten)]
    pub batch: BatchView,
    pub trainees: Vec<Trainee>,
    pub materials: Vec<Material>,
}

pub async fn get_batch(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BatchDetail>> {
    let batch = BatchRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("batch {id}")))?;
    ensure_batch_access(&user, &batch)?;

    let trainees = BatchRepository::list_trainees(&state.db, id).await?;
    let materials = BatchRepository::list_materials(&state.db, id).await?;
    Ok(Json(BatchDetail {
        batch: batch.into_view(today()),
        trainees,
        materials,
    }))
}

pub async fn update_batch(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBatch>,
) -> AppResult<Json<BatchView>> {
    require_role(&user, &[UserRole::Admin, UserRole::Operations])?;
    payload.validate()?;
    check_batch_shape(
        payload.training_mode,
        payload.meeting_link.as_deref(),
        payload.venue.as_deref(),
        payload.start_date,
        payload.end_date,
    )
    .map_err(AppError::Validation)?;
    ensure_references(&state, payload.trainer_id, payload.purchase_order_id).await?;

    let mut tx = state.db.begin().await?;
    let batch = BatchRepository::update_tx(&mut tx, id, &payload).await?;
    let notification = note_missing_purchase_order(&mut tx, &batch).await?;
    tx.commit().await?;

    if let Some(notification) = &notification {
        state.broadcast_notification(notification);
    }
    Ok(Json(batch.into_view(today())))
}

pub async fn delete_batch(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_role(&user, &[UserRole::Admin, UserRole::Operations])?;
    BatchRepository::delete(&state.db, id).await?;
    tracing::info!(batch_id = %id, "deleted batch");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_trainees(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Trainee>>> {
    require_role(&user, &[UserRole::Admin, UserRole::Operations])?;
    BatchRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("batch {id}")))?;
    let trainees = BatchRepository::list_trainees(&state.db, id).await?;
    Ok(Json(trainees))
}

pub async fn add_trainee(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewTrainee>,
) -> AppResult<impl IntoResponse> {
    require_role(&user, &[UserRole::Admin, UserRole::Operations])?;
    payload.validate()?;
    BatchRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("batch {id}")))?;
    let trainee = BatchRepository::add_trainee(&state.db, id, &payload).await?;
    Ok((StatusCode::CREATED, Json(trainee)))
}

pub async fn remove_trainee(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, trainee_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    require_role(&user, &[UserRole::Admin, UserRole::Operations])?;
    BatchRepository::remove_trainee(&state.db, id, trainee_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn transition_assignment(
    state: &AppState,
    user: &CurrentUser,
    batch_id: Uuid,
    target: AssignmentStatus,
) -> Result<(Batch, Option<Notification>), AppError> {
    let batch = BatchRepository::find_by_id(&state.db, batch_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("batch {batch_id}")))?;
    ensure_assigned_trainer(user, &batch)?;

    let current = batch.assignment_status.ok_or_else(|| {
        AppError::Conflict("this batch has no assignment to act on".to_string())
    })?;
    if !current.may_become(target) {
        return Err(AppError::Conflict(format!(
            "assignment cannot move from {current:?} to {target:?}"
        )));
    }

    let mut tx = state.db.begin().await?;
    let batch = BatchRepository::transition_assignment_tx(&mut tx, batch_id, current, target)
        .await?
        .ok_or_else(|| {
            AppError::Conflict("the assignment status changed underneath".to_string())
        })?;
    let notification = if target == AssignmentStatus::Rejected {
        // The decline and its notification commit together.
        Some(
            NotificationRepository::create_tx(
                &mut tx,
                &NewNotification {
                    notification_type: NotificationType::TrainingDeclined,
                    message: format!(
                        "{} declined the training assignment for batch \"{}\"",
                        user.0.full_name(),
                        batch.name
                    ),
                    batch_id: Some(batch.id),
                    trainer_id: Some(user.0.id),
                },
            )
            .await?,
        )
    } else {
        None
    };
    tx.commit().await?;

    Ok((batch, notification))
}

pub async fn accept_assignment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BatchView>> {
    let (batch, _) = transition_assignment(&state, &user, id, AssignmentStatus::Accepted).await?;
    tracing::info!(batch_id = %id, trainer_id = %user.0.id, "assignment accepted");
    Ok(Json(batch.into_view(today())))
}

pub async fn decline_assignment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BatchView>> {
    let (batch, notification) =
        transition_assignment(&state, &user, id, AssignmentStatus::Rejected).await?;
    if let Some(notification) = &notification {
        state.broadcast_notification(notification);
    }
    tracing::info!(batch_id = %id, trainer_id = %user.0.id, "assignment declined");
    Ok(Json(batch.into_view(today())))
}

pub async fn complete_assignment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BatchView>> {
    let (batch, _) = transition_assignment(&state, &user, id, AssignmentStatus::Completed).await?;
    tracing::info!(batch_id = %id, trainer_id = %user.0.id, "assignment completed");
    Ok(Json(batch.into_view(today())))
}

pub async fn list_materials(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Material>>> {
    let batch = BatchRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("batch {id}")))?;
    ensure_batch_access(&user, &batch)?;
    let materials = BatchRepository::list_materials(&state.db, id).await?;
    Ok(Json(materials))
}

pub async fn add_material(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewMaterial>,
) -> AppResult<impl IntoResponse> {
    let batch = BatchRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("batch {id}")))?;
    ensure_assigned_trainer(&user, &batch)?;
    payload.validate()?;
    let material = BatchRepository::add_material(&state.db, id, user.0.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(material)))
}

pub async fn get_attendance(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<AttendanceRecord>>> {
    let batch = BatchRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("batch {id}")))?;
    ensure_batch_access(&user, &batch)?;
    let records = BatchRepository::list_attendance(&state.db, id).await?;
    Ok(Json(records))
}

/// Records one day's sheet in a single transaction; a bad mark (a trainee
/// from another batch) rejects the whole sheet.
pub async fn record_attendance(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(sheet): Json<AttendanceSheet>,
) -> AppResult<Json<Vec<AttendanceRecord>>> {
    let batch = BatchRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("batch {id}")))?;
    ensure_assigned_trainer(&user, &batch)?;
    if sheet.records.is_empty() {
        return Err(AppError::Validation(
            "an attendance sheet needs at least one record".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;
    let mut recorded = Vec::with_capacity(sheet.records.len());
    for mark in &sheet.records {
        let record = BatchRepository::record_attendance_tx(&mut tx, id, sheet.date, mark).await?;
        recorded.push(record);
    }
    tx.commit().await?;
    Ok(Json(recorded))
}
