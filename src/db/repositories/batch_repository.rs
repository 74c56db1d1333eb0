use sqlx::types::Uuid;
use sqlx::{Sqlite, SqlitePool, Transaction};
use time::{Date, OffsetDateTime};

use crate::db::error::DatabaseError;
use crate::db::models::{
    AssignmentStatus, AttendanceMark, AttendanceRecord, Batch, Material, NewBatch, NewMaterial,
    NewTrainee, Trainee, UpdateBatch,
};

pub struct BatchRepository;

impl BatchRepository {
    /// Inserts a batch. Attaching a trainer at creation time starts the
    /// assignment workflow at PENDING.
    pub async fn create_tx(
        tx: &mut Transaction<'_, Sqlite>,
        data: &NewBatch,
    ) -> Result<Batch, DatabaseError> {
        let now = OffsetDateTime::now_utc();
        let assignment_status = data.trainer_id.map(|_| AssignmentStatus::Pending);
        let batch = sqlx::query_as::<_, Batch>(
            r#"
            INSERT INTO batches
                (id, name, description, training_mode, start_date, end_date,
                 start_time, end_time, meeting_link, venue, trainer_id,
                 purchase_order_id, assignment_status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.training_mode)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(&data.start_time)
        .bind(&data.end_time)
        .bind(&data.meeting_link)
        .bind(&data.venue)
        .bind(data.trainer_id)
        .bind(data.purchase_order_id)
        .bind(assignment_status)
        .bind(now)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;
        Ok(batch)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Batch>, DatabaseError> {
        let batch = sqlx::query_as::<_, Batch>("SELECT * FROM batches WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(batch)
    }

    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Batch>, DatabaseError> {
        let batches =
            sqlx::query_as::<_, Batch>("SELECT * FROM batches ORDER BY start_date, name")
                .fetch_all(pool)
                .await?;
        Ok(batches)
    }

    pub async fn list_by_trainer(
        pool: &SqlitePool,
        trainer_id: Uuid,
    ) -> Result<Vec<Batch>, DatabaseError> {
        let batches = sqlx::query_as::<_, Batch>(
            "SELECT * FROM batches WHERE trainer_id = ? ORDER BY start_date, name",
        )
        .bind(trainer_id)
        .fetch_all(pool)
        .await?;
        Ok(batches)
    }

    /// Full replace. The assignment status follows the trainer field: keeping
    /// the trainer keeps the status, swapping the trainer restarts at
    /// PENDING, detaching clears it.
    pub async fn update_tx(
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        data: &UpdateBatch,
    ) -> Result<Batch, DatabaseError> {
        let existing = sqlx::query_as::<_, Batch>("SELECT * FROM batches WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(DatabaseError::NotFound)?;

        let assignment_status = match data.trainer_id {
            None => None,
            Some(t) if existing.trainer_id == Some(t) => existing.assignment_status,
            Some(_) => Some(AssignmentStatus::Pending),
        };

        let batch = sqlx::query_as::<_, Batch>(
            r#"
            UPDATE batches SET
                name = ?, description = ?, training_mode = ?, start_date = ?,
                end_date = ?, start_time = ?, end_time = ?, meeting_link = ?,
                venue = ?, trainer_id = ?, purchase_order_id = ?,
                assignment_status = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.training_mode)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(&data.start_time)
        .bind(&data.end_time)
        .bind(&data.meeting_link)
        .bind(&data.venue)
        .bind(data.trainer_id)
        .bind(data.purchase_order_id)
        .bind(assignment_status)
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(batch)
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM batches WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    /// Assignment move guarded by the expected current status. `None` means
    /// the assignment was not in `from` when the update ran; a caller acting
    /// on a stale read must not write anything else.
    pub async fn transition_assignment_tx(
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        from: AssignmentStatus,
        to: AssignmentStatus,
    ) -> Result<Option<Batch>, DatabaseError> {
        let batch = sqlx::query_as::<_, Batch>(
            r#"
            UPDATE batches SET assignment_status = ?, updated_at = ?
            WHERE id = ? AND assignment_status = ?
            RETURNING *
            "#,
        )
        .bind(to)
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .bind(from)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(batch)
    }

    pub async fn add_trainee(
        pool: &SqlitePool,
        batch_id: Uuid,
        data: &NewTrainee,
    ) -> Result<Trainee, DatabaseError> {
        let trainee = sqlx::query_as::<_, Trainee>(
            r#"
            INSERT INTO trainees (id, batch_id, name, email, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(batch_id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(pool)
        .await?;
        Ok(trainee)
    }

    pub async fn list_trainees(
        pool: &SqlitePool,
        batch_id: Uuid,
    ) -> Result<Vec<Trainee>, DatabaseError> {
        let trainees = sqlx::query_as::<_, Trainee>(
            "SELECT * FROM trainees WHERE batch_id = ? ORDER BY created_at",
        )
        .bind(batch_id)
        .fetch_all(pool)
        .await?;
        Ok(trainees)
    }

    pub async fn remove_trainee(
        pool: &SqlitePool,
        batch_id: Uuid,
        trainee_id: Uuid,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM trainees WHERE id = ? AND batch_id = ?")
            .bind(trainee_id)
            .bind(batch_id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    pub async fn add_material(
        pool: &SqlitePool,
        batch_id: Uuid,
        uploaded_by: Uuid,
        data: &NewMaterial,
    ) -> Result<Material, DatabaseError> {
        let material = sqlx::query_as::<_, Material>(
            r#"
            INSERT INTO materials (id, batch_id, uploaded_by, title, url, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(batch_id)
        .bind(uploaded_by)
        .bind(&data.title)
        .bind(&data.url)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(pool)
        .await?;
        Ok(material)
    }

    pub async fn list_materials(
        pool: &SqlitePool,
        batch_id: Uuid,
    ) -> Result<Vec<Material>, DatabaseError> {
        let materials = sqlx::query_as::<_, Material>(
            "SELECT * FROM materials WHERE batch_id = ? ORDER BY created_at DESC",
        )
        .bind(batch_id)
        .fetch_all(pool)
        .await?;
        Ok(materials)
    }

    /// Upserts one mark of a day's attendance sheet. Re-marking the same
    /// trainee and date overwrites the earlier mark.
    pub async fn record_attendance_tx(
        tx: &mut Transaction<'_, Sqlite>,
        batch_id: Uuid,
        date: Date,
        mark: &AttendanceMark,
    ) -> Result<AttendanceRecord, DatabaseError> {
        let on_roster = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM trainees WHERE id = ? AND batch_id = ?)",
        )
        .bind(mark.trainee_id)
        .bind(batch_id)
        .fetch_one(&mut **tx)
        .await?;
        if !on_roster {
            return Err(DatabaseError::InvalidInput(format!(
                "trainee {} is not on this batch's roster",
                mark.trainee_id
            )));
        }

        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            INSERT INTO attendance_records (id, batch_id, trainee_id, date, present, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (batch_id, trainee_id, date)
            DO UPDATE SET present = excluded.present, recorded_at = excluded.recorded_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(batch_id)
        .bind(mark.trainee_id)
        .bind(date)
        .bind(mark.present)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&mut **tx)
        .await?;
        Ok(record)
    }

    pub async fn list_attendance(
        pool: &SqlitePool,
        batch_id: Uuid,
    ) -> Result<Vec<AttendanceRecord>, DatabaseError> {
        let records = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendance_records WHERE batch_id = ? ORDER BY date, recorded_at",
        )
        .bind(batch_id)
        .fetch_all(pool)
        .await?;
        Ok(records)
    }
}
