use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub trainee_id: Uuid,
    pub date: Date,
    pub present: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

/// One day's roll call for a batch. Submitting the same date again replaces
/// the marks for the trainees it names.
#[derive(Debug, Deserialize)]
pub struct AttendanceSheet {
    pub date: Date,
    pub records: Vec<AttendanceMark>,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceMark {
    pub trainee_id: Uuid,
    pub present: bool,
}
