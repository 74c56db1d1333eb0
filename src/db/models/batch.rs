use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::{Date, OffsetDateTime};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainingMode {
    Online,
    Offline,
    Hybrid,
}

/// Where a batch's trainer stands on the assignment. `None` on the batch
/// means no trainer has been attached yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl AssignmentStatus {
    /// Legal trainer-driven moves. Rejected and Completed are terminal;
    /// getting out of Rejected takes a reassignment, not a transition.
    pub fn may_become(self, next: AssignmentStatus) -> bool {
        matches!(
            (self, next),
            (AssignmentStatus::Pending, AssignmentStatus::Accepted)
                | (AssignmentStatus::Pending, AssignmentStatus::Rejected)
                | (AssignmentStatus::Accepted, AssignmentStatus::Completed)
        )
    }
}

/// Computed from the batch dates on every read; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl ScheduleStatus {
    /// Date granularity, inclusive on both ends: a batch starting and ending
    /// today is ONGOING.
    pub fn from_dates(start: Date, end: Date, today: Date) -> Self {
        if today < start {
            ScheduleStatus::Upcoming
        } else if today > end {
            ScheduleStatus::Completed
        } else {
            ScheduleStatus::Ongoing
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub training_mode: TrainingMode,
    pub start_date: Date,
    pub end_date: Date,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub meeting_link: Option<String>,
    pub venue: Option<String>,
    pub trainer_id: Option<Uuid>,
    pub purchase_order_id: Option<Uuid>,
    pub assignment_status: Option<AssignmentStatus>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Batch {
    pub fn schedule_status(&self, today: Date) -> ScheduleStatus {
        ScheduleStatus::from_dates(self.start_date, self.end_date, today)
    }

    pub fn into_view(self, today: Date) -> BatchView {
        let schedule_status = self.schedule_status(today);
        BatchView {
            batch: self,
            schedule_status,
        }
    }
}

/// A batch as it leaves the API, with the derived schedule status attached.
#[derive(Debug, Clone, Serialize)]
pub struct BatchView {
    #[serde(flatten)]
    pub batch: Batch,
    pub schedule_status: ScheduleStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewBatch {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    pub training_mode: TrainingMode,
    pub start_date: Date,
    pub end_date: Date,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[validate(url)]
    pub meeting_link: Option<String>,
    pub venue: Option<String>,
    pub trainer_id: Option<Uuid>,
    pub purchase_order_id: Option<Uuid>,
}

/// Full-replace payload for `PUT`. Sending `trainer_id: null` detaches the
/// trainer (and clears the assignment status with it).
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBatch {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    pub training_mode: TrainingMode,
    pub start_date: Date,
    pub end_date: Date,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[validate(url)]
    pub meeting_link: Option<String>,
    pub venue: Option<String>,
    pub trainer_id: Option<Uuid>,
    pub purchase_order_id: Option<Uuid>,
}

/// Cross-field checks shared by create and update: the location fields must
/// agree with the training mode, and the dates must be ordered.
pub fn check_batch_shape(
    mode: TrainingMode,
    meeting_link: Option<&str>,
    venue: Option<&str>,
    start_date: Date,
    end_date: Date,
) -> Result<(), String> {
    if end_date < start_date {
        return Err("end_date must not precede start_date".into());
    }
    match mode {
        TrainingMode::Online => {
            if meeting_link.is_none() {
                return Err("an ONLINE batch requires a meeting_link".into());
            }
            if venue.is_some() {
                return Err("an ONLINE batch must not carry a venue".into());
            }
        }
        TrainingMode::Offline => {
            if venue.is_none() {
                return Err("an OFFLINE batch requires a venue".into());
            }
            if meeting_link.is_some() {
                return Err("an OFFLINE batch must not carry a meeting_link".into());
            }
        }
        TrainingMode::Hybrid => {
            if meeting_link.is_none() || venue.is_none() {
                return Err("a HYBRID batch requires both a meeting_link and a venue".into());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn schedule_status_is_inclusive_at_both_boundaries() {
        let start = date!(2026 - 03 - 02);
        let end = date!(2026 - 03 - 06);

        assert_eq!(
            ScheduleStatus::from_dates(start, end, date!(2026 - 03 - 01)),
            ScheduleStatus::Upcoming
        );
        assert_eq!(
            ScheduleStatus::from_dates(start, end, start),
            ScheduleStatus::Ongoing
        );
        assert_eq!(
            ScheduleStatus::from_dates(start, end, date!(2026 - 03 - 04)),
            ScheduleStatus::Ongoing
        );
        assert_eq!(
            ScheduleStatus::from_dates(start, end, end),
            ScheduleStatus::Ongoing
        );
        assert_eq!(
            ScheduleStatus::from_dates(start, end, date!(2026 - 03 - 07)),
            ScheduleStatus::Completed
        );
    }

    #[test]
    fn single_day_batch_is_ongoing_on_that_day() {
        let day = date!(2026 - 05 - 11);
        assert_eq!(
            ScheduleStatus::from_dates(day, day, day),
            ScheduleStatus::Ongoing
        );
    }

    #[test]
    fn assignment_transitions_follow_the_lifecycle() {
        use AssignmentStatus::*;

        assert!(Pending.may_become(Accepted));
        assert!(Pending.may_become(Rejected));
        assert!(Accepted.may_become(Completed));

        assert!(!Accepted.may_become(Rejected));
        assert!(!Rejected.may_become(Accepted));
        assert!(!Completed.may_become(Pending));
        assert!(!Pending.may_become(Completed));
    }

    #[test]
    fn location_fields_must_match_the_mode() {
        let start = date!(2026 - 01 - 05);
        let end = date!(2026 - 01 - 09);

        assert!(check_batch_shape(
            TrainingMode::Online,
            Some("https://meet.example.com/abc"),
            None,
            start,
            end
        )
        .is_ok());
        assert!(check_batch_shape(TrainingMode::Online, None, None, start, end).is_err());
        assert!(check_batch_shape(
            TrainingMode::Online,
            Some("https://meet.example.com/abc"),
            Some("Hall B"),
            start,
            end
        )
        .is_err());

        assert!(check_batch_shape(TrainingMode::Offline, None, Some("Hall B"), start, end).is_ok());
        assert!(check_batch_shape(TrainingMode::Offline, None, None, start, end).is_err());

        assert!(check_batch_shape(
            TrainingMode::Hybrid,
            Some("https://meet.example.com/abc"),
            Some("Hall B"),
            start,
            end
        )
        .is_ok());
        assert!(
            check_batch_shape(TrainingMode::Hybrid, Some("https://x.test"), None, start, end)
                .is_err()
        );

        assert!(check_batch_shape(
            TrainingMode::Offline,
            None,
            Some("Hall B"),
            end,
            start
        )
        .is_err());
    }
}
