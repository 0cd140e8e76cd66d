use crate::db::Database;
use crate::error::{CropOpsError, Result};
use crate::models::{Prediction, Schedule, ScheduleStatus};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use tracing::warn;

// Prediction Queries

impl Database {
    pub fn insert_prediction(&self, prediction: &Prediction) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO predictions
                    (crop_type, crop_days, soil_moisture, temperature_c, humidity_percent,
                     irrigation_needed, confidence, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    prediction.crop_type,
                    prediction.crop_days,
                    prediction.soil_moisture,
                    prediction.temperature_c,
                    prediction.humidity_percent,
                    prediction.irrigation_needed,
                    prediction.confidence,
                    prediction.created_at.to_rfc3339(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_prediction(&self, id: i64) -> Result<Option<Prediction>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM predictions WHERE id = ?1",
                [id],
                row_to_prediction,
            )
            .optional()
            .map_err(Into::into)
        })
    }
}

fn row_to_prediction(row: &Row) -> rusqlite::Result<Prediction> {
    let created_at_str: String = row.get("created_at")?;

    Ok(Prediction {
        id: Some(row.get("id")?),
        crop_type: row.get("crop_type")?,
        crop_days: row.get("crop_days")?,
        soil_moisture: row.get("soil_moisture")?,
        temperature_c: row.get("temperature_c")?,
        humidity_percent: row.get("humidity_percent")?,
        irrigation_needed: row.get("irrigation_needed")?,
        confidence: row.get("confidence")?,
        created_at: parse_timestamp(&created_at_str),
    })
}

// Schedule Queries

impl Database {
    pub fn create_schedule(&self, schedule: &Schedule) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO schedules
                    (prediction_id, status, scheduled_time, executed_at, water_amount_mm,
                     duration_minutes, cancellation_reason, notification_sent, location,
                     recipient, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
                params![
                    schedule.prediction_id,
                    schedule.status.as_str(),
                    schedule.scheduled_time.to_rfc3339(),
                    schedule.executed_at.map(|t| t.to_rfc3339()),
                    schedule.water_amount_mm,
                    schedule.duration_minutes,
                    schedule.cancellation_reason,
                    schedule.notification_sent,
                    schedule.location,
                    schedule.recipient,
                    schedule.created_at.to_rfc3339(),
                    schedule.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_schedule(&self, id: i64) -> Result<Option<Schedule>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM schedules WHERE id = ?1", [id], row_to_schedule)
                .optional()
                .map_err(Into::into)
        })
    }

    /// All pending schedules whose scheduled_time has passed.
    pub fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Schedule>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT * FROM schedules
                WHERE status = 'pending' AND scheduled_time <= ?1
                ORDER BY scheduled_time
                "#,
            )?;
            let schedules = stmt
                .query_map([now.to_rfc3339()], row_to_schedule)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(schedules)
        })
    }

    /// Compare-and-set transition: writes the schedule's mutable fields
    /// only if its stored status still matches `expected`. Returns false
    /// on conflict (another writer got there first).
    pub fn transition(&self, schedule: &Schedule, expected: ScheduleStatus) -> Result<bool> {
        let id = schedule
            .id
            .ok_or_else(|| CropOpsError::InvalidData("Schedule has no ID".into()))?;

        self.with_conn(|conn| {
            let rows = conn.execute(
                r#"
                UPDATE schedules SET
                    status = ?1, scheduled_time = ?2, executed_at = ?3, water_amount_mm = ?4,
                    duration_minutes = ?5, cancellation_reason = ?6, notification_sent = ?7,
                    updated_at = ?8
                WHERE id = ?9 AND status = ?10
                "#,
                params![
                    schedule.status.as_str(),
                    schedule.scheduled_time.to_rfc3339(),
                    schedule.executed_at.map(|t| t.to_rfc3339()),
                    schedule.water_amount_mm,
                    schedule.duration_minutes,
                    schedule.cancellation_reason,
                    schedule.notification_sent,
                    Utc::now().to_rfc3339(),
                    id,
                    expected.as_str(),
                ],
            )?;
            Ok(rows == 1)
        })
    }

    /// Mark a schedule failed with the causal message. Terminal states are
    /// left untouched.
    pub fn mark_failed(&self, id: i64, reason: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let rows = conn.execute(
                r#"
                UPDATE schedules SET
                    status = 'failed', cancellation_reason = ?1, updated_at = ?2
                WHERE id = ?3 AND status IN ('pending', 'postponed', 'executing')
                "#,
                params![reason, Utc::now().to_rfc3339(), id],
            )?;
            Ok(rows == 1)
        })
    }

    /// Re-queue postponed schedules as pending. Their pushed-out
    /// scheduled_time keeps them un-due until it arrives.
    pub fn requeue_postponed(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let rows = conn.execute(
                "UPDATE schedules SET status = 'pending', updated_at = ?1 WHERE status = 'postponed'",
                params![Utc::now().to_rfc3339()],
            )?;
            Ok(rows)
        })
    }

    pub fn recent_schedules(&self, limit: u32) -> Result<Vec<Schedule>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM schedules ORDER BY scheduled_time DESC LIMIT ?1")?;
            let schedules = stmt
                .query_map([limit], row_to_schedule)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(schedules)
        })
    }
}

fn row_to_schedule(row: &Row) -> rusqlite::Result<Schedule> {
    let status_str: String = row.get("status")?;
    let scheduled_time_str: String = row.get("scheduled_time")?;
    let executed_at_str: Option<String> = row.get("executed_at")?;
    let created_at_str: String = row.get("created_at")?;
    let updated_at_str: String = row.get("updated_at")?;

    let status = ScheduleStatus::from_str(&status_str).unwrap_or_else(|| {
        warn!(
            status = %status_str,
            "Unknown schedule status in database, treating as failed"
        );
        ScheduleStatus::Failed
    });

    Ok(Schedule {
        id: Some(row.get("id")?),
        prediction_id: row.get("prediction_id")?,
        status,
        scheduled_time: parse_timestamp(&scheduled_time_str),
        executed_at: executed_at_str.as_deref().map(parse_timestamp),
        water_amount_mm: row.get("water_amount_mm")?,
        duration_minutes: row.get("duration_minutes")?,
        cancellation_reason: row.get("cancellation_reason")?,
        notification_sent: row.get("notification_sent")?,
        location: row.get("location")?,
        recipient: row.get("recipient")?,
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

trait OptionalExt<T> {
    fn optional(self) -> rusqlite::Result<Option<T>>;
}

impl<T> OptionalExt<T> for rusqlite::Result<T> {
    fn optional(self) -> rusqlite::Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_schedule(offset_minutes: i64) -> Schedule {
        Schedule::new(Utc::now() + Duration::minutes(offset_minutes))
            .with_location("New Delhi")
            .with_recipient("farmer-1")
    }

    #[test]
    fn prediction_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let p = Prediction::new("Wheat", 45, 350.0, 28.0, 40.0, true, 0.91).unwrap();
        let id = db.insert_prediction(&p).unwrap();

        let loaded = db.get_prediction(id).unwrap().unwrap();
        assert_eq!(loaded.crop_type, "Wheat");
        assert_eq!(loaded.crop_days, 45);
        assert!(loaded.irrigation_needed);
        assert!((loaded.confidence - 0.91).abs() < 1e-9);
    }

    #[test]
    fn schedule_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let schedule = sample_schedule(-10).with_water(42.5, 85);
        let id = db.create_schedule(&schedule).unwrap();

        let loaded = db.get_schedule(id).unwrap().unwrap();
        assert_eq!(loaded.status, ScheduleStatus::Pending);
        assert_eq!(loaded.water_amount_mm, Some(42.5));
        assert_eq!(loaded.duration_minutes, Some(85));
        assert_eq!(loaded.location.as_deref(), Some("New Delhi"));
        assert!(loaded.executed_at.is_none());
    }

    #[test]
    fn find_due_skips_future_and_non_pending() {
        let db = Database::open_in_memory().unwrap();
        let due_id = db.create_schedule(&sample_schedule(-5)).unwrap();
        db.create_schedule(&sample_schedule(60)).unwrap();

        let mut done = sample_schedule(-5);
        done.status = ScheduleStatus::Completed;
        db.create_schedule(&done).unwrap();

        let due = db.find_due(Utc::now()).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, Some(due_id));
    }

    #[test]
    fn transition_compare_and_set() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_schedule(&sample_schedule(-5)).unwrap();

        let mut schedule = db.get_schedule(id).unwrap().unwrap();
        schedule.status = ScheduleStatus::Cancelled;
        schedule.cancellation_reason = Some("Rain expected (probability: 80%)".into());
        assert!(db.transition(&schedule, ScheduleStatus::Pending).unwrap());

        // Second writer expecting pending loses the race
        let mut stale = schedule.clone();
        stale.status = ScheduleStatus::Executing;
        assert!(!db.transition(&stale, ScheduleStatus::Pending).unwrap());

        let loaded = db.get_schedule(id).unwrap().unwrap();
        assert_eq!(loaded.status, ScheduleStatus::Cancelled);
    }

    #[test]
    fn mark_failed_spares_terminal_states() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_schedule(&sample_schedule(-5)).unwrap();

        assert!(db.mark_failed(id, "actuator offline").unwrap());
        let loaded = db.get_schedule(id).unwrap().unwrap();
        assert_eq!(loaded.status, ScheduleStatus::Failed);
        assert_eq!(loaded.cancellation_reason.as_deref(), Some("actuator offline"));

        // Already terminal: no-op
        assert!(!db.mark_failed(id, "again").unwrap());
    }

    #[test]
    fn requeue_postponed_restores_pending() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_schedule(&sample_schedule(-5)).unwrap();

        let mut schedule = db.get_schedule(id).unwrap().unwrap();
        schedule.status = ScheduleStatus::Postponed;
        schedule.scheduled_time = Utc::now() + Duration::hours(12);
        assert!(db.transition(&schedule, ScheduleStatus::Pending).unwrap());

        assert_eq!(db.requeue_postponed().unwrap(), 1);
        let loaded = db.get_schedule(id).unwrap().unwrap();
        assert_eq!(loaded.status, ScheduleStatus::Pending);
        // Still not due until the pushed-out time arrives
        assert!(db.find_due(Utc::now()).unwrap().is_empty());
    }
}
