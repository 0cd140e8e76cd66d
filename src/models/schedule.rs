use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleStatus {
    Pending,
    Cancelled,
    Postponed,
    Executing,
    Completed,
    Failed,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "pending",
            ScheduleStatus::Cancelled => "cancelled",
            ScheduleStatus::Postponed => "postponed",
            ScheduleStatus::Executing => "executing",
            ScheduleStatus::Completed => "completed",
            ScheduleStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().trim() {
            "pending" => Some(ScheduleStatus::Pending),
            "cancelled" => Some(ScheduleStatus::Cancelled),
            "postponed" => Some(ScheduleStatus::Postponed),
            "executing" => Some(ScheduleStatus::Executing),
            "completed" => Some(ScheduleStatus::Completed),
            "failed" => Some(ScheduleStatus::Failed),
            _ => None,
        }
    }

    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScheduleStatus::Cancelled | ScheduleStatus::Completed | ScheduleStatus::Failed
        )
    }

}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An irrigation schedule record. Mutated only through the decision
/// engine's compare-and-set transitions; retained for audit once terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Option<i64>,
    pub prediction_id: Option<i64>,
    pub status: ScheduleStatus,
    pub scheduled_time: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    /// mm of water to apply; persisted before the schedule enters executing.
    pub water_amount_mm: Option<f64>,
    pub duration_minutes: Option<u32>,
    /// Set on cancel, postpone, and failure.
    pub cancellation_reason: Option<String>,
    pub notification_sent: bool,
    pub location: Option<String>,
    pub recipient: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn new(scheduled_time: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            prediction_id: None,
            status: ScheduleStatus::Pending,
            scheduled_time,
            executed_at: None,
            water_amount_mm: None,
            duration_minutes: None,
            cancellation_reason: None,
            notification_sent: false,
            location: None,
            recipient: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_prediction(mut self, prediction_id: i64) -> Self {
        self.prediction_id = Some(prediction_id);
        self
    }

    pub fn with_water(mut self, amount_mm: f64, duration_minutes: u32) -> Self {
        self.water_amount_mm = Some(amount_mm);
        self.duration_minutes = Some(duration_minutes);
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_recipient(mut self, recipient: &str) -> Self {
        self.recipient = Some(recipient.to_string());
        self
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ScheduleStatus::Pending && self.scheduled_time <= now
    }
}
