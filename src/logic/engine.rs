use crate::actuator::Actuator;
use crate::datasources::ForecastProvider;
use crate::db::Database;
use crate::error::{CropOpsError, Result};
use crate::logic::threshold::needs_irrigation;
use crate::logic::water::compute_water_requirement;
use crate::models::{Prediction, Schedule, ScheduleStatus};
use crate::notify::Notifier;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Hours a postponed schedule is pushed out before re-queueing.
pub const POSTPONE_HOURS: i64 = 12;
/// Application rate used to derive a run duration from an amount.
const MINUTES_PER_MM: f64 = 2.0;

/// Decision branch taken for one schedule. Policy outcomes are not
/// errors; collaborator failures surface as Err and are routed to the
/// failed state by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Precondition not met (already evaluated, or lost a transition race).
    Skipped,
    Cancelled,
    Postponed,
    Completed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Skipped => "skipped",
            Outcome::Cancelled => "cancelled",
            Outcome::Postponed => "postponed",
            Outcome::Completed => "completed",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub default_location: String,
    pub default_recipient: String,
    pub forecast_timeout: std::time::Duration,
    pub actuator_timeout: std::time::Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_location: "New Delhi".into(),
            default_recipient: "operator".into(),
            forecast_timeout: std::time::Duration::from_secs(10),
            actuator_timeout: std::time::Duration::from_secs(120),
        }
    }
}

/// Per-schedule decision state machine. Collaborators are injected so
/// tests can substitute each boundary.
pub struct DecisionEngine {
    db: Database,
    forecast: Arc<dyn ForecastProvider>,
    notifier: Arc<dyn Notifier>,
    actuator: Arc<dyn Actuator>,
    settings: EngineSettings,
}

impl DecisionEngine {
    pub fn new(
        db: Database,
        forecast: Arc<dyn ForecastProvider>,
        notifier: Arc<dyn Notifier>,
        actuator: Arc<dyn Actuator>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            db,
            forecast,
            notifier,
            actuator,
            settings,
        }
    }

    /// Run the decision transition for one schedule. Idempotent against
    /// duplicate dispatch: anything not pending is a no-op, and every
    /// state change is a compare-and-set against the status the engine
    /// last observed.
    pub async fn evaluate(&self, schedule_id: i64, now: DateTime<Utc>) -> Result<Outcome> {
        let mut schedule = self
            .db
            .get_schedule(schedule_id)?
            .ok_or_else(|| CropOpsError::NotFound(format!("Schedule {}", schedule_id)))?;

        if schedule.status != ScheduleStatus::Pending {
            tracing::debug!(
                schedule_id,
                status = %schedule.status,
                terminal = schedule.status.is_terminal(),
                "Schedule not pending, skipping"
            );
            return Ok(Outcome::Skipped);
        }

        let prediction = match schedule.prediction_id {
            Some(pid) => self.db.get_prediction(pid)?,
            None => None,
        };

        let location = schedule
            .location
            .clone()
            .unwrap_or_else(|| self.settings.default_location.clone());

        // Rain check. A provider failure is an error outcome, never
        // silently treated as a dry forecast.
        let outlook = tokio::time::timeout(
            self.settings.forecast_timeout,
            self.forecast.forecast(&location),
        )
        .await
        .map_err(|_| CropOpsError::Timeout(format!("Rain forecast for {}", location)))??;

        if outlook.rain_expected {
            schedule.status = ScheduleStatus::Cancelled;
            schedule.cancellation_reason = Some(format!(
                "Rain expected (probability: {}%)",
                outlook.probability_percent
            ));
            schedule.notification_sent = true;
            if !self.db.transition(&schedule, ScheduleStatus::Pending)? {
                return Ok(Outcome::Skipped);
            }
            tracing::info!(schedule_id, probability = outlook.probability_percent,
                "Schedule cancelled, rain expected");
            self.notify(
                &schedule,
                &format!(
                    "Irrigation cancelled - Rain expected ({}%)",
                    outlook.probability_percent
                ),
            )
            .await;
            return Ok(Outcome::Cancelled);
        }

        // Moisture check. A schedule with no linked prediction proceeds to
        // irrigation (long-standing fallback, kept deliberately).
        let soil_ok = match &prediction {
            Some(p) => !needs_irrigation(p.soil_moisture, &p.crop_type),
            None => false,
        };

        if soil_ok {
            schedule.status = ScheduleStatus::Postponed;
            schedule.scheduled_time = now + Duration::hours(POSTPONE_HOURS);
            schedule.cancellation_reason = Some("Soil moisture adequate".into());
            schedule.notification_sent = true;
            if !self.db.transition(&schedule, ScheduleStatus::Pending)? {
                return Ok(Outcome::Skipped);
            }
            tracing::info!(schedule_id, "Schedule postponed, soil moisture adequate");
            self.notify(
                &schedule,
                "Irrigation postponed - Soil moisture adequate. Rescheduled for 12h later.",
            )
            .await;
            return Ok(Outcome::Postponed);
        }

        // Amounts must be persisted before the executing transition so a
        // crash mid-run is observable as stuck-executing, not lost.
        self.ensure_water_amounts(&mut schedule, prediction.as_ref())?;
        let water_amount = schedule.water_amount_mm.unwrap_or(0.0);
        let duration = schedule.duration_minutes.unwrap_or(0);

        schedule.status = ScheduleStatus::Executing;
        if !self.db.transition(&schedule, ScheduleStatus::Pending)? {
            return Ok(Outcome::Skipped);
        }

        tracing::info!(schedule_id, water_amount, duration, "Executing irrigation");
        tokio::time::timeout(
            self.settings.actuator_timeout,
            self.actuator.run(water_amount, duration),
        )
        .await
        .map_err(|_| CropOpsError::Timeout(format!("Actuator run for schedule {}", schedule_id)))??;

        schedule.status = ScheduleStatus::Completed;
        schedule.executed_at = Some(now);
        schedule.notification_sent = true;
        if !self.db.transition(&schedule, ScheduleStatus::Executing)? {
            tracing::warn!(schedule_id, "Completed transition lost a race, leaving as-is");
            return Ok(Outcome::Skipped);
        }

        tracing::info!(schedule_id, "Schedule completed");
        self.notify(
            &schedule,
            &format!("Irrigation completed! Applied {}mm of water.", water_amount),
        )
        .await;

        Ok(Outcome::Completed)
    }

    fn ensure_water_amounts(
        &self,
        schedule: &mut Schedule,
        prediction: Option<&Prediction>,
    ) -> Result<()> {
        if schedule.water_amount_mm.is_some() && schedule.duration_minutes.is_some() {
            return Ok(());
        }

        let prediction = prediction.ok_or_else(|| {
            CropOpsError::InvalidData(
                "Schedule has no water amount and no linked prediction to compute one".into(),
            )
        })?;

        let report = compute_water_requirement(
            &prediction.crop_type,
            prediction.temperature_c,
            prediction.crop_days,
            prediction.soil_moisture,
        );

        if schedule.water_amount_mm.is_none() {
            schedule.water_amount_mm = Some(report.irrigation_amount_mm);
        }
        if schedule.duration_minutes.is_none() {
            let amount = schedule.water_amount_mm.unwrap_or(report.irrigation_amount_mm);
            schedule.duration_minutes = Some(duration_for_amount(amount));
        }

        Ok(())
    }

    /// Notification failures are logged and swallowed; they never touch
    /// schedule state.
    async fn notify(&self, schedule: &Schedule, message: &str) {
        let recipient = schedule
            .recipient
            .as_deref()
            .unwrap_or(&self.settings.default_recipient);
        if let Err(e) = self.notifier.notify(recipient, message).await {
            tracing::warn!(recipient = %recipient, error = %e, "Notification failed");
        }
    }
}

/// Derive a run duration from an amount at a fixed application rate.
pub fn duration_for_amount(amount_mm: f64) -> u32 {
    (amount_mm * MINUTES_PER_MM).ceil().max(1.0) as u32
}
