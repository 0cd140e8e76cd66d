use crate::db::Database;
use crate::error::Result;
use crate::logic::engine::DecisionEngine;
use chrono::{DateTime, Utc};

/// Periodic sweep over due pending schedules. Each schedule is evaluated
/// independently; one failure never aborts the rest of the sweep.
pub struct Dispatcher {
    db: Database,
    engine: DecisionEngine,
}

impl Dispatcher {
    pub fn new(db: Database, engine: DecisionEngine) -> Self {
        Self { db, engine }
    }

    /// One sweep: re-queue postponed schedules, then evaluate everything
    /// pending and due. Returns the number of schedules processed.
    pub async fn sweep_due(&self, now: DateTime<Utc>) -> Result<usize> {
        let requeued = self.db.requeue_postponed()?;
        if requeued > 0 {
            tracing::debug!(requeued, "Re-queued postponed schedules as pending");
        }

        let due = self.db.find_due(now)?;
        tracing::info!(count = due.len(), "Sweeping due schedules");

        let mut processed = 0;
        for schedule in due {
            let Some(id) = schedule.id else { continue };
            debug_assert!(schedule.is_due(now));

            match self.engine.evaluate(id, now).await {
                Ok(outcome) => {
                    tracing::info!(schedule_id = id, outcome = %outcome, "Schedule processed");
                }
                Err(e) => {
                    // Isolate the failure: this schedule goes to failed
                    // with the cause preserved, the sweep continues.
                    tracing::error!(schedule_id = id, error = %e, "Schedule failed");
                    if let Err(store_err) = self.db.mark_failed(id, &e.to_string()) {
                        tracing::error!(
                            schedule_id = id,
                            error = %store_err,
                            "Could not record schedule failure"
                        );
                    }
                }
            }
            processed += 1;
        }

        Ok(processed)
    }

    /// Sweep on a fixed interval until the process is stopped.
    pub async fn run(&self, interval: std::time::Duration) -> Result<()> {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep_due(Utc::now()).await {
                tracing::error!(error = %e, "Sweep failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::Actuator;
    use crate::datasources::{ForecastProvider, RainOutlook};
    use crate::error::CropOpsError;
    use crate::logic::engine::EngineSettings;
    use crate::models::{Prediction, Schedule, ScheduleStatus};
    use crate::notify::Notifier;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::Arc;

    struct DryForecast;

    #[async_trait]
    impl ForecastProvider for DryForecast {
        async fn forecast(&self, _location: &str) -> crate::error::Result<RainOutlook> {
            Ok(RainOutlook::dry())
        }
    }

    struct SilentNotifier;

    #[async_trait]
    impl Notifier for SilentNotifier {
        async fn notify(&self, _recipient: &str, _message: &str) -> crate::error::Result<()> {
            Ok(())
        }
    }

    /// Fails the first run, succeeds afterwards.
    struct FlakyActuator {
        failures_left: std::sync::Mutex<u32>,
    }

    #[async_trait]
    impl Actuator for FlakyActuator {
        async fn run(
            &self,
            _water_amount_mm: f64,
            _duration_minutes: u32,
        ) -> crate::error::Result<()> {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(CropOpsError::Actuator("Pump fault".into()));
            }
            Ok(())
        }
    }

    fn dispatcher_with(db: Database, actuator: impl Actuator + 'static) -> Dispatcher {
        let engine = DecisionEngine::new(
            db.clone(),
            Arc::new(DryForecast),
            Arc::new(SilentNotifier),
            Arc::new(actuator),
            EngineSettings::default(),
        );
        Dispatcher::new(db, engine)
    }

    fn due_schedule(db: &Database, soil_moisture: f64) -> i64 {
        let prediction =
            Prediction::new("Wheat", 45, soil_moisture, 28.0, 40.0, true, 0.9).unwrap();
        let pid = db.insert_prediction(&prediction).unwrap();
        let schedule =
            Schedule::new(Utc::now() - Duration::minutes(5)).with_prediction(pid);
        db.create_schedule(&schedule).unwrap()
    }

    #[tokio::test]
    async fn sweep_processes_all_due_schedules() {
        let db = Database::open_in_memory().unwrap();
        let first = due_schedule(&db, 300.0);
        let second = due_schedule(&db, 300.0);
        // Not yet due
        let future = db
            .create_schedule(&Schedule::new(Utc::now() + Duration::hours(1)).with_water(10.0, 20))
            .unwrap();

        let dispatcher = dispatcher_with(db.clone(), crate::actuator::SimulatedActuator);
        let processed = dispatcher.sweep_due(Utc::now()).await.unwrap();
        assert_eq!(processed, 2);

        assert_eq!(
            db.get_schedule(first).unwrap().unwrap().status,
            ScheduleStatus::Completed
        );
        assert_eq!(
            db.get_schedule(second).unwrap().unwrap().status,
            ScheduleStatus::Completed
        );
        assert_eq!(
            db.get_schedule(future).unwrap().unwrap().status,
            ScheduleStatus::Pending
        );
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_sweep() {
        let db = Database::open_in_memory().unwrap();
        let first = due_schedule(&db, 300.0);
        let second = due_schedule(&db, 300.0);

        let dispatcher = dispatcher_with(
            db.clone(),
            FlakyActuator {
                failures_left: std::sync::Mutex::new(1),
            },
        );
        let processed = dispatcher.sweep_due(Utc::now()).await.unwrap();
        assert_eq!(processed, 2);

        let failed = db.get_schedule(first).unwrap().unwrap();
        assert_eq!(failed.status, ScheduleStatus::Failed);
        assert!(failed
            .cancellation_reason
            .as_deref()
            .unwrap()
            .contains("Pump fault"));

        assert_eq!(
            db.get_schedule(second).unwrap().unwrap().status,
            ScheduleStatus::Completed
        );
    }

    #[tokio::test]
    async fn postponed_schedules_requeue_but_stay_undue() {
        let db = Database::open_in_memory().unwrap();
        // Adequate moisture for Wheat -> postpone on first sweep
        let id = due_schedule(&db, 600.0);

        let dispatcher = dispatcher_with(db.clone(), crate::actuator::SimulatedActuator);
        dispatcher.sweep_due(Utc::now()).await.unwrap();
        assert_eq!(
            db.get_schedule(id).unwrap().unwrap().status,
            ScheduleStatus::Postponed
        );

        // Next sweep re-queues it as pending; its +12h time keeps it un-due
        let processed = dispatcher.sweep_due(Utc::now()).await.unwrap();
        assert_eq!(processed, 0);
        let loaded = db.get_schedule(id).unwrap().unwrap();
        assert_eq!(loaded.status, ScheduleStatus::Pending);
        assert!(loaded.scheduled_time > Utc::now());
    }

    #[tokio::test]
    async fn empty_sweep_is_fine() {
        let db = Database::open_in_memory().unwrap();
        let dispatcher = dispatcher_with(db, crate::actuator::SimulatedActuator);
        assert_eq!(dispatcher.sweep_due(Utc::now()).await.unwrap(), 0);
    }
}
