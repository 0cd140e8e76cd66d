use crate::error::Result;
use async_trait::async_trait;

/// Irrigation hardware boundary. Implementations report failure via Err;
/// there is no separate success signal.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn run(&self, water_amount_mm: f64, duration_minutes: u32) -> Result<()>;
}

/// Simulated actuator: logs the command it would send to hardware and
/// returns immediately.
pub struct SimulatedActuator;

#[async_trait]
impl Actuator for SimulatedActuator {
    async fn run(&self, water_amount_mm: f64, duration_minutes: u32) -> Result<()> {
        if !water_amount_mm.is_finite() || water_amount_mm < 0.0 {
            return Err(crate::error::CropOpsError::Actuator(format!(
                "Invalid water amount: {}",
                water_amount_mm
            )));
        }
        tracing::info!(
            water_amount_mm,
            duration_minutes,
            "Simulated irrigation run"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_actuator_succeeds() {
        let actuator = SimulatedActuator;
        assert!(actuator.run(42.5, 85).await.is_ok());
    }

    #[tokio::test]
    async fn simulated_actuator_rejects_bad_amounts() {
        let actuator = SimulatedActuator;
        assert!(actuator.run(-1.0, 10).await.is_err());
        assert!(actuator.run(f64::NAN, 10).await.is_err());
    }
}
