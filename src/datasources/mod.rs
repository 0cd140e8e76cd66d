pub mod openweathermap;

pub use openweathermap::OpenWeatherMapClient;

use crate::error::Result;
use async_trait::async_trait;

/// Rain outlook for a location over the forecast window. A provider error
/// is a distinct outcome from "no rain"; callers must not conflate them.
#[derive(Debug, Clone, Copy)]
pub struct RainOutlook {
    pub rain_expected: bool,
    /// 0-100.
    pub probability_percent: f64,
}

impl RainOutlook {
    pub fn dry() -> Self {
        Self {
            rain_expected: false,
            probability_percent: 0.0,
        }
    }

    pub fn rain(probability_percent: f64) -> Self {
        Self {
            rain_expected: true,
            probability_percent,
        }
    }
}

/// External rain forecast collaborator. Implementations resolve a
/// free-text location to an outlook over their configured window.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn forecast(&self, location: &str) -> Result<RainOutlook>;
}

/// Fallback provider for deployments with no weather API configured.
/// Always reports a dry window, so schedules are decided on soil
/// moisture alone.
pub struct StaticForecast;

#[async_trait]
impl ForecastProvider for StaticForecast {
    async fn forecast(&self, location: &str) -> Result<RainOutlook> {
        tracing::debug!(location = %location, "Static forecast, reporting dry window");
        Ok(RainOutlook::dry())
    }
}
