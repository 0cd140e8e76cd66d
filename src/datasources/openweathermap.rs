use crate::config::OpenWeatherMapConfig;
use crate::datasources::{ForecastProvider, RainOutlook};
use crate::error::{CropOpsError, Result};
use async_trait::async_trait;
use serde::Deserialize;

const API_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Rain forecast backed by the OpenWeatherMap 5-day/3-hour API.
pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    config: OpenWeatherMapConfig,
    /// Hours ahead to scan for rain.
    window_hours: u32,
}

// OpenWeatherMap API response structures
#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<OwmForecastItem>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt: i64,
    #[serde(default)]
    pop: f64, // probability of precipitation, 0.0-1.0
    #[serde(default)]
    rain: Option<OwmPrecipitation>,
    #[serde(default)]
    snow: Option<OwmPrecipitation>,
}

#[derive(Debug, Deserialize)]
struct OwmPrecipitation {
    #[serde(rename = "3h", default)]
    three_hour: f64,
}

/// Precipitation over the window that counts as rain, mm.
const RAIN_THRESHOLD_MM: f64 = 2.5;
/// Probability over the window that counts as rain.
const RAIN_PROBABILITY_THRESHOLD: f64 = 0.5;

impl OpenWeatherMapClient {
    pub fn new(config: OpenWeatherMapConfig, window_hours: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            window_hours,
        }
    }

    /// Test connection to OpenWeatherMap API
    pub async fn test_connection(&self, location: &str) -> Result<bool> {
        let url = format!(
            "{}/weather?q={}&appid={}&units=metric",
            API_BASE_URL, location, self.config.api_key
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            CropOpsError::DataSourceUnavailable(format!("OpenWeatherMap: {}", e))
        })?;

        Ok(response.status().is_success())
    }

    async fn fetch_forecast(&self, location: &str) -> Result<OwmForecastResponse> {
        let url = format!(
            "{}/forecast?q={}&appid={}&units=metric",
            API_BASE_URL, location, self.config.api_key
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            CropOpsError::DataSourceUnavailable(format!("OpenWeatherMap: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CropOpsError::DataSourceUnavailable(format!(
                "OpenWeatherMap returned {}: {}",
                status, body
            )));
        }

        response.json().await.map_err(|e| {
            CropOpsError::DataSourceUnavailable(format!(
                "Failed to parse OpenWeatherMap response: {}",
                e
            ))
        })
    }

    fn outlook_from_response(&self, response: &OwmForecastResponse) -> RainOutlook {
        let cutoff = chrono::Utc::now().timestamp() + i64::from(self.window_hours) * 3600;

        let mut total_precip = 0.0;
        let mut max_pop: f64 = 0.0;
        for item in response.list.iter().filter(|i| i.dt <= cutoff) {
            let rain_mm = item.rain.as_ref().map(|r| r.three_hour).unwrap_or(0.0);
            let snow_mm = item.snow.as_ref().map(|s| s.three_hour).unwrap_or(0.0);
            total_precip += rain_mm + snow_mm;
            max_pop = max_pop.max(item.pop);
        }

        if total_precip >= RAIN_THRESHOLD_MM || max_pop >= RAIN_PROBABILITY_THRESHOLD {
            RainOutlook::rain((max_pop * 100.0).round())
        } else {
            RainOutlook::dry()
        }
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherMapClient {
    async fn forecast(&self, location: &str) -> Result<RainOutlook> {
        let response = self.fetch_forecast(location).await?;
        Ok(self.outlook_from_response(&response))
    }
}
