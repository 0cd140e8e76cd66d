use crate::error::{CropOpsError, Result};
use crate::logic::engine::EngineSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    pub openweathermap: Option<OpenWeatherMapConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Sweep cadence in run mode.
    pub sweep_interval_minutes: u64,
    /// Hours ahead the rain check looks.
    pub forecast_window_hours: u32,
    pub forecast_timeout_secs: u64,
    pub actuator_timeout_secs: u64,
    /// Used when a schedule carries no location of its own.
    pub default_location: String,
    /// Used when a schedule carries no recipient of its own.
    pub default_recipient: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_minutes: 60,
            forecast_window_hours: 24,
            forecast_timeout_secs: 10,
            actuator_timeout_secs: 120,
            default_location: "New Delhi".into(),
            default_recipient: "operator".into(),
        }
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct OpenWeatherMapConfig {
    pub api_key: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl std::fmt::Debug for OpenWeatherMapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherMapConfig")
            .field("api_key", &"[REDACTED]")
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p,
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            // No file: run with defaults (mock forecast, local db)
            tracing::warn!(
                path = %config_path.display(),
                "No config file found, using defaults"
            );
            return Ok(Self::default());
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| CropOpsError::Config(format!("Failed to read config: {}", e)))?;

        // Substitute environment variables
        let config_str = Self::substitute_env_vars(&config_str);

        let config: Config = serde_yaml::from_str(&config_str)
            .map_err(|e| CropOpsError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        // Try current directory first
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        // Return the XDG path as the default
        let default_path = dirs::config_dir()
            .ok_or_else(|| CropOpsError::Config("Cannot determine config directory".into()))?
            .join("cropops")
            .join("config.yaml");
        Ok(default_path)
    }

    fn substitute_env_vars(content: &str) -> String {
        let mut result = content.to_string();

        // Find all ${VAR_NAME} patterns and substitute
        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }

    pub fn data_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        // CLI override takes priority
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        // Then check env var
        if let Ok(dir) = std::env::var("CROPOPS_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        // Use XDG data directory
        let data_dir = dirs::data_dir()
            .ok_or_else(|| CropOpsError::Config("Cannot determine data directory".into()))?
            .join("cropops");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn db_path(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(Self::data_dir(data_dir_override)?.join("cropops.db"))
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.scheduler.sweep_interval_minutes * 60)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            default_location: self.scheduler.default_location.clone(),
            default_recipient: self.scheduler.default_recipient.clone(),
            forecast_timeout: std::time::Duration::from_secs(
                self.scheduler.forecast_timeout_secs,
            ),
            actuator_timeout: std::time::Duration::from_secs(
                self.scheduler.actuator_timeout_secs,
            ),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            openweathermap: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.scheduler.sweep_interval_minutes, 60);
        assert_eq!(config.scheduler.forecast_window_hours, 24);
        assert_eq!(config.scheduler.default_location, "New Delhi");
        assert!(config.openweathermap.is_none());
    }

    #[test]
    fn parse_with_missing_sections() {
        let config: Config = serde_yaml::from_str("openweathermap:\n  api_key: abc\n").unwrap();
        assert!(config.openweathermap.is_some());
        assert!(config.openweathermap.as_ref().unwrap().enabled);
        assert_eq!(config.scheduler.sweep_interval_minutes, 60);
    }

    #[test]
    fn env_substitution() {
        std::env::set_var("CROPOPS_TEST_KEY", "secret");
        let substituted =
            Config::substitute_env_vars("openweathermap:\n  api_key: ${CROPOPS_TEST_KEY}\n");
        assert!(substituted.contains("secret"));
        assert!(!substituted.contains("${CROPOPS_TEST_KEY}"));
    }
}
