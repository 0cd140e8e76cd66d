use crate::error::{CropOpsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single irrigation-need prediction for a field, produced upstream by
/// the classifier. Immutable once recorded; the decision engine only
/// reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: Option<i64>,
    /// Free-text crop name; unknown crops degrade to default coefficients.
    pub crop_type: String,
    pub crop_days: u32,
    /// 0-1000 scale, 1000 = field capacity.
    pub soil_moisture: f64,
    pub temperature_c: f64,
    pub humidity_percent: f64,
    /// Classifier verdict, consumed as an opaque flag.
    pub irrigation_needed: bool,
    /// Classifier confidence in [0, 1].
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

impl Prediction {
    pub fn new(
        crop_type: &str,
        crop_days: u32,
        soil_moisture: f64,
        temperature_c: f64,
        humidity_percent: f64,
        irrigation_needed: bool,
        confidence: f64,
    ) -> Result<Self> {
        if crop_type.trim().is_empty() {
            return Err(CropOpsError::InvalidData("Crop type must not be empty".into()));
        }
        if !(0.0..=1000.0).contains(&soil_moisture) {
            return Err(CropOpsError::InvalidData(format!(
                "Soil moisture {} outside 0-1000 scale",
                soil_moisture
            )));
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(CropOpsError::InvalidData(format!(
                "Confidence {} outside [0, 1]",
                confidence
            )));
        }

        Ok(Self {
            id: None,
            crop_type: crop_type.trim().to_string(),
            crop_days,
            soil_moisture,
            temperature_c,
            humidity_percent,
            irrigation_needed,
            confidence,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_new_valid() {
        let p = Prediction::new("Wheat", 45, 350.0, 28.0, 40.0, true, 0.91).unwrap();
        assert_eq!(p.crop_type, "Wheat");
        assert_eq!(p.crop_days, 45);
        assert!(p.id.is_none());
    }

    #[test]
    fn prediction_rejects_empty_crop() {
        assert!(Prediction::new("  ", 10, 400.0, 25.0, 50.0, false, 0.5).is_err());
    }

    #[test]
    fn prediction_rejects_out_of_range_moisture() {
        assert!(Prediction::new("Rice", 10, 1200.0, 25.0, 50.0, true, 0.5).is_err());
        assert!(Prediction::new("Rice", 10, -5.0, 25.0, 50.0, true, 0.5).is_err());
    }

    #[test]
    fn prediction_rejects_bad_confidence() {
        assert!(Prediction::new("Rice", 10, 400.0, 25.0, 50.0, true, 1.5).is_err());
    }
}
