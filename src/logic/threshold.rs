use crate::models::CropType;

const DEFAULT_THRESHOLD: f64 = 400.0;

/// Moisture level (0-1000 scale) below which a crop needs irrigation.
pub fn threshold_for_crop(crop_type: &str) -> f64 {
    match CropType::from_str(crop_type) {
        Some(CropType::Wheat) => 400.0,
        Some(CropType::Rice) => 600.0,
        Some(CropType::Cotton) => 350.0,
        Some(CropType::Sugarcane) => 500.0,
        Some(CropType::Maize) => 380.0,
        Some(CropType::Soybean) => 370.0,
        None => DEFAULT_THRESHOLD,
    }
}

/// True iff the soil is strictly below the crop's threshold. The boundary
/// value itself does not trigger irrigation.
pub fn needs_irrigation(soil_moisture: f64, crop_type: &str) -> bool {
    soil_moisture < threshold_for_crop(crop_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheat_threshold() {
        assert!(needs_irrigation(300.0, "Wheat"));
        assert!(!needs_irrigation(600.0, "Wheat"));
    }

    #[test]
    fn boundary_is_exclusive() {
        assert!(needs_irrigation(399.9, "Wheat"));
        assert!(!needs_irrigation(400.0, "Wheat"));
        assert!(needs_irrigation(599.9, "Rice"));
        assert!(!needs_irrigation(600.0, "Rice"));
    }

    #[test]
    fn rice_needs_water_at_moderate_moisture() {
        assert!(needs_irrigation(500.0, "Rice"));
    }

    #[test]
    fn unknown_crop_uses_default_threshold() {
        assert!(needs_irrigation(350.0, "UnknownCrop"));
        assert!(!needs_irrigation(450.0, "UnknownCrop"));
    }

    #[test]
    fn extremes() {
        assert!(needs_irrigation(0.0, "Wheat"));
        assert!(!needs_irrigation(1000.0, "Wheat"));
    }

    #[test]
    fn step_property_per_crop() {
        // needs_irrigation(m, c) is true for all m < threshold(c) and
        // false for all m >= threshold(c)
        for crop in ["Wheat", "Rice", "Cotton", "Sugarcane", "Maize", "Soybean", "Other"] {
            let threshold = threshold_for_crop(crop);
            let mut m = 0.0;
            while m <= 1000.0 {
                assert_eq!(
                    needs_irrigation(m, crop),
                    m < threshold,
                    "step property violated for {} at {}",
                    crop,
                    m
                );
                m += 10.0;
            }
        }
    }
}
