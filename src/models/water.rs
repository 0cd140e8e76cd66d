use serde::{Deserialize, Serialize};

/// Crop development phase, selects which Kc applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthStage {
    Initial,
    Mid,
    Late,
}

impl GrowthStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthStage::Initial => "Initial",
            GrowthStage::Mid => "Mid",
            GrowthStage::Late => "Late",
        }
    }

    /// Stage selection by crop age. Boundaries are half-open,
    /// left-inclusive: <30 initial, 30-89 mid, >=90 late.
    pub fn from_crop_days(crop_days: u32) -> Self {
        if crop_days < 30 {
            GrowthStage::Initial
        } else if crop_days < 90 {
            GrowthStage::Mid
        } else {
            GrowthStage::Late
        }
    }
}

impl std::fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived water-requirement figures. Ephemeral: recomputed on demand,
/// never persisted. All fields are rounded to 2 decimals for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterRequirementReport {
    /// Reference evapotranspiration, mm/day.
    pub eto_mm_day: f64,
    /// Crop coefficient for the current growth stage.
    pub kc: f64,
    /// Crop evapotranspiration, mm/day (Kc x ETo).
    pub etc_mm_day: f64,
    pub growth_stage: GrowthStage,
    /// Water already depleted from the root zone, mm.
    pub current_depletion_mm: f64,
    /// Depletion level at which irrigation becomes mandatory, mm.
    pub refill_threshold_mm: f64,
    /// Recommended application, mm (1 mm == 1 L/m2).
    pub irrigation_amount_mm: f64,
    pub irrigation_liters_per_m2: f64,
    pub irrigation_liters_per_acre: f64,
    /// Available-water capacity of the soil profile, mm.
    pub available_water_mm: f64,
    /// Management-allowed-depletion fraction.
    pub mad_fraction: f64,
}
