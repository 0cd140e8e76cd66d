use crate::models::{CropType, GrowthStage, WaterRequirementReport};

/// Per-crop coefficients for the initial/mid/late growth stages.
struct KcSet {
    initial: f64,
    mid: f64,
    late: f64,
}

const KC_DEFAULT: KcSet = KcSet {
    initial: 0.35,
    mid: 1.00,
    late: 0.60,
};

fn kc_for_crop(crop: Option<CropType>) -> KcSet {
    match crop {
        Some(CropType::Wheat) => KcSet {
            initial: 0.30,
            mid: 1.15,
            late: 0.40,
        },
        Some(CropType::Rice) => KcSet {
            initial: 1.05,
            mid: 1.20,
            late: 0.90,
        },
        Some(CropType::Cotton) => KcSet {
            initial: 0.35,
            mid: 1.15,
            late: 0.70,
        },
        Some(CropType::Sugarcane) => KcSet {
            initial: 0.40,
            mid: 1.25,
            late: 0.75,
        },
        Some(CropType::Maize) => KcSet {
            initial: 0.30,
            mid: 1.20,
            late: 0.60,
        },
        Some(CropType::Soybean) => KcSet {
            initial: 0.40,
            mid: 1.15,
            late: 0.50,
        },
        None => KC_DEFAULT,
    }
}

// Hargreaves inputs fixed to placeholder values; a location/season-aware
// radiation model would replace these. Known limitation, do not "fix"
// without one.
const DELTA_T: f64 = 10.0;
const RA: f64 = 25.0;

/// Available-water capacity of the profile, mm (soil-type-independent
/// simplification).
const AVAILABLE_WATER_MM: f64 = 150.0;
/// Management-allowed-depletion fraction.
const MAD_FRACTION: f64 = 0.5;
/// Fraction of capacity to refill to.
const REFILL_FRACTION: f64 = 0.9;
/// Exact acre-to-m2 conversion.
const SQ_METERS_PER_ACRE: f64 = 4046.86;

/// Maximum soil moisture reading (field capacity) on the sensor scale.
const MOISTURE_SCALE_MAX: f64 = 1000.0;

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Compute the water requirement for a crop via a simplified Hargreaves
/// ETo model. Deterministic and total: unknown crop types use the default
/// coefficient set, and the irrigation amount is floored at zero.
pub fn compute_water_requirement(
    crop_type: &str,
    temperature_c: f64,
    crop_days: u32,
    soil_moisture: f64,
) -> WaterRequirementReport {
    let kc_set = kc_for_crop(CropType::from_str(crop_type));
    let stage = GrowthStage::from_crop_days(crop_days);
    let kc = match stage {
        GrowthStage::Initial => kc_set.initial,
        GrowthStage::Mid => kc_set.mid,
        GrowthStage::Late => kc_set.late,
    };

    // Simplified Hargreaves reference evapotranspiration, mm/day
    let eto = 0.0023 * (temperature_c + 17.8) * DELTA_T.sqrt() * RA;
    let etc = kc * eto;

    let depletion = (MOISTURE_SCALE_MAX - soil_moisture) / MOISTURE_SCALE_MAX * AVAILABLE_WATER_MM;
    let refill_threshold = MAD_FRACTION * AVAILABLE_WATER_MM;

    // Refill to 90% of capacity, never a negative amount
    let amount =
        (REFILL_FRACTION * AVAILABLE_WATER_MM - (AVAILABLE_WATER_MM - depletion)).max(0.0);

    WaterRequirementReport {
        eto_mm_day: round2(eto),
        kc: round2(kc),
        etc_mm_day: round2(etc),
        growth_stage: stage,
        current_depletion_mm: round2(depletion),
        refill_threshold_mm: round2(refill_threshold),
        irrigation_amount_mm: round2(amount),
        irrigation_liters_per_m2: round2(amount),
        irrigation_liters_per_acre: round2(amount * SQ_METERS_PER_ACRE),
        available_water_mm: AVAILABLE_WATER_MM,
        mad_fraction: MAD_FRACTION,
    }
}
