use serde::{Deserialize, Serialize};

/// Crop types with tuned coefficient/threshold tables. Anything else
/// falls back to the default values in the policy and water model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CropType {
    Wheat,
    Rice,
    Cotton,
    Sugarcane,
    Maize,
    Soybean,
}

impl CropType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropType::Wheat => "Wheat",
            CropType::Rice => "Rice",
            CropType::Cotton => "Cotton",
            CropType::Sugarcane => "Sugarcane",
            CropType::Maize => "Maize",
            CropType::Soybean => "Soybean",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().trim() {
            "wheat" => Some(CropType::Wheat),
            "rice" => Some(CropType::Rice),
            "cotton" => Some(CropType::Cotton),
            "sugarcane" => Some(CropType::Sugarcane),
            "maize" | "corn" => Some(CropType::Maize),
            "soybean" => Some(CropType::Soybean),
            _ => None,
        }
    }

    pub fn all() -> &'static [CropType] {
        &[
            CropType::Wheat,
            CropType::Rice,
            CropType::Cotton,
            CropType::Sugarcane,
            CropType::Maize,
            CropType::Soybean,
        ]
    }
}

impl std::fmt::Display for CropType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
