use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TideType {
    Low,
    High,
}

impl TideType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TideType::Low => "Low",
            TideType::High => "High",
        }
    }

    /// NOAA hi/lo predictions mark low tides with "L" (and "LL" for the lower low).
    /// Everything else is treated as a high tide.
    pub fn from_noaa_code(code: &str) -> Self {
        if code.starts_with('L') {
            TideType::Low
        } else {
            TideType::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WaterQualityStatus {
    Safe,
    Caution,
    Advisory,
    Unknown,
}

impl WaterQualityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaterQualityStatus::Safe => "SAFE",
            WaterQualityStatus::Caution => "CAUTION",
            WaterQualityStatus::Advisory => "ADVISORY",
            WaterQualityStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SAFE" => Some(WaterQualityStatus::Safe),
            "CAUTION" => Some(WaterQualityStatus::Caution),
            "ADVISORY" => Some(WaterQualityStatus::Advisory),
            "UNKNOWN" => Some(WaterQualityStatus::Unknown),
            _ => None,
        }
    }

    /// Human readable advisory text shown next to the status badge
    pub fn message(&self) -> &'static str {
        match self {
            WaterQualityStatus::Safe => "No advisories at this time. Water quality is good.",
            WaterQualityStatus::Caution => {
                "Moderate bacteria levels detected. Swimming not recommended for sensitive individuals."
            }
            WaterQualityStatus::Advisory => "High bacteria count reported. Avoid water contact.",
            WaterQualityStatus::Unknown => "Unable to retrieve water quality data at this time.",
        }
    }
}
