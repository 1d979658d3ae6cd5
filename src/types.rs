//! Core types for the Mechanostat model
//!
//! This module defines the data structures shared by the response model, the
//! dataset synthesizer and the export layer: loading conditions, predictions
//! with their advisories, and synthesized dataset records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Anatomical site of the loaded bone.
///
/// The label is carried for display only and does not alter the prediction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoneRegion {
    Tibia,
    Ulna,
    Vertebra,
    Femur,
    Humerus,
    /// For sites outside the named set.
    ///
    /// Construct through [`BoneRegion::parse`] or `From<&str>`. The wire form
    /// is the bare label, so `Other("tibia")` decodes as `Tibia`.
    #[serde(untagged)]
    Other(String),
}

impl BoneRegion {
    /// Regions the synthesizer draws from
    pub const NAMED: [BoneRegion; 5] = [
        BoneRegion::Tibia,
        BoneRegion::Ulna,
        BoneRegion::Vertebra,
        BoneRegion::Femur,
        BoneRegion::Humerus,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            BoneRegion::Tibia => "tibia",
            BoneRegion::Ulna => "ulna",
            BoneRegion::Vertebra => "vertebra",
            BoneRegion::Femur => "femur",
            BoneRegion::Humerus => "humerus",
            BoneRegion::Other(name) => name.as_str(),
        }
    }

    /// Parse a region label, case-insensitively for the named regions
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "tibia" => BoneRegion::Tibia,
            "ulna" => BoneRegion::Ulna,
            "vertebra" => BoneRegion::Vertebra,
            "femur" => BoneRegion::Femur,
            "humerus" => BoneRegion::Humerus,
            _ => BoneRegion::Other(trimmed.to_string()),
        }
    }
}

impl Default for BoneRegion {
    fn default() -> Self {
        BoneRegion::Tibia
    }
}

impl From<&str> for BoneRegion {
    fn from(label: &str) -> Self {
        BoneRegion::parse(label)
    }
}

impl fmt::Display for BoneRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single mechanical loading regimen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingCondition {
    /// Loaded bone (informational)
    #[serde(default)]
    pub bone_region: BoneRegion,
    /// Loading frequency (Hz); modeled band is 1-10 Hz
    pub frequency_hz: f64,
    /// Peak strain amplitude (µε)
    pub strain_amplitude_microstrain: f64,
    /// Length of the loading program (weeks)
    pub duration_weeks: f64,
}

impl LoadingCondition {
    pub fn new(
        bone_region: BoneRegion,
        frequency_hz: f64,
        strain_amplitude_microstrain: f64,
        duration_weeks: f64,
    ) -> Self {
        Self {
            bone_region,
            frequency_hz,
            strain_amplitude_microstrain,
            duration_weeks,
        }
    }
}

/// Informational message attached to a prediction when an input falls
/// outside its recommended sub-range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "AdvisoryRepr", into = "AdvisoryRepr")]
pub enum Advisory {
    /// Strain below the activation threshold
    BelowActivationThreshold,
    /// Strain above the safe limit
    ExceedsSafeStrain,
    /// Frequency above the high-frequency cutoff
    HighFrequency,
    /// Duration beyond the saturation cap
    ProlongedDuration,
}

impl Advisory {
    pub fn code(&self) -> &'static str {
        match self {
            Advisory::BelowActivationThreshold => "below_activation_threshold",
            Advisory::ExceedsSafeStrain => "exceeds_safe_strain",
            Advisory::HighFrequency => "high_frequency",
            Advisory::ProlongedDuration => "prolonged_duration",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Advisory::BelowActivationThreshold => {
                "Strain amplitude is below the activation threshold, minimal effect."
            }
            Advisory::ExceedsSafeStrain => {
                "Strain amplitude exceeds the safe strain limit, risk of microdamage."
            }
            Advisory::HighFrequency => {
                "High loading frequency may cause fatigue damage or desensitization."
            }
            Advisory::ProlongedDuration => {
                "Prolonged loading may desensitize mechanoreceptors; diminishing returns."
            }
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "below_activation_threshold" => Some(Advisory::BelowActivationThreshold),
            "exceeds_safe_strain" => Some(Advisory::ExceedsSafeStrain),
            "high_frequency" => Some(Advisory::HighFrequency),
            "prolonged_duration" => Some(Advisory::ProlongedDuration),
            _ => None,
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Wire form of an advisory: `{ "code": ..., "message": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AdvisoryRepr {
    code: String,
    #[serde(default)]
    message: String,
}

impl From<Advisory> for AdvisoryRepr {
    fn from(advisory: Advisory) -> Self {
        Self {
            code: advisory.code().to_string(),
            message: advisory.message().to_string(),
        }
    }
}

impl TryFrom<AdvisoryRepr> for Advisory {
    type Error = String;

    fn try_from(repr: AdvisoryRepr) -> Result<Self, Self::Error> {
        Advisory::from_code(&repr.code).ok_or_else(|| format!("unknown advisory code: {}", repr.code))
    }
}

/// Per-factor contributions behind a prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectBreakdown {
    /// Triangular strain response (0-1)
    pub amplitude_effect: f64,
    /// Triangular frequency response (0-1)
    pub frequency_effect: f64,
    /// Capped linear duration factor
    pub duration_factor: f64,
}

/// Output of the response model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted bone formation rate (1.0 = baseline)
    pub bfr: f64,
    /// Advisories in amplitude, frequency, duration order
    #[serde(default)]
    pub advisories: Vec<Advisory>,
    pub effects: EffectBreakdown,
}

impl PredictionResult {
    pub fn has_advisories(&self) -> bool {
        !self.advisories.is_empty()
    }
}

/// One row of a synthesized dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    #[serde(flatten)]
    pub condition: LoadingCondition,
    #[serde(flatten)]
    pub prediction: PredictionResult,
}

/// Synthesized reference dataset.
///
/// Every record is reproducible by reapplying the response model to its
/// loading condition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SyntheticDataset {
    /// Seed used for sampling, if any
    pub seed: Option<u64>,
    pub records: Vec<DatasetRecord>,
}

impl SyntheticDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DatasetRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bone_region_parse() {
        assert_eq!(BoneRegion::parse("Tibia"), BoneRegion::Tibia);
        assert_eq!(BoneRegion::parse(" FEMUR "), BoneRegion::Femur);
        assert_eq!(
            BoneRegion::parse("Radius"),
            BoneRegion::Other("Radius".to_string())
        );
    }

    #[test]
    fn test_bone_region_serde() {
        assert_eq!(serde_json::to_string(&BoneRegion::Ulna).unwrap(), "\"ulna\"");
        let other: BoneRegion = serde_json::from_str("\"calcaneus\"").unwrap();
        assert_eq!(other, BoneRegion::Other("calcaneus".to_string()));
        let named: BoneRegion = serde_json::from_str("\"vertebra\"").unwrap();
        assert_eq!(named, BoneRegion::Vertebra);
    }

    #[test]
    fn test_other_label_normalizes_to_named_region() {
        assert_eq!(BoneRegion::from("Tibia"), BoneRegion::Tibia);
        assert_eq!(BoneRegion::from("radius"), BoneRegion::Other("radius".to_string()));

        // A named label wrapped in Other is indistinguishable on the wire
        let json = serde_json::to_string(&BoneRegion::Other("tibia".to_string())).unwrap();
        let decoded: BoneRegion = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, BoneRegion::Tibia);

        for region in BoneRegion::NAMED {
            let json = serde_json::to_string(&region).unwrap();
            assert_eq!(serde_json::from_str::<BoneRegion>(&json).unwrap(), region);
            assert_eq!(BoneRegion::parse(region.as_str()), region);
        }
    }

    #[test]
    fn test_advisory_wire_form() {
        let json = serde_json::to_value(Advisory::HighFrequency).unwrap();
        assert_eq!(json["code"], "high_frequency");
        assert!(json["message"].as_str().unwrap().contains("fatigue"));

        let parsed: Advisory =
            serde_json::from_str(r#"{"code": "prolonged_duration"}"#).unwrap();
        assert_eq!(parsed, Advisory::ProlongedDuration);

        assert!(serde_json::from_str::<Advisory>(r#"{"code": "nope"}"#).is_err());
    }

    #[test]
    fn test_dataset_record_is_flat() {
        let record = DatasetRecord {
            condition: LoadingCondition::new(BoneRegion::Femur, 5.0, 1500.0, 2.0),
            prediction: PredictionResult {
                bfr: 6.0,
                advisories: vec![],
                effects: EffectBreakdown {
                    amplitude_effect: 1.0,
                    frequency_effect: 1.0,
                    duration_factor: 1.0,
                },
            },
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["bone_region"], "femur");
        assert_eq!(value["strain_amplitude_microstrain"], 1500.0);
        assert_eq!(value["bfr"], 6.0);

        let back: DatasetRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
