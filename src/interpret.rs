//! Qualitative interpretation of a loading condition
//!
//! Unlike advisories, which list every out-of-range input, an interpretation
//! is a single sentence describing where the condition sits relative to the
//! stimulatory window. The first matching rule wins:
//! amplitude at or below threshold, amplitude past the optimum, frequency past
//! the optimum, duration past the cap, otherwise inside the window.

use crate::params::ModelParams;
use crate::types::LoadingCondition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a loading condition falls on the response surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpretation {
    BelowThreshold,
    AboveOptimalStrain,
    AboveOptimalFrequency,
    DurationSaturated,
    StimulatoryWindow,
}

impl Interpretation {
    /// Classify a loading condition under the given constants
    pub fn classify(condition: &LoadingCondition, params: &ModelParams) -> Self {
        let amplitude = non_negative(condition.strain_amplitude_microstrain);
        let frequency = non_negative(condition.frequency_hz);
        let duration = non_negative(condition.duration_weeks);

        if amplitude <= params.activation_threshold {
            Interpretation::BelowThreshold
        } else if amplitude > params.optimum_amplitude {
            Interpretation::AboveOptimalStrain
        } else if frequency > params.frequency_optimum {
            Interpretation::AboveOptimalFrequency
        } else if duration > params.duration_cap {
            Interpretation::DurationSaturated
        } else {
            Interpretation::StimulatoryWindow
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Interpretation::BelowThreshold => "below_threshold",
            Interpretation::AboveOptimalStrain => "above_optimal_strain",
            Interpretation::AboveOptimalFrequency => "above_optimal_frequency",
            Interpretation::DurationSaturated => "duration_saturated",
            Interpretation::StimulatoryWindow => "stimulatory_window",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Interpretation::BelowThreshold => {
                "The strain amplitude is below the activation threshold required to \
                 stimulate lamellar bone formation, so only baseline formation is expected."
            }
            Interpretation::AboveOptimalStrain => {
                "The strain amplitude exceeds the optimal range. High strains can induce \
                 microdamage and modelling-dependent bone loss, reducing the anabolic response."
            }
            Interpretation::AboveOptimalFrequency => {
                "The loading frequency is above the optimum. Very high frequencies may \
                 desensitize osteocytes and reduce the anabolic response."
            }
            Interpretation::DurationSaturated => {
                "Long loading durations do not increase bone formation indefinitely. \
                 Continuous sessions desensitize mechanosensors; past the saturation point \
                 extending the program adds little benefit."
            }
            Interpretation::StimulatoryWindow => {
                "The parameters fall within the stimulatory window: moderate strain, \
                 frequency near the optimum and a duration up to a few weeks."
            }
        }
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoneRegion;

    fn classify(amp: f64, freq: f64, dur: f64) -> Interpretation {
        Interpretation::classify(
            &LoadingCondition::new(BoneRegion::Tibia, freq, amp, dur),
            &ModelParams::default(),
        )
    }

    #[test]
    fn test_below_threshold_wins() {
        // Threshold is inclusive here, matching the zero amplitude effect at 1050
        assert_eq!(classify(1050.0, 12.0, 8.0), Interpretation::BelowThreshold);
        assert_eq!(classify(-20.0, 5.0, 2.0), Interpretation::BelowThreshold);
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(classify(1600.0, 9.0, 8.0), Interpretation::AboveOptimalStrain);
        assert_eq!(classify(1400.0, 9.0, 8.0), Interpretation::AboveOptimalFrequency);
        assert_eq!(classify(1400.0, 5.0, 8.0), Interpretation::DurationSaturated);
        assert_eq!(classify(1400.0, 5.0, 2.0), Interpretation::StimulatoryWindow);
    }

    #[test]
    fn test_optimum_is_inside_window() {
        assert_eq!(classify(1500.0, 5.0, 3.0), Interpretation::StimulatoryWindow);
    }

    #[test]
    fn test_serialized_code() {
        let json = serde_json::to_string(&Interpretation::DurationSaturated).unwrap();
        assert_eq!(json, "\"duration_saturated\"");
        assert_eq!(Interpretation::DurationSaturated.code(), "duration_saturated");
    }
}
