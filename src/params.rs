//! Model and sampling configuration
//!
//! This module holds the constants of the response curves and the ranges the
//! synthesizer draws from. Defaults reproduce the reference model; a partial
//! JSON document overrides only the fields it names.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Default number of records in a synthesized dataset
pub const DEFAULT_DATASET_SIZE: usize = 300;

/// Response curve constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Strain below which lamellar formation is not triggered (µε)
    pub activation_threshold: f64,
    /// Strain at which the anabolic response peaks (µε)
    pub optimum_amplitude: f64,
    /// Safe strain limit; the response reaches zero here (µε)
    pub max_amplitude: f64,
    /// Lower edge of the modeled frequency band (Hz)
    pub frequency_min: f64,
    /// Frequency of peak response (Hz)
    pub frequency_optimum: f64,
    /// Upper edge of the modeled frequency band (Hz)
    pub frequency_max: f64,
    /// Frequencies above this emit a fatigue advisory (Hz)
    pub high_frequency_cutoff: f64,
    /// Duration past which the effect no longer grows (weeks)
    pub duration_cap: f64,
    /// Duration factor gained per week below the cap
    pub duration_slope: f64,
    /// BFR with no loading effect
    pub baseline_bfr: f64,
    /// Scale applied to the combined effect
    pub max_increase: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            activation_threshold: 1050.0,
            optimum_amplitude: 1500.0,
            max_amplitude: 3000.0,
            frequency_min: 1.0,
            frequency_optimum: 5.0,
            frequency_max: 10.0,
            high_frequency_cutoff: 10.0,
            duration_cap: 3.0,
            duration_slope: 0.5,
            baseline_bfr: 1.0,
            max_increase: 5.0,
        }
    }
}

impl ModelParams {
    /// Parse parameters from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Serialize parameters to pretty JSON
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every constant is finite and the breakpoints are ordered
    pub fn validate(&self) -> Result<(), ModelError> {
        let fields = [
            ("activation_threshold", self.activation_threshold),
            ("optimum_amplitude", self.optimum_amplitude),
            ("max_amplitude", self.max_amplitude),
            ("frequency_min", self.frequency_min),
            ("frequency_optimum", self.frequency_optimum),
            ("frequency_max", self.frequency_max),
            ("high_frequency_cutoff", self.high_frequency_cutoff),
            ("duration_cap", self.duration_cap),
            ("duration_slope", self.duration_slope),
            ("baseline_bfr", self.baseline_bfr),
            ("max_increase", self.max_increase),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(ModelError::InvalidParams(format!("{name} must be finite")));
            }
        }

        if !(self.activation_threshold < self.optimum_amplitude
            && self.optimum_amplitude < self.max_amplitude)
        {
            return Err(ModelError::InvalidParams(format!(
                "amplitude breakpoints must satisfy threshold < optimum < max, got {} / {} / {}",
                self.activation_threshold, self.optimum_amplitude, self.max_amplitude
            )));
        }

        if !(self.frequency_min < self.frequency_optimum
            && self.frequency_optimum < self.frequency_max)
        {
            return Err(ModelError::InvalidParams(format!(
                "frequency breakpoints must satisfy min < optimum < max, got {} / {} / {}",
                self.frequency_min, self.frequency_optimum, self.frequency_max
            )));
        }

        if self.activation_threshold < 0.0 || self.frequency_min < 0.0 {
            return Err(ModelError::InvalidParams(
                "amplitude and frequency breakpoints must be non-negative".to_string(),
            ));
        }

        if self.duration_cap <= 0.0 || self.duration_slope <= 0.0 {
            return Err(ModelError::InvalidParams(
                "duration_cap and duration_slope must be positive".to_string(),
            ));
        }

        if self.max_increase < 0.0 {
            return Err(ModelError::InvalidParams(
                "max_increase must be non-negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Half-open interval `[min, max)` sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn validate(&self, name: &str) -> Result<(), ModelError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ModelError::InvalidRange(format!("{name} bounds must be finite")));
        }
        if self.min > self.max {
            return Err(ModelError::InvalidRange(format!(
                "{name} min {} exceeds max {}",
                self.min, self.max
            )));
        }
        if self.min < 0.0 {
            return Err(ModelError::InvalidRange(format!(
                "{name} min {} is negative",
                self.min
            )));
        }
        Ok(())
    }
}

/// Ranges the synthesizer draws loading conditions from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingRanges {
    /// Strain amplitude (µε)
    pub amplitude: Range,
    /// Loading frequency (Hz)
    pub frequency: Range,
    /// Loading duration (weeks)
    pub duration: Range,
}

impl Default for SamplingRanges {
    fn default() -> Self {
        Self {
            amplitude: Range::new(0.0, 3500.0),
            frequency: Range::new(0.0, 12.0),
            duration: Range::new(1.0, 4.0),
        }
    }
}

impl SamplingRanges {
    /// Parse ranges from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let ranges: Self = serde_json::from_str(json)?;
        ranges.validate()?;
        Ok(ranges)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        self.amplitude.validate("amplitude")?;
        self.frequency.validate("frequency")?;
        self.duration.validate("duration")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ModelParams::default().validate().is_ok());
        assert!(SamplingRanges::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params = ModelParams::from_json(r#"{"duration_cap": 4.0}"#).unwrap();
        assert_eq!(params.duration_cap, 4.0);
        assert_eq!(params.activation_threshold, 1050.0);
        assert_eq!(params.max_increase, 5.0);
    }

    #[test]
    fn test_inverted_amplitude_breakpoints_rejected() {
        let result = ModelParams::from_json(r#"{"optimum_amplitude": 900.0}"#);
        assert!(matches!(result, Err(ModelError::InvalidParams(_))));
    }

    #[test]
    fn test_inverted_frequency_breakpoints_rejected() {
        let params = ModelParams {
            frequency_optimum: 12.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_non_positive_cap_rejected() {
        let params = ModelParams {
            duration_cap: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_params_json_roundtrip() {
        let params = ModelParams::default();
        let json = params.to_json().unwrap();
        assert_eq!(ModelParams::from_json(&json).unwrap(), params);
    }

    #[test]
    fn test_range_min_above_max_rejected() {
        let result = SamplingRanges::from_json(r#"{"frequency": {"min": 5.0, "max": 2.0}}"#);
        assert!(matches!(result, Err(ModelError::InvalidRange(_))));
    }

    #[test]
    fn test_partial_ranges_json() {
        let ranges = SamplingRanges::from_json(r#"{"amplitude": {"min": 500.0, "max": 3000.0}}"#)
            .unwrap();
        assert_eq!(ranges.amplitude, Range::new(500.0, 3000.0));
        assert_eq!(ranges.frequency, Range::new(0.0, 12.0));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            ModelParams::from_json("not json"),
            Err(ModelError::JsonError(_))
        ));
    }
}
