//! Bone formation response model
//!
//! This module maps a loading condition to a predicted bone formation rate:
//! - Triangular response over strain amplitude (threshold → optimum → limit)
//! - Triangular response over frequency, peaking inside the modeled band
//! - Linear duration factor, flat past the saturation cap
//!
//! The three factors combine multiplicatively, so amplitude and frequency must
//! both be productive before any gain over baseline appears. Duration scales
//! a triggered response but never triggers one alone.
//!
//! Breakpoints are closed below and open above: a value equal to the
//! activation threshold, the strain limit, or either frequency band edge
//! yields a zero effect.

use crate::params::ModelParams;
use crate::types::{
    Advisory, BoneRegion, EffectBreakdown, LoadingCondition, PredictionResult,
};
use log::{trace, warn};

/// Closed-form mechanostat response model
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResponseModel {
    params: ModelParams,
}

impl ResponseModel {
    /// Create a model with the given constants.
    ///
    /// Callers loading constants from user input should run
    /// [`ModelParams::validate`] first.
    pub fn new(params: ModelParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    /// Predict from individual inputs
    pub fn predict(
        &self,
        bone_region: BoneRegion,
        frequency_hz: f64,
        strain_amplitude_microstrain: f64,
        duration_weeks: f64,
    ) -> PredictionResult {
        self.predict_condition(&LoadingCondition::new(
            bone_region,
            frequency_hz,
            strain_amplitude_microstrain,
            duration_weeks,
        ))
    }

    /// Predict for a loading condition. Total: never fails.
    pub fn predict_condition(&self, condition: &LoadingCondition) -> PredictionResult {
        let amplitude = clamp_input(condition.strain_amplitude_microstrain, "strain amplitude");
        let frequency = clamp_input(condition.frequency_hz, "frequency");
        let duration = clamp_input(condition.duration_weeks, "duration");

        let effects = EffectBreakdown {
            amplitude_effect: self.amplitude_effect(amplitude),
            frequency_effect: self.frequency_effect(frequency),
            duration_factor: self.duration_factor(duration),
        };

        let bfr = self.params.baseline_bfr
            + self.params.max_increase
                * effects.amplitude_effect
                * effects.frequency_effect
                * effects.duration_factor;

        let advisories = self.advisories(amplitude, frequency, duration);

        trace!(
            "predict region={} amp={} freq={} dur={} -> bfr={:.4} ({} advisories)",
            condition.bone_region,
            amplitude,
            frequency,
            duration,
            bfr,
            advisories.len()
        );

        PredictionResult {
            bfr,
            advisories,
            effects,
        }
    }

    /// Triangular strain response, 1.0 at the optimum
    pub fn amplitude_effect(&self, amplitude: f64) -> f64 {
        let p = &self.params;
        if amplitude <= p.activation_threshold {
            0.0
        } else if amplitude <= p.optimum_amplitude {
            (amplitude - p.activation_threshold) / (p.optimum_amplitude - p.activation_threshold)
        } else if amplitude <= p.max_amplitude {
            (p.max_amplitude - amplitude) / (p.max_amplitude - p.optimum_amplitude)
        } else {
            0.0
        }
    }

    /// Triangular frequency response, 1.0 at the optimum, 0 at and beyond the band edges
    pub fn frequency_effect(&self, frequency: f64) -> f64 {
        let p = &self.params;
        if frequency <= p.frequency_min || frequency >= p.frequency_max {
            0.0
        } else if frequency <= p.frequency_optimum {
            (frequency - p.frequency_min) / (p.frequency_optimum - p.frequency_min)
        } else {
            (p.frequency_max - frequency) / (p.frequency_max - p.frequency_optimum)
        }
    }

    /// Linear in duration up to the cap, constant afterwards
    pub fn duration_factor(&self, duration: f64) -> f64 {
        duration.min(self.params.duration_cap) * self.params.duration_slope
    }

    /// Advisories for already-clamped inputs: amplitude, then frequency, then duration
    fn advisories(&self, amplitude: f64, frequency: f64, duration: f64) -> Vec<Advisory> {
        let p = &self.params;
        let mut advisories = Vec::new();

        if amplitude < p.activation_threshold {
            advisories.push(Advisory::BelowActivationThreshold);
        }
        if amplitude > p.max_amplitude {
            advisories.push(Advisory::ExceedsSafeStrain);
        }
        if frequency > p.high_frequency_cutoff {
            advisories.push(Advisory::HighFrequency);
        }
        if duration > p.duration_cap {
            advisories.push(Advisory::ProlongedDuration);
        }

        advisories
    }
}

/// Negative and NaN inputs are physically meaningless; treat them as no load
fn clamp_input(value: f64, name: &str) -> f64 {
    if value.is_nan() {
        warn!("{} is NaN, clamping to 0", name);
        0.0
    } else if value < 0.0 {
        warn!("{} {} is negative, clamping to 0", name, value);
        0.0
    } else {
        value
    }
}
