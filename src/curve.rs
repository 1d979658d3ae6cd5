//! Response curve sweeps
//!
//! Evaluates the model along one input axis while holding the other inputs of
//! a base condition fixed. These are the series behind the amplitude,
//! frequency and duration views.

use crate::response::ResponseModel;
use crate::types::LoadingCondition;
use serde::{Deserialize, Serialize};

/// Input varied by a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepAxis {
    Amplitude,
    Frequency,
    Duration,
}

impl SweepAxis {
    /// Default sweep bounds covering the modeled domain plus some margin
    pub fn default_bounds(&self) -> (f64, f64) {
        match self {
            SweepAxis::Amplitude => (0.0, 3500.0),
            SweepAxis::Frequency => (0.0, 12.0),
            SweepAxis::Duration => (0.0, 6.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SweepAxis::Amplitude => "Strain amplitude (µε)",
            SweepAxis::Frequency => "Frequency (Hz)",
            SweepAxis::Duration => "Duration (weeks)",
        }
    }

    fn apply(&self, base: &LoadingCondition, value: f64) -> LoadingCondition {
        let mut condition = base.clone();
        match self {
            SweepAxis::Amplitude => condition.strain_amplitude_microstrain = value,
            SweepAxis::Frequency => condition.frequency_hz = value,
            SweepAxis::Duration => condition.duration_weeks = value,
        }
        condition
    }
}

/// One evaluated point on a response curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Value of the swept input
    pub input: f64,
    /// Effect of the swept factor alone at this input
    pub effect: f64,
    pub bfr: f64,
}

/// Sweep `axis` from `start` to `end` inclusive in `steps` evenly spaced points.
///
/// `steps == 0` yields no points and `steps == 1` a single point at `start`.
pub fn sweep(
    model: &ResponseModel,
    axis: SweepAxis,
    start: f64,
    end: f64,
    steps: usize,
    base: &LoadingCondition,
) -> Vec<CurvePoint> {
    let stride = if steps > 1 {
        (end - start) / (steps - 1) as f64
    } else {
        0.0
    };

    (0..steps)
        .map(|i| {
            // Pin the last point so rounding never overshoots `end`
            let input = if steps > 1 && i == steps - 1 {
                end
            } else {
                start + stride * i as f64
            };
            let prediction = model.predict_condition(&axis.apply(base, input));
            let effect = match axis {
                SweepAxis::Amplitude => prediction.effects.amplitude_effect,
                SweepAxis::Frequency => prediction.effects.frequency_effect,
                SweepAxis::Duration => prediction.effects.duration_factor,
            };
            CurvePoint {
                input,
                effect,
                bfr: prediction.bfr,
            }
        })
        .collect()
}
