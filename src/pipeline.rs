//! Pipeline orchestration
//!
//! This module provides the public API for Mechanostat: one-shot `predict` and
//! `synthesize` with the reference constants, and a stateful processor that
//! holds custom constants and caches seeded datasets for a session.

use crate::error::ModelError;
use crate::interpret::Interpretation;
use crate::params::{ModelParams, SamplingRanges};
use crate::response::ResponseModel;
use crate::synth::DatasetSynthesizer;
use crate::types::{BoneRegion, LoadingCondition, PredictionResult, SyntheticDataset};
use log::debug;
use std::sync::Arc;

/// Predict bone formation rate with the reference constants.
///
/// # Arguments
/// * `bone_region` - Loaded bone (informational)
/// * `frequency_hz` - Loading frequency in Hz
/// * `strain_amplitude_microstrain` - Peak strain in µε
/// * `duration_weeks` - Program length in weeks
///
/// # Example
/// ```
/// use mechanostat::{predict, BoneRegion};
///
/// let result = predict(BoneRegion::Tibia, 5.0, 1500.0, 2.0);
/// assert_eq!(result.bfr, 6.0);
/// assert!(result.advisories.is_empty());
/// ```
pub fn predict(
    bone_region: BoneRegion,
    frequency_hz: f64,
    strain_amplitude_microstrain: f64,
    duration_weeks: f64,
) -> PredictionResult {
    ResponseModel::default().predict(
        bone_region,
        frequency_hz,
        strain_amplitude_microstrain,
        duration_weeks,
    )
}

/// Synthesize a dataset with the reference constants and sampling ranges.
///
/// # Example
/// ```
/// let a = mechanostat::synthesize(300, Some(42));
/// let b = mechanostat::synthesize(300, Some(42));
/// assert_eq!(a, b);
/// ```
pub fn synthesize(count: usize, seed: Option<u64>) -> SyntheticDataset {
    DatasetSynthesizer::default().synthesize(count, seed)
}

/// Stateful processor for a dashboard or export session.
///
/// The most recent seeded dataset is cached and handed out as a shared,
/// read-only `Arc`; a request with a different `(count, seed)` replaces it.
/// Unseeded requests always produce a fresh dataset.
pub struct MechanoProcessor {
    params: ModelParams,
    ranges: SamplingRanges,
    synthesizer: DatasetSynthesizer,
    cache: Option<((usize, u64), Arc<SyntheticDataset>)>,
}

impl Default for MechanoProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MechanoProcessor {
    /// Create a processor with the reference constants
    pub fn new() -> Self {
        Self::build(ModelParams::default(), SamplingRanges::default())
    }

    /// Create a processor with custom constants and ranges
    pub fn with_params(params: ModelParams, ranges: SamplingRanges) -> Result<Self, ModelError> {
        params.validate()?;
        ranges.validate()?;
        Ok(Self::build(params, ranges))
    }

    fn build(params: ModelParams, ranges: SamplingRanges) -> Self {
        Self {
            params,
            ranges,
            synthesizer: DatasetSynthesizer::new(ResponseModel::new(params), ranges),
            cache: None,
        }
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn ranges(&self) -> &SamplingRanges {
        &self.ranges
    }

    pub fn model(&self) -> &ResponseModel {
        self.synthesizer.model()
    }

    /// Single-point prediction
    pub fn predict(&self, condition: &LoadingCondition) -> PredictionResult {
        self.model().predict_condition(condition)
    }

    /// Qualitative reading of a condition under this processor's constants
    pub fn interpret(&self, condition: &LoadingCondition) -> Interpretation {
        Interpretation::classify(condition, &self.params)
    }

    /// Dataset for this session; seeded requests are served from the cache
    pub fn dataset(&mut self, count: usize, seed: Option<u64>) -> Arc<SyntheticDataset> {
        let Some(seed) = seed else {
            return Arc::new(self.synthesizer.synthesize(count, None));
        };

        if let Some((key, cached)) = &self.cache {
            if *key == (count, seed) {
                debug!("dataset cache hit count={} seed={}", count, seed);
                return Arc::clone(cached);
            }
        }

        debug!("dataset cache miss count={} seed={}", count, seed);
        let dataset = Arc::new(self.synthesizer.synthesize(count, Some(seed)));
        self.cache = Some(((count, seed), Arc::clone(&dataset)));
        dataset
    }

    /// Number of cached datasets (0 or 1)
    pub fn cached_datasets(&self) -> usize {
        usize::from(self.cache.is_some())
    }

    /// Drop the cached dataset
    pub fn clear_cache(&mut self) {
        self.cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Advisory;

    #[test]
    fn test_predict_reference_scenarios() {
        assert_eq!(predict(BoneRegion::Tibia, 5.0, 1500.0, 2.0).bfr, 6.0);

        let low = predict(BoneRegion::Tibia, 5.0, 500.0, 2.0);
        assert_eq!(low.bfr, 1.0);
        assert_eq!(low.advisories, vec![Advisory::BelowActivationThreshold]);

        let high = predict(BoneRegion::Tibia, 5.0, 3500.0, 2.0);
        assert_eq!(high.bfr, 1.0);
        assert_eq!(high.advisories, vec![Advisory::ExceedsSafeStrain]);
    }

    #[test]
    fn test_synthesize_reproducible_and_consistent() {
        let first = synthesize(300, Some(42));
        let second = synthesize(300, Some(42));
        assert_eq!(first, second);
        assert!(synthesize(0, None).is_empty());

        for record in first.iter() {
            let c = &record.condition;
            let again = predict(
                c.bone_region.clone(),
                c.frequency_hz,
                c.strain_amplitude_microstrain,
                c.duration_weeks,
            );
            assert_eq!(record.prediction.bfr, again.bfr);
        }
    }

    #[test]
    fn test_processor_caches_seeded_datasets() {
        let mut processor = MechanoProcessor::new();
        let a = processor.dataset(300, Some(42));
        let b = processor.dataset(300, Some(42));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(processor.cached_datasets(), 1);

        processor.clear_cache();
        assert_eq!(processor.cached_datasets(), 0);
        let d = processor.dataset(300, Some(42));
        assert!(!Arc::ptr_eq(&a, &d));
        assert_eq!(*a, *d);
    }

    #[test]
    fn test_processor_cache_holds_only_latest() {
        let mut processor = MechanoProcessor::new();
        let first = processor.dataset(300, Some(42));
        for seed in 0..50 {
            processor.dataset(10, Some(seed));
            assert_eq!(processor.cached_datasets(), 1);
        }

        let latest = processor.dataset(10, Some(49));
        assert_eq!(processor.cached_datasets(), 1);
        assert!(Arc::ptr_eq(&latest, &processor.dataset(10, Some(49))));

        let again = processor.dataset(300, Some(42));
        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(*first, *again);
    }

    #[test]
    fn test_processor_does_not_cache_unseeded() {
        let mut processor = MechanoProcessor::new();
        let dataset = processor.dataset(10, None);
        assert_eq!(dataset.len(), 10);
        assert_eq!(processor.cached_datasets(), 0);
    }

    #[test]
    fn test_processor_rejects_invalid_params() {
        let params = ModelParams {
            max_amplitude: 1000.0,
            ..Default::default()
        };
        assert!(MechanoProcessor::with_params(params, SamplingRanges::default()).is_err());
    }

    #[test]
    fn test_processor_custom_params_flow_through() {
        let params = ModelParams {
            max_increase: 2.0,
            ..Default::default()
        };
        let processor = MechanoProcessor::with_params(params, SamplingRanges::default()).unwrap();
        let condition = LoadingCondition::new(BoneRegion::Humerus, 5.0, 1500.0, 2.0);
        assert_eq!(processor.predict(&condition).bfr, 3.0);
        assert_eq!(
            processor.interpret(&condition),
            Interpretation::StimulatoryWindow
        );
    }

    #[test]
    fn test_shared_dataset_across_threads() {
        let mut processor = MechanoProcessor::new();
        let dataset = processor.dataset(50, Some(5));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&dataset);
                std::thread::spawn(move || shared.iter().map(|r| r.prediction.bfr).sum::<f64>())
            })
            .collect();
        let expected: f64 = dataset.iter().map(|r| r.prediction.bfr).sum();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
