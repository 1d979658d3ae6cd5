//! Synthetic dataset generation
//!
//! Draws loading conditions uniformly from [`SamplingRanges`] and attaches a
//! prediction from the response model to each. The random source is always an
//! explicit generator: seeded runs use `ChaCha8Rng` so output is stable across
//! platforms, unseeded runs seed one from OS entropy.

use crate::params::SamplingRanges;
use crate::response::ResponseModel;
use crate::types::{BoneRegion, DatasetRecord, LoadingCondition, SyntheticDataset};
use log::debug;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Generator for illustrative datasets backed by a [`ResponseModel`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetSynthesizer {
    model: ResponseModel,
    ranges: SamplingRanges,
}

impl DatasetSynthesizer {
    /// Ranges are expected to have passed [`SamplingRanges::validate`]
    pub fn new(model: ResponseModel, ranges: SamplingRanges) -> Self {
        Self { model, ranges }
    }

    pub fn model(&self) -> &ResponseModel {
        &self.model
    }

    pub fn ranges(&self) -> &SamplingRanges {
        &self.ranges
    }

    /// Synthesize `count` records.
    ///
    /// With a seed the output is bit-for-bit reproducible; without one the
    /// generator is seeded from OS entropy.
    pub fn synthesize(&self, count: usize, seed: Option<u64>) -> SyntheticDataset {
        let mut rng = seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        let mut dataset = self.synthesize_with_rng(count, &mut rng);
        dataset.seed = seed;
        dataset
    }

    /// Synthesize `count` records from a caller-supplied generator.
    ///
    /// Each record consumes draws in a fixed order: region, amplitude,
    /// frequency, duration.
    pub fn synthesize_with_rng<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> SyntheticDataset {
        let records: Vec<DatasetRecord> = (0..count)
            .map(|_| {
                let condition = self.sample_condition(rng);
                let prediction = self.model.predict_condition(&condition);
                DatasetRecord {
                    condition,
                    prediction,
                }
            })
            .collect();

        debug!("synthesized {} records", records.len());

        SyntheticDataset {
            seed: None,
            records,
        }
    }

    fn sample_condition<R: Rng + ?Sized>(&self, rng: &mut R) -> LoadingCondition {
        let region_index = rng.gen_range(0..BoneRegion::NAMED.len());
        let bone_region = BoneRegion::NAMED[region_index].clone();
        let strain_amplitude_microstrain =
            uniform(rng, self.ranges.amplitude.min, self.ranges.amplitude.max);
        let frequency_hz = uniform(rng, self.ranges.frequency.min, self.ranges.frequency.max);
        let duration_weeks = uniform(rng, self.ranges.duration.min, self.ranges.duration.max);

        LoadingCondition {
            bone_region,
            frequency_hz,
            strain_amplitude_microstrain,
            duration_weeks,
        }
    }
}

/// Uniform draw over `[min, max)`; a degenerate range yields `min`
fn uniform<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    let unit: f64 = rng.gen();
    min + (max - min) * unit
}
