//! Mechanostat - Mechanobiology response model for bone formation
//!
//! Mechanostat predicts a dimensionless bone formation rate (BFR) from three
//! mechanical loading inputs: strain amplitude, loading frequency and duration.
//! The prediction combines closed-form piecewise response curves derived from
//! published loading studies: baseline + scale × amplitude × frequency × duration.
//!
//! ## Modules
//!
//! - **Response Model**: Pure prediction with advisories for out-of-range inputs
//! - **Dataset Synthesizer**: Seeded or entropy-backed illustrative datasets
//! - **Export**: JSON, NDJSON and CSV encodings plus a self-describing envelope
//!
//! This is a demonstration model, not a validated scientific instrument.

pub mod curve;
pub mod error;
pub mod export;
pub mod interpret;
pub mod params;
pub mod pipeline;
pub mod response;
pub mod synth;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::ModelError;
pub use interpret::Interpretation;
pub use params::{ModelParams, SamplingRanges, DEFAULT_DATASET_SIZE};
pub use pipeline::{predict, synthesize, MechanoProcessor};
pub use response::ResponseModel;
pub use synth::DatasetSynthesizer;
pub use types::{
    Advisory, BoneRegion, DatasetRecord, EffectBreakdown, LoadingCondition, PredictionResult,
    SyntheticDataset,
};

/// Mechanostat version embedded in exports
pub const MODEL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for exports
pub const PRODUCER_NAME: &str = "mechanostat";
