//! Dataset export
//!
//! This module encodes synthesized datasets for external tooling: line- or
//! array-oriented JSON, CSV, and a self-describing JSON envelope carrying the
//! producer, parameters and sampling ranges alongside the records.
//! JSON forms keep full f64 precision so every record decodes back unchanged.

use crate::error::ModelError;
use crate::params::{ModelParams, SamplingRanges};
use crate::types::{DatasetRecord, SyntheticDataset};
use crate::{MODEL_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Export encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One record per line
    Ndjson,
    /// JSON array of records
    Json,
    /// Pretty-printed JSON array
    JsonPretty,
    /// Comma-separated with a header row
    Csv,
}

/// Encode dataset records in the requested format
pub fn encode(dataset: &SyntheticDataset, format: OutputFormat) -> Result<String, ModelError> {
    match format {
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for record in dataset.iter() {
                out.push_str(&serde_json::to_string(record)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string(&dataset.records)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(&dataset.records)?),
        OutputFormat::Csv => encode_csv(dataset),
    }
}

/// Decode records written as NDJSON; blank lines are skipped
pub fn decode_ndjson(input: &str) -> Result<Vec<DatasetRecord>, ModelError> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).map_err(ModelError::from))
        .collect()
}

/// Decode records written as a JSON array
pub fn decode_json(input: &str) -> Result<Vec<DatasetRecord>, ModelError> {
    Ok(serde_json::from_str(input)?)
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    bone_region: &'a str,
    frequency_hz: f64,
    strain_amplitude_microstrain: f64,
    duration_weeks: f64,
    bfr: f64,
    advisories: String,
}

fn encode_csv(dataset: &SyntheticDataset) -> Result<String, ModelError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if dataset.is_empty() {
        writer.write_record([
            "bone_region",
            "frequency_hz",
            "strain_amplitude_microstrain",
            "duration_weeks",
            "bfr",
            "advisories",
        ])?;
    }

    for record in dataset.iter() {
        let advisories: Vec<&str> = record
            .prediction
            .advisories
            .iter()
            .map(|a| a.code())
            .collect();
        writer.serialize(CsvRow {
            bone_region: record.condition.bone_region.as_str(),
            frequency_hz: record.condition.frequency_hz,
            strain_amplitude_microstrain: record.condition.strain_amplitude_microstrain,
            duration_weeks: record.condition.duration_weeks,
            bfr: record.prediction.bfr,
            advisories: advisories.join(";"),
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ModelError::CsvError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ModelError::EncodingError(e.to_string()))
}

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportProducer {
    pub name: String,
    pub version: String,
}

/// Self-describing dataset export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEnvelope {
    pub producer: ExportProducer,
    /// Unique per export
    pub export_id: String,
    pub generated_at_utc: DateTime<Utc>,
    pub seed: Option<u64>,
    pub count: usize,
    pub params: ModelParams,
    pub ranges: SamplingRanges,
    pub records: Vec<DatasetRecord>,
}

impl ExportEnvelope {
    pub fn new(dataset: &SyntheticDataset, params: &ModelParams, ranges: &SamplingRanges) -> Self {
        Self {
            producer: ExportProducer {
                name: PRODUCER_NAME.to_string(),
                version: MODEL_VERSION.to_string(),
            },
            export_id: Uuid::new_v4().to_string(),
            generated_at_utc: Utc::now(),
            seed: dataset.seed,
            count: dataset.len(),
            params: *params,
            ranges: *ranges,
            records: dataset.records.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string_pretty(self).map_err(ModelError::JsonError)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuild the dataset carried by this envelope
    pub fn dataset(&self) -> SyntheticDataset {
        SyntheticDataset {
            seed: self.seed,
            records: self.records.clone(),
        }
    }
}

/// Rounded row for tabular listings. Display only; not for round-trips.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub bone_region: String,
    pub frequency_hz: f64,
    pub strain_amplitude_microstrain: f64,
    pub duration_weeks: f64,
    pub bfr: f64,
}

/// Round frequency, duration and BFR to 2 decimals and amplitude to whole µε
pub fn display_table(dataset: &SyntheticDataset) -> Vec<TableRow> {
    dataset
        .iter()
        .map(|record| TableRow {
            bone_region: record.condition.bone_region.to_string(),
            frequency_hz: round_to(record.condition.frequency_hz, 2),
            strain_amplitude_microstrain: record.condition.strain_amplitude_microstrain.round(),
            duration_weeks: round_to(record.condition.duration_weeks, 2),
            bfr: round_to(record.prediction.bfr, 2),
        })
        .collect()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::DatasetSynthesizer;
    use pretty_assertions::assert_eq;

    fn dataset() -> SyntheticDataset {
        DatasetSynthesizer::default().synthesize(60, Some(42))
    }

    #[test]
    fn test_ndjson_roundtrip() {
        let dataset = dataset();
        let encoded = encode(&dataset, OutputFormat::Ndjson).unwrap();
        assert_eq!(encoded.lines().count(), 60);
        assert_eq!(decode_ndjson(&encoded).unwrap(), dataset.records);
    }

    #[test]
    fn test_json_roundtrip() {
        let dataset = dataset();
        let compact = encode(&dataset, OutputFormat::Json).unwrap();
        assert_eq!(decode_json(&compact).unwrap(), dataset.records);
        let pretty = encode(&dataset, OutputFormat::JsonPretty).unwrap();
        assert_eq!(decode_json(&pretty).unwrap(), dataset.records);
    }

    #[test]
    fn test_csv_layout() {
        let dataset = dataset();
        let encoded = encode(&dataset, OutputFormat::Csv).unwrap();
        let mut lines = encoded.lines();
        assert_eq!(
            lines.next().unwrap(),
            "bone_region,frequency_hz,strain_amplitude_microstrain,duration_weeks,bfr,advisories"
        );
        assert_eq!(lines.count(), 60);
    }

    #[test]
    fn test_csv_values_parse_back() {
        let dataset = dataset();
        let encoded = encode(&dataset, OutputFormat::Csv).unwrap();
        let mut reader = csv::Reader::from_reader(encoded.as_bytes());
        for (row, record) in reader.records().zip(dataset.iter()) {
            let row = row.unwrap();
            assert_eq!(&row[0], record.condition.bone_region.as_str());
            let bfr: f64 = row[4].parse().unwrap();
            assert_eq!(bfr, record.prediction.bfr);
        }
    }

    #[test]
    fn test_empty_dataset_encodings() {
        let empty = SyntheticDataset::default();
        assert_eq!(encode(&empty, OutputFormat::Ndjson).unwrap(), "");
        assert_eq!(encode(&empty, OutputFormat::Json).unwrap(), "[]");
        let csv = encode(&empty, OutputFormat::Csv).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_envelope_roundtrip() {
        let dataset = dataset();
        let envelope = ExportEnvelope::new(
            &dataset,
            &ModelParams::default(),
            &SamplingRanges::default(),
        );
        assert_eq!(envelope.count, 60);
        assert_eq!(envelope.seed, Some(42));
        assert_eq!(envelope.producer.name, PRODUCER_NAME);

        let parsed = ExportEnvelope::from_json(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(parsed, envelope);
        assert_eq!(parsed.dataset(), dataset);
    }

    #[test]
    fn test_display_table_rounding() {
        let table = display_table(&dataset());
        for row in &table {
            assert_eq!(row.strain_amplitude_microstrain.fract(), 0.0);
            assert!(((row.bfr * 100.0).round() - row.bfr * 100.0).abs() < 1e-6);
        }
        assert_eq!(round_to(5.4567, 2), 5.46);
    }
}
