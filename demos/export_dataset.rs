//! Print a reproducible dataset export envelope for embedding in a static page

use mechanostat::export::ExportEnvelope;
use mechanostat::{MechanoProcessor, DEFAULT_DATASET_SIZE};

fn main() {
    let mut processor = MechanoProcessor::new();
    let dataset = processor.dataset(DEFAULT_DATASET_SIZE, Some(42));

    match ExportEnvelope::new(&dataset, processor.params(), processor.ranges()).to_json() {
        Ok(json) => print!("{json}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
