// imgpress/src/processors/mod.rs
mod batch;
mod encoder;
mod loader;
mod metadata;
mod reducer;
mod resizer;

pub use batch::{collect_files, read_input_file, BatchProcessor};
pub use encoder::{jpeg_quality, Encoder};
pub use loader::Loader;
pub use metadata::MetadataProcessor;
pub use reducer::{
    Reduction, ReductionState, SizeReducer, MAX_ENCODE_ATTEMPTS, QUALITY_DECAY, QUALITY_FLOOR,
};
pub use resizer::{compute_dimensions, Resizer};
