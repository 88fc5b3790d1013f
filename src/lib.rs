//! Pre-upload image compression.
//!
//! Images larger than a threshold are decoded, scaled down to a maximum
//! edge length and re-encoded with decreasing quality until they fit a size
//! target. Everything else, and anything that fails along the way, is
//! returned unchanged so an upload is never blocked by a single file.
//!
//! ```no_run
//! use imgpress::{BatchProcessor, CompressionOptions, InputFile};
//!
//! let processor = BatchProcessor::new(CompressionOptions::default())?;
//! let bytes = std::fs::read("photo.jpg")?;
//! let results = processor.compress_batch(vec![InputFile::new("photo.jpg", "image/jpeg", bytes)]);
//! println!("ratio: {:.2}", results[0].compression_ratio);
//! # Ok::<(), imgpress::CompressError>(())
//! ```

mod cli;
mod core;
mod processors;
mod report;
mod utils;

pub use crate::cli::{Algorithm, Cli, Commands, CompressArgs};
pub use crate::core::pipeline::ImagePipeline;
pub use crate::core::state::{BatchEvent, BatchObserver, FileStatus, NoopObserver, UploadState};
pub use crate::core::{
    BatchStats, CompressError, CompressionOptions, CompressionResult, InputFile, Outcome,
    OutputFormat, PassThroughReason, ResizeAlgorithm, Result, BYTES_PER_MB, MAX_DIMENSION,
};
pub use crate::processors::{
    collect_files, compute_dimensions, jpeg_quality, read_input_file, BatchProcessor, Encoder,
    Loader, MetadataProcessor, Reduction, ReductionState, Resizer, SizeReducer,
    MAX_ENCODE_ATTEMPTS, QUALITY_DECAY, QUALITY_FLOOR,
};
pub use crate::report::{BatchReport, FileReport, OptionsSummary};
pub use crate::utils::{
    format_file_size, generate_output_path, get_file_extension, mime_from_path,
    replace_extension, sanitize_filename,
};

pub mod prelude {
    pub use crate::{
        BatchProcessor, CompressionOptions, CompressionResult, ImagePipeline, InputFile,
        OutputFormat, UploadState,
    };
}

// Re-export commonly used types
pub use image::DynamicImage;
