// imgpress/src/core/mod.rs
pub mod pipeline;
pub mod state;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const BYTES_PER_MB: u64 = 1024 * 1024;
pub const MAX_DIMENSION: u32 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAlgorithm {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

/// Encoded format of compressed output, addressed by MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    pub fn from_mime(mime: &str) -> Result<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Ok(OutputFormat::Jpeg),
            "image/png" => Ok(OutputFormat::Png),
            "image/webp" => Ok(OutputFormat::WebP),
            other => Err(CompressError::UnsupportedFormat(format!(
                "cannot encode to '{}'",
                other
            ))),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        }
    }

    /// Whether the encoder output depends on the quality factor.
    pub fn is_lossy(&self) -> bool {
        matches!(self, OutputFormat::Jpeg)
    }
}

impl FromStr for OutputFormat {
    type Err = CompressError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_mime(s)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

#[derive(Debug, Clone)]
pub struct CompressionOptions {
    /// Files at or below this size (in MB) are returned unchanged.
    pub max_size_mb: f64,
    /// The reducer stops as soon as the output is at or below this size.
    pub target_size_mb: f64,
    pub max_width_or_height: u32,
    /// Initial encoder quality in (0, 1].
    pub quality: f32,
    pub output_format: OutputFormat,
    pub algorithm: ResizeAlgorithm,
    pub respect_orientation: bool,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            max_size_mb: 2.0,
            target_size_mb: 1.3,
            max_width_or_height: 1920,
            quality: 0.8,
            output_format: OutputFormat::Jpeg,
            algorithm: ResizeAlgorithm::Lanczos3,
            respect_orientation: true,
        }
    }
}

impl CompressionOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.max_size_mb.is_finite() || self.max_size_mb <= 0.0 {
            return Err(CompressError::InvalidOptions(format!(
                "max size must be a positive number of MB, got {}",
                self.max_size_mb
            )));
        }

        if !self.target_size_mb.is_finite() || self.target_size_mb <= 0.0 {
            return Err(CompressError::InvalidOptions(format!(
                "target size must be a positive number of MB, got {}",
                self.target_size_mb
            )));
        }

        if self.max_width_or_height == 0 || self.max_width_or_height > MAX_DIMENSION {
            return Err(CompressError::InvalidOptions(format!(
                "max edge must be between 1 and {} pixels",
                MAX_DIMENSION
            )));
        }

        if !self.quality.is_finite() || self.quality <= 0.0 || self.quality > 1.0 {
            return Err(CompressError::InvalidOptions(
                "quality must be in the range (0, 1]".to_string(),
            ));
        }

        Ok(())
    }

    /// True when a file of `size` bytes is large enough to be compressed.
    pub fn exceeds_threshold(&self, size: u64) -> bool {
        size as f64 > self.max_size_mb * BYTES_PER_MB as f64
    }

    pub fn fits_target(&self, size: usize) -> bool {
        size as f64 <= self.target_size_mb * BYTES_PER_MB as f64
    }
}

/// An in-memory file as handed over by the upload workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Judged by the declared MIME type only; content is sniffed later.
    pub fn is_image(&self) -> bool {
        self.mime_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "message", rename_all = "snake_case")]
pub enum PassThroughReason {
    NotAnImage,
    UnderThreshold,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Compressed {
        width: u32,
        height: u32,
        quality: f32,
        attempts: u32,
    },
    PassThrough(PassThroughReason),
}

#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub file: InputFile,
    pub original_size: u64,
    pub compressed_size: u64,
    pub compression_ratio: f64,
    pub outcome: Outcome,
}

impl CompressionResult {
    pub fn pass_through(file: InputFile, reason: PassThroughReason) -> Self {
        let size = file.size_bytes();
        Self {
            file,
            original_size: size,
            compressed_size: size,
            compression_ratio: 1.0,
            outcome: Outcome::PassThrough(reason),
        }
    }

    pub fn compressed(file: InputFile, original_size: u64, outcome: Outcome) -> Self {
        let compressed_size = file.size_bytes();
        let compression_ratio = if original_size == 0 {
            1.0
        } else {
            compressed_size as f64 / original_size as f64
        };

        Self {
            file,
            original_size,
            compressed_size,
            compression_ratio,
            outcome,
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.outcome, Outcome::Compressed { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self.outcome,
            Outcome::PassThrough(PassThroughReason::Failed(_))
        )
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct BatchStats {
    pub processed_count: usize,
    pub compressed_count: usize,
    pub passed_through_count: usize,
    pub failed_count: usize,
    pub total_size_before: u64,
    pub total_size_after: u64,
}

impl BatchStats {
    pub fn from_results(results: &[CompressionResult]) -> Self {
        let mut stats = BatchStats::default();
        for result in results {
            stats.processed_count += 1;
            stats.total_size_before += result.original_size;
            stats.total_size_after += result.compressed_size;
            if result.is_compressed() {
                stats.compressed_count += 1;
            } else {
                stats.passed_through_count += 1;
                if result.is_failure() {
                    stats.failed_count += 1;
                }
            }
        }
        stats
    }

    pub fn overall_savings(&self) -> f64 {
        if self.total_size_before == 0 {
            return 0.0;
        }

        let savings = (self.total_size_before as f64 - self.total_size_after as f64)
            / self.total_size_before as f64
            * 100.0;
        savings.clamp(0.0, 100.0)
    }
}

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Not an image: {0}")]
    NotAnImage(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Report error: {0}")]
    Report(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CompressError>;
