// imgpress/src/cli.rs
use crate::core::{CompressionOptions, OutputFormat, ResizeAlgorithm};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "imgpress", version, about = "Shrink images before upload")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compress individual files into an output directory
    Compress {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        options: CompressArgs,
    },

    /// Compress every file in a directory
    Batch {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long)]
        recursive: bool,

        /// Worker threads (0 = one per core, 1 = sequential)
        #[arg(short = 'j', long, default_value_t = 1)]
        threads: usize,

        #[command(flatten)]
        options: CompressArgs,
    },

    /// Show what the pipeline would do with a file
    Info {
        input: PathBuf,

        #[command(flatten)]
        options: CompressArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CompressArgs {
    /// Files at or below this size (MB) are left untouched
    #[arg(long, default_value_t = 2.0)]
    pub max_size_mb: f64,

    /// Stop lowering quality once output is at or below this size (MB)
    #[arg(long, default_value_t = 1.3)]
    pub target_size_mb: f64,

    /// Longest edge in pixels
    #[arg(long = "max-edge", default_value_t = 1920)]
    pub max_width_or_height: u32,

    /// Initial encoder quality in (0, 1]
    #[arg(short, long, default_value_t = 0.8)]
    pub quality: f32,

    /// Output MIME type (image/jpeg, image/png, image/webp)
    #[arg(short, long, default_value = "image/jpeg")]
    pub format: String,

    #[arg(short, long, value_enum, default_value_t = Algorithm::Lanczos3)]
    pub algorithm: Algorithm,

    /// Ignore the EXIF orientation tag
    #[arg(long)]
    pub no_orientation: bool,

    /// Write a JSON report of the run
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl CompressArgs {
    pub fn to_options(&self) -> crate::Result<CompressionOptions> {
        let options = CompressionOptions {
            max_size_mb: self.max_size_mb,
            target_size_mb: self.target_size_mb,
            max_width_or_height: self.max_width_or_height,
            quality: self.quality,
            output_format: self.format.parse::<OutputFormat>()?,
            algorithm: self.algorithm.into(),
            respect_orientation: !self.no_orientation,
        };
        options.validate()?;
        Ok(options)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl From<Algorithm> for ResizeAlgorithm {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Nearest => ResizeAlgorithm::Nearest,
            Algorithm::Bilinear => ResizeAlgorithm::Bilinear,
            Algorithm::Bicubic => ResizeAlgorithm::Bicubic,
            Algorithm::Lanczos3 => ResizeAlgorithm::Lanczos3,
        }
    }
}
