// imgpress/src/core/pipeline.rs
use super::{
    CompressError, CompressionOptions, CompressionResult, InputFile, Outcome, PassThroughReason,
    Result,
};
use crate::processors::{Loader, MetadataProcessor, Resizer, SizeReducer};
use crate::utils::{format_file_size, replace_extension};

/// Compresses a single file.
pub struct ImagePipeline {
    options: CompressionOptions,
    loader: Loader,
    resizer: Resizer,
    reducer: SizeReducer,
    metadata_processor: MetadataProcessor,
}

impl ImagePipeline {
    pub fn new(options: CompressionOptions) -> Result<Self> {
        options.validate()?;

        let resizer = Resizer::new(options.algorithm);

        Ok(Self {
            options,
            loader: Loader::new(),
            resizer,
            reducer: SizeReducer::default(),
            metadata_processor: MetadataProcessor::new(),
        })
    }

    pub fn options(&self) -> &CompressionOptions {
        &self.options
    }

    /// Whether `file` would be routed through the encoder at all.
    pub fn should_compress(&self, file: &InputFile) -> bool {
        file.is_image() && self.options.exceeds_threshold(file.size_bytes())
    }

    /// Never fails: anything that goes wrong degrades to the original file.
    pub fn process(&self, file: InputFile) -> CompressionResult {
        if !file.is_image() {
            log::debug!("{} ({}) is not an image, passing through", file.name, file.mime_type);
            return CompressionResult::pass_through(file, PassThroughReason::NotAnImage);
        }

        if !self.options.exceeds_threshold(file.size_bytes()) {
            log::debug!(
                "{} is {}, under the {} MB threshold",
                file.name,
                format_file_size(file.size_bytes()),
                self.options.max_size_mb
            );
            return CompressionResult::pass_through(file, PassThroughReason::UnderThreshold);
        }

        match self.compress(&file) {
            Ok(result) => result,
            Err(CompressError::NotAnImage(reason)) => {
                log::debug!("{} is declared as {} but {}", file.name, file.mime_type, reason);
                CompressionResult::pass_through(file, PassThroughReason::NotAnImage)
            }
            Err(e) => {
                log::warn!("Failed to compress {}, uploading original: {}", file.name, e);
                let reason = PassThroughReason::Failed(e.to_string());
                CompressionResult::pass_through(file, reason)
            }
        }
    }

    /// Decodes, resizes and re-encodes `file` unconditionally.
    pub fn compress(&self, file: &InputFile) -> Result<CompressionResult> {
        self.loader.sniff_format(&file.bytes)?;

        let resized = {
            let mut image = self.loader.decode(&file.bytes)?;
            if self.options.respect_orientation {
                image = self.metadata_processor.orient(image, &file.bytes);
            }
            self.resizer.fit_within(&image, self.options.max_width_or_height)
        };

        let reduction = self.reducer.reduce_to_target(&resized, &self.options)?;

        let format = self.options.output_format;
        let original_size = file.size_bytes();
        let output = InputFile::new(
            replace_extension(&file.name, format.extension()),
            format.mime_type(),
            reduction.bytes,
        );

        log::info!(
            "Compressed {}: {} -> {} ({}x{}, quality {:.2}, {} attempt(s))",
            file.name,
            format_file_size(original_size),
            format_file_size(output.size_bytes()),
            resized.width(),
            resized.height(),
            reduction.quality,
            reduction.attempts
        );

        let outcome = Outcome::Compressed {
            width: resized.width(),
            height: resized.height(),
            quality: reduction.quality,
            attempts: reduction.attempts,
        };

        Ok(CompressionResult::compressed(output, original_size, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OutputFormat, BYTES_PER_MB};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn gradient_png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
        });
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    /// Thresholds small enough that test fixtures count as "large".
    fn small_options() -> CompressionOptions {
        CompressionOptions {
            max_size_mb: 1024.0 / BYTES_PER_MB as f64,
            target_size_mb: 512.0 / BYTES_PER_MB as f64,
            max_width_or_height: 64,
            ..Default::default()
        }
    }

    #[test]
    fn rejects_invalid_options() {
        let options = CompressionOptions {
            quality: 2.0,
            ..Default::default()
        };
        assert!(ImagePipeline::new(options).is_err());
    }

    #[test]
    fn non_image_passes_through() {
        let pipeline = ImagePipeline::new(small_options()).unwrap();
        let file = InputFile::new("c.pdf", "application/pdf", vec![1; 5000]);
        let result = pipeline.process(file.clone());
        assert_eq!(result.file, file);
        assert_eq!(result.outcome, Outcome::PassThrough(PassThroughReason::NotAnImage));
        assert_eq!(result.compression_ratio, 1.0);
    }

    #[test]
    fn small_image_passes_through() {
        let pipeline = ImagePipeline::new(CompressionOptions::default()).unwrap();
        let file = InputFile::new("b.png", "image/png", gradient_png(16, 16));
        let result = pipeline.process(file.clone());
        assert_eq!(result.file, file);
        assert_eq!(result.outcome, Outcome::PassThrough(PassThroughReason::UnderThreshold));
    }

    #[test]
    fn mislabelled_file_is_not_an_image() {
        let pipeline = ImagePipeline::new(small_options()).unwrap();
        let file = InputFile::new("fake.jpg", "image/jpeg", vec![b'x'; 4096]);
        let result = pipeline.process(file);
        assert_eq!(result.outcome, Outcome::PassThrough(PassThroughReason::NotAnImage));
        assert_eq!(result.compressed_size, 4096);
    }

    #[test]
    fn large_image_is_resized_and_reencoded() {
        let pipeline = ImagePipeline::new(small_options()).unwrap();
        let file = InputFile::new("photo.png", "image/png", gradient_png(256, 128));
        let original_size = file.size_bytes();

        let result = pipeline.process(file);

        assert!(result.is_compressed());
        assert_eq!(result.file.name, "photo.jpg");
        assert_eq!(result.file.mime_type, "image/jpeg");
        assert_eq!(result.original_size, original_size);
        assert_eq!(result.compressed_size, result.file.size_bytes());
        match result.outcome {
            Outcome::Compressed { width, height, attempts, .. } => {
                assert_eq!((width, height), (64, 32));
                assert!((1..=5).contains(&attempts));
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let decoded = image::load_from_memory(&result.file.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 32));
    }

    #[test]
    fn corrupt_image_degrades_to_original() {
        let pipeline = ImagePipeline::new(small_options()).unwrap();
        let mut bytes = gradient_png(128, 128);
        bytes.truncate(bytes.len() / 2);
        let file = InputFile::new("broken.png", "image/png", bytes);

        let result = pipeline.process(file.clone());

        assert!(result.is_failure());
        assert_eq!(result.file, file);
        assert_eq!(result.compression_ratio, 1.0);
    }

    #[test]
    fn png_output_keeps_png_extension() {
        let options = CompressionOptions {
            output_format: OutputFormat::Png,
            ..small_options()
        };
        let pipeline = ImagePipeline::new(options).unwrap();
        let file = InputFile::new("scan.jpeg", "image/png", gradient_png(128, 128));
        let result = pipeline.compress(&file).unwrap();
        assert_eq!(result.file.name, "scan.png");
        assert_eq!(result.file.mime_type, "image/png");
    }
}
