// imgpress/src/processors/encoder.rs
use crate::core::{CompressError, OutputFormat, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ColorType, DynamicImage, ImageFormat};
use oxipng::{optimize_from_memory, Options};
use std::io::Cursor;

pub struct Encoder {
    optimize_png: bool,
}

impl Encoder {
    pub fn new() -> Self {
        Self { optimize_png: true }
    }

    pub fn with_png_optimization(mut self, optimize: bool) -> Self {
        self.optimize_png = optimize;
        self
    }

    /// Serializes `image` to `format`. `quality` is in (0, 1] and only
    /// affects lossy formats.
    pub fn encode(&self, image: &DynamicImage, format: OutputFormat, quality: f32) -> Result<Vec<u8>> {
        log::debug!(
            "Encoding {}x{} image as {} at quality {:.3}",
            image.width(),
            image.height(),
            format,
            quality
        );

        match format {
            OutputFormat::Jpeg => self.encode_jpeg(image, quality),
            OutputFormat::Png => self.encode_png(image),
            OutputFormat::WebP => self.encode_webp(image),
        }
    }

    fn encode_jpeg(&self, image: &DynamicImage, quality: f32) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality(quality));

        // JPEG has no alpha channel; transparent pixels are flattened.
        match image.color() {
            ColorType::L8 | ColorType::Rgb8 => image.write_with_encoder(encoder),
            _ => DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder),
        }
        .map_err(|e| CompressError::Encode(format!("JPEG encoding failed: {}", e)))?;

        Ok(buffer)
    }

    fn encode_png(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| CompressError::Encode(format!("PNG encoding failed: {}", e)))?;

        if !self.optimize_png {
            return Ok(buffer.into_inner());
        }

        optimize_from_memory(&buffer.into_inner(), &Options::default())
            .map_err(|e| CompressError::Encode(format!("PNG optimization failed: {}", e)))
    }

    fn encode_webp(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder = WebPEncoder::new_lossless(&mut buffer);

        if image.color().has_alpha() {
            DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(encoder)
        } else {
            DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)
        }
        .map_err(|e| CompressError::Encode(format!("WebP encoding failed: {}", e)))?;

        Ok(buffer)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a (0, 1] quality factor onto the JPEG encoder's 1..=100 scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}
