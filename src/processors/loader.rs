// imgpress/src/processors/loader.rs
use crate::core::{CompressError, Result, MAX_DIMENSION};
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;

#[derive(Clone)]
pub struct Loader {
    max_dimensions: Option<(u32, u32)>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            max_dimensions: Some((MAX_DIMENSION, MAX_DIMENSION)),
        }
    }

    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_dimensions = Some((width, height));
        self
    }

    /// Identifies the container format from the leading bytes.
    pub fn sniff_format(&self, data: &[u8]) -> Result<ImageFormat> {
        image::guess_format(data).map_err(|_| {
            CompressError::NotAnImage("content does not match any known image signature".to_string())
        })
    }

    /// Reads the pixel dimensions from the header without decoding pixels.
    pub fn read_dimensions(&self, data: &[u8]) -> Result<(u32, u32)> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(CompressError::Io)?;

        reader
            .into_dimensions()
            .map_err(|e| CompressError::Decode(format!("Failed to read image header: {}", e)))
    }

    pub fn decode(&self, data: &[u8]) -> Result<DynamicImage> {
        if data.is_empty() {
            return Err(CompressError::Decode("input is empty".to_string()));
        }

        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(CompressError::Io)?;

        if let (Some((max_w, max_h)), Ok((width, height))) =
            (self.max_dimensions, self.read_dimensions(data))
        {
            if width > max_w || height > max_h {
                return Err(CompressError::Decode(format!(
                    "Image dimensions {}x{} exceed maximum {}x{}",
                    width, height, max_w, max_h
                )));
            }
        }

        let image = reader
            .decode()
            .map_err(|e| CompressError::Decode(format!("Failed to decode image: {}", e)))?;

        let (width, height) = image.dimensions();
        log::debug!(
            "Decoded image: {}x{} pixels, color: {:?}",
            width,
            height,
            image.color()
        );

        Ok(image)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
