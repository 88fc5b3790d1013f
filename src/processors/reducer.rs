// imgpress/src/processors/reducer.rs
use crate::core::{CompressionOptions, Result};
use crate::processors::Encoder;
use image::DynamicImage;

pub const QUALITY_DECAY: f32 = 0.8;
pub const QUALITY_FLOOR: f32 = 0.1;
pub const MAX_ENCODE_ATTEMPTS: u32 = 5;

/// Position of the reducer between two encodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReductionState {
    pub quality: f32,
    pub attempts: u32,
}

impl ReductionState {
    pub fn start(quality: f32) -> Self {
        Self { quality, attempts: 0 }
    }

    /// State after an encode at the current quality, with quality decayed
    /// for the next attempt.
    pub fn next(self) -> Self {
        Self {
            quality: self.quality * QUALITY_DECAY,
            attempts: self.attempts + 1,
        }
    }

    /// Whether to stop after encoding at this state's quality: on a fit,
    /// at the quality floor, or once the attempt cap is reached.
    pub fn is_terminal(&self, fits_target: bool) -> bool {
        fits_target || self.quality <= QUALITY_FLOOR || self.attempts + 1 >= MAX_ENCODE_ATTEMPTS
    }
}

#[derive(Debug, Clone)]
pub struct Reduction {
    pub bytes: Vec<u8>,
    /// Quality of the encode that produced `bytes`.
    pub quality: f32,
    pub attempts: u32,
}

pub struct SizeReducer {
    encoder: Encoder,
}

impl SizeReducer {
    pub fn new(encoder: Encoder) -> Self {
        Self { encoder }
    }

    /// Re-encodes `image` with decreasing quality until the output fits
    /// `options.target_size_mb`. Always returns the last output, even when
    /// it is still above the target.
    pub fn reduce_to_target(
        &self,
        image: &DynamicImage,
        options: &CompressionOptions,
    ) -> Result<Reduction> {
        let mut state = ReductionState::start(options.quality);

        loop {
            let bytes = self.encoder.encode(image, options.output_format, state.quality)?;
            let fits = options.fits_target(bytes.len());

            log::debug!(
                "Encode attempt {} at quality {:.3}: {} bytes (fits target: {})",
                state.attempts + 1,
                state.quality,
                bytes.len(),
                fits
            );

            if state.is_terminal(fits) || !options.output_format.is_lossy() {
                return Ok(Reduction {
                    bytes,
                    quality: state.quality,
                    attempts: state.attempts + 1,
                });
            }

            state = state.next();
        }
    }
}

impl Default for SizeReducer {
    fn default() -> Self {
        Self::new(Encoder::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OutputFormat, BYTES_PER_MB};
    use image::{Rgb, RgbImage};

    fn noisy_image(width: u32, height: u32) -> DynamicImage {
        let mut seed: u32 = 0xDEAD_BEEF;
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let [r, g, b, _] = seed.to_le_bytes();
            Rgb([r, g, b])
        }))
    }

    fn options_with_target_bytes(target: u64) -> CompressionOptions {
        CompressionOptions {
            target_size_mb: target as f64 / BYTES_PER_MB as f64,
            max_size_mb: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn state_transitions_are_pure() {
        let start = ReductionState::start(0.8);
        let next = start.next();
        assert_eq!(start, ReductionState { quality: 0.8, attempts: 0 });
        assert_eq!(next.attempts, 1);
        assert!((next.quality - 0.64).abs() < 1e-6);
    }

    #[test]
    fn attempt_cap_is_five_encodes() {
        let mut state = ReductionState::start(1.0);
        let mut encodes = 1;
        while !state.is_terminal(false) {
            state = state.next();
            encodes += 1;
        }
        assert_eq!(encodes, MAX_ENCODE_ATTEMPTS);
    }

    #[test]
    fn quality_floor_stops_early() {
        let mut state = ReductionState::start(0.12);
        let mut encodes = 1;
        while !state.is_terminal(false) {
            state = state.next();
            encodes += 1;
        }
        // 0.12 -> 0.096
        assert_eq!(encodes, 2);
        assert!(state.quality <= QUALITY_FLOOR);

        let state = ReductionState::start(0.1);
        assert!(state.is_terminal(false));
    }

    #[test]
    fn stops_on_first_fit() {
        let image = noisy_image(32, 32);
        let reduction = SizeReducer::default()
            .reduce_to_target(&image, &options_with_target_bytes(BYTES_PER_MB / 2))
            .unwrap();
        assert_eq!(reduction.attempts, 1);
        assert_eq!(reduction.quality, 0.8);
    }

    #[test]
    fn unreachable_target_returns_last_output() {
        let image = noisy_image(128, 128);
        let reduction = SizeReducer::default()
            .reduce_to_target(&image, &options_with_target_bytes(16))
            .unwrap();
        assert_eq!(reduction.attempts, MAX_ENCODE_ATTEMPTS);
        assert!(reduction.quality > QUALITY_FLOOR);
        assert!((reduction.quality - 0.8 * QUALITY_DECAY.powi(4)).abs() < 1e-6);
        assert!(!reduction.bytes.is_empty());
        assert!(reduction.bytes.len() > 16);
    }

    #[test]
    fn lossless_format_encodes_once() {
        let image = noisy_image(64, 64);
        let options = CompressionOptions {
            output_format: OutputFormat::WebP,
            ..options_with_target_bytes(16)
        };
        let reduction = SizeReducer::default().reduce_to_target(&image, &options).unwrap();
        assert_eq!(reduction.attempts, 1);
    }
}
