// imgpress/src/processors/resizer.rs
use crate::core::ResizeAlgorithm;
use image::{imageops::FilterType, DynamicImage};

/// Fits `original_width × original_height` inside a `max_edge` square.
///
/// Images already within bounds come back unchanged; nothing is ever
/// upscaled, and an empty edge leaves the size as is. Otherwise the longer edge is clamped to `max_edge` and the
/// shorter edge follows the aspect ratio, rounded to the nearest pixel.
pub fn compute_dimensions(original_width: u32, original_height: u32, max_edge: u32) -> (u32, u32) {
    if original_width == 0 || original_height == 0 {
        return (original_width, original_height);
    }

    if original_width <= max_edge && original_height <= max_edge {
        return (original_width, original_height);
    }

    let aspect_ratio = original_width as f64 / original_height as f64;

    if original_width >= original_height {
        let height = (max_edge as f64 / aspect_ratio).round() as u32;
        (max_edge, height.max(1))
    } else {
        let width = (max_edge as f64 * aspect_ratio).round() as u32;
        (width.max(1), max_edge)
    }
}

pub struct Resizer {
    algorithm: ResizeAlgorithm,
}

impl Resizer {
    pub fn new(algorithm: ResizeAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Renders `image` onto a new bitmap of exactly `width × height`.
    pub fn resample(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        if width == image.width() && height == image.height() {
            log::debug!("Image dimensions unchanged, skipping resize");
            return image.clone();
        }

        log::debug!(
            "Resizing image from {}x{} to {}x{}",
            image.width(),
            image.height(),
            width,
            height
        );

        image.resize_exact(width, height, self.filter_type())
    }

    /// Caps the longest edge of `image` at `max_edge`.
    pub fn fit_within(&self, image: &DynamicImage, max_edge: u32) -> DynamicImage {
        let (width, height) = compute_dimensions(image.width(), image.height(), max_edge);
        self.resample(image, width, height)
    }

    fn filter_type(&self) -> FilterType {
        match self.algorithm {
            ResizeAlgorithm::Nearest => FilterType::Nearest,
            ResizeAlgorithm::Bilinear => FilterType::Triangle,
            ResizeAlgorithm::Bicubic => FilterType::CatmullRom,
            ResizeAlgorithm::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new(ResizeAlgorithm::Lanczos3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use proptest::prelude::*;

    #[test]
    fn landscape_is_clamped_on_width() {
        assert_eq!(compute_dimensions(4000, 2000, 1920), (1920, 960));
    }

    #[test]
    fn portrait_is_clamped_on_height() {
        assert_eq!(compute_dimensions(1000, 3000, 1920), (640, 1920));
    }

    #[test]
    fn square_clamps_both_edges() {
        assert_eq!(compute_dimensions(5000, 5000, 1920), (1920, 1920));
    }

    #[test]
    fn within_bounds_is_unchanged() {
        assert_eq!(compute_dimensions(1920, 1080, 1920), (1920, 1080));
        assert_eq!(compute_dimensions(10, 10, 1920), (10, 10));
    }

    #[test]
    fn extreme_ratio_keeps_one_pixel() {
        assert_eq!(compute_dimensions(100_000, 10, 1920), (1920, 1));
    }

    #[test]
    fn empty_edge_is_left_alone() {
        assert_eq!(compute_dimensions(5000, 0, 1920), (5000, 0));
        assert_eq!(compute_dimensions(0, 3000, 1920), (0, 3000));
        assert_eq!(compute_dimensions(0, 0, 1920), (0, 0));
    }

    #[test]
    fn resample_produces_exact_size() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(64, 32));
        let resizer = Resizer::new(ResizeAlgorithm::Bilinear);
        let resized = resizer.resample(&image, 16, 8);
        assert_eq!((resized.width(), resized.height()), (16, 8));
    }

    #[test]
    fn fit_within_leaves_small_images_alone() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(40, 30));
        let resized = Resizer::default().fit_within(&image, 100);
        assert_eq!((resized.width(), resized.height()), (40, 30));
    }

    proptest! {
        #[test]
        fn prop_never_upscales(
            width in 0u32..4000,
            height in 0u32..4000,
            max_edge in 1u32..4000,
        ) {
            let (w, h) = compute_dimensions(width, height, max_edge);
            prop_assert!(w <= width && h <= height);
            if width == 0 || height == 0 || (width <= max_edge && height <= max_edge) {
                prop_assert_eq!((w, h), (width, height));
            } else {
                prop_assert_eq!(w.max(h), max_edge);
            }
        }

        #[test]
        fn prop_preserves_aspect_ratio(
            width in 200u32..8000,
            height in 200u32..8000,
            max_edge in 400u32..2000,
        ) {
            prop_assume!(width > max_edge || height > max_edge);
            let ratio = width as f64 / height as f64;
            prop_assume!((0.5..=2.0).contains(&ratio));

            let (w, h) = compute_dimensions(width, height, max_edge);
            let expected = (ratio * 100.0).round() as i64;
            let actual = (w as f64 / h as f64 * 100.0).round() as i64;
            prop_assert!((expected - actual).abs() <= 1, "{}x{} -> {}x{}", width, height, w, h);
        }
    }
}
