use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use imageproc::filter::median_filter;

/// Parameters of the region normalization pipeline.
/// Largest accepted upscale factor.
pub const MAX_UPSCALE: u32 = 8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreprocessParams {
    /// Integer upscale factor (Lanczos resampling), clamped to 1..=MAX_UPSCALE
    pub upscale: u32,
    /// Contrast factor around the mean luminance (1.0 = unchanged)
    pub contrast: f32,
    /// Pixels with luminance below this become black (text), the rest white
    pub threshold: u8,
}

impl Default for PreprocessParams {
    fn default() -> Self {
        Self {
            upscale: 2,
            contrast: 2.0,
            threshold: 150,
        }
    }
}

/// Normalizes a cropped region for digit recognition.
///
/// Steps: Lanczos upscale, grayscale, contrast stretch, 3x3 median filter
/// against scan speckle, then a fixed global threshold. Deterministic for a
/// given input and parameter set.
pub fn preprocess_region(region: &RgbImage, params: &PreprocessParams) -> GrayImage {
    let (width, height) = region.dimensions();
    let factor = params.upscale.clamp(1, MAX_UPSCALE);

    let upscaled = imageops::resize(
        region,
        width.saturating_mul(factor),
        height.saturating_mul(factor),
        FilterType::Lanczos3,
    );
    let gray = luma_601(&upscaled);
    let contrasted = enhance_contrast(&gray, params.contrast);
    let denoised = median_filter(&contrasted, 1, 1);

    binarize(&denoised, params.threshold)
}

/// Grayscale with ITU-R 601 weights (0.299 R + 0.587 G + 0.114 B), in
/// 16-bit fixed point with rounding.
pub fn luma_601(img: &RgbImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b] = img.get_pixel(x, y).0;
        let luma = (r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16;
        Luma([luma as u8])
    })
}

/// Scales every pixel's distance from the mean luminance by `factor`.
///
/// The mean is taken over the whole region and rounded to the nearest integer,
/// results are clamped to 0..=255.
pub fn enhance_contrast(img: &GrayImage, factor: f32) -> GrayImage {
    let pixel_count = img.width() as u64 * img.height() as u64;
    if pixel_count == 0 {
        return img.clone();
    }

    let sum: u64 = img.pixels().map(|p| p[0] as u64).sum();
    let mean = (sum as f32 / pixel_count as f32 + 0.5).floor();

    let mut output = img.clone();
    for pixel in output.pixels_mut() {
        let value = mean + factor * (pixel[0] as f32 - mean);
        pixel[0] = value.clamp(0.0, 255.0) as u8;
    }

    output
}

/// Converts grayscale to pure black/white with a fixed threshold.
///
/// Pixels below `threshold` become black (0), all others white (255).
pub fn binarize(img: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if pixel[0] < threshold { 0u8 } else { 255u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_binarize_threshold_boundary() {
        let img = GrayImage::from_fn(3, 1, |x, _| Luma([[149u8, 150, 200][x as usize]]));

        let result = binarize(&img, 150);

        assert_eq!(result.get_pixel(0, 0)[0], 0, "Below threshold should become black");
        assert_eq!(result.get_pixel(1, 0)[0], 255, "Threshold itself should become white");
        assert_eq!(result.get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn test_luma_uses_601_weights() {
        let img = RgbImage::from_fn(4, 1, |x, _| {
            [
                Rgb([255, 0, 0]),
                Rgb([0, 255, 0]),
                Rgb([0, 0, 255]),
                Rgb([255, 255, 255]),
            ][x as usize]
        });

        let gray = luma_601(&img);

        assert_eq!(gray.get_pixel(0, 0)[0], 76);
        assert_eq!(gray.get_pixel(1, 0)[0], 150, "Pure green must land on the threshold");
        assert_eq!(gray.get_pixel(2, 0)[0], 29);
        assert_eq!(gray.get_pixel(3, 0)[0], 255);
    }

    #[test]
    fn test_upscale_is_clamped() {
        let region = RgbImage::from_pixel(3, 2, Rgb([255, 255, 255]));
        let params = PreprocessParams {
            upscale: u32::MAX,
            ..PreprocessParams::default()
        };

        let result = preprocess_region(&region, &params);

        assert_eq!(result.dimensions(), (3 * MAX_UPSCALE, 2 * MAX_UPSCALE));
    }

    #[test]
    fn test_enhance_contrast_stretches_around_mean() {
        // Mean is 150: 100 -> 50, 200 -> 250
        let img = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 100 } else { 200 }]));

        let result = enhance_contrast(&img, 2.0);

        assert_eq!(result.get_pixel(0, 0)[0], 50);
        assert_eq!(result.get_pixel(1, 0)[0], 250);
    }

    #[test]
    fn test_enhance_contrast_clamps() {
        let img = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 0 } else { 255 }]));

        let result = enhance_contrast(&img, 4.0);

        assert_eq!(result.get_pixel(0, 0)[0], 0);
        assert_eq!(result.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn test_preprocess_upscales_and_binarizes() {
        // White region with a dark 4x4 block in the middle
        let region = RgbImage::from_fn(20, 10, |x, y| {
            if (8..12).contains(&x) && (3..7).contains(&y) {
                Rgb([20, 20, 20])
            } else {
                Rgb([240, 240, 240])
            }
        });

        let result = preprocess_region(&region, &PreprocessParams::default());

        assert_eq!(result.dimensions(), (40, 20));
        assert!(result.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(result.get_pixel(20, 10)[0], 0, "Glyph center should stay black");
        assert_eq!(result.get_pixel(2, 2)[0], 255, "Background should be white");
    }

    #[test]
    fn test_median_filter_removes_speckle() {
        // Single dark pixel on white is scan noise
        let region = RgbImage::from_fn(10, 10, |x, y| {
            if x == 5 && y == 5 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let params = PreprocessParams {
            upscale: 1,
            ..PreprocessParams::default()
        };

        let result = preprocess_region(&region, &params);

        assert!(result.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_preprocess_is_deterministic() {
        let region = RgbImage::from_fn(16, 8, |x, y| Rgb([(x * 15) as u8, (y * 30) as u8, 128]));
        let params = PreprocessParams::default();

        assert_eq!(
            preprocess_region(&region, &params),
            preprocess_region(&region, &params)
        );
    }
}
