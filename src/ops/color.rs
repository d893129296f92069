//! Per-pixel color transforms: sepia, grayscale, invert, brightness.

use image::RgbImage;

fn saturate(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Apply the fixed sepia channel-mixing matrix.
pub fn sepia(image: &RgbImage) -> RgbImage {
    let mut result = image.clone();

    for pixel in result.pixels_mut() {
        let [r, g, b] = pixel.0;
        let (r, g, b) = (r as f64, g as f64, b as f64);
        pixel.0 = [
            saturate(0.393 * r + 0.769 * g + 0.189 * b),
            saturate(0.349 * r + 0.686 * g + 0.168 * b),
            saturate(0.272 * r + 0.534 * g + 0.131 * b),
        ];
    }

    result
}

/// Convert to single-channel luma, replicated into all 3 channels.
pub fn grayscale(image: &RgbImage) -> RgbImage {
    let mut result = image.clone();

    for pixel in result.pixels_mut() {
        let [r, g, b] = pixel.0;
        let luma = saturate(0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64);
        pixel.0 = [luma, luma, luma];
    }

    result
}

/// Bitwise complement of every channel byte.
pub fn invert(image: &RgbImage) -> RgbImage {
    let mut result = image.clone();

    for pixel in result.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = !*channel;
        }
    }

    result
}

/// Add `beta` to every channel, clamping to the 0-255 byte range.
pub fn brighten(image: &RgbImage, beta: f64) -> RgbImage {
    let mut result = image.clone();

    for pixel in result.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = saturate(*channel as f64 + beta);
        }
    }

    result
}
