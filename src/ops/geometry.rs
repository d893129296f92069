//! Geometric transforms: resize, translate, rotate.

use image::imageops::FilterType;
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

/// Convert a percentage of a dimension to a pixel count.
pub fn percent_of(dimension: u32, percent: f64) -> i64 {
    (dimension as f64 * percent / 100.0).round() as i64
}

/// Resize to exact `(width, height)` with bilinear sampling.
///
/// Callers reject non-positive dimensions before getting here.
pub fn resize(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    image::imageops::resize(image, width, height, FilterType::Triangle)
}

/// Translate by `(dx, dy)` on a same-size canvas; vacated pixels are black.
pub fn translate(image: &RgbImage, dx: i64, dy: i64) -> RgbImage {
    let (width, height) = image.dimensions();

    RgbImage::from_fn(width, height, |x, y| {
        let src_x = x as i64 - dx;
        let src_y = y as i64 - dy;
        if (0..width as i64).contains(&src_x) && (0..height as i64).contains(&src_y) {
            *image.get_pixel(src_x as u32, src_y as u32)
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// Rotate about the image center by `degrees` (positive = counter-clockwise),
/// scale 1.0, on a same-size canvas with black background.
pub fn rotate(image: &RgbImage, degrees: f64) -> RgbImage {
    // rotate_about_center turns clockwise for positive theta.
    let theta = -(degrees.to_radians()) as f32;
    rotate_about_center(image, theta, Interpolation::Bilinear, Rgb([0, 0, 0]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_of_rounds() {
        assert_eq!(percent_of(100, 50.0), 50);
        assert_eq!(percent_of(3, 50.0), 2); // 1.5 rounds away from zero
        assert_eq!(percent_of(100, 0.0), 0);
        assert_eq!(percent_of(100, -10.0), -10);
    }

    #[test]
    fn test_resize_dimensions() {
        let image = RgbImage::new(10, 10);
        assert_eq!(resize(&image, 3, 7).dimensions(), (3, 7));
    }

    #[test]
    fn test_translate_moves_and_clears() {
        let mut image = RgbImage::new(4, 4);
        image.put_pixel(0, 0, Rgb([255, 0, 0]));

        let moved = translate(&image, 2, 1);
        assert_eq!(moved.get_pixel(2, 1).0, [255, 0, 0]);
        assert_eq!(moved.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(moved.dimensions(), (4, 4));
    }

    #[test]
    fn test_translate_out_of_bounds_is_background() {
        let image = RgbImage::from_pixel(2, 2, Rgb([9, 9, 9]));
        let moved = translate(&image, 5, 5);
        for pixel in moved.pixels() {
            assert_eq!(pixel.0, [0, 0, 0]);
        }
    }

    #[test]
    fn test_rotate_keeps_canvas() {
        let image = RgbImage::new(6, 4);
        assert_eq!(rotate(&image, 37.5).dimensions(), (6, 4));
    }

    #[test]
    fn test_rotate_quarter_turn_direction() {
        // Positive angle turns counter-clockwise: a mark right of center
        // moves above the center.
        let mut image = RgbImage::new(9, 9);
        image.put_pixel(7, 4, Rgb([255, 255, 255]));
        let turned = rotate(&image, 90.0);
        assert!(turned.get_pixel(4, 2).0[0] > 128);
    }
}
