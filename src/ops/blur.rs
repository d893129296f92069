//! Gaussian blur with kernel-size driven sigma.

use image::RgbImage;

/// Smallest accepted kernel size.
pub const MIN_KERNEL_SIZE: i64 = 1;
/// Largest accepted kernel size.
pub const MAX_KERNEL_SIZE: i64 = 100;

/// Check a kernel size against the accepted range.
pub fn kernel_size_in_range(kernel_size: i64) -> bool {
    (MIN_KERNEL_SIZE..=MAX_KERNEL_SIZE).contains(&kernel_size)
}

/// Sigma derived from an odd kernel size when none is given explicitly.
fn sigma_for_kernel(kernel_size: u32) -> f32 {
    (0.3 * ((kernel_size as f64 - 1.0) * 0.5 - 1.0) + 0.8) as f32
}

/// Blur with a square kernel of the given odd size.
///
/// Kernel size 1 is an exact copy. Callers are expected to have range-checked
/// the size with [`kernel_size_in_range`] already.
pub fn gaussian(image: &RgbImage, kernel_size: u32) -> RgbImage {
    if kernel_size <= 1 {
        return image.clone();
    }
    imageproc::filter::gaussian_blur_f32(image, sigma_for_kernel(kernel_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_kernel_size_bounds() {
        assert!(kernel_size_in_range(1));
        assert!(kernel_size_in_range(99));
        assert!(kernel_size_in_range(100));
        assert!(!kernel_size_in_range(0));
        assert!(!kernel_size_in_range(-1));
        assert!(!kernel_size_in_range(101));
    }

    #[test]
    fn test_kernel_one_is_identity() {
        let mut image = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));
        image.put_pixel(2, 2, Rgb([200, 0, 0]));
        assert_eq!(gaussian(&image, 1), image);
    }

    #[test]
    fn test_blur_spreads_energy() {
        let mut image = RgbImage::new(9, 9);
        image.put_pixel(4, 4, Rgb([255, 255, 255]));
        let blurred = gaussian(&image, 5);

        // The spike is attenuated and its neighbours pick up intensity.
        assert!(blurred.get_pixel(4, 4).0[0] < 255);
        assert!(blurred.get_pixel(3, 4).0[0] > 0);
    }

    #[test]
    fn test_blur_preserves_dimensions() {
        let image = RgbImage::new(12, 7);
        let blurred = gaussian(&image, 7);
        assert_eq!(blurred.dimensions(), (12, 7));
    }
}
