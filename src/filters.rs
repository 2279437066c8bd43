// src/filters.rs - Channel preprocessing filters applied before thresholding

use image::Luma;

use crate::config::PreprocessStep;
use crate::image_utils::{clamp_coord, FloatImage};

/// Kernel truncation accuracy: the kernel is cut where it falls below this
/// fraction of its peak.
const GAUSSIAN_ACCURACY: f64 = 0.002;

/// Run a recipe of preprocessing steps in order
pub fn apply_preprocessing(image: &FloatImage, steps: &[PreprocessStep]) -> FloatImage {
    let mut current = image.clone();
    for step in steps {
        current = match *step {
            PreprocessStep::Variance { radius } => variance_filter(&current, radius),
            PreprocessStep::Gaussian { sigma } => gaussian_blur(&current, sigma),
            PreprocessStep::BandPass { low_sigma, high_sigma } => {
                band_pass(&current, low_sigma, high_sigma)
            }
        };
    }
    current
}

/// Normalised 1-D Gaussian kernel of length 2r+1
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (sigma * (-2.0 * GAUSSIAN_ACCURACY.ln()).sqrt()).ceil() as i64 + 1;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|i| (-0.5 * (i * i) as f64 / (sigma * sigma)).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    for k in kernel.iter_mut() {
        *k /= sum;
    }
    kernel
}

/// Separable Gaussian blur; pixels beyond the border repeat the edge value.
pub fn gaussian_blur(image: &FloatImage, sigma: f64) -> FloatImage {
    if sigma <= 0.0 {
        return image.clone();
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as i64;
    let (width, height) = image.dimensions();

    let horizontal = FloatImage::from_fn(width, height, |x, y| {
        let mut acc = 0.0f64;
        for (k, weight) in kernel.iter().enumerate() {
            let sx = clamp_coord(x as i64 + k as i64 - radius, width);
            acc += weight * image.get_pixel(sx, y)[0] as f64;
        }
        Luma([acc as f32])
    });

    FloatImage::from_fn(width, height, |x, y| {
        let mut acc = 0.0f64;
        for (k, weight) in kernel.iter().enumerate() {
            let sy = clamp_coord(y as i64 + k as i64 - radius, height);
            acc += weight * horizontal.get_pixel(x, sy)[0] as f64;
        }
        Luma([acc as f32])
    })
}

/// Offsets of a circular neighbourhood: every (dx, dy) with dx²+dy² <= r²+1
fn circular_offsets(radius: f64) -> Vec<(i64, i64)> {
    let r2 = radius * radius + 1.0;
    let extent = (r2 + 1e-10).sqrt() as i64;
    let mut offsets = Vec::new();
    for dy in -extent..=extent {
        for dx in -extent..=extent {
            if ((dx * dx + dy * dy) as f64) <= r2 {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

/// Local (population) variance over a circular neighbourhood.
///
/// Flat areas go to zero; textured brightfield areas light up.
pub fn variance_filter(image: &FloatImage, radius: f64) -> FloatImage {
    let offsets = circular_offsets(radius.max(0.0));
    let n = offsets.len() as f64;
    let (width, height) = image.dimensions();

    FloatImage::from_fn(width, height, |x, y| {
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for &(dx, dy) in &offsets {
            let sx = clamp_coord(x as i64 + dx, width);
            let sy = clamp_coord(y as i64 + dy, height);
            let v = image.get_pixel(sx, sy)[0] as f64;
            sum += v;
            sum_sq += v * v;
        }
        let mean = sum / n;
        Luma([(sum_sq / n - mean * mean).max(0.0) as f32])
    })
}

/// Lightly blurred copy minus a heavily blurred copy, clipped at zero
pub fn band_pass(image: &FloatImage, low_sigma: f64, high_sigma: f64) -> FloatImage {
    let detail = gaussian_blur(image, low_sigma);
    let background = gaussian_blur(image, high_sigma);
    let (width, height) = image.dimensions();
    FloatImage::from_fn(width, height, |x, y| {
        let v = detail.get_pixel(x, y)[0] - background.get_pixel(x, y)[0];
        Luma([v.max(0.0)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn kernel_is_normalised_and_symmetric() {
        let kernel = gaussian_kernel(4.0);
        assert_approx_eq!(kernel.iter().sum::<f64>(), 1.0, 1e-12);
        let n = kernel.len();
        for i in 0..n / 2 {
            assert_approx_eq!(kernel[i], kernel[n - 1 - i], 1e-15);
        }
    }

    #[test]
    fn blur_preserves_flat_image() {
        let image = FloatImage::from_pixel(12, 9, Luma([42.0]));
        let blurred = gaussian_blur(&image, 5.0);
        for p in blurred.pixels() {
            assert_approx_eq!(p[0], 42.0, 1e-3);
        }
    }

    #[test]
    fn radius_one_neighbourhood_is_three_by_three() {
        assert_eq!(circular_offsets(1.0).len(), 9);
    }

    #[test]
    fn variance_is_zero_on_flat_and_positive_on_edge() {
        let image = FloatImage::from_fn(6, 6, |x, _| Luma([if x < 3 { 0.0 } else { 10.0 }]));
        let var = variance_filter(&image, 1.0);
        assert_approx_eq!(var.get_pixel(0, 3)[0], 0.0, 1e-6);
        assert!(var.get_pixel(2, 3)[0] > 0.0);
        assert!(var.get_pixel(3, 3)[0] > 0.0);
    }

    #[test]
    fn band_pass_never_negative() {
        let image = FloatImage::from_fn(30, 30, |x, y| {
            Luma([if (12..18).contains(&x) && (12..18).contains(&y) { 100.0 } else { 5.0 }])
        });
        let out = band_pass(&image, 1.0, 6.0);
        assert!(out.pixels().all(|p| p[0] >= 0.0));
        assert!(out.get_pixel(15, 15)[0] > 0.0);
    }

    #[test]
    fn flat_plane_keeps_its_value_at_the_border() {
        let image = FloatImage::from_pixel(30, 20, Luma([500.0]));
        let blurred = gaussian_blur(&image, 5.0);
        for (x, y) in [(0, 0), (29, 0), (0, 19), (29, 19), (15, 0)] {
            assert_approx_eq!(blurred.get_pixel(x, y)[0], 500.0, 1e-2);
        }
    }
}
