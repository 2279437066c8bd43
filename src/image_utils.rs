use image::{GrayImage, ImageBuffer, Luma};
use serde::{Deserialize, Serialize};

use crate::errors::{OrganoidError, Result};

/// Single-channel floating point image
pub type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Mask value for foreground pixels
pub const FOREGROUND: u8 = 255;

/// Mask value for background pixels
pub const BACKGROUND: u8 = 0;

/// Number of histogram bins fed to the auto-threshold methods
pub const HISTOGRAM_BINS: usize = 256;

/// Physical size of one pixel
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub pixel_width: f64,
    pub pixel_height: f64,
    #[serde(default = "default_unit")]
    pub unit: UnitName,
}

/// Short unit label carried through to the results table
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitName {
    Pixel,
    Nm,
    Um,
    Mm,
}

fn default_unit() -> UnitName {
    UnitName::Um
}

impl UnitName {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitName::Pixel => "pixel",
            UnitName::Nm => "nm",
            UnitName::Um => "µm",
            UnitName::Mm => "mm",
        }
    }
}

impl Calibration {
    pub fn new(pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            pixel_width,
            pixel_height,
            unit: default_unit(),
        }
    }

    /// Uncalibrated: one unit per pixel
    pub fn uncalibrated() -> Self {
        Self {
            pixel_width: 1.0,
            pixel_height: 1.0,
            unit: UnitName::Pixel,
        }
    }

    /// Physical area covered by one pixel
    #[inline]
    pub fn pixel_area(&self) -> f64 {
        self.pixel_width * self.pixel_height
    }

    /// Convert a pixel count to calibrated area
    #[inline]
    pub fn area_of(&self, pixel_count: u64) -> f64 {
        pixel_count as f64 * self.pixel_area()
    }

    /// Reject zero, negative and non-finite pixel sizes
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("pixel_width", self.pixel_width), ("pixel_height", self.pixel_height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(OrganoidError::InvalidCalibration(format!(
                    "{} must be a finite value > 0, got {}", name, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::uncalibrated()
    }
}

/// Smallest and largest pixel value, or None for an empty image
pub fn min_max(image: &FloatImage) -> Option<(f32, f32)> {
    let mut pixels = image.as_raw().iter().copied().filter(|v| !v.is_nan());
    let first = pixels.next()?;
    Some(pixels.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

/// Histogram of `bins` equal-width bins spanning the image's own [min, max].
///
/// A uniform image puts every pixel into bin 0.
pub fn histogram(image: &FloatImage, bins: usize) -> Vec<u64> {
    let mut counts = vec![0u64; bins];
    let (lo, hi) = match min_max(image) {
        Some(range) => range,
        None => return counts,
    };
    let span = (hi - lo) as f64;
    let scale = if span > 0.0 { bins as f64 / span } else { 0.0 };

    for &v in image.as_raw() {
        if v.is_nan() {
            continue;
        }
        let index = ((v - lo) as f64 * scale) as usize;
        counts[index.min(bins - 1)] += 1;
    }
    counts
}

/// Clamp a possibly out-of-range coordinate onto the nearest edge pixel
#[inline]
pub fn clamp_coord(v: i64, len: u32) -> u32 {
    v.clamp(0, len as i64 - 1) as u32
}

/// Count the foreground pixels of a mask
pub fn count_foreground(mask: &GrayImage) -> u64 {
    mask.as_raw().iter().filter(|&&v| v == FOREGROUND).count() as u64
}

/// Linear rescale of a float channel into 8-bit grey for previews
pub fn to_gray_preview(image: &FloatImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let (lo, hi) = min_max(image).unwrap_or((0.0, 0.0));
    let span = hi - lo;
    GrayImage::from_fn(width, height, |x, y| {
        let v = image.get_pixel(x, y)[0];
        let scaled = if span > 0.0 { (v - lo) / span * 255.0 } else { 0.0 };
        Luma([scaled.round().clamp(0.0, 255.0) as u8])
    })
}
