use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, Luma, Pixel, RgbImage};

use crate::config::REQUIRED_CHANNELS;
use crate::errors::{OrganoidError, Result};
use crate::image_utils::{Calibration, FloatImage};

/// One z-plane of a multi-channel stack with its metadata.
///
/// Channels are stored in stack order and addressed 1-based.
#[derive(Debug, Clone)]
pub struct ChannelStack {
    pub channels: Vec<FloatImage>,
    pub calibration: Calibration,
    /// 1-based z position
    pub slice: usize,
    /// Name used for output files
    pub title: String,
}

impl ChannelStack {
    /// Assemble a stack, failing fast on missing channels, mismatched sizes
    /// or a malformed calibration.
    pub fn new(channels: Vec<FloatImage>, calibration: Calibration, slice: usize, title: &str) -> Result<Self> {
        if channels.len() < REQUIRED_CHANNELS {
            return Err(OrganoidError::MissingChannels {
                expected: REQUIRED_CHANNELS,
                found: channels.len(),
            });
        }
        calibration.validate()?;

        let expected = channels[0].dimensions();
        for (idx, channel) in channels.iter().enumerate() {
            if channel.dimensions() != expected {
                return Err(OrganoidError::DimensionMismatch {
                    channel: idx + 1,
                    expected,
                    found: channel.dimensions(),
                });
            }
        }

        Ok(Self {
            channels,
            calibration,
            slice,
            title: title.to_string(),
        })
    }

    /// Channel by 1-based index
    pub fn channel(&self, index: usize) -> Result<&FloatImage> {
        index
            .checked_sub(1)
            .and_then(|i| self.channels.get(i))
            .ok_or(OrganoidError::MissingChannels {
                expected: index,
                found: self.channels.len(),
            })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.channels[0].dimensions()
    }
}

/// Split the leading channels of an interleaved buffer into float planes
fn split_channels<P>(buffer: &ImageBuffer<P, Vec<P::Subpixel>>) -> Vec<FloatImage>
where
    P: Pixel,
    P::Subpixel: Into<f32>,
{
    let (width, height) = buffer.dimensions();
    let count = (P::CHANNEL_COUNT as usize).min(REQUIRED_CHANNELS);
    (0..count)
        .map(|c| {
            FloatImage::from_fn(width, height, |x, y| {
                Luma([buffer.get_pixel(x, y).channels()[c].into()])
            })
        })
        .collect()
}

/// Raw intensities of every channel in a decoded image
fn decode_channels(image: DynamicImage) -> Vec<FloatImage> {
    match image {
        DynamicImage::ImageLuma8(buf) => split_channels(&buf),
        DynamicImage::ImageLumaA8(buf) => split_channels(&buf),
        DynamicImage::ImageLuma16(buf) => split_channels(&buf),
        DynamicImage::ImageLumaA16(buf) => split_channels(&buf),
        DynamicImage::ImageRgb8(buf) => split_channels(&buf),
        DynamicImage::ImageRgba8(buf) => split_channels(&buf),
        DynamicImage::ImageRgb16(buf) => split_channels(&buf),
        DynamicImage::ImageRgba16(buf) => split_channels(&buf),
        DynamicImage::ImageRgb32F(buf) => split_channels(&buf),
        DynamicImage::ImageRgba32F(buf) => split_channels(&buf),
        other => split_channels(&other.to_rgb32f()),
    }
}

fn title_of(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .ok_or_else(|| OrganoidError::InvalidPath(path.to_path_buf()))
}

/// Load one plane of a composite image: red, green and blue become
/// channels 1, 2 and 3.
///
/// Grey or grey+alpha files carry fewer than three channels and are rejected.
pub fn load_stack<P: AsRef<Path>>(path: P, calibration: Calibration, slice: usize) -> Result<ChannelStack> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(OrganoidError::InvalidPath(path.to_path_buf()));
    }
    let title = title_of(path)?;

    let image = image::open(path)?;
    let channel_count = image.color().channel_count() as usize;
    // Alpha is not a signal channel
    let signal_channels = if image.color().has_alpha() { channel_count - 1 } else { channel_count };
    if signal_channels < REQUIRED_CHANNELS {
        return Err(OrganoidError::MissingChannels {
            expected: REQUIRED_CHANNELS,
            found: signal_channels,
        });
    }

    log::info!("Loaded {} ({}x{}, {} channels)", path.display(), image.width(), image.height(), signal_channels);
    ChannelStack::new(decode_channels(image), calibration, slice, &title)
}

/// Load one single-channel file per stack channel, in stack order
pub fn load_channel_files(paths: &[PathBuf], calibration: Calibration, slice: usize) -> Result<ChannelStack> {
    if paths.len() < REQUIRED_CHANNELS {
        return Err(OrganoidError::MissingChannels {
            expected: REQUIRED_CHANNELS,
            found: paths.len(),
        });
    }

    let mut channels = Vec::with_capacity(paths.len());
    for path in paths {
        if !path.is_file() {
            return Err(OrganoidError::InvalidPath(path.clone()));
        }
        let image = image::open(path)?;
        let mut planes = decode_channels(image);
        if planes.len() > 1 {
            log::warn!("{} has {} channels; using the first", path.display(), planes.len());
        }
        channels.push(planes.swap_remove(0));
    }

    let title = title_of(&paths[0])?;
    ChannelStack::new(channels, calibration, slice, &title)
}

/// Save a binary mask as PNG
pub fn save_mask<P: AsRef<Path>>(mask: &GrayImage, path: P) -> Result<()> {
    mask.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save an RGB overlay rendering as PNG
pub fn save_overlay_image<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(w: u32, h: u32, v: f32) -> FloatImage {
        FloatImage::from_pixel(w, h, Luma([v]))
    }

    #[test]
    fn two_channels_fail_fast() {
        let err = ChannelStack::new(vec![plane(4, 4, 0.0), plane(4, 4, 0.0)], Calibration::default(), 1, "t")
            .unwrap_err();
        assert!(matches!(err, OrganoidError::MissingChannels { expected: 3, found: 2 }));
    }

    #[test]
    fn mismatched_channel_sizes_are_rejected() {
        let err = ChannelStack::new(
            vec![plane(4, 4, 0.0), plane(4, 4, 0.0), plane(5, 4, 0.0)],
            Calibration::default(),
            1,
            "t",
        )
        .unwrap_err();
        assert!(matches!(err, OrganoidError::DimensionMismatch { channel: 3, .. }));
    }

    #[test]
    fn bad_calibration_is_rejected() {
        let err = ChannelStack::new(
            vec![plane(4, 4, 0.0), plane(4, 4, 0.0), plane(4, 4, 0.0)],
            Calibration::new(-1.0, 1.0),
            1,
            "t",
        )
        .unwrap_err();
        assert!(matches!(err, OrganoidError::InvalidCalibration(_)));
    }

    #[test]
    fn rgb_planes_keep_raw_values() {
        let rgb = RgbImage::from_fn(2, 1, |x, _| image::Rgb([10 + x as u8, 100, 200]));
        let planes = decode_channels(DynamicImage::ImageRgb8(rgb));
        assert_eq!(planes.len(), 3);
        assert_eq!(planes[0].get_pixel(1, 0)[0], 11.0);
        assert_eq!(planes[1].get_pixel(0, 0)[0], 100.0);
        assert_eq!(planes[2].get_pixel(0, 0)[0], 200.0);
    }

    #[test]
    fn channels_are_one_based() {
        let stack = ChannelStack::new(
            vec![plane(2, 2, 1.0), plane(2, 2, 2.0), plane(2, 2, 3.0)],
            Calibration::default(),
            1,
            "t",
        )
        .unwrap();
        assert_eq!(stack.channel(2).unwrap().get_pixel(0, 0)[0], 2.0);
        assert!(stack.channel(0).is_err());
        assert!(stack.channel(4).is_err());
    }
}
