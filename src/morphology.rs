use std::collections::VecDeque;

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};

use crate::config::ChannelRecipe;
use crate::filters::apply_preprocessing;
use crate::image_utils::{count_foreground, histogram, min_max, FloatImage, BACKGROUND, FOREGROUND, HISTOGRAM_BINS};
use crate::threshold::ThresholdMethod;

/// 4-connected neighbour offsets
const NEIGHBOURS_4: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Intensity cut-off chosen for a channel.
///
/// The selected histogram bin is mapped back through the channel maximum,
/// `bin / 255 * max`, so pixels `>= value` become foreground.
pub fn select_threshold(image: &FloatImage, method: ThresholdMethod) -> Option<f32> {
    let (lo, hi) = min_max(image)?;
    if hi <= lo {
        return None;
    }
    let hist = histogram(image, HISTOGRAM_BINS);
    let bin = method.select_bin(&hist)?;
    Some(bin as f32 / (HISTOGRAM_BINS - 1) as f32 * hi)
}

/// Binarise: foreground where value >= threshold, empty mask without one
pub fn threshold_mask(image: &FloatImage, threshold: Option<f32>) -> GrayImage {
    let (width, height) = image.dimensions();
    match threshold {
        Some(t) => GrayImage::from_fn(width, height, |x, y| {
            Luma([if image.get_pixel(x, y)[0] >= t { FOREGROUND } else { BACKGROUND }])
        }),
        None => GrayImage::new(width, height),
    }
}

/// Fill every background area that cannot be reached from the image border.
///
/// Background is flood-filled with 4-connectivity from each border pixel;
/// whatever the flood does not reach becomes foreground.
pub fn fill_holes(mask: &mut GrayImage) {
    let (width, height) = mask.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let mut outside = vec![false; (width * height) as usize];
    let mut queue = VecDeque::new();

    let seed = |x: u32, y: u32, outside: &mut Vec<bool>, queue: &mut VecDeque<(u32, u32)>| {
        let idx = (y * width + x) as usize;
        if !outside[idx] && mask.get_pixel(x, y)[0] == BACKGROUND {
            outside[idx] = true;
            queue.push_back((x, y));
        }
    };

    for y in 0..height {
        seed(0, y, &mut outside, &mut queue);
        seed(width - 1, y, &mut outside, &mut queue);
    }
    for x in 0..width {
        seed(x, 0, &mut outside, &mut queue);
        seed(x, height - 1, &mut outside, &mut queue);
    }

    while let Some((x, y)) = queue.pop_front() {
        for &(dx, dy) in &NEIGHBOURS_4 {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            let idx = (ny * width + nx) as usize;
            if !outside[idx] && mask.get_pixel(nx, ny)[0] == BACKGROUND {
                outside[idx] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    for (idx, pixel) in mask.pixels_mut().enumerate() {
        pixel[0] = if outside[idx] { BACKGROUND } else { FOREGROUND };
    }
}

/// One 3x3 erosion followed by one 3x3 dilation.
///
/// The image border does not erode foreground that touches it.
pub fn apply_opening(mask: &GrayImage) -> GrayImage {
    let eroded = erode(mask, Norm::LInf, 1);
    dilate(&eroded, Norm::LInf, 1)
}

/// Full mask construction for one channel: preprocess, threshold, fill, open
pub fn build_mask(channel: &FloatImage, recipe: &ChannelRecipe) -> GrayImage {
    let processed = apply_preprocessing(channel, &recipe.preprocess);
    let threshold = select_threshold(&processed, recipe.threshold);

    match threshold {
        Some(t) => log::debug!("{} threshold on channel {}: {:.4}", recipe.threshold.name(), recipe.channel, t),
        None => log::warn!(
            "{} found no threshold on channel {}; channel treated as empty",
            recipe.threshold.name(),
            recipe.channel
        ),
    }

    let mut mask = threshold_mask(&processed, threshold);
    fill_holes(&mut mask);
    let opened = apply_opening(&mask);
    log::debug!(
        "Channel {} mask: {} foreground pixels after opening ({} before)",
        recipe.channel,
        count_foreground(&opened),
        count_foreground(&mask)
    );
    opened
}
