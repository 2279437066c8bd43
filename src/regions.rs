// src/regions.rs - Binary mask to polygonal regions

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use serde::Serialize;

use crate::config::ChannelRole;
use crate::image_utils::{Calibration, FloatImage, BACKGROUND};

/// Direction vectors for crack following, clockwise on screen: E, S, W, N
static CRACK_STEPS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Axis-aligned pixel bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Box centre truncated to integer pixel coordinates
    pub fn center(&self) -> (i32, i32) {
        let cx = self.x as f64 + self.width as f64 / 2.0;
        let cy = self.y as f64 + self.height as f64 / 2.0;
        (cx as i32, cy as i32)
    }

    #[inline]
    pub fn contains_pixel(&self, x: i32, y: i32) -> bool {
        x >= self.x as i32
            && y >= self.y as i32
            && x < (self.x + self.width) as i32
            && y < (self.y + self.height) as i32
    }
}

/// A closed polygon traced from one connected foreground component.
///
/// Outline vertices sit on pixel corners; the polygon runs clockwise on
/// screen with the region on its right-hand side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub role: ChannelRole,
    pub outline: Vec<(i32, i32)>,
    pub pixel_area: u64,
    pub bounds: BoundingBox,
    pub mean_intensity: f64,
}

impl Region {
    /// Axis-aligned rectangular region
    pub fn rectangle(role: ChannelRole, x: u32, y: u32, width: u32, height: u32, mean_intensity: f64) -> Self {
        let (x0, y0) = (x as i32, y as i32);
        let (x1, y1) = ((x + width) as i32, (y + height) as i32);
        Self {
            role,
            outline: vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)],
            pixel_area: width as u64 * height as u64,
            bounds: BoundingBox { x, y, width, height },
            mean_intensity,
        }
    }

    /// Bounding-box centroid in integer pixel coordinates
    pub fn centroid(&self) -> (i32, i32) {
        self.bounds.center()
    }

    /// Calibrated area
    pub fn physical_area(&self, calibration: &Calibration) -> f64 {
        calibration.area_of(self.pixel_area)
    }

    /// Whether pixel (x, y) lies inside the outline (tested at the pixel centre)
    pub fn contains(&self, x: i32, y: i32) -> bool {
        if !self.bounds.contains_pixel(x, y) || self.outline.len() < 3 {
            return false;
        }
        let px = x as f64 + 0.5;
        let py = y as f64 + 0.5;

        let mut inside = false;
        let mut j = self.outline.len() - 1;
        for i in 0..self.outline.len() {
            let (xi, yi) = (self.outline[i].0 as f64, self.outline[i].1 as f64);
            let (xj, yj) = (self.outline[j].0 as f64, self.outline[j].1 as f64);
            if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// Per-component statistics gathered in one pass over the label image
struct ComponentStats {
    first_pixel: (u32, u32),
    count: u64,
    intensity_sum: f64,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

/// Split a mask into one region per 4-connected foreground component.
///
/// Regions come out in raster order of each component's first pixel.
/// Mean intensity is measured on `measure` over the component's pixels.
pub fn extract_regions(mask: &GrayImage, measure: &FloatImage, role: ChannelRole) -> Vec<Region> {
    let labels = connected_components(mask, Connectivity::Four, Luma([BACKGROUND]));
    let (width, height) = labels.dimensions();

    let mut order: Vec<u32> = Vec::new();
    let mut stats: Vec<Option<ComponentStats>> = Vec::new();

    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0];
        if label == 0 {
            continue;
        }
        let slot = label as usize;
        if stats.len() <= slot {
            stats.resize_with(slot + 1, || None);
        }
        let value = measure.get_pixel(x, y)[0] as f64;
        if let Some(s) = stats[slot].as_mut() {
            s.count += 1;
            s.intensity_sum += value;
            s.min_x = s.min_x.min(x);
            s.max_x = s.max_x.max(x);
            s.max_y = s.max_y.max(y);
        } else {
            order.push(label);
            stats[slot] = Some(ComponentStats {
                first_pixel: (x, y),
                count: 1,
                intensity_sum: value,
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
            });
        }
    }

    let mut regions = Vec::with_capacity(order.len());
    for label in order {
        let s = match stats[label as usize].take() {
            Some(s) => s,
            None => continue,
        };

        let inside = |px: i32, py: i32| {
            px >= 0
                && py >= 0
                && (px as u32) < width
                && (py as u32) < height
                && labels.get_pixel(px as u32, py as u32)[0] == label
        };
        let start = (s.first_pixel.0 as i32, s.first_pixel.1 as i32);
        let outline = trace_outline(start, s.count, inside);

        regions.push(Region {
            role,
            outline,
            pixel_area: s.count,
            bounds: BoundingBox {
                x: s.min_x,
                y: s.min_y,
                width: s.max_x - s.min_x + 1,
                height: s.max_y - s.min_y + 1,
            },
            mean_intensity: s.intensity_sum / s.count as f64,
        });
    }

    log::debug!("Extracted {} {} regions", regions.len(), role.name());
    regions
}

/// Follow the outer boundary of a component along pixel edges.
///
/// `start` must be the component's first pixel in raster order; its top-left
/// corner is then a corner of the outer boundary with a single outgoing edge.
/// At diagonal pinch points the walk turns right, keeping to the pixel it is
/// hugging, so diagonal neighbours are never joined and background that only
/// reaches the outside through a corner stays outside the polygon.
fn trace_outline<F>(start: (i32, i32), pixel_count: u64, inside: F) -> Vec<(i32, i32)>
where
    F: Fn(i32, i32) -> bool,
{
    // Edge leaving vertex v in direction d exists when the pixel on its right
    // is inside and the pixel on its left is not.
    let edge_exists = |v: (i32, i32), d: usize| -> bool {
        let (right, left) = match d {
            0 => ((v.0, v.1), (v.0, v.1 - 1)),
            1 => ((v.0 - 1, v.1), (v.0, v.1)),
            2 => ((v.0 - 1, v.1 - 1), (v.0 - 1, v.1)),
            _ => ((v.0, v.1 - 1), (v.0 - 1, v.1 - 1)),
        };
        inside(right.0, right.1) && !inside(left.0, left.1)
    };

    let max_steps = 4 * pixel_count as usize + 4;
    let mut outline = vec![start];
    let mut vertex = start;
    let mut dir = 0usize;

    for _ in 0..max_steps {
        vertex = (vertex.0 + CRACK_STEPS[dir].0, vertex.1 + CRACK_STEPS[dir].1);
        if vertex == start {
            return outline;
        }
        let next = [(dir + 1) % 4, dir, (dir + 3) % 4]
            .into_iter()
            .find(|&d| edge_exists(vertex, d));
        match next {
            Some(d) if d != dir => {
                outline.push(vertex);
                dir = d;
            }
            Some(_) => {}
            None => break,
        }
    }

    log::warn!("Outline trace from {:?} did not close; using partial outline", start);
    outline
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(pattern: &[&str]) -> GrayImage {
        let height = pattern.len() as u32;
        let width = pattern[0].len() as u32;
        GrayImage::from_fn(width, height, |x, y| {
            let c = pattern[y as usize].as_bytes()[x as usize];
            Luma([if c == b'#' { 255 } else { 0 }])
        })
    }

    fn flat(mask: &GrayImage, value: f32) -> FloatImage {
        FloatImage::from_pixel(mask.width(), mask.height(), Luma([value]))
    }

    #[test]
    fn single_pixel_is_unit_square() {
        let mask = mask_from(&["...", ".#.", "..."]);
        let regions = extract_regions(&mask, &flat(&mask, 1.0), ChannelRole::Organoid);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].outline, vec![(1, 1), (2, 1), (2, 2), (1, 2)]);
        assert_eq!(regions[0].pixel_area, 1);
        assert!(regions[0].contains(1, 1));
        assert!(!regions[0].contains(0, 1));
    }

    #[test]
    fn l_shape_outline_has_six_corners() {
        let mask = mask_from(&[
            "#..",
            "#..",
            "###",
        ]);
        let regions = extract_regions(&mask, &flat(&mask, 1.0), ChannelRole::MarkerA);
        assert_eq!(regions.len(), 1);
        let r = &regions[0];
        assert_eq!(r.outline, vec![(0, 0), (1, 0), (1, 2), (3, 2), (3, 3), (0, 3)]);
        assert_eq!(r.pixel_area, 5);
        assert!(r.contains(0, 1));
        assert!(r.contains(2, 2));
        assert!(!r.contains(2, 0));
        assert!(!r.contains(1, 1));
    }

    #[test]
    fn diagonal_neighbours_are_separate_regions() {
        let mask = mask_from(&[
            "##..",
            "##..",
            "..##",
            "..##",
        ]);
        let regions = extract_regions(&mask, &flat(&mask, 1.0), ChannelRole::MarkerB);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].bounds, BoundingBox { x: 0, y: 0, width: 2, height: 2 });
        assert_eq!(regions[1].bounds, BoundingBox { x: 2, y: 2, width: 2, height: 2 });
        assert_eq!(regions[0].outline.len(), 4);
        assert_eq!(regions[1].outline.len(), 4);
    }

    #[test]
    fn regions_follow_raster_order_and_never_overlap() {
        let mask = mask_from(&[
            "....###",
            "##..###",
            "##.....",
            ".......",
            "..####.",
        ]);
        let regions = extract_regions(&mask, &flat(&mask, 1.0), ChannelRole::Organoid);
        assert_eq!(regions.len(), 3);
        assert_eq!(regions[0].bounds.x, 4);
        assert_eq!(regions[1].bounds.x, 0);
        assert_eq!(regions[2].bounds.y, 4);

        let total: u64 = regions.iter().map(|r| r.pixel_area).sum();
        assert_eq!(total, 6 + 4 + 4);
        for y in 0..5 {
            for x in 0..7 {
                let owners = regions.iter().filter(|r| r.contains(x, y)).count();
                let fg = mask.get_pixel(x as u32, y as u32)[0] == 255;
                assert_eq!(owners, fg as usize, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn pinched_component_excludes_corner_enclosed_background() {
        // A ring closed only by a diagonal contact at the lower right
        let mask = mask_from(&[
            "####.",
            "#..#.",
            "#..#.",
            "###..",
            ".....",
        ]);
        let regions = extract_regions(&mask, &flat(&mask, 1.0), ChannelRole::Organoid);
        // (3,2) and (2,3) only touch diagonally, but the ring is still one 4-connected piece
        assert_eq!(regions.len(), 1);
        let ring = &regions[0];
        assert_eq!(ring.pixel_area, 11);
        assert!(ring.contains(3, 1));
        assert!(ring.contains(0, 1));
        assert!(ring.contains(2, 3));
        assert!(!ring.contains(1, 1));
        assert!(!ring.contains(3, 3));
        assert!(!ring.contains(4, 4));
    }

    #[test]
    fn mean_intensity_uses_measurement_channel() {
        let mask = mask_from(&["##", ".."]);
        let measure = FloatImage::from_fn(2, 2, |x, _| Luma([if x == 0 { 10.0 } else { 30.0 }]));
        let regions = extract_regions(&mask, &measure, ChannelRole::MarkerB);
        assert_eq!(regions[0].mean_intensity, 20.0);
    }

    #[test]
    fn centroid_truncates_box_centre() {
        let r = Region::rectangle(ChannelRole::MarkerA, 3, 4, 5, 2, 0.0);
        assert_eq!(r.centroid(), (5, 5));
    }

    #[test]
    fn empty_mask_has_no_regions() {
        let mask = GrayImage::new(5, 5);
        assert!(extract_regions(&mask, &flat(&mask, 0.0), ChannelRole::Organoid).is_empty());
    }
}
