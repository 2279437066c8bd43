// src/overlay.rs - Role-tagged overlay items and a simple PNG renderer

use bresenham::Bresenham;
use image::{Rgb, RgbImage};
use serde::Serialize;

use crate::config::ChannelRole;
use crate::font::{glyph, is_set, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::image_utils::{to_gray_preview, FloatImage};
use crate::regions::Region;

/// Offset of the text anchor from an organoid's pixel centroid
pub const LABEL_OFFSET: (i32, i32) = (-20, 20);

/// Pixel size of one glyph dot in the rendered overlay
const LABEL_SCALE: i32 = 2;

/// What an overlay item marks; each kind gets its own colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayRole {
    OrganoidOutline,
    MarkerAOutline,
    MarkerBOutline,
    Label,
}

impl OverlayRole {
    pub fn for_channel(role: ChannelRole) -> Self {
        match role {
            ChannelRole::Organoid => OverlayRole::OrganoidOutline,
            ChannelRole::MarkerA => OverlayRole::MarkerAOutline,
            ChannelRole::MarkerB => OverlayRole::MarkerBOutline,
        }
    }

    pub fn color(&self) -> [u8; 3] {
        match self {
            OverlayRole::OrganoidOutline => [255, 255, 0], // Yellow
            OverlayRole::MarkerAOutline => [255, 0, 255],  // Magenta
            OverlayRole::MarkerBOutline => [0, 255, 255],  // Cyan
            OverlayRole::Label => [0, 255, 0],             // Green
        }
    }
}

/// One drawable element, tagged with the z-slice it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayItem {
    Outline {
        role: OverlayRole,
        slice: usize,
        points: Vec<(i32, i32)>,
    },
    Text {
        role: OverlayRole,
        slice: usize,
        text: String,
        x: i32,
        y: i32,
    },
}

impl OverlayItem {
    pub fn outline(region: &Region, slice: usize) -> Self {
        OverlayItem::Outline {
            role: OverlayRole::for_channel(region.role),
            slice,
            points: region.outline.clone(),
        }
    }

    /// Label placed at the standard offset from the organoid centroid
    pub fn label(text: &str, centroid: (i32, i32), slice: usize) -> Self {
        OverlayItem::Text {
            role: OverlayRole::Label,
            slice,
            text: text.to_string(),
            x: centroid.0 + LABEL_OFFSET.0,
            y: centroid.1 + LABEL_OFFSET.1,
        }
    }

    pub fn role(&self) -> OverlayRole {
        match self {
            OverlayItem::Outline { role, .. } | OverlayItem::Text { role, .. } => *role,
        }
    }
}

fn put_if_inside(image: &mut RgbImage, x: isize, y: isize, color: [u8; 3]) {
    let (width, height) = image.dimensions();
    if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
        image.put_pixel(x as u32, y as u32, Rgb(color));
    }
}

/// Draw a closed polygon; corner coordinates are clamped onto the last pixel
/// row and column so right and bottom edges stay visible.
fn draw_polygon(image: &mut RgbImage, points: &[(i32, i32)], color: [u8; 3]) {
    if points.is_empty() {
        return;
    }
    let (width, height) = image.dimensions();
    let to_pixel = |p: (i32, i32)| -> (isize, isize) {
        (
            p.0.min(width as i32 - 1) as isize,
            p.1.min(height as i32 - 1) as isize,
        )
    };
    for i in 0..points.len() {
        let start = to_pixel(points[i]);
        let end = to_pixel(points[(i + 1) % points.len()]);
        for (x, y) in Bresenham::new(start, end) {
            put_if_inside(image, x, y, color);
        }
        // Bresenham excludes the end point
        put_if_inside(image, end.0, end.1, color);
    }
}

/// Draw text with the bitmap font, top-left corner at (x, y).
///
/// Each glyph pixel becomes a `scale` x `scale` block; characters without a
/// glyph leave a gap.
fn draw_text(image: &mut RgbImage, text: &str, x: i32, y: i32, color: [u8; 3], scale: i32) {
    let mut cursor_x = x;
    for c in text.chars() {
        if let Some(bitmap) = glyph(c) {
            for row in 0..GLYPH_HEIGHT {
                for col in 0..GLYPH_WIDTH {
                    if !is_set(bitmap, col, row) {
                        continue;
                    }
                    let px = cursor_x + col as i32 * scale;
                    let py = y + row as i32 * scale;
                    for dy in 0..scale {
                        for dx in 0..scale {
                            put_if_inside(image, (px + dx) as isize, (py + dy) as isize, color);
                        }
                    }
                }
            }
        }
        // One blank column between characters
        cursor_x += (GLYPH_WIDTH as i32 + 1) * scale;
    }
}

/// Draw overlay items over a greyscale rendering of `base`
pub fn render_overlay(base: &FloatImage, items: &[OverlayItem]) -> RgbImage {
    let grey = to_gray_preview(base);
    let mut canvas = RgbImage::from_fn(grey.width(), grey.height(), |x, y| {
        let v = grey.get_pixel(x, y)[0];
        Rgb([v, v, v])
    });

    for item in items {
        let color = item.role().color();
        match item {
            OverlayItem::Outline { points, .. } => draw_polygon(&mut canvas, points, color),
            OverlayItem::Text { text, x, y, .. } => draw_text(&mut canvas, text, *x, *y, color, LABEL_SCALE),
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn label_sits_below_left_of_centroid() {
        match OverlayItem::label("A", (50, 40), 3) {
            OverlayItem::Text { x, y, slice, text, role } => {
                assert_eq!((x, y), (30, 60));
                assert_eq!(slice, 3);
                assert_eq!(text, "A");
                assert_eq!(role, OverlayRole::Label);
            }
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn outline_role_follows_region_channel() {
        let region = Region::rectangle(ChannelRole::MarkerB, 1, 1, 2, 2, 0.0);
        assert_eq!(OverlayItem::outline(&region, 1).role(), OverlayRole::MarkerBOutline);
    }

    #[test]
    fn renders_outline_in_role_colour() {
        let base = FloatImage::from_pixel(10, 10, Luma([0.0]));
        let region = Region::rectangle(ChannelRole::Organoid, 2, 2, 4, 4, 0.0);
        let canvas = render_overlay(&base, &[OverlayItem::outline(&region, 1)]);
        assert_eq!(canvas.get_pixel(2, 2), &Rgb([255, 255, 0]));
        assert_eq!(canvas.get_pixel(6, 4), &Rgb([255, 255, 0]));
        assert_eq!(canvas.get_pixel(4, 4), &Rgb([0, 0, 0]));
    }

    #[test]
    fn serialises_with_kind_tag() {
        let item = OverlayItem::label("BB", (0, 0), 2);
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"kind\":\"text\""));
        assert!(json.contains("\"role\":\"label\""));
    }

    #[test]
    fn renders_label_text_at_anchor() {
        let base = FloatImage::from_pixel(60, 60, Luma([0.0]));
        // Anchor lands at (10, 30)
        let canvas = render_overlay(&base, &[OverlayItem::label("AB", (30, 10), 1)]);
        let green = Rgb([0, 255, 0]);
        // Top row of "A" is .###.
        assert_eq!(canvas.get_pixel(10, 30), &Rgb([0, 0, 0]));
        assert_eq!(canvas.get_pixel(12, 30), &green);
        assert_eq!(canvas.get_pixel(13, 31), &green);
        // Cross bar of "A" on glyph row 3
        assert_eq!(canvas.get_pixel(10, 36), &green);
        // "B" starts one glyph plus one gap column later
        assert_eq!(canvas.get_pixel(22, 30), &green);
        assert_eq!(canvas.get_pixel(30, 30), &Rgb([0, 0, 0]));
    }
}
