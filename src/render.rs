//! Flattening a scene into a single raster.
//!
//! Layers are drawn bottom to top: the base photo, each placement in insertion
//! order, then the debug overlay when asked for. Visibility is a parameter of
//! the render call, never state on the scene.

use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::glyphs::lit_cells;
use crate::scene::{DebugLayer, DebugMark, Placement, Scene};
use crate::types::{BoundingBox, Point};

/// Renders a scene to pixels.
pub trait Compositor {
    fn compose(
        &self,
        scene: &Scene,
        width: u32,
        height: u32,
        debug_visible: bool,
    ) -> Result<RgbaImage>;
}

/// Colours and sizes of the debug overlay.
#[derive(Debug, Clone)]
pub struct DebugStyle {
    pub box_color: Rgba<u8>,
    pub box_thickness: i32,
    pub landmark_color: Rgba<u8>,
    pub landmark_radius: i32,
    pub landmark_label_color: Rgba<u8>,
    pub anchor_fill: Rgba<u8>,
    pub anchor_ring: Rgba<u8>,
    pub anchor_radius: i32,
    pub anchor_label_color: Rgba<u8>,
    pub anchor_label_scale: u32,
}

impl Default for DebugStyle {
    fn default() -> Self {
        Self {
            box_color: Rgba([255, 0, 0, 255]),
            box_thickness: 3,
            landmark_color: Rgba([0, 255, 0, 255]),
            landmark_radius: 3,
            landmark_label_color: Rgba([255, 255, 0, 255]),
            anchor_fill: Rgba([0, 255, 255, 255]),
            anchor_ring: Rgba([0, 0, 255, 255]),
            anchor_radius: 5,
            anchor_label_color: Rgba([255, 255, 255, 255]),
            anchor_label_scale: 2,
        }
    }
}

/// CPU compositor: inverse-mapped bilinear sampling with source-over blending.
#[derive(Debug, Clone, Default)]
pub struct RasterCompositor {
    pub style: DebugStyle,
}

impl Compositor for RasterCompositor {
    fn compose(
        &self,
        scene: &Scene,
        width: u32,
        height: u32,
        debug_visible: bool,
    ) -> Result<RgbaImage> {
        if (width, height) != scene.dimensions() {
            let (base_w, base_h) = scene.dimensions();
            return Err(Error::Render(format!(
                "target {}x{} does not match base image {}x{}",
                width, height, base_w, base_h
            )));
        }

        let mut canvas = scene.base().pixels().clone();
        for placement in scene.placements() {
            draw_placement(&mut canvas, placement);
        }
        if debug_visible {
            if let Some(layer) = scene.debug_layer() {
                self.draw_debug(&mut canvas, layer);
            }
        }
        debug!(
            width,
            height,
            placements = scene.placements().len(),
            debug_visible,
            "scene flattened"
        );
        Ok(canvas)
    }
}

/// Render `scene` at its own size with the default compositor.
pub fn flatten(scene: &Scene, debug_visible: bool) -> Result<RgbaImage> {
    let (width, height) = scene.dimensions();
    RasterCompositor::default().compose(scene, width, height, debug_visible)
}

fn draw_placement(canvas: &mut RgbaImage, placement: &Placement) {
    let t = &placement.transform;
    if !t.is_invertible() {
        warn!(
            face = placement.face_index,
            scale = t.scale,
            "skipping prop with degenerate scale"
        );
        return;
    }

    let prop = placement.prop.image();
    let (pw, ph) = (prop.width() as f32, prop.height() as f32);
    let corners = [
        t.apply(Point::new(0.0, 0.0)),
        t.apply(Point::new(pw, 0.0)),
        t.apply(Point::new(0.0, ph)),
        t.apply(Point::new(pw, ph)),
    ];
    let (mut min, mut max) = (corners[0], corners[0]);
    for c in &corners[1..] {
        min = Point::new(min.x.min(c.x), min.y.min(c.y));
        max = Point::new(max.x.max(c.x), max.y.max(c.y));
    }

    let x0 = min.x.floor().max(0.0) as u32;
    let y0 = min.y.floor().max(0.0) as u32;
    let x1 = (max.x.ceil().max(0.0) as u32).min(canvas.width());
    let y1 = (max.y.ceil().max(0.0) as u32).min(canvas.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let Some(src) = t.invert(Point::new(x as f32 + 0.5, y as f32 + 0.5)) else {
                continue;
            };
            let sample = sample_bilinear(prop, src.x - 0.5, src.y - 0.5);
            if sample[3] <= 0.0 {
                continue;
            }
            blend_over(canvas.get_pixel_mut(x, y), sample);
        }
    }
}

/// Premultiplied RGBA (colour in 0..=255, alpha in 0..=1) at a sub-pixel
/// position. Outside the raster is transparent.
fn sample_bilinear(image: &RgbaImage, x: f32, y: f32) -> [f32; 4] {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let mut acc = [0.0f32; 4];
    for (dx, dy, w) in [
        (0, 0, (1.0 - fx) * (1.0 - fy)),
        (1, 0, fx * (1.0 - fy)),
        (0, 1, (1.0 - fx) * fy),
        (1, 1, fx * fy),
    ] {
        let (px, py) = (x0 + dx, y0 + dy);
        if px < 0 || py < 0 || px >= image.width() as i64 || py >= image.height() as i64 {
            continue;
        }
        let Rgba([r, g, b, a]) = *image.get_pixel(px as u32, py as u32);
        let alpha = a as f32 / 255.0;
        acc[0] += w * r as f32 * alpha;
        acc[1] += w * g as f32 * alpha;
        acc[2] += w * b as f32 * alpha;
        acc[3] += w * alpha;
    }
    acc
}

/// Source-over of a premultiplied sample onto a straight-alpha pixel.
fn blend_over(dst: &mut Rgba<u8>, src: [f32; 4]) {
    let src_a = src[3].min(1.0);
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return;
    }
    for c in 0..3 {
        let premul = src[c] + dst[c] as f32 * dst_a * (1.0 - src_a);
        dst[c] = (premul / out_a).round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

impl RasterCompositor {
    fn draw_debug(&self, canvas: &mut RgbaImage, layer: &DebugLayer) {
        let style = &self.style;
        for mark in &layer.marks {
            match mark {
                DebugMark::FaceBox(bbox) => {
                    draw_box(canvas, bbox, style.box_thickness, style.box_color)
                }
                DebugMark::Landmark { point, index } => {
                    let (x, y) = pixel(*point);
                    draw_circle(canvas, x, y, style.landmark_radius, style.landmark_color);
                    draw_text(
                        canvas,
                        x + 4,
                        y - 10,
                        &index.to_string(),
                        1,
                        style.landmark_label_color,
                    );
                }
                DebugMark::Anchor { point, label } => {
                    let (x, y) = pixel(*point);
                    draw_circle(canvas, x, y, style.anchor_radius + 1, style.anchor_ring);
                    draw_circle(canvas, x, y, style.anchor_radius - 1, style.anchor_fill);
                    draw_text(
                        canvas,
                        x + 8,
                        y - 6,
                        label,
                        style.anchor_label_scale,
                        style.anchor_label_color,
                    );
                }
            }
        }
    }
}

fn pixel(p: Point) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}

fn put(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Box outline `thickness` pixels wide, centred on the box edge.
fn draw_box(img: &mut RgbaImage, bbox: &BoundingBox, thickness: i32, color: Rgba<u8>) {
    let x = bbox.x.round() as i32;
    let y = bbox.y.round() as i32;
    let w = bbox.width.round() as i32;
    let h = bbox.height.round() as i32;
    let half = thickness / 2;

    for inset in -half..thickness - half {
        let (left, top) = (x + inset, y + inset);
        let (right, bottom) = (x + w - 1 - inset, y + h - 1 - inset);
        if right < left || bottom < top {
            break;
        }
        for px in left..=right {
            put(img, px, top, color);
            put(img, px, bottom, color);
        }
        for py in top..=bottom {
            put(img, left, py, color);
            put(img, right, py, color);
        }
    }
}

fn draw_circle(img: &mut RgbaImage, cx: i32, cy: i32, radius: i32, color: Rgba<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

fn draw_text(img: &mut RgbaImage, x: i32, y: i32, text: &str, scale: u32, color: Rgba<u8>) {
    let scale = scale.max(1) as i32;
    for (col, row) in lit_cells(text) {
        let (cx, cy) = (x + col as i32 * scale, y + row as i32 * scale);
        for sy in 0..scale {
            for sx in 0..scale {
                put(img, cx + sx, cy + sy, color);
            }
        }
    }
}
