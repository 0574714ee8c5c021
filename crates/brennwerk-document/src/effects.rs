// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Effect renderer — the obscuring algorithms applied to a pixel region, and
// the raster drawing of vector marks used by the on-screen overlay.
//
// Destructive effects read and write only inside their `PixelRect`. Vector
// marks are described as `VectorShape`s so the PDF writer can emit them as
// native operators and the overlay can draw the same shape in pixels.

use brennwerk_core::{AnnotationKind, AppConfig, Color, DocPoint, DocRect};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::filter::gaussian_blur_f32;
use imageproc::rect::Rect;

use crate::geometry::{PixelRect, Viewport};

/// Average Helvetica glyph advance as a fraction of the font size.
pub const GLYPH_WIDTH_FACTOR: f64 = 0.5;

/// Resolved parameters for destructive effects at one raster scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    /// Pixelation cell edge in pixels.
    pub block_px: u32,
    pub blur_ratio: f64,
    pub blur_blend: bool,
}

impl EffectParams {
    pub fn from_config(config: &AppConfig, scale: f64) -> Self {
        Self {
            block_px: config.block_px(scale),
            blur_ratio: config.blur_downsample_ratio.clamp(0.01, 1.0),
            blur_blend: config.blur_blend_pixelate,
        }
    }
}

pub(crate) fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 255])
}

// -- Destructive effects ------------------------------------------------------

/// Apply a destructive annotation to `region` of `canvas`.
///
/// Returns `false` (and leaves the canvas alone) for vector kinds.
pub fn apply_destructive(
    canvas: &mut RgbaImage,
    region: PixelRect,
    kind: &AnnotationKind,
    params: &EffectParams,
) -> bool {
    match kind {
        AnnotationKind::Pixelate { .. } => pixelate(canvas, region, params.block_px),
        AnnotationKind::Blur { .. } => blur(canvas, region, params),
        AnnotationKind::OpaqueFill { color, .. } => fill(canvas, region, *color),
        AnnotationKind::StrokeRect { .. }
        | AnnotationKind::FreehandStroke { .. }
        | AnnotationKind::TextLabel { .. } => return false,
    }
    true
}

/// Replace each `block` x `block` cell of the region with its average colour.
///
/// Equivalent to a box-filter downsample to `ceil(w/block) x ceil(h/block)`
/// followed by a nearest-neighbour upsample. Cells on the far edges are
/// clipped to the region.
pub fn pixelate(canvas: &mut RgbaImage, region: PixelRect, block: u32) {
    let Some(region) = clamp_region(canvas, region) else {
        return;
    };
    let block = block.max(1);

    let mut cell_y = region.y;
    while cell_y < region.bottom() {
        let cell_h = block.min(region.bottom() - cell_y);
        let mut cell_x = region.x;
        while cell_x < region.right() {
            let cell_w = block.min(region.right() - cell_x);
            let cell = PixelRect::new(cell_x, cell_y, cell_w, cell_h);
            let average = average_colour(canvas, cell);
            for y in cell.y..cell.bottom() {
                for x in cell.x..cell.right() {
                    canvas.put_pixel(x, y, average);
                }
            }
            cell_x += block;
        }
        cell_y += block;
    }
}

fn average_colour(canvas: &RgbaImage, cell: PixelRect) -> Rgba<u8> {
    let mut acc = [0u64; 4];
    for y in cell.y..cell.bottom() {
        for x in cell.x..cell.right() {
            let pixel = canvas.get_pixel(x, y);
            for (sum, channel) in acc.iter_mut().zip(pixel.0) {
                *sum += channel as u64;
            }
        }
    }
    let count = (cell.width as u64 * cell.height as u64).max(1);
    Rgba(acc.map(|sum| (sum / count) as u8))
}

/// Smear the region: downsample to `blur_ratio` of its linear size, scale back
/// up with a triangle filter and run a Gaussian pass. When `blur_blend` is set
/// the result is mixed 50/50 with a pixelated copy.
pub fn blur(canvas: &mut RgbaImage, region: PixelRect, params: &EffectParams) {
    let Some(region) = clamp_region(canvas, region) else {
        return;
    };
    let patch = imageops::crop_imm(&*canvas, region.x, region.y, region.width, region.height)
        .to_image();

    let small_w = ((region.width as f64 * params.blur_ratio).round() as u32).max(1);
    let small_h = ((region.height as f64 * params.blur_ratio).round() as u32).max(1);
    let small = imageops::resize(&patch, small_w, small_h, FilterType::Triangle);
    let smooth = imageops::resize(&small, region.width, region.height, FilterType::Triangle);
    let sigma = (0.5 / params.blur_ratio).max(0.8) as f32;
    let mut blurred = gaussian_blur_f32(&smooth, sigma);

    if params.blur_blend {
        let mut blocky = patch;
        let whole = PixelRect::new(0, 0, region.width, region.height);
        pixelate(&mut blocky, whole, params.block_px);
        for (soft, hard) in blurred.pixels_mut().zip(blocky.pixels()) {
            for (a, b) in soft.0.iter_mut().zip(hard.0) {
                *a = ((*a as u16 + b as u16) / 2) as u8;
            }
        }
    }

    for (x, y, pixel) in blurred.enumerate_pixels() {
        canvas.put_pixel(region.x + x, region.y + y, *pixel);
    }
}

/// Paint the region a solid colour.
pub fn fill(canvas: &mut RgbaImage, region: PixelRect, color: Color) {
    let Some(region) = clamp_region(canvas, region) else {
        return;
    };
    let rect = Rect::at(region.x as i32, region.y as i32).of_size(region.width, region.height);
    draw_filled_rect_mut(canvas, rect, rgba(color));
}

fn clamp_region(canvas: &RgbaImage, region: PixelRect) -> Option<PixelRect> {
    let right = region.right().min(canvas.width());
    let bottom = region.bottom().min(canvas.height());
    (right > region.x && bottom > region.y)
        .then(|| PixelRect::new(region.x, region.y, right - region.x, bottom - region.y))
}

// -- Vector marks -------------------------------------------------------------

/// A non-destructive mark in document space.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorShape {
    Outline {
        rect: DocRect,
        color: Color,
        width: f64,
    },
    Polyline {
        points: Vec<DocPoint>,
        color: Color,
        width: f64,
    },
    Text {
        origin: DocPoint,
        text: String,
        font_size: f64,
        color: Color,
    },
}

/// The vector form of an annotation, `None` for destructive kinds.
pub fn vector_shape(kind: &AnnotationKind) -> Option<VectorShape> {
    let shape = match kind {
        AnnotationKind::StrokeRect { rect, color, width } => VectorShape::Outline {
            rect: *rect,
            color: *color,
            width: *width,
        },
        AnnotationKind::FreehandStroke {
            points,
            color,
            width,
        } => VectorShape::Polyline {
            points: points.clone(),
            color: *color,
            width: *width,
        },
        AnnotationKind::TextLabel {
            rect,
            text,
            font_size,
            color,
        } => VectorShape::Text {
            origin: text_origin(rect, *font_size),
            text: text.clone(),
            font_size: *font_size,
            color: *color,
        },
        AnnotationKind::Pixelate { .. }
        | AnnotationKind::Blur { .. }
        | AnnotationKind::OpaqueFill { .. } => return None,
    };
    Some(shape)
}

/// Baseline start of a label: one font size below the top edge of its box,
/// never below the box itself.
pub fn text_origin(rect: &DocRect, font_size: f64) -> DocPoint {
    DocPoint::new(rect.x, (rect.top() - font_size).max(rect.y))
}

/// Estimated advance of `chars` glyphs at `font_size`.
pub fn estimated_text_width(chars: usize, font_size: f64) -> f64 {
    chars as f64 * GLYPH_WIDTH_FACTOR * font_size
}

/// Draw a vector mark in raster space for the overlay.
pub fn draw_shape(canvas: &mut RgbaImage, viewport: &Viewport, shape: &VectorShape) {
    let scale = viewport.scale();
    match shape {
        VectorShape::Outline { rect, color, width } => {
            let device = viewport.rect_to_device(rect);
            let corners = [
                (device.x, device.y),
                (device.right(), device.y),
                (device.right(), device.bottom()),
                (device.x, device.bottom()),
            ];
            for i in 0..corners.len() {
                let (a, b) = (corners[i], corners[(i + 1) % corners.len()]);
                thick_line(canvas, a, b, width * scale, rgba(*color));
            }
        }
        VectorShape::Polyline {
            points,
            color,
            width,
        } => {
            let device: Vec<(f64, f64)> = points
                .iter()
                .map(|p| {
                    let d = viewport.to_device(*p);
                    (d.x, d.y)
                })
                .collect();
            for pair in device.windows(2) {
                thick_line(canvas, pair[0], pair[1], width * scale, rgba(*color));
            }
        }
        VectorShape::Text {
            origin,
            text,
            font_size,
            color,
        } => {
            // Glyph cells rather than real outlines; the exported PDF carries
            // the actual text.
            let baseline = viewport.to_device(*origin);
            let size_px = font_size * scale;
            let advance = GLYPH_WIDTH_FACTOR * size_px;
            let cell_w = ((advance * 0.8).round() as u32).max(1);
            let cell_h = ((size_px * 0.7).round() as u32).max(1);
            for (i, ch) in text.chars().enumerate() {
                if ch.is_whitespace() {
                    continue;
                }
                let x = (baseline.x + i as f64 * advance).round() as i32;
                let y = (baseline.y - size_px * 0.7).round() as i32;
                draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(cell_w, cell_h), rgba(*color));
            }
        }
    }
}

/// Line of `width` pixels drawn by stamping discs along the segment, which
/// also gives round caps and joins.
pub(crate) fn thick_line(
    canvas: &mut RgbaImage,
    from: (f64, f64),
    to: (f64, f64),
    width: f64,
    color: Rgba<u8>,
) {
    let radius = (width / 2.0).round() as i32;
    let margin = radius.max(1) as f64;
    let Some((from, to, _)) = clip_segment(canvas, from, to, margin) else {
        return;
    };
    if radius < 1 {
        draw_line_segment_mut(
            canvas,
            (from.0 as f32, from.1 as f32),
            (to.0 as f32, to.1 as f32),
            color,
        );
        return;
    }
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = (dx.hypot(dy).ceil() as u32).max(1);
    for step in 0..=steps {
        let t = step as f64 / steps as f64;
        let center = (
            (from.0 + dx * t).round() as i32,
            (from.1 + dy * t).round() as i32,
        );
        draw_filled_circle_mut(canvas, center, radius, color);
    }
}

/// Liang-Barsky clip of a segment to the canvas grown by `margin` pixels.
/// Returns the visible part and the fraction of the segment cut off before
/// it.
fn clip_segment(
    canvas: &RgbaImage,
    from: (f64, f64),
    to: (f64, f64),
    margin: f64,
) -> Option<((f64, f64), (f64, f64), f64)> {
    let (x_min, y_min) = (-margin, -margin);
    let x_max = canvas.width() as f64 + margin;
    let y_max = canvas.height() as f64 + margin;
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    if !(dx.is_finite() && dy.is_finite()) {
        return None;
    }

    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-dx, from.0 - x_min),
        (dx, x_max - from.0),
        (-dy, from.1 - y_min),
        (dy, y_max - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    let at = |t: f64| (from.0 + dx * t, from.1 + dy * t);
    Some((at(t0), at(t1), t0))
}

// -- Preview styling ----------------------------------------------------------

/// Dashed outline of a device-space box, one pixel wide.
pub fn dashed_rect(canvas: &mut RgbaImage, region: PixelRect, color: Color, dash: u32, gap: u32) {
    let (right, bottom) = (region.right().saturating_sub(1), region.bottom().saturating_sub(1));
    let edges = [
        ((region.x, region.y), (right, region.y)),
        ((right, region.y), (right, bottom)),
        ((right, bottom), (region.x, bottom)),
        ((region.x, bottom), (region.x, region.y)),
    ];
    let mut phase = 0;
    for (from, to) in edges {
        phase = dashed_segment(
            canvas,
            (from.0 as f64, from.1 as f64),
            (to.0 as f64, to.1 as f64),
            color,
            dash,
            gap,
            phase,
        );
    }
}

/// Dashed polyline through device points.
pub fn dashed_path(canvas: &mut RgbaImage, points: &[(f64, f64)], color: Color, dash: u32, gap: u32) {
    let mut phase = 0;
    for pair in points.windows(2) {
        phase = dashed_segment(canvas, pair[0], pair[1], color, dash, gap, phase);
    }
}

/// Walk a segment pixel by pixel, painting while inside a dash. Returns the
/// pattern phase to continue with on the next segment.
fn dashed_segment(
    canvas: &mut RgbaImage,
    from: (f64, f64),
    to: (f64, f64),
    color: Color,
    dash: u32,
    gap: u32,
    mut phase: u32,
) -> u32 {
    let period = (dash + gap).max(1);
    let length = (to.0 - from.0).hypot(to.1 - from.1);
    let Some((from, to, skipped)) = clip_segment(canvas, from, to, 1.0) else {
        return ((phase as f64 + length.round()) % period as f64) as u32;
    };
    // Keep the pattern aligned with the unclipped segment.
    phase = ((phase as f64 + (skipped * length).round()) % period as f64) as u32;
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = dx.hypot(dy).round() as u32;
    let pixel = rgba(color);
    for step in 0..=steps {
        let t = if steps == 0 { 0.0 } else { step as f64 / steps as f64 };
        let (x, y) = ((from.0 + dx * t).round(), (from.1 + dy * t).round());
        let on_canvas = x >= 0.0 && y >= 0.0 && (x as u32) < canvas.width() && (y as u32) < canvas.height();
        if phase < dash && on_canvas {
            canvas.put_pixel(x as u32, y as u32, pixel);
        }
        phase = (phase + 1) % period;
    }
    phase
}

/// Blend `color` over the region at `alpha` (0-255).
pub fn tint(canvas: &mut RgbaImage, region: PixelRect, color: Color, alpha: u8) {
    let Some(region) = clamp_region(canvas, region) else {
        return;
    };
    let a = alpha as u16;
    let src = [color.r, color.g, color.b];
    for y in region.y..region.bottom() {
        for x in region.x..region.right() {
            let pixel = canvas.get_pixel_mut(x, y);
            for (dst, s) in pixel.0.iter_mut().take(3).zip(src) {
                *dst = ((s as u16 * a + *dst as u16 * (255 - a)) / 255) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) * 3 % 256) as u8, 255])
        })
    }

    fn params() -> EffectParams {
        EffectParams {
            block_px: 8,
            blur_ratio: 0.1,
            blur_blend: true,
        }
    }

    fn outside_unchanged(before: &RgbaImage, after: &RgbaImage, region: PixelRect) {
        for (x, y, pixel) in before.enumerate_pixels() {
            if !region.contains(x, y) {
                assert_eq!(after.get_pixel(x, y), pixel, "pixel ({x},{y}) outside region changed");
            }
        }
    }

    #[test]
    fn pixelate_bounds_distinct_colours() {
        let mut image = gradient(37, 23);
        let whole = PixelRect::new(0, 0, 37, 23);
        pixelate(&mut image, whole, 8);
        let colours: HashSet<_> = image.pixels().map(|p| p.0).collect();
        assert!(colours.len() <= 5 * 3, "got {} colours", colours.len());
    }

    #[test]
    fn pixelate_cells_are_uniform() {
        let mut image = gradient(16, 16);
        pixelate(&mut image, PixelRect::new(0, 0, 16, 16), 8);
        assert_eq!(image.get_pixel(0, 0), image.get_pixel(7, 7));
        assert_ne!(image.get_pixel(0, 0), image.get_pixel(8, 0));
    }

    #[test]
    fn destructive_effects_stay_inside_region() {
        let region = PixelRect::new(10, 5, 20, 12);
        let kinds = [
            AnnotationKind::Pixelate { rect: DocRect::new(0.0, 0.0, 1.0, 1.0) },
            AnnotationKind::Blur { rect: DocRect::new(0.0, 0.0, 1.0, 1.0) },
            AnnotationKind::OpaqueFill {
                rect: DocRect::new(0.0, 0.0, 1.0, 1.0),
                color: Color::BLACK,
            },
        ];
        for kind in &kinds {
            let before = gradient(48, 32);
            let mut after = before.clone();
            assert!(apply_destructive(&mut after, region, kind, &params()));
            outside_unchanged(&before, &after, region);
            assert_ne!(before, after, "{} changed nothing", kind.label());
        }
    }

    #[test]
    fn fill_paints_every_pixel_in_region() {
        let mut image = gradient(20, 20);
        let region = PixelRect::new(2, 3, 5, 4);
        fill(&mut image, region, Color::RED);
        for y in 3..7 {
            for x in 2..7 {
                assert_eq!(*image.get_pixel(x, y), rgba(Color::RED));
            }
        }
    }

    #[test]
    fn region_past_the_edge_is_clamped() {
        let mut image = gradient(10, 10);
        pixelate(&mut image, PixelRect::new(8, 8, 20, 20), 4);
        blur(&mut image, PixelRect::new(20, 20, 5, 5), &params());
    }

    #[test]
    fn vector_kinds_are_not_destructive_here() {
        let mut image = gradient(10, 10);
        let before = image.clone();
        let kind = AnnotationKind::StrokeRect {
            rect: DocRect::new(0.0, 0.0, 5.0, 5.0),
            color: Color::BLUE,
            width: 1.0,
        };
        assert!(!apply_destructive(&mut image, PixelRect::new(0, 0, 10, 10), &kind, &params()));
        assert_eq!(image, before);
        assert!(vector_shape(&kind).is_some());
    }

    #[test]
    fn label_origin_sits_one_font_size_below_the_top() {
        let rect = DocRect::new(10.0, 100.0, 80.0, 14.4);
        assert!((text_origin(&rect, 12.0).y - 102.4).abs() < 1e-9);
        let squat = DocRect::new(0.0, 50.0, 10.0, 4.0);
        assert_eq!(text_origin(&squat, 12.0).y, 50.0);
    }

    #[test]
    fn outline_is_drawn_on_the_box_edges() {
        let viewport = Viewport::new(100.0, 100.0, 1.0).unwrap();
        let mut canvas = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let shape = VectorShape::Outline {
            rect: DocRect::new(20.0, 20.0, 40.0, 40.0),
            color: Color::BLACK,
            width: 2.0,
        };
        draw_shape(&mut canvas, &viewport, &shape);
        assert_eq!(*canvas.get_pixel(20, 50), rgba(Color::BLACK));
        assert_eq!(*canvas.get_pixel(40, 50), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn far_off_canvas_segments_are_clipped() {
        let mut canvas = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        thick_line(&mut canvas, (10.0, 10.0), (1e9, 10.0), 4.0, rgba(Color::BLACK));
        assert_eq!(*canvas.get_pixel(10, 10), rgba(Color::BLACK));
        assert_eq!(*canvas.get_pixel(99, 10), rgba(Color::BLACK));
        assert_eq!(*canvas.get_pixel(50, 40), Rgba([255, 255, 255, 255]));

        let mut dashed = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        dashed_path(&mut dashed, &[(-1e9, 50.0), (1e9, 50.0)], Color::BLACK, 6, 4);
        assert!((0..100).any(|x| *dashed.get_pixel(x, 50) == rgba(Color::BLACK)));

        let untouched = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let mut missed = untouched.clone();
        thick_line(&mut missed, (-1e9, -50.0), (1e9, -50.0), 4.0, rgba(Color::BLACK));
        assert_eq!(missed, untouched);
    }

    #[test]
    fn clipping_keeps_the_dash_phase() {
        let mut whole = RgbaImage::from_pixel(40, 10, Rgba([255, 255, 255, 255]));
        dashed_path(&mut whole, &[(0.0, 5.0), (39.0, 5.0)], Color::BLACK, 6, 4);
        let mut from_outside = RgbaImage::from_pixel(40, 10, Rgba([255, 255, 255, 255]));
        dashed_path(&mut from_outside, &[(-20.0, 5.0), (39.0, 5.0)], Color::BLACK, 6, 4);
        // Starting 20 px earlier is two full periods, so the pattern matches.
        assert_eq!(whole, from_outside);
    }

    #[test]
    fn dashes_leave_gaps() {
        let mut canvas = RgbaImage::from_pixel(40, 10, Rgba([255, 255, 255, 255]));
        dashed_path(&mut canvas, &[(0.0, 5.0), (39.0, 5.0)], Color::BLACK, 6, 4);
        assert_eq!(*canvas.get_pixel(0, 5), rgba(Color::BLACK));
        assert_eq!(*canvas.get_pixel(7, 5), Rgba([255, 255, 255, 255]));
        assert_eq!(*canvas.get_pixel(10, 5), rgba(Color::BLACK));
    }
}
