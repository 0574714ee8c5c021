// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Interactive overlay compositor — the non-destructive preview of a page.
//
// `compose` is a pure function of its inputs: the base raster is cloned,
// never modified, and equal inputs give byte-identical output.

use brennwerk_core::error::Result;
use brennwerk_core::{Annotation, AppConfig, Color, DocPoint, DocRect, Tool};
use image::RgbaImage;
use tracing::trace;

use crate::effects::{self, EffectParams};
use crate::render::PageRaster;

/// A gesture that has not been committed yet, in document space.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingShape {
    /// A box being dragged with a box tool.
    Box {
        rect: DocRect,
        tool: Tool,
        color: Color,
    },
    /// A freehand trail being drawn.
    Trail { points: Vec<DocPoint>, color: Color },
}

/// Draw the page preview: base raster, then every annotation on
/// `page_index` in insertion order, then the pending gesture.
pub fn compose(
    base: &PageRaster,
    page_index: usize,
    annotations: &[Annotation],
    pending: Option<&PendingShape>,
    config: &AppConfig,
) -> Result<RgbaImage> {
    let viewport = base.validate()?;
    let params = EffectParams::from_config(config, base.scale);
    let (width, height) = (base.pixel_width(), base.pixel_height());
    let mut canvas = base.pixels.clone();

    for annotation in annotations.iter().filter(|a| a.page_index == page_index) {
        if annotation.kind.is_destructive() {
            let Some(region) = annotation
                .kind
                .rect()
                .and_then(|rect| viewport.pixel_rect(&rect, width, height))
            else {
                continue;
            };
            effects::apply_destructive(&mut canvas, region, &annotation.kind, &params);
        } else if let Some(shape) = effects::vector_shape(&annotation.kind) {
            effects::draw_shape(&mut canvas, &viewport, &shape);
        }
    }

    let style = &config.preview;
    match pending {
        Some(PendingShape::Box { rect, tool, color }) => {
            if let Some(region) = viewport.pixel_rect(rect, width, height) {
                if tool.is_destructive() {
                    effects::tint(&mut canvas, region, *color, style.fill_alpha);
                }
                effects::dashed_rect(&mut canvas, region, *color, style.dash, style.gap);
            }
        }
        Some(PendingShape::Trail { points, color }) => {
            let device: Vec<(f64, f64)> = points
                .iter()
                .map(|p| {
                    let d = viewport.to_device(*p);
                    (d.x, d.y)
                })
                .collect();
            effects::dashed_path(&mut canvas, &device, *color, style.dash, style.gap);
        }
        None => {}
    }

    trace!(page = page_index, width, height, "overlay composed");
    Ok(canvas)
}
