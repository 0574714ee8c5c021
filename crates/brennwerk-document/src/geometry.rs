// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-space / device-space transforms.
//
// Document space: PDF points, origin bottom-left, y up, zoom independent.
// Device space: raster pixels, origin top-left, y down, scaled by zoom.
// Rectangles always cross between the two through their extreme corners.

use brennwerk_core::{DevicePoint, DeviceRect, DocPoint, DocRect, TransformError};

/// The mapping between one page's document space and a raster of that page
/// drawn at `scale` pixels per point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    doc_width: f64,
    doc_height: f64,
    scale: f64,
}

impl Viewport {
    /// Create a viewport for a page of the given document dimensions.
    pub fn new(doc_width: f64, doc_height: f64, scale: f64) -> Result<Self, TransformError> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(TransformError::InvalidScale(scale));
        }
        Ok(Self {
            doc_width,
            doc_height,
            scale,
        })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn doc_width(&self) -> f64 {
        self.doc_width
    }

    pub fn doc_height(&self) -> f64 {
        self.doc_height
    }

    /// Raster dimensions for this page at this scale.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.doc_width * self.scale).ceil().max(1.0) as u32,
            (self.doc_height * self.scale).ceil().max(1.0) as u32,
        )
    }

    /// The whole page as a document-space rectangle.
    pub fn page_rect(&self) -> DocRect {
        DocRect::new(0.0, 0.0, self.doc_width, self.doc_height)
    }

    /// `(x, y) -> (x * s, (H - y) * s)`
    pub fn to_device(&self, point: DocPoint) -> DevicePoint {
        DevicePoint::new(
            point.x * self.scale,
            (self.doc_height - point.y) * self.scale,
        )
    }

    /// `(px, py) -> (px / s, H - py / s)`
    pub fn to_document(&self, point: DevicePoint) -> DocPoint {
        DocPoint::new(
            point.x / self.scale,
            self.doc_height - point.y / self.scale,
        )
    }

    /// Convert a document rectangle through its top-left and bottom-right
    /// corners, then normalise with min/max.
    pub fn rect_to_device(&self, rect: &DocRect) -> DeviceRect {
        let a = self.to_device(rect.top_left());
        let b = self.to_device(rect.bottom_right());
        DeviceRect::from_points(a, b)
    }

    /// Inverse of [`Viewport::rect_to_device`].
    pub fn rect_to_document(&self, rect: &DeviceRect) -> DocRect {
        let a = self.to_document(DevicePoint::new(rect.x, rect.y));
        let b = self.to_document(DevicePoint::new(rect.right(), rect.bottom()));
        DocRect::from_corners(a, b)
    }

    /// Clip a rectangle to the page. Fails when nothing of it is on the page.
    pub fn clip_to_page(&self, rect: &DocRect) -> Result<DocRect, TransformError> {
        self.page_rect()
            .intersection(rect)
            .ok_or(TransformError::OutOfBounds)
    }

    /// Integer pixel region of `rect` inside a `width` x `height` raster.
    pub fn pixel_rect(&self, rect: &DocRect, width: u32, height: u32) -> Option<PixelRect> {
        PixelRect::from_device(&self.rect_to_device(rect), width, height)
    }
}

/// A whole-pixel region inside a raster, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Cover `rect` with whole pixels (floor the near edges, ceil the far
    /// edges) and clamp to the raster. `None` if no pixel remains.
    pub fn from_device(rect: &DeviceRect, width: u32, height: u32) -> Option<Self> {
        let x0 = rect.x.floor().clamp(0.0, width as f64) as u32;
        let y0 = rect.y.floor().clamp(0.0, height as f64) as u32;
        let x1 = rect.right().ceil().clamp(0.0, width as f64) as u32;
        let y1 = rect.bottom().ceil().clamp(0.0, height as f64) as u32;
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self::new(x0, y0, x1 - x0, y1 - y0))
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Reject device rectangles too small to be a deliberate gesture.
pub fn check_min_size(rect: &DeviceRect, min_px: f64) -> Result<(), TransformError> {
    if rect.width < min_px || rect.height < min_px {
        return Err(TransformError::Degenerate {
            width: rect.width,
            height: rect.height,
            min: min_px,
        });
    }
    Ok(())
}

/// Turn a finished drag into a page-clipped document rectangle. The size
/// rule applies to what is left after clipping.
pub fn drag_to_document(
    viewport: &Viewport,
    start: DevicePoint,
    end: DevicePoint,
    min_px: f64,
) -> Result<DocRect, TransformError> {
    let device = DeviceRect::from_points(start, end);
    accept_document_rect(viewport, &viewport.rect_to_document(&device), min_px)
}

/// Validate a rectangle that arrived in document space (detector output,
/// imported marks) with the same size rule applied to manual drags.
pub fn accept_document_rect(
    viewport: &Viewport,
    rect: &DocRect,
    min_px: f64,
) -> Result<DocRect, TransformError> {
    let clipped = viewport.clip_to_page(rect)?;
    check_min_size(&viewport.rect_to_device(&clipped), min_px)?;
    Ok(clipped)
}

/// Bring a freehand stroke onto the page: points off the page are clamped to
/// its edge. A stroke whose bounds miss the page entirely is out of bounds,
/// and one that collapses to a single point is rejected like a click.
pub fn accept_stroke(viewport: &Viewport, points: &[DocPoint]) -> Result<Vec<DocPoint>, TransformError> {
    check_stroke(points)?;
    let (mut x0, mut y0, mut x1, mut y1) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for p in points {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }
    let page = viewport.page_rect();
    let touches = x0 <= page.right() && x1 >= page.x && y0 <= page.top() && y1 >= page.y;
    if !touches || !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
        return Err(TransformError::OutOfBounds);
    }

    let mut clamped: Vec<DocPoint> = Vec::with_capacity(points.len());
    for p in points {
        let q = DocPoint::new(p.x.clamp(page.x, page.right()), p.y.clamp(page.y, page.top()));
        if clamped.last() != Some(&q) {
            clamped.push(q);
        }
    }
    check_stroke(&clamped)?;
    Ok(clamped)
}

/// A freehand stroke needs at least two distinct points.
pub fn check_stroke(points: &[DocPoint]) -> Result<(), TransformError> {
    let Some(first) = points.first() else {
        return Err(TransformError::TooFewPoints(0));
    };
    if points.iter().any(|p| p.distance_to(first) > f64::EPSILON) {
        Ok(())
    } else {
        Err(TransformError::TooFewPoints(1))
    }
}
