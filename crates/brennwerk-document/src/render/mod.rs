// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization seam.
//
// Brennwerk does not draw PDF content itself. A `PageRenderer` turns one page
// of the original bytes into pixels; the overlay, the detector flow and the
// burn-in pipeline all go through this trait. With the `pdfium` feature the
// PDFium library draws real page content.

use brennwerk_core::Color;
use brennwerk_core::error::{BrennwerkError, Result};
use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::geometry::Viewport;
use crate::pdf::reader::PageHandle;

#[cfg(feature = "pdfium")]
mod pdfium;

#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRenderer;

/// A rendered page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRaster {
    pub pixels: RgbaImage,
    /// Page width in document units.
    pub document_width: f64,
    /// Page height in document units.
    pub document_height: f64,
    /// Pixels per document unit the raster was drawn at.
    pub scale: f64,
}

impl PageRaster {
    pub fn pixel_width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixels.height()
    }

    /// The transform between this raster and its page.
    pub fn viewport(&self) -> Result<Viewport> {
        Viewport::new(self.document_width, self.document_height, self.scale)
            .map_err(|err| BrennwerkError::Render(format!("raster has {err}")))
    }

    /// Reject rasters whose pixel size does not match the page at their
    /// scale (off by at most one pixel for rounding).
    pub fn validate(&self) -> Result<Viewport> {
        let viewport = self.viewport()?;
        let (want_w, want_h) = viewport.pixel_size();
        let off = |have: u32, want: u32| have.abs_diff(want) > 1;
        if off(self.pixel_width(), want_w) || off(self.pixel_height(), want_h) {
            return Err(BrennwerkError::Render(format!(
                "raster is {}x{} px, expected about {}x{} for a {}x{} page at scale {}",
                self.pixel_width(),
                self.pixel_height(),
                want_w,
                want_h,
                self.document_width,
                self.document_height,
                self.scale
            )));
        }
        Ok(viewport)
    }
}

/// Rasterizes pages of a PDF.
///
/// Implementations must be callable from a blocking worker thread.
pub trait PageRenderer: Send + Sync {
    /// Draw `page` of `document` at `scale` pixels per document unit.
    fn rasterize(&self, document: &[u8], page: &PageHandle, scale: f64) -> Result<PageRaster>;
}

/// Renders a blank sheet of paper at the page size.
///
/// Used where no real rasterizer is available: destructive marks then burn
/// the page background, and text under them is removed by scrubbing.
#[derive(Debug, Clone)]
pub struct PaperRenderer {
    color: Color,
}

impl PaperRenderer {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Default for PaperRenderer {
    fn default() -> Self {
        Self::new(Color::WHITE)
    }
}

impl PageRenderer for PaperRenderer {
    fn rasterize(&self, _document: &[u8], page: &PageHandle, scale: f64) -> Result<PageRaster> {
        let viewport = Viewport::new(page.width(), page.height(), scale)
            .map_err(|err| BrennwerkError::Render(format!("page {}: {err}", page.index)))?;
        let (width, height) = viewport.pixel_size();
        debug!(page = page.index, width, height, "paper raster");
        let pixel = Rgba([self.color.r, self.color.g, self.color.b, 255]);
        Ok(PageRaster {
            pixels: RgbaImage::from_pixel(width, height, pixel),
            document_width: page.width(),
            document_height: page.height(),
            scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::MediaBox;

    fn handle() -> PageHandle {
        PageHandle {
            index: 0,
            object_id: (3, 0),
            media_box: MediaBox::new(0.0, 0.0, 200.0, 100.0),
        }
    }

    #[test]
    fn paper_raster_matches_page_size() {
        let raster = PaperRenderer::default().rasterize(&[], &handle(), 2.0).unwrap();
        assert_eq!((raster.pixel_width(), raster.pixel_height()), (400, 200));
        assert!(raster.validate().is_ok());
        assert_eq!(*raster.pixels.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn mismatched_raster_is_a_render_error() {
        let raster = PageRaster {
            pixels: RgbaImage::new(10, 10),
            document_width: 200.0,
            document_height: 100.0,
            scale: 1.0,
        };
        assert!(matches!(raster.validate(), Err(BrennwerkError::Render(_))));
    }

    #[test]
    fn zero_scale_is_a_render_error() {
        let err = PaperRenderer::default().rasterize(&[], &handle(), 0.0);
        assert!(matches!(err, Err(BrennwerkError::Render(_))));
    }
}
