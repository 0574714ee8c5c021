// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDFium-backed page rasterizer.
//
// The library is bound at runtime: first next to the executable, then in the
// working directory, then from the system library path. Pages are drawn at
// the viewport's pixel size; a page whose rendered box differs from its
// MediaBox (rotation, CropBox) fails raster validation downstream.

use brennwerk_core::error::{BrennwerkError, Result};
use image::RgbaImage;
use pdfium_render::prelude::*;
use tracing::{debug, info};

use super::{PageRaster, PageRenderer};
use crate::geometry::Viewport;
use crate::pdf::reader::PageHandle;

/// Rasterizes pages with a bound PDFium library.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
}

impl PdfiumRenderer {
    /// Bind to the PDFium shared library.
    pub fn bind() -> Result<Self> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|path| path.parent().map(|dir| dir.to_path_buf()));
        if let Some(dir) = exe_dir {
            if let Ok(bindings) = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir)) {
                info!(dir = %dir.display(), "pdfium bound next to the executable");
                return Ok(Self {
                    pdfium: Pdfium::new(bindings),
                });
            }
        }

        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|err| BrennwerkError::Render(format!("cannot load the PDFium library: {}", err)))?;
        info!("pdfium bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PageRenderer for PdfiumRenderer {
    fn rasterize(&self, document: &[u8], page: &PageHandle, scale: f64) -> Result<PageRaster> {
        let viewport = Viewport::new(page.width(), page.height(), scale)
            .map_err(|err| BrennwerkError::Render(format!("page {}: {err}", page.index)))?;
        let (width, height) = viewport.pixel_size();
        let index = u16::try_from(page.index)
            .map_err(|_| BrennwerkError::Render(format!("page {} is beyond PDFium's range", page.index)))?;

        let pdf = self
            .pdfium
            .load_pdf_from_byte_slice(document, None)
            .map_err(|err| BrennwerkError::Render(format!("PDFium cannot open the document: {}", err)))?;
        let rendered = pdf
            .pages()
            .get(index)
            .map_err(|err| BrennwerkError::Render(format!("PDFium has no page {}: {}", page.index, err)))?;

        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32);
        let bitmap = rendered
            .render_with_config(&config)
            .map_err(|err| BrennwerkError::Render(format!("PDFium failed on page {}: {}", page.index, err)))?;
        let pixels = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes().to_vec()).ok_or_else(|| {
            BrennwerkError::Render(format!(
                "PDFium bitmap for page {} is not {}x{} px",
                page.index, width, height
            ))
        })?;

        debug!(page = page.index, width, height, "pdfium raster");
        Ok(PageRaster {
            pixels,
            document_width: page.width(),
            document_height: page.height(),
            scale,
        })
    }
}
