// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// brennwerk-document — Everything that touches pages for Brennwerk.
//
// Provides the document/device coordinate transform, the annotation store,
// the pixel effects (pixelate, blur, fill) and vector shapes, the interactive
// overlay compositor, and the burn-in pipeline that writes a new PDF with
// destroyed regions replaced by image patches.

pub mod effects;
pub mod export;
pub mod geometry;
pub mod image;
pub mod integrity;
pub mod overlay;
pub mod pdf;
pub mod render;
pub mod store;

#[cfg(test)]
mod testutil;

// Re-export the primary types so callers can use `brennwerk_document::BurnInPipeline` etc.
pub use effects::{EffectParams, VectorShape};
pub use export::{BurnInPipeline, ExportOutcome, ExportReport};
pub use geometry::{PixelRect, Viewport};
pub use overlay::{PendingShape, compose};
pub use pdf::{MediaBox, OutputDocument, PageHandle, SourceDocument};
pub use render::{PageRaster, PageRenderer, PaperRenderer};
#[cfg(feature = "pdfium")]
pub use render::PdfiumRenderer;
pub use store::AnnotationStore;
