// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export / burn-in pipeline — the destructive path from original bytes plus
// annotations to a new PDF.
//
// Per affected page: rasterize once at the oversampling scale (only when the
// page has destructive marks), scrub the content under destroyed regions
// (text, enclosed images and paths, form contents), then apply
// marks in insertion order. Destructive marks are applied to the shared
// raster, cropped, JPEG-encoded and placed over their rectangle; vector marks
// become native PDF operators. Nothing is written until every page succeeded.

use std::sync::Arc;

use brennwerk_core::error::{BrennwerkError, Result};
use brennwerk_core::{Annotation, AppConfig, DeviceRect, DocRect};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::effects::{self, EffectParams};
use crate::image::{crop_region, encode_jpeg};
use crate::integrity::sha256_hex;
use crate::pdf::scrub::scrub_page;
use crate::pdf::{OutputDocument, PageHandle, SourceDocument};
use crate::render::{PageRaster, PageRenderer};
use crate::store::partition_by_page;

/// What an export did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub source_sha256: String,
    pub output_sha256: String,
    /// Pages that carried at least one annotation.
    pub pages_rewritten: usize,
    /// Burned image patches placed.
    pub images_embedded: usize,
    /// Strokes, outlines and labels drawn as vectors.
    pub vector_shapes: usize,
    /// Text-showing operators removed under destroyed regions.
    pub text_runs_removed: usize,
    /// Image XObject placements removed under destroyed regions.
    pub images_removed: usize,
    /// Vector paths removed under destroyed regions.
    pub paths_removed: usize,
    /// Destructive marks that no longer covered any pixel of their page.
    pub annotations_skipped: usize,
}

/// Output bytes plus the report describing them.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub bytes: Vec<u8>,
    pub report: ExportReport,
}

/// Burns annotations into a copy of a document.
#[derive(Clone)]
pub struct BurnInPipeline {
    config: AppConfig,
    renderer: Arc<dyn PageRenderer>,
}

impl BurnInPipeline {
    pub fn new(config: AppConfig, renderer: Arc<dyn PageRenderer>) -> Self {
        Self { config, renderer }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Produce the burned copy. Either the whole document is written or an
    /// error is returned; `original` is never modified.
    #[instrument(skip_all, fields(bytes_len = original.len(), annotations = annotations.len()))]
    pub fn run(&self, original: &[u8], annotations: &[Annotation]) -> Result<ExportOutcome> {
        let scale = self.config.export_oversampling;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(BrennwerkError::Render(format!(
                "export oversampling must be positive, got {scale}"
            )));
        }

        let source = SourceDocument::from_bytes(original)?;
        let by_page = partition_by_page(annotations);
        for page_index in by_page.keys() {
            source.page(*page_index)?;
        }

        info!(
            pages = source.page_count(),
            affected = by_page.len(),
            scale,
            "burn-in started"
        );

        let mut output = OutputDocument::from_source(source.clone());
        let mut report = ExportReport {
            source_sha256: sha256_hex(original),
            ..ExportReport::default()
        };

        for (page_index, marks) in &by_page {
            let page = source.page(*page_index)?;
            self.burn_page(original, &source, page, marks, &mut output, &mut report)?;
            report.pages_rewritten += 1;
        }

        let bytes = output.serialize()?;
        report.output_sha256 = sha256_hex(&bytes);
        info!(
            output_bytes = bytes.len(),
            images = report.images_embedded,
            shapes = report.vector_shapes,
            text_removed = report.text_runs_removed,
            images_removed = report.images_removed,
            paths_removed = report.paths_removed,
            "burn-in finished"
        );
        Ok(ExportOutcome { bytes, report })
    }

    fn burn_page(
        &self,
        original: &[u8],
        source: &SourceDocument,
        page: &PageHandle,
        marks: &[&Annotation],
        output: &mut OutputDocument,
        report: &mut ExportReport,
    ) -> Result<()> {
        let page_rect = DocRect::new(0.0, 0.0, page.width(), page.height());
        let destroyed: Vec<DocRect> = marks
            .iter()
            .filter(|a| a.kind.is_destructive())
            .filter_map(|a| a.kind.rect())
            .filter_map(|rect| rect.intersection(&page_rect))
            .collect();

        let mut raster = if marks.iter().any(|a| a.kind.is_destructive()) {
            let raster = self
                .renderer
                .rasterize(original, page, self.config.export_oversampling)?;
            raster.validate()?;
            Some(raster)
        } else {
            None
        };

        if self.config.scrub_text && !destroyed.is_empty() {
            let (ox, oy) = page.origin();
            let regions: Vec<DocRect> = destroyed
                .iter()
                .map(|r| DocRect::new(r.x + ox, r.y + oy, r.width, r.height))
                .collect();
            let scrubbed = scrub_page(
                source.document(),
                &source.page_resources(page.index)?,
                &source.page_content(page.index)?,
                &regions,
            )?;
            if scrubbed.is_changed() {
                output.replace_page_content(page.index, scrubbed.content)?;
                output.add_forms(page.index, scrubbed.forms)?;
                report.text_runs_removed += scrubbed.text_removed;
                report.images_removed += scrubbed.images_removed;
                report.paths_removed += scrubbed.paths_removed;
            }
        }

        let params = EffectParams::from_config(&self.config, self.config.export_oversampling);
        for annotation in marks {
            if annotation.kind.is_destructive() {
                let Some(raster) = raster.as_mut() else {
                    continue;
                };
                if self.burn_region(raster, page, annotation, &params, output)? {
                    report.images_embedded += 1;
                } else {
                    report.annotations_skipped += 1;
                }
            } else if let Some(shape) = effects::vector_shape(&annotation.kind) {
                output.draw_vector_shape(page.index, &shape)?;
                report.vector_shapes += 1;
            }
        }

        debug!(page = page.index, marks = marks.len(), "page burned");
        Ok(())
    }

    /// Apply one destructive mark to the page raster and embed the result.
    /// Returns `false` when the mark covers nothing on this page.
    fn burn_region(
        &self,
        raster: &mut PageRaster,
        page: &PageHandle,
        annotation: &Annotation,
        params: &EffectParams,
        output: &mut OutputDocument,
    ) -> Result<bool> {
        let viewport = raster.viewport()?;
        let page_rect = viewport.page_rect();
        let Some(rect) = annotation
            .kind
            .rect()
            .and_then(|rect| rect.intersection(&page_rect))
        else {
            warn!(id = %annotation.id, page = page.index, "mark lies off the page, skipped");
            return Ok(false);
        };
        let (width, height) = (raster.pixel_width(), raster.pixel_height());
        let Some(region) = viewport.pixel_rect(&rect, width, height) else {
            warn!(id = %annotation.id, page = page.index, "mark covers no pixels, skipped");
            return Ok(false);
        };

        effects::apply_destructive(&mut raster.pixels, region, &annotation.kind, params);
        let patch = crop_region(&raster.pixels, region)?;
        let image = encode_jpeg(&patch, self.config.jpeg_quality)?;
        // The patch covers whole pixels, so it is placed over their extent.
        let placed = viewport
            .rect_to_document(&DeviceRect::new(
                region.x as f64,
                region.y as f64,
                region.width as f64,
                region.height as f64,
            ))
            .intersection(&page_rect)
            .unwrap_or(rect);
        output.draw_image(page.index, &placed, &image)?;
        Ok(true)
    }
}
