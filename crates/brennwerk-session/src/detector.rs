// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sensitive-region detector seam.

use brennwerk_core::DocRect;
use brennwerk_core::error::Result;
use brennwerk_document::PageRaster;

/// Finds regions worth destroying on a rendered page.
///
/// Candidates are document-space rectangles on the rendered page. They are
/// added like user drags: too-small and off-page ones are dropped.
pub trait RegionDetector: Send + Sync {
    fn detect(&self, raster: &PageRaster) -> Result<Vec<DocRect>>;
}

/// Summary of one detection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionReport {
    /// Candidates that became annotations.
    pub accepted: usize,
    /// Candidates dropped as degenerate or off the page.
    pub rejected: usize,
}
