// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document session — one open PDF with its annotations, view and gesture.
//
// The original bytes are loaded once and never change. Sessions share no
// mutable state; the only thing another task can observe is the export flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use brennwerk_core::error::{BrennwerkError, Result};
use brennwerk_core::{
    Annotation, AnnotationId, AnnotationKind, AppConfig, DevicePoint, SessionId, ToolSettings,
    TransformError,
};
use brennwerk_document::geometry::{Viewport, accept_document_rect, accept_stroke};
use brennwerk_document::integrity::sha256_hex;
use brennwerk_document::{AnnotationStore, PageRaster, SourceDocument, compose};
use chrono::{DateTime, Utc};
use image::RgbaImage;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::gesture::{GestureOutcome, GestureState};

pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 8.0;

/// Which page is shown and how large.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewState {
    pub page_index: usize,
    /// Device pixels per document unit.
    pub zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            page_index: 0,
            zoom: 1.0,
        }
    }
}

/// Read-only snapshot for listings and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub name: String,
    pub page_count: usize,
    pub annotation_count: usize,
    pub source_sha256: String,
    pub opened_at: DateTime<Utc>,
}

/// Held while an export of one session is running. Dropping it lets the
/// next export start.
#[derive(Debug)]
pub struct ExportGuard {
    flag: Arc<AtomicBool>,
    session: SessionId,
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        debug!(session = %self.session, "export slot released");
    }
}

pub struct DocumentSession {
    id: SessionId,
    name: String,
    original: Arc<[u8]>,
    source: SourceDocument,
    source_sha256: String,
    store: AnnotationStore,
    gesture: GestureState,
    view: ViewState,
    tools: ToolSettings,
    min_gesture_px: f64,
    exporting: Arc<AtomicBool>,
    opened_at: DateTime<Utc>,
}

impl DocumentSession {
    /// Decode `bytes` and start a session. Fails with `Load` for anything
    /// that is not a readable, unencrypted PDF with at least one page.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn open(name: impl Into<String>, bytes: Vec<u8>, config: &AppConfig) -> Result<Self> {
        let source = SourceDocument::from_bytes(&bytes)?;
        let name = name.into();
        let session = Self {
            id: SessionId::new(),
            source_sha256: sha256_hex(&bytes),
            original: Arc::from(bytes),
            source,
            name,
            store: AnnotationStore::new(),
            gesture: GestureState::Idle,
            view: ViewState::default(),
            tools: ToolSettings::default(),
            min_gesture_px: config.min_gesture_px,
            exporting: Arc::new(AtomicBool::new(false)),
            opened_at: Utc::now(),
        };
        info!(
            session = %session.id,
            name = %session.name,
            pages = session.page_count(),
            "document opened"
        );
        Ok(session)
    }

    // -- Accessors ------------------------------------------------------------

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bytes as loaded.
    pub fn original(&self) -> &Arc<[u8]> {
        &self.original
    }

    pub fn source(&self) -> &SourceDocument {
        &self.source
    }

    pub fn page_count(&self) -> usize {
        self.source.page_count()
    }

    pub fn source_sha256(&self) -> &str {
        &self.source_sha256
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.store.annotations()
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            name: self.name.clone(),
            page_count: self.page_count(),
            annotation_count: self.store.len(),
            source_sha256: self.source_sha256.clone(),
            opened_at: self.opened_at,
        }
    }

    // -- View -----------------------------------------------------------------

    pub fn view(&self) -> ViewState {
        self.view
    }

    /// Show another page. An unfinished gesture is dropped.
    pub fn set_page(&mut self, page_index: usize) -> Result<()> {
        self.source.page(page_index)?;
        if page_index != self.view.page_index {
            if self.gesture.cancel() {
                debug!(session = %self.id, "gesture cancelled by page change");
            }
            self.view.page_index = page_index;
        }
        Ok(())
    }

    /// Set the zoom, clamped to the supported range. Returns the zoom in
    /// effect. An unfinished gesture is dropped since its device points no
    /// longer line up.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        if !zoom.is_finite() {
            warn!(session = %self.id, zoom, "ignoring non-finite zoom");
            return self.view.zoom;
        }
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if zoom != self.view.zoom {
            self.gesture.cancel();
            self.view.zoom = zoom;
        }
        zoom
    }

    pub fn tools(&self) -> &ToolSettings {
        &self.tools
    }

    pub fn set_tools(&mut self, tools: ToolSettings) {
        self.tools = tools;
    }

    /// Transform for the active page at the current zoom.
    pub fn viewport(&self) -> Result<Viewport> {
        self.page_viewport(self.view.page_index, self.view.zoom)
    }

    pub fn page_viewport(&self, page_index: usize, scale: f64) -> Result<Viewport> {
        let page = self.source.page(page_index)?;
        Viewport::new(page.width(), page.height(), scale)
            .map_err(|err| BrennwerkError::Render(format!("page {} has {}", page_index, err)))
    }

    // -- Gestures -------------------------------------------------------------

    pub fn pointer_down(&mut self, point: DevicePoint) -> Result<()> {
        let viewport = self.viewport()?;
        self.gesture
            .begin(self.view.page_index, self.tools.tool, point, &viewport);
        Ok(())
    }

    pub fn pointer_move(&mut self, point: DevicePoint) -> Result<()> {
        if self.gesture.is_active() {
            let viewport = self.viewport()?;
            self.gesture.update(point, &viewport);
        }
        Ok(())
    }

    /// Finish the gesture. Returns the new annotation, or `None` when the
    /// gesture was too small, off the page, or never started.
    pub fn pointer_up(&mut self, point: DevicePoint) -> Result<Option<Annotation>> {
        let viewport = self.viewport()?;
        match self
            .gesture
            .finish(point, &viewport, &self.tools, self.min_gesture_px)
        {
            GestureOutcome::Committed { page_index, kind } => {
                let annotation = Annotation::new(page_index, kind);
                self.store.append(annotation.clone());
                Ok(Some(annotation))
            }
            GestureOutcome::Rejected(reason) => {
                debug!(session = %self.id, %reason, "gesture rejected");
                Ok(None)
            }
            GestureOutcome::Ignored => Ok(None),
        }
    }

    pub fn cancel_gesture(&mut self) -> bool {
        self.gesture.cancel()
    }

    // -- Annotations ----------------------------------------------------------

    /// Add an annotation that did not come from a pointer gesture (detector
    /// candidates, imported lists). It goes through the same size and page
    /// checks as a drag at the current zoom.
    ///
    /// Fails for a page that does not exist; returns `None` when the
    /// geometry is rejected.
    pub fn propose(&mut self, page_index: usize, kind: AnnotationKind) -> Result<Option<Annotation>> {
        let viewport = self.page_viewport(page_index, self.view.zoom)?;
        match accept_kind(&viewport, kind, self.min_gesture_px) {
            Ok(kind) => {
                let annotation = Annotation::new(page_index, kind);
                self.store.append(annotation.clone());
                Ok(Some(annotation))
            }
            Err(reason) => {
                debug!(session = %self.id, page = page_index, %reason, "annotation rejected");
                Ok(None)
            }
        }
    }

    pub fn undo(&mut self) -> &[Annotation] {
        self.store.undo()
    }

    pub fn redo(&mut self) -> &[Annotation] {
        self.store.redo()
    }

    pub fn clear_page(&mut self, page_index: usize) -> &[Annotation] {
        self.store.clear_page(page_index)
    }

    pub fn edit_text(&mut self, id: AnnotationId, text: &str) -> Result<&[Annotation]> {
        self.store.edit_text(id, text)
    }

    // -- Preview --------------------------------------------------------------

    /// Overlay for the active page on top of `base`, including the gesture
    /// in progress.
    pub fn preview(&self, base: &PageRaster, config: &AppConfig) -> Result<RgbaImage> {
        let pending = if self.gesture.page_index() == Some(self.view.page_index) {
            self.gesture.pending(&self.viewport()?, &self.tools)
        } else {
            None
        };
        compose(
            base,
            self.view.page_index,
            self.store.annotations(),
            pending.as_ref(),
            config,
        )
    }

    // -- Export exclusion -----------------------------------------------------

    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::Acquire)
    }

    /// Claim the export slot, failing at once if it is taken.
    pub fn begin_export(&self) -> Result<ExportGuard> {
        if self
            .exporting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(session = %self.id, "export already running");
            return Err(BrennwerkError::ExportConflict(self.id));
        }
        Ok(ExportGuard {
            flag: Arc::clone(&self.exporting),
            session: self.id,
        })
    }
}

/// Size and page checks for annotations arriving in document space. Boxes
/// are clipped to the page, strokes are clamped to it, and labels only need
/// to touch it.
fn accept_kind(
    viewport: &Viewport,
    kind: AnnotationKind,
    min_px: f64,
) -> std::result::Result<AnnotationKind, TransformError> {
    if let AnnotationKind::FreehandStroke { points, color, width } = kind {
        let points = accept_stroke(viewport, &points)?;
        return Ok(AnnotationKind::FreehandStroke { points, color, width });
    }
    let Some(rect) = kind.rect() else {
        return Ok(kind);
    };
    let accepted = match kind {
        AnnotationKind::TextLabel { .. } => viewport.clip_to_page(&rect)?,
        _ => accept_document_rect(viewport, &rect, min_px)?,
    };
    Ok(kind.with_rect(accepted))
}
