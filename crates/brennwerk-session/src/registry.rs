// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session registry — every open document, the active one, and the async
// surface for rendering, detection and export.
//
// Rasterization and burn-in are blocking work and run on tokio's blocking
// pool. An export claims its session's slot before the first await, so a
// second request for the same session fails immediately while other
// sessions export independently.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use brennwerk_core::error::{BrennwerkError, Result};
use brennwerk_core::{AppConfig, SessionId, Tool, ToolSettings};
use brennwerk_document::{BurnInPipeline, ExportOutcome, PageRaster, PageRenderer};
use tracing::{debug, info, instrument};

use crate::detector::{DetectionReport, RegionDetector};
use crate::session::DocumentSession;

pub struct SessionRegistry {
    sessions: HashMap<SessionId, DocumentSession>,
    active: Option<SessionId>,
    config: AppConfig,
    renderer: Arc<dyn PageRenderer>,
}

impl SessionRegistry {
    pub fn new(config: AppConfig, renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            sessions: HashMap::new(),
            active: None,
            config,
            renderer,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    // -- Lifecycle ------------------------------------------------------------

    /// Open a document from memory and make it the active session.
    pub fn open(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<SessionId> {
        let session = DocumentSession::open(name, bytes, &self.config)?;
        let id = session.id();
        self.sessions.insert(id, session);
        self.activate(id)?;
        Ok(id)
    }

    /// Read and open a file.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn open_file(&mut self, path: impl AsRef<Path>) -> Result<SessionId> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.open(name, bytes)
    }

    /// Close a session. A running export of it still finishes.
    pub fn close(&mut self, id: SessionId) -> Result<DocumentSession> {
        let session = self
            .sessions
            .remove(&id)
            .ok_or(BrennwerkError::SessionNotFound(id))?;
        if self.active == Some(id) {
            self.active = None;
        }
        info!(session = %id, "session closed");
        Ok(session)
    }

    /// Switch the active document. A gesture left unfinished in the
    /// previously active session is dropped.
    pub fn activate(&mut self, id: SessionId) -> Result<()> {
        if !self.sessions.contains_key(&id) {
            return Err(BrennwerkError::SessionNotFound(id));
        }
        if let Some(previous) = self.active.filter(|prev| *prev != id) {
            if let Some(session) = self.sessions.get_mut(&previous) {
                if session.cancel_gesture() {
                    debug!(session = %previous, "gesture cancelled by document switch");
                }
            }
        }
        self.active = Some(id);
        Ok(())
    }

    pub fn active(&self) -> Option<SessionId> {
        self.active
    }

    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    pub fn session(&self, id: SessionId) -> Result<&DocumentSession> {
        self.sessions
            .get(&id)
            .ok_or(BrennwerkError::SessionNotFound(id))
    }

    pub fn session_mut(&mut self, id: SessionId) -> Result<&mut DocumentSession> {
        self.sessions
            .get_mut(&id)
            .ok_or(BrennwerkError::SessionNotFound(id))
    }

    // -- Rendering ------------------------------------------------------------

    /// Rasterize a page of a session at its current zoom.
    pub async fn render_page(&self, id: SessionId, page_index: usize) -> Result<PageRaster> {
        let session = self.session(id)?;
        let page = session.source().page(page_index)?.clone();
        let scale = session.view().zoom;
        let original = Arc::clone(session.original());
        let renderer = Arc::clone(&self.renderer);

        let raster = tokio::task::spawn_blocking(move || renderer.rasterize(&original, &page, scale))
            .await
            .map_err(|err| BrennwerkError::Render(format!("render worker failed: {}", err)))??;
        raster.validate()?;
        Ok(raster)
    }

    /// Run `detector` on a page and add its candidates as destructive
    /// annotations using the session's tool (pixelate when the current tool
    /// is not destructive).
    #[instrument(skip(self, detector), fields(session = %id))]
    pub async fn detect_regions(
        &mut self,
        id: SessionId,
        page_index: usize,
        detector: Arc<dyn RegionDetector>,
    ) -> Result<DetectionReport> {
        let raster = self.render_page(id, page_index).await?;
        let candidates = tokio::task::spawn_blocking(move || detector.detect(&raster))
            .await
            .map_err(|err| BrennwerkError::Detector(format!("detector worker failed: {}", err)))??;

        let session = self.session_mut(id)?;
        let settings = if session.tools().tool.is_destructive() {
            session.tools().clone()
        } else {
            ToolSettings {
                tool: Tool::Pixelate,
                ..session.tools().clone()
            }
        };

        let mut report = DetectionReport::default();
        for rect in candidates {
            let Some(kind) = settings.annotation_for_rect(rect) else {
                continue;
            };
            match session.propose(page_index, kind)? {
                Some(_) => report.accepted += 1,
                None => report.rejected += 1,
            }
        }
        info!(
            page = page_index,
            accepted = report.accepted,
            rejected = report.rejected,
            "regions detected"
        );
        Ok(report)
    }

    // -- Export ---------------------------------------------------------------

    /// Burn the session's annotations into a new document.
    ///
    /// Fails with `ExportConflict` at once if this session is already being
    /// exported. The session itself is not modified.
    #[instrument(skip(self), fields(session = %id))]
    pub async fn export_document(&self, id: SessionId) -> Result<ExportOutcome> {
        let session = self.session(id)?;
        let guard = session.begin_export()?;
        let original = Arc::clone(session.original());
        let annotations = session.annotations().to_vec();
        let pipeline = BurnInPipeline::new(self.config.clone(), Arc::clone(&self.renderer));

        let outcome = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            pipeline.run(&original, &annotations)
        })
        .await
        .map_err(|err| BrennwerkError::Render(format!("export worker failed: {}", err)))??;

        info!(
            bytes = outcome.bytes.len(),
            output_sha256 = %outcome.report.output_sha256,
            "export finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brennwerk_core::{AnnotationKind, DevicePoint, DocRect};
    use brennwerk_document::pdf::PageHandle;
    use brennwerk_document::pdf::sample::specimen_document;
    use brennwerk_document::{PaperRenderer, SourceDocument};
    use std::time::Duration;

    /// Paper renderer that takes long enough for requests to overlap.
    struct SlowRenderer;

    impl PageRenderer for SlowRenderer {
        fn rasterize(&self, document: &[u8], page: &PageHandle, scale: f64) -> Result<PageRaster> {
            std::thread::sleep(Duration::from_millis(150));
            PaperRenderer::default().rasterize(document, page, scale)
        }
    }

    struct FixedDetector(Vec<DocRect>);

    impl RegionDetector for FixedDetector {
        fn detect(&self, _raster: &PageRaster) -> Result<Vec<DocRect>> {
            Ok(self.0.clone())
        }
    }

    struct FailingDetector;

    impl RegionDetector for FailingDetector {
        fn detect(&self, _raster: &PageRaster) -> Result<Vec<DocRect>> {
            Err(BrennwerkError::Detector("model unavailable".into()))
        }
    }

    fn registry(renderer: Arc<dyn PageRenderer>) -> SessionRegistry {
        SessionRegistry::new(AppConfig::default(), renderer)
    }

    fn open_marked(registry: &mut SessionRegistry, name: &str) -> SessionId {
        let id = registry.open(name, specimen_document(2)).unwrap();
        let session = registry.session_mut(id).unwrap();
        session
            .propose(0, AnnotationKind::Pixelate { rect: DocRect::new(50.0, 700.0, 200.0, 40.0) })
            .unwrap()
            .unwrap();
        id
    }

    #[test]
    fn open_activate_close() {
        let mut registry = registry(Arc::new(PaperRenderer::default()));
        let a = registry.open("a.pdf", specimen_document(1)).unwrap();
        let b = registry.open("b.pdf", specimen_document(1)).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.active(), Some(b));

        registry.activate(a).unwrap();
        assert_eq!(registry.active(), Some(a));

        registry.close(a).unwrap();
        assert_eq!(registry.active(), None);
        assert!(matches!(registry.close(a), Err(BrennwerkError::SessionNotFound(_))));
        assert!(registry.activate(a).is_err());
    }

    #[test]
    fn unreadable_document_creates_no_session() {
        let mut registry = registry(Arc::new(PaperRenderer::default()));
        assert!(registry.open("bad.pdf", b"%PDF-1.4 broken".to_vec()).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn switching_documents_cancels_the_gesture() {
        let mut registry = registry(Arc::new(PaperRenderer::default()));
        let a = registry.open("a.pdf", specimen_document(1)).unwrap();
        let b = registry.open("b.pdf", specimen_document(1)).unwrap();
        registry.activate(a).unwrap();
        registry
            .session_mut(a)
            .unwrap()
            .pointer_down(DevicePoint::new(10.0, 10.0))
            .unwrap();

        registry.activate(b).unwrap();
        assert!(!registry.session(a).unwrap().gesture().is_active());
    }

    #[tokio::test]
    async fn second_export_of_same_session_conflicts() {
        let mut registry = registry(Arc::new(SlowRenderer));
        let id = open_marked(&mut registry, "a.pdf");

        let (first, second) = tokio::join!(registry.export_document(id), registry.export_document(id));
        assert!(first.is_ok());
        assert!(matches!(second, Err(BrennwerkError::ExportConflict(conflict)) if conflict == id));

        // The slot is free again once the first export is done.
        assert!(registry.export_document(id).await.is_ok());
    }

    #[tokio::test]
    async fn different_sessions_export_independently() {
        let mut registry = registry(Arc::new(SlowRenderer));
        let a = open_marked(&mut registry, "a.pdf");
        let b = open_marked(&mut registry, "b.pdf");

        let (first, second) = tokio::join!(registry.export_document(a), registry.export_document(b));
        assert_eq!(first.unwrap().report.images_embedded, 1);
        assert_eq!(second.unwrap().report.images_embedded, 1);
    }

    #[tokio::test]
    async fn export_leaves_the_session_untouched() {
        let mut registry = registry(Arc::new(PaperRenderer::default()));
        let id = open_marked(&mut registry, "a.pdf");
        let before = registry.session(id).unwrap().original().to_vec();

        let outcome = registry.export_document(id).await.unwrap();
        let session = registry.session(id).unwrap();
        assert_eq!(session.original().as_ref(), before.as_slice());
        assert_eq!(session.annotations().len(), 1);
        assert_ne!(outcome.bytes, before);
        assert_eq!(SourceDocument::from_bytes(&outcome.bytes).unwrap().page_count(), 2);
    }

    #[tokio::test]
    async fn export_of_unknown_session_fails() {
        let registry = registry(Arc::new(PaperRenderer::default()));
        let err = registry.export_document(SessionId::new()).await.unwrap_err();
        assert!(matches!(err, BrennwerkError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn detected_regions_pass_the_same_checks() {
        let mut registry = registry(Arc::new(PaperRenderer::default()));
        let id = registry.open("a.pdf", specimen_document(1)).unwrap();
        let detector = Arc::new(FixedDetector(vec![
            DocRect::new(60.0, 700.0, 180.0, 20.0),
            DocRect::new(60.0, 600.0, 1.0, 1.0),
            DocRect::new(2000.0, 2000.0, 50.0, 50.0),
        ]));

        let report = registry.detect_regions(id, 0, detector).await.unwrap();
        assert_eq!(report, DetectionReport { accepted: 1, rejected: 2 });

        let annotations = registry.session(id).unwrap().annotations();
        assert_eq!(annotations.len(), 1);
        assert!(annotations[0].kind.is_destructive());
    }

    #[tokio::test]
    async fn detector_failure_is_reported() {
        let mut registry = registry(Arc::new(PaperRenderer::default()));
        let id = registry.open("a.pdf", specimen_document(1)).unwrap();
        let err = registry
            .detect_regions(id, 0, Arc::new(FailingDetector))
            .await
            .unwrap_err();
        assert!(matches!(err, BrennwerkError::Detector(_)));
        assert!(registry.session(id).unwrap().annotations().is_empty());
    }

    #[tokio::test]
    async fn open_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("specimen.pdf");
        std::fs::write(&path, specimen_document(3)).unwrap();

        let mut registry = registry(Arc::new(PaperRenderer::default()));
        let id = registry.open_file(&path).await.unwrap();
        let session = registry.session(id).unwrap();
        assert_eq!(session.name(), "specimen.pdf");
        assert_eq!(session.page_count(), 3);
    }
}
