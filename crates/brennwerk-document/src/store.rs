// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Annotation store — ordered marks for one document plus a linear undo/redo
// history. Insertion order is both z-order and undo order.

use std::collections::BTreeMap;

use brennwerk_core::error::{BrennwerkError, Result};
use brennwerk_core::{Annotation, AnnotationId, AnnotationKind};
use tracing::debug;

/// All annotations of one document session.
///
/// Any edit that is not an undo or redo clears the redo stack, so redo is
/// only valid directly after undo.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    /// Popped annotations, most recently undone last.
    redo: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every annotation, in insertion order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// The redo stack, bottom first; `redo()` pops from the end.
    pub fn redo_stack(&self) -> &[Annotation] {
        &self.redo
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.annotations.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Annotations on one page, in insertion order.
    pub fn for_page(&self, page_index: usize) -> impl Iterator<Item = &Annotation> {
        self.annotations
            .iter()
            .filter(move |a| a.page_index == page_index)
    }

    /// Annotations grouped by page, each group in insertion order.
    pub fn by_page(&self) -> BTreeMap<usize, Vec<&Annotation>> {
        partition_by_page(&self.annotations)
    }

    // -- Mutation -------------------------------------------------------------

    pub fn append(&mut self, annotation: Annotation) -> &[Annotation] {
        debug!(
            id = %annotation.id,
            page = annotation.page_index,
            kind = annotation.kind.label(),
            "annotation appended"
        );
        self.annotations.push(annotation);
        self.redo.clear();
        &self.annotations
    }

    /// Move the newest annotation onto the redo stack. No-op when empty.
    pub fn undo(&mut self) -> &[Annotation] {
        if let Some(annotation) = self.annotations.pop() {
            debug!(id = %annotation.id, "annotation undone");
            self.redo.push(annotation);
        }
        &self.annotations
    }

    /// Restore the most recently undone annotation. No-op when nothing was undone.
    pub fn redo(&mut self) -> &[Annotation] {
        if let Some(annotation) = self.redo.pop() {
            debug!(id = %annotation.id, "annotation redone");
            self.annotations.push(annotation);
        }
        &self.annotations
    }

    /// Drop every annotation on `page_index`. Not undoable; clears redo.
    pub fn clear_page(&mut self, page_index: usize) -> &[Annotation] {
        let before = self.annotations.len();
        self.annotations.retain(|a| a.page_index != page_index);
        self.redo.clear();
        debug!(
            page = page_index,
            removed = before - self.annotations.len(),
            "page cleared"
        );
        &self.annotations
    }

    /// Replace the text of a label in place. Clears redo.
    pub fn edit_text(&mut self, id: AnnotationId, new_text: &str) -> Result<&[Annotation]> {
        let annotation = self
            .annotations
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(BrennwerkError::AnnotationNotFound(id))?;

        match &mut annotation.kind {
            AnnotationKind::TextLabel { text, .. } => {
                text.clear();
                text.push_str(new_text);
            }
            other => {
                return Err(BrennwerkError::InvalidAnnotation(format!(
                    "{} annotation {} has no text",
                    other.label(),
                    id
                )));
            }
        }

        self.redo.clear();
        Ok(&self.annotations)
    }
}

/// Group annotations by page, preserving insertion order within each page.
pub fn partition_by_page(annotations: &[Annotation]) -> BTreeMap<usize, Vec<&Annotation>> {
    let mut pages: BTreeMap<usize, Vec<&Annotation>> = BTreeMap::new();
    for annotation in annotations {
        pages.entry(annotation.page_index).or_default().push(annotation);
    }
    pages
}
