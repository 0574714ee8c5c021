// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — decode the original document once and describe its pages
// using the `lopdf` crate. The original bytes are never modified.

use std::path::Path;

use brennwerk_core::error::{BrennwerkError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info, instrument, warn};

use super::number;

/// Parent chains deeper than this are treated as malformed.
const MAX_TREE_DEPTH: usize = 32;

/// Page size used when neither the page nor its ancestors carry a MediaBox.
const FALLBACK_MEDIA_BOX: MediaBox = MediaBox::new(0.0, 0.0, 595.0, 842.0);

/// A page's MediaBox, normalised so `llx <= urx` and `lly <= ury`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl MediaBox {
    pub const fn new(llx: f64, lly: f64, urx: f64, ury: f64) -> Self {
        Self { llx, lly, urx, ury }
    }

    fn from_array(values: &[Object]) -> Option<Self> {
        if values.len() != 4 {
            return None;
        }
        let v: Vec<f64> = values.iter().filter_map(number).collect();
        if v.len() != 4 {
            return None;
        }
        Some(Self::new(
            v[0].min(v[2]),
            v[1].min(v[3]),
            v[0].max(v[2]),
            v[1].max(v[3]),
        ))
    }

    pub fn width(&self) -> f64 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f64 {
        self.ury - self.lly
    }
}

/// Everything the engine needs to know about one page of the original.
#[derive(Debug, Clone, PartialEq)]
pub struct PageHandle {
    /// Zero-based page index.
    pub index: usize,
    /// The page dictionary's object id in the original document.
    pub object_id: ObjectId,
    pub media_box: MediaBox,
}

impl PageHandle {
    /// Page width in document units.
    pub fn width(&self) -> f64 {
        self.media_box.width()
    }

    /// Page height in document units.
    pub fn height(&self) -> f64 {
        self.media_box.height()
    }

    /// User-space position of the document-space origin (the MediaBox's
    /// lower-left corner).
    pub fn origin(&self) -> (f64, f64) {
        (self.media_box.llx, self.media_box.lly)
    }
}

/// A decoded, read-only view of the original PDF.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    document: Document,
    pages: Vec<PageHandle>,
}

impl SourceDocument {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    /// Decode PDF bytes already in memory.
    ///
    /// Encrypted documents and documents without pages are refused.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| BrennwerkError::Load(format!("failed to parse PDF: {}", err)))?;
        if document.trailer.has(b"Encrypt") || document.encryption_state.is_some() {
            return Err(BrennwerkError::Load("document is encrypted".into()));
        }

        let mut pages = Vec::new();
        for (index, (_, object_id)) in document.get_pages().into_iter().enumerate() {
            let media_box = resolve_media_box(&document, object_id)?;
            pages.push(PageHandle {
                index,
                object_id,
                media_box,
            });
        }
        if pages.is_empty() {
            return Err(BrennwerkError::Load("document has no pages".into()));
        }

        info!(pages = pages.len(), "PDF decoded");
        Ok(Self { document, pages })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[PageHandle] {
        &self.pages
    }

    /// The handle of page `index` (zero-based).
    pub fn page(&self, index: usize) -> Result<&PageHandle> {
        self.pages.get(index).ok_or_else(|| {
            BrennwerkError::InvalidAnnotation(format!(
                "page {} out of range (document has {} pages)",
                index + 1,
                self.pages.len()
            ))
        })
    }

    /// Decoded content stream bytes of page `index`.
    pub fn page_content(&self, index: usize) -> Result<Vec<u8>> {
        let page = self.page(index)?;
        self.document
            .get_page_content(page.object_id)
            .map_err(|err| {
                BrennwerkError::Pdf(format!("cannot read content of page {}: {}", index + 1, err))
            })
    }

    /// The effective `/Resources` of page `index`, inherited ones included.
    pub fn page_resources(&self, index: usize) -> Result<Dictionary> {
        let page = self.page(index)?;
        Ok(inherited_resources(&self.document, page.object_id))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn into_parts(self) -> (Document, Vec<PageHandle>) {
        (self.document, self.pages)
    }
}

/// Walk from the page up through `/Parent` until a MediaBox is found.
fn resolve_media_box(document: &Document, page_id: ObjectId) -> Result<MediaBox> {
    let mut current = Some(page_id);
    let mut depth = 0;
    while let Some(id) = current {
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            return Err(BrennwerkError::Load(format!(
                "page tree deeper than {MAX_TREE_DEPTH} levels at {:?}",
                page_id
            )));
        }
        let dict = document
            .get_object(id)
            .and_then(Object::as_dict)
            .map_err(|err| BrennwerkError::Load(format!("bad page node {:?}: {}", id, err)))?;
        if let Some(media_box) = media_box_of(document, dict) {
            if media_box.width() <= 0.0 || media_box.height() <= 0.0 {
                return Err(BrennwerkError::Load(format!(
                    "page {:?} has an empty MediaBox",
                    page_id
                )));
            }
            debug!(?page_id, ?media_box, "MediaBox resolved");
            return Ok(media_box);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }

    warn!(?page_id, "no MediaBox on page or ancestors, assuming A4");
    Ok(FALLBACK_MEDIA_BOX)
}

/// The page's effective `/Resources`, resolved through references and the
/// page tree, as an owned dictionary.
pub(crate) fn inherited_resources(document: &Document, page_id: ObjectId) -> Dictionary {
    let mut current = Some(page_id);
    for _ in 0..MAX_TREE_DEPTH {
        let Some(id) = current else { break };
        let Ok(dict) = document.get_object(id).and_then(Object::as_dict) else {
            break;
        };
        if let Ok(resources) = dict.get(b"Resources") {
            return resolve_dictionary(document, resources).unwrap_or_else(Dictionary::new);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    Dictionary::new()
}

/// `resources[key]` as an owned dictionary, empty when absent.
pub(crate) fn sub_dictionary(document: &Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    resources
        .get(key)
        .ok()
        .and_then(|object| resolve_dictionary(document, object))
        .unwrap_or_else(Dictionary::new)
}

pub(crate) fn resolve_dictionary(document: &Document, object: &Object) -> Option<Dictionary> {
    match object {
        Object::Dictionary(dict) => Some(dict.clone()),
        Object::Reference(id) => document
            .get_object(*id)
            .and_then(Object::as_dict)
            .ok()
            .cloned(),
        _ => None,
    }
}

fn media_box_of(document: &Document, dict: &Dictionary) -> Option<MediaBox> {
    let raw = dict.get(b"MediaBox").ok()?;
    let resolved = match raw {
        Object::Reference(id) => document.get_object(*id).ok()?,
        other => other,
    };
    MediaBox::from_array(resolved.as_array().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, FixturePage};
    use lopdf::dictionary;

    #[test]
    fn pages_are_listed_in_order_with_sizes() {
        let bytes = testutil::document(&[
            FixturePage::text(&[(72.0, 700.0, "first")]),
            FixturePage::text(&[(72.0, 700.0, "second")]).with_media_box([0, 0, 300, 400]),
        ]);
        let source = SourceDocument::from_bytes(&bytes).unwrap();
        assert_eq!(source.page_count(), 2);
        assert_eq!(source.page(0).unwrap().height(), 842.0);
        assert_eq!(source.page(1).unwrap().width(), 300.0);
        assert_eq!(source.pages()[1].index, 1);
        assert!(source.page(2).is_err());
    }

    #[test]
    fn media_box_is_inherited_from_the_page_tree() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(lopdf::Stream::new(dictionary! {}, b"".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![10.into(), 20.into(), 210.into(), 320.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let source = SourceDocument::from_bytes(&bytes).unwrap();
        let page = source.page(0).unwrap();
        assert_eq!(page.media_box, MediaBox::new(10.0, 20.0, 210.0, 320.0));
        assert_eq!(page.origin(), (10.0, 20.0));
        assert_eq!((page.width(), page.height()), (200.0, 300.0));
    }

    #[test]
    fn garbage_is_a_load_error() {
        let err = SourceDocument::from_bytes(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, BrennwerkError::Load(_)));
    }

    #[test]
    fn encrypt_entry_in_the_trailer_is_refused() {
        let mut doc = Document::load_mem(&testutil::document(&[FixturePage::blank()])).unwrap();
        let encrypt_id = doc.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 1,
            "R" => 2,
            "P" => -4,
        });
        doc.trailer.set("Encrypt", encrypt_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let err = SourceDocument::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, BrennwerkError::Load(_)));
    }

    #[test]
    fn the_word_encrypt_in_page_text_is_not_encryption() {
        let bytes = testutil::document(&[FixturePage::with_content(
            "BT /F1 12 Tf 72 700 Td (See /Encrypt in the manual) Tj ET\n% /Encrypt 9 0 R\n",
        )]);
        let source = SourceDocument::from_bytes(&bytes).unwrap();
        assert_eq!(source.page_count(), 1);
    }

    #[test]
    fn resources_are_inherited_through_references() {
        let bytes = testutil::document(&[FixturePage::blank()]);
        let source = SourceDocument::from_bytes(&bytes).unwrap();
        let resources = source.page_resources(0).unwrap();
        let fonts = sub_dictionary(source.document(), &resources, b"Font");
        assert!(fonts.has(b"F1"));
        assert!(source.page_resources(4).is_err());
    }

    #[test]
    fn page_content_is_decoded() {
        let bytes = testutil::document(&[FixturePage::text(&[(72.0, 700.0, "hello")])]);
        let source = SourceDocument::from_bytes(&bytes).unwrap();
        let content = source.page_content(0).unwrap();
        assert!(String::from_utf8_lossy(&content).contains("(hello) Tj"));
    }
}
