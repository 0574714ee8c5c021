// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — build the burned copy of a document with `lopdf`.
//
// Edits are queued per page and only applied in `serialize`, which wraps the
// page's original content in `q ... Q` and appends one overlay stream. Pages
// without edits keep their objects untouched. Objects no longer reachable
// after the edits, such as scrubbed content streams, are not written.

use std::collections::{BTreeMap, BTreeSet};

use brennwerk_core::error::{BrennwerkError, Result};
use brennwerk_core::{Color, DocRect};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use tracing::{debug, info, instrument};

use super::reader::{PageHandle, SourceDocument, inherited_resources, resolve_dictionary, sub_dictionary};
use super::scrub::FormCopy;
use super::real;
use crate::effects::VectorShape;
use crate::image::EmbeddableImage;

const IMAGE_STEM: &str = "BwIm";
const FONT_STEM: &str = "BwHelv";

/// Queued changes for one page.
#[derive(Debug, Default)]
struct PageEdit {
    /// Overlay operators, drawn after the original content.
    operations: Vec<Operation>,
    /// Image and form XObjects to register under the page's resources.
    xobjects: Vec<(String, ObjectId)>,
    /// Resource name of the label font, once a label was drawn.
    font_name: Option<String>,
    /// Replacement for the original content (after text scrubbing).
    replacement: Option<Vec<u8>>,
    /// Names handed out on this page so far.
    allocated: BTreeSet<Vec<u8>>,
}

impl PageEdit {
    fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.replacement.is_none()
    }
}

/// An output document derived from an original PDF.
pub struct OutputDocument {
    document: Document,
    pages: Vec<PageHandle>,
    edits: BTreeMap<usize, PageEdit>,
    font_id: Option<ObjectId>,
}

impl OutputDocument {
    // -- Construction ---------------------------------------------------------

    /// Start an output document from the original bytes.
    pub fn from_original(original: &[u8]) -> Result<Self> {
        Ok(Self::from_source(SourceDocument::from_bytes(original)?))
    }

    pub fn from_source(source: SourceDocument) -> Self {
        let (document, pages) = source.into_parts();
        Self {
            document,
            pages,
            edits: BTreeMap::new(),
            font_id: None,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Result<&PageHandle> {
        self.pages.get(index).ok_or_else(|| {
            BrennwerkError::InvalidAnnotation(format!(
                "page {} out of range (document has {} pages)",
                index + 1,
                self.pages.len()
            ))
        })
    }

    /// Whether any page has queued edits.
    pub fn is_modified(&self) -> bool {
        self.edits.values().any(|edit| !edit.is_empty())
    }

    // -- Drawing --------------------------------------------------------------

    /// Place `image` so it exactly covers the document-space `rect`.
    ///
    /// Returns the resource name the image is registered under.
    pub fn draw_image(
        &mut self,
        page_index: usize,
        rect: &DocRect,
        image: &EmbeddableImage,
    ) -> Result<String> {
        let page = self.page(page_index)?.clone();
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            image.data.clone(),
        )
        .with_compression(false);
        let image_id = self.document.add_object(stream);

        let ordinal = self.edits.get(&page_index).map_or(0, |e| e.xobjects.len()) + 1;
        let name = self.allocate_name(&page, b"XObject", &format!("{IMAGE_STEM}{ordinal}"));
        let (ox, oy) = page.origin();

        let edit = self.edits.entry(page_index).or_default();
        edit.xobjects.push((name.clone(), image_id));
        edit.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(rect.width),
                    real(0.0),
                    real(0.0),
                    real(rect.height),
                    real(rect.x + ox),
                    real(rect.y + oy),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ]);

        debug!(
            page = page_index,
            name = %name,
            width = image.width,
            height = image.height,
            "image placed"
        );
        Ok(name)
    }

    /// Draw a vector mark with native path or text operators.
    pub fn draw_vector_shape(&mut self, page_index: usize, shape: &VectorShape) -> Result<()> {
        let page = self.page(page_index)?.clone();
        let (ox, oy) = page.origin();

        let operations = match shape {
            VectorShape::Outline { rect, color, width } => {
                let mut ops = vec![Operation::new("q", vec![])];
                ops.push(stroke_colour(*color));
                ops.push(Operation::new("w", vec![real(*width)]));
                ops.push(Operation::new(
                    "re",
                    vec![
                        real(rect.x + ox),
                        real(rect.y + oy),
                        real(rect.width),
                        real(rect.height),
                    ],
                ));
                ops.push(Operation::new("S", vec![]));
                ops.push(Operation::new("Q", vec![]));
                ops
            }
            VectorShape::Polyline {
                points,
                color,
                width,
            } => {
                let [first, rest @ ..] = points.as_slice() else {
                    return Err(BrennwerkError::InvalidAnnotation(
                        "freehand stroke has no points".into(),
                    ));
                };
                if rest.is_empty() {
                    return Err(BrennwerkError::InvalidAnnotation(
                        "freehand stroke needs at least two points".into(),
                    ));
                }
                let mut ops = vec![Operation::new("q", vec![])];
                ops.push(stroke_colour(*color));
                ops.push(Operation::new("w", vec![real(*width)]));
                ops.push(Operation::new("J", vec![Object::Integer(1)]));
                ops.push(Operation::new("j", vec![Object::Integer(1)]));
                ops.push(Operation::new(
                    "m",
                    vec![real(first.x + ox), real(first.y + oy)],
                ));
                for point in rest {
                    ops.push(Operation::new(
                        "l",
                        vec![real(point.x + ox), real(point.y + oy)],
                    ));
                }
                ops.push(Operation::new("S", vec![]));
                ops.push(Operation::new("Q", vec![]));
                ops
            }
            VectorShape::Text {
                origin,
                text,
                font_size,
                color,
            } => {
                let font = self.label_font(&page);
                let (r, g, b) = color.to_normalized();
                vec![
                    Operation::new("q", vec![]),
                    Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
                    Operation::new("BT", vec![]),
                    Operation::new(
                        "Tf",
                        vec![Object::Name(font.into_bytes()), real(*font_size)],
                    ),
                    Operation::new("Td", vec![real(origin.x + ox), real(origin.y + oy)]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(win_ansi(text), StringFormat::Literal)],
                    ),
                    Operation::new("ET", vec![]),
                    Operation::new("Q", vec![]),
                ]
            }
        };

        self.edits
            .entry(page_index)
            .or_default()
            .operations
            .extend(operations);
        Ok(())
    }

    /// Swap the page's original content for `content` (already decoded,
    /// written uncompressed).
    pub fn replace_page_content(&mut self, page_index: usize, content: Vec<u8>) -> Result<()> {
        self.page(page_index)?;
        self.edits.entry(page_index).or_default().replacement = Some(content);
        Ok(())
    }

    /// Register scrubbed form copies on the page under their names. The
    /// names must already be free in the page's `/XObject` resources.
    pub fn add_forms(&mut self, page_index: usize, forms: Vec<(String, FormCopy)>) -> Result<()> {
        self.page(page_index)?;
        for (name, form) in forms {
            let id = self.add_form(form)?;
            let edit = self.edits.entry(page_index).or_default();
            edit.allocated.insert(name.clone().into_bytes());
            edit.xobjects.push((name, id));
        }
        Ok(())
    }

    /// Add a form copy and its nested copies. Inline resources keep only
    /// the XObjects the copy's content still invokes.
    fn add_form(&mut self, form: FormCopy) -> Result<ObjectId> {
        let FormCopy {
            mut dict,
            content,
            forms,
        } = form;
        let resources = dict
            .get(b"Resources")
            .ok()
            .and_then(|object| resolve_dictionary(&self.document, object));
        if let Some(mut resources) = resources {
            let mut xobjects = invoked_xobjects(&self.document, &resources, &content)?;
            for (name, nested) in forms {
                let id = self.add_form(nested)?;
                xobjects.set(name.as_str(), Object::Reference(id));
            }
            resources.set("XObject", Object::Dictionary(xobjects));
            dict.set("Resources", Object::Dictionary(resources));
        }
        Ok(self.document.add_object(Stream::new(dict, content)))
    }

    // -- Output ---------------------------------------------------------------

    /// Apply all queued edits and write the document.
    #[instrument(skip(self), fields(edited_pages = self.edits.len()))]
    pub fn serialize(mut self) -> Result<Vec<u8>> {
        let edits = std::mem::take(&mut self.edits);
        for (index, edit) in edits {
            if edit.is_empty() {
                continue;
            }
            let page_id = self.page(index)?.object_id;
            self.apply_edit(page_id, edit)?;
            debug!(page = index, "page rewritten");
        }
        let pruned = self.document.prune_objects();
        debug!(objects = pruned.len(), "unreachable objects pruned");

        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|err| BrennwerkError::Pdf(format!("failed to serialise output PDF: {}", err)))?;

        info!(output_bytes = output.len(), "output document written");
        Ok(output)
    }

    fn apply_edit(&mut self, page_id: ObjectId, edit: PageEdit) -> Result<()> {
        // Resources: an inline copy per edited page, so pages sharing the
        // original dictionary never see the new names. Replaced content
        // drops the XObjects it no longer invokes.
        if !edit.xobjects.is_empty() || edit.font_name.is_some() || edit.replacement.is_some() {
            let mut resources = inherited_resources(&self.document, page_id);
            let xobjects = match &edit.replacement {
                Some(content) => Some(invoked_xobjects(&self.document, &resources, content)?),
                None if !edit.xobjects.is_empty() => {
                    Some(sub_dictionary(&self.document, &resources, b"XObject"))
                }
                None => None,
            };
            if let Some(mut xobjects) = xobjects {
                for (name, id) in &edit.xobjects {
                    xobjects.set(name.as_str(), Object::Reference(*id));
                }
                resources.set("XObject", Object::Dictionary(xobjects));
            }
            if let (Some(name), Some(font_id)) = (&edit.font_name, self.font_id) {
                let mut fonts = sub_dictionary(&self.document, &resources, b"Font");
                fonts.set(name.as_str(), Object::Reference(font_id));
                resources.set("Font", Object::Dictionary(fonts));
            }
            self.page_dict_mut(page_id)?
                .set("Resources", Object::Dictionary(resources));
        }

        let mut contents = match edit.replacement {
            Some(content) => {
                let id = self.document.add_object(Stream::new(dictionary! {}, content));
                vec![Object::Reference(id)]
            }
            None => original_contents(self.page_dict_mut(page_id)?),
        };

        if !edit.operations.is_empty() {
            let overlay = Content {
                operations: edit.operations,
            }
            .encode()
            .map_err(|err| BrennwerkError::Pdf(format!("failed to encode overlay: {}", err)))?;
            let mut suffix = b"Q\n".to_vec();
            suffix.extend_from_slice(&overlay);

            let prefix_id = self
                .document
                .add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
            let suffix_id = self.document.add_object(Stream::new(dictionary! {}, suffix));
            contents.insert(0, Object::Reference(prefix_id));
            contents.push(Object::Reference(suffix_id));
        }

        self.page_dict_mut(page_id)?
            .set("Contents", Object::Array(contents));
        Ok(())
    }

    // -- Helpers --------------------------------------------------------------

    fn page_dict_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary> {
        self.document
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| BrennwerkError::Pdf(format!("page object {:?}: {}", page_id, err)))
    }

    /// Resource name for the label font on `page`, adding the shared
    /// Helvetica font object on first use.
    fn label_font(&mut self, page: &PageHandle) -> String {
        if let Some(name) = self
            .edits
            .get(&page.index)
            .and_then(|edit| edit.font_name.clone())
        {
            return name;
        }
        if self.font_id.is_none() {
            self.font_id = Some(self.document.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            }));
        }
        let name = self.allocate_name(page, b"Font", FONT_STEM);
        self.edits.entry(page.index).or_default().font_name = Some(name.clone());
        name
    }

    /// `stem`, or `stem_N` for the first N not already used in the page's
    /// resources of this category or handed out earlier.
    fn allocate_name(&mut self, page: &PageHandle, category: &[u8], stem: &str) -> String {
        let resources = inherited_resources(&self.document, page.object_id);
        let existing: BTreeSet<Vec<u8>> = sub_dictionary(&self.document, &resources, category)
            .iter()
            .map(|(key, _)| key.clone())
            .collect();
        let edit = self.edits.entry(page.index).or_default();

        let mut candidate = stem.to_string();
        let mut n = 0;
        while existing.contains(candidate.as_bytes()) || edit.allocated.contains(candidate.as_bytes())
        {
            n += 1;
            candidate = format!("{stem}_{n}");
        }
        edit.allocated.insert(candidate.clone().into_bytes());
        candidate
    }
}

fn stroke_colour(color: Color) -> Operation {
    let (r, g, b) = color.to_normalized();
    Operation::new("RG", vec![Object::Real(r), Object::Real(g), Object::Real(b)])
}

/// Encode label text for a WinAnsi simple font. Characters outside Latin-1
/// become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?'))
        .collect()
}

/// The `/XObject` entries of `resources` that `content` invokes with `Do`.
fn invoked_xobjects(document: &Document, resources: &Dictionary, content: &[u8]) -> Result<Dictionary> {
    let invoked: BTreeSet<Vec<u8>> = Content::decode(content)
        .map_err(|err| BrennwerkError::Pdf(format!("cannot parse content stream: {}", err)))?
        .operations
        .into_iter()
        .filter(|op| op.operator == "Do")
        .filter_map(|op| match op.operands.into_iter().next() {
            Some(Object::Name(name)) => Some(name),
            _ => None,
        })
        .collect();
    let mut xobjects = sub_dictionary(document, resources, b"XObject");
    let unused: Vec<Vec<u8>> = xobjects
        .iter()
        .map(|(name, _)| name.clone())
        .filter(|name| !invoked.contains(name))
        .collect();
    for name in unused {
        xobjects.remove(&name);
    }
    Ok(xobjects)
}

/// References to the page's content streams, in drawing order.
fn original_contents(page: &Dictionary) -> Vec<Object> {
    match page.get(b"Contents") {
        Ok(Object::Array(items)) => items.clone(),
        Ok(reference @ Object::Reference(_)) => vec![reference.clone()],
        _ => Vec::new(),
    }
}
