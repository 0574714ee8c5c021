// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixture PDFs for unit tests, built directly with lopdf.

use lopdf::{Dictionary, Document, Object, Stream, dictionary};

/// One page of a fixture document.
pub(crate) struct FixturePage {
    media_box: [i64; 4],
    content: String,
    forms: Vec<(String, String)>,
    images: Vec<String>,
}

impl FixturePage {
    pub(crate) fn blank() -> Self {
        Self::with_content("")
    }

    pub(crate) fn with_content(content: &str) -> Self {
        Self {
            media_box: [0, 0, 595, 842],
            content: content.to_string(),
            forms: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Helvetica 12pt text runs at `(x, y)`.
    pub(crate) fn text(runs: &[(f64, f64, &str)]) -> Self {
        let content = runs
            .iter()
            .map(|(x, y, s)| format!("BT /F1 12 Tf {x} {y} Td ({s}) Tj ET\n"))
            .collect::<String>();
        Self::with_content(&content)
    }

    pub(crate) fn with_media_box(mut self, media_box: [i64; 4]) -> Self {
        self.media_box = media_box;
        self
    }

    /// A form XObject without its own resources, so it inherits the page's.
    pub(crate) fn with_form(mut self, name: &str, content: &str) -> Self {
        self.forms.push((name.to_string(), content.to_string()));
        self
    }

    /// A 2x2 RGB image XObject whose samples spell `PIXELSECRET!`.
    pub(crate) fn with_image(mut self, name: &str) -> Self {
        self.images.push(name.to_string());
        self
    }
}

/// Build a document whose pages share one `/Resources` dictionary by
/// reference. Pages with XObjects get their own.
pub(crate) fn document(pages: &[FixturePage]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for page in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page.content.clone().into_bytes()));
        let media_box: Vec<Object> = page.media_box.iter().map(|v| Object::Integer(*v)).collect();
        let resources = if page.forms.is_empty() && page.images.is_empty() {
            Object::Reference(resources_id)
        } else {
            let mut xobjects = Dictionary::new();
            for (name, content) in &page.forms {
                let form_id = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Form",
                        "BBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(595), Object::Integer(842)],
                    },
                    content.clone().into_bytes(),
                ));
                xobjects.set(name.as_str(), form_id);
            }
            for name in &page.images {
                let image_id = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => 2,
                        "Height" => 2,
                        "ColorSpace" => "DeviceRGB",
                        "BitsPerComponent" => 8,
                    },
                    b"PIXELSECRET!".to_vec(),
                ));
                xobjects.set(name.as_str(), image_id);
            }
            Object::Dictionary(dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            })
        };
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box,
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
