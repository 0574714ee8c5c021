// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Specimen documents — multi-page A4 text PDFs generated with `printpdf` 0.8,
// used by the `demo` command and the benchmarks as burn-in input.

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use tracing::{debug, instrument};

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN_MM: f32 = 20.0;
const LINE_HEIGHT_PT: f32 = 18.0;

/// Lines repeated on every page; the interesting ones look like data a user
/// would want to redact.
const BODY: &[&str] = &[
    "Customer: Erika Mustermann",
    "Address: Heidestrasse 17, 51147 Koeln",
    "Account: DE02 1203 0000 0000 2020 51",
    "Phone: +49 221 555 0199",
    "",
    "This specimen exists to try out pixelation, blur and opaque fills.",
    "Everything outside a marked region must survive the export unchanged.",
];

/// Point size of the heading line at the top of each page.
pub const HEADING_SIZE_PT: f32 = 16.0;

/// Point size of body lines.
pub const BODY_SIZE_PT: f32 = 11.0;

/// Generate an A4 specimen with `pages` pages (at least one).
#[instrument]
pub fn specimen_document(pages: usize) -> Vec<u8> {
    let page_count = pages.max(1);
    let margin_pt = Mm(MARGIN_MM).into_pt().0;
    let page_h_pt = PAGE_HEIGHT.into_pt().0;

    let mut doc = PdfDocument::new("Brennwerk Specimen");
    let mut sheets: Vec<PdfPage> = Vec::with_capacity(page_count);

    for number in 1..=page_count {
        let mut ops: Vec<Op> = Vec::new();
        let heading = format!("Specimen page {number} of {page_count}");
        push_line(
            &mut ops,
            &heading,
            margin_pt,
            page_h_pt - margin_pt,
            HEADING_SIZE_PT,
            BuiltinFont::HelveticaBold,
        );
        for (line_idx, line) in BODY.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let y_pt = page_h_pt - margin_pt - (line_idx as f32 + 2.0) * LINE_HEIGHT_PT;
            push_line(
                &mut ops,
                line,
                margin_pt,
                y_pt,
                BODY_SIZE_PT,
                BuiltinFont::Helvetica,
            );
        }
        sheets.push(PdfPage::new(PAGE_WIDTH, PAGE_HEIGHT, ops));
    }

    doc.with_pages(sheets);
    debug!(pages = doc.pages.len(), "specimen laid out");

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    doc.save(&PdfSaveOptions::default(), &mut warnings)
}

fn push_line(ops: &mut Vec<Op>, text: &str, x_pt: f32, y_pt: f32, size: f32, font: BuiltinFont) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Pt(x_pt),
            y: Pt(y_pt),
        },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(size),
        font: font.clone(),
    });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(text.to_string())],
        font,
    });
    ops.push(Op::EndTextSection);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::SourceDocument;

    #[test]
    fn specimen_has_requested_pages() {
        let bytes = specimen_document(3);
        let source = SourceDocument::from_bytes(&bytes).unwrap();
        assert_eq!(source.page_count(), 3);
        let page = source.page(0).unwrap();
        assert!((page.width() - 595.0).abs() < 1.0);
        assert!((page.height() - 842.0).abs() < 1.0);
    }

    #[test]
    fn zero_pages_still_yields_one() {
        let source = SourceDocument::from_bytes(&specimen_document(0)).unwrap();
        assert_eq!(source.page_count(), 1);
    }
}
