// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content scrubbing — remove what a destroyed region covers from the page
// content itself, so burned areas keep no extractable text, images or paths.
//
// Positions are tracked through the graphics state (q/Q/cm/w) and the text
// state (BT/Td/TD/Tm/T*/TL/Tf/Tc/Tw/Tz). Glyph extents are estimated from the
// font size; no font programs are read. Form XObjects are scrubbed
// recursively into copies, so other pages drawing the same form keep it.

use std::collections::BTreeSet;

use brennwerk_core::DocRect;
use brennwerk_core::error::{BrennwerkError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use tracing::{debug, warn};

use super::number;
use super::reader::{resolve_dictionary, sub_dictionary};
use crate::effects::GLYPH_WIDTH_FACTOR;

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Fraction of the font size assumed below the baseline.
const DESCENT: f64 = 0.2;

/// Forms nested deeper than this are left alone.
const MAX_FORM_DEPTH: usize = 8;

const FORM_STEM: &str = "BwForm";

/// `a` then `b`, in PDF row-vector convention.
fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

fn translation(tx: f64, ty: f64) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

fn apply(m: &Matrix, x: f64, y: f64) -> (f64, f64) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    let values: Vec<f64> = operands.iter().filter_map(number).collect();
    <[f64; 6]>::try_from(values.as_slice()).ok()
}

/// Axis-aligned box around a set of user-space points.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Bounds {
    fn of(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut bounds: Option<Self> = None;
        for point in points {
            bounds = Some(match bounds {
                Some(b) => b.with(point),
                None => Self {
                    x0: point.0,
                    y0: point.1,
                    x1: point.0,
                    y1: point.1,
                },
            });
        }
        bounds
    }

    fn with(self, (x, y): (f64, f64)) -> Self {
        Self {
            x0: self.x0.min(x),
            y0: self.y0.min(y),
            x1: self.x1.max(x),
            y1: self.y1.max(y),
        }
    }

    fn rect(&self) -> DocRect {
        DocRect::new(self.x0, self.y0, self.x1 - self.x0, self.y1 - self.y0)
    }
}

/// The part of the graphics state `q`/`Q` save and restore that matters here.
#[derive(Debug, Clone)]
struct State {
    ctm: Matrix,
    line_width: f64,
    font_size: f64,
    leading: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            line_width: 1.0,
            font_size: 0.0,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
        }
    }
}

/// A scrubbed copy of a form XObject, not yet part of any document.
#[derive(Debug, Clone, PartialEq)]
pub struct FormCopy {
    /// The form dictionary without filters. A form that inherited its
    /// resources, or that gained nested copies, carries them inline.
    pub dict: Dictionary,
    /// Decoded, scrubbed content.
    pub content: Vec<u8>,
    /// Scrubbed nested forms, under the names `content` now invokes them by.
    pub forms: Vec<(String, FormCopy)>,
}

/// Result of scrubbing one content stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrubOutcome {
    /// Re-encoded content stream.
    pub content: Vec<u8>,
    /// Text-showing operators removed, nested forms included.
    pub text_removed: usize,
    /// Image XObject invocations removed.
    pub images_removed: usize,
    /// Painted paths removed.
    pub paths_removed: usize,
    /// Scrubbed form copies to register under the given resource names.
    pub forms: Vec<(String, FormCopy)>,
}

impl ScrubOutcome {
    pub fn is_changed(&self) -> bool {
        self.text_removed + self.images_removed + self.paths_removed > 0 || !self.forms.is_empty()
    }

    fn absorb(&mut self, nested: &ScrubOutcome) {
        self.text_removed += nested.text_removed;
        self.images_removed += nested.images_removed;
        self.paths_removed += nested.paths_removed;
    }
}

/// Where `Do` names are looked up.
#[derive(Clone, Copy)]
struct Resources<'a> {
    document: &'a Document,
    dict: &'a Dictionary,
}

enum XObject {
    Image,
    Form(Stream),
}

struct Scrubber<'a> {
    regions: &'a [DocRect],
    resources: Option<Resources<'a>>,
    depth: usize,
    state: State,
    stack: Vec<State>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    /// Path construction operators waiting for their painting operator.
    path: Vec<Operation>,
    path_bounds: Option<Bounds>,
    path_clips: bool,
    /// XObject names in use in this stream's resources.
    taken: BTreeSet<Vec<u8>>,
    outcome: ScrubOutcome,
}

impl<'a> Scrubber<'a> {
    fn new(regions: &'a [DocRect], resources: Option<Resources<'a>>, state: State, depth: usize) -> Self {
        let taken = resources
            .map(|r| {
                sub_dictionary(r.document, r.dict, b"XObject")
                    .iter()
                    .map(|(key, _)| key.clone())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            regions,
            resources,
            depth,
            state,
            stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            path: Vec::new(),
            path_bounds: None,
            path_clips: false,
            taken,
            outcome: ScrubOutcome::default(),
        }
    }

    fn run(mut self, content: &[u8]) -> Result<ScrubOutcome> {
        let decoded = Content::decode(content)
            .map_err(|err| BrennwerkError::Pdf(format!("cannot parse content stream: {}", err)))?;
        let mut out = Vec::with_capacity(decoded.operations.len());
        for op in decoded.operations {
            self.step(op, &mut out)?;
        }
        out.append(&mut self.path);

        self.outcome.content = Content { operations: out }
            .encode()
            .map_err(|err| BrennwerkError::Pdf(format!("cannot encode content stream: {}", err)))?;
        Ok(self.outcome)
    }

    fn destroyed(&self, rect: &DocRect) -> bool {
        self.regions.iter().any(|region| region.encloses(rect))
    }

    // -- Text -----------------------------------------------------------------

    fn next_line(&mut self) {
        self.move_line(0.0, -self.state.leading);
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = multiply(&translation(tx, ty), &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// Advance of one shown string in unscaled text space.
    fn string_advance(&self, bytes: &[u8]) -> f64 {
        let s = &self.state;
        bytes
            .iter()
            .map(|b| {
                let word = if *b == b' ' { s.word_spacing } else { 0.0 };
                (GLYPH_WIDTH_FACTOR * s.font_size + s.char_spacing + word) * s.horizontal_scale
            })
            .sum()
    }

    /// Advance of a `TJ` array: strings plus kerning adjustments.
    fn array_advance(&self, items: &[Object]) -> f64 {
        items
            .iter()
            .map(|item| match item {
                Object::String(bytes, _) => self.string_advance(bytes),
                other => number(other).map_or(0.0, |adjust| {
                    -adjust / 1000.0 * self.state.font_size * self.state.horizontal_scale
                }),
            })
            .sum()
    }

    /// Move past a run of `advance` units and report whether its estimated
    /// glyph box touches any region.
    fn show(&mut self, advance: f64) -> bool {
        let size = self.state.font_size.abs();
        let to_user = multiply(&self.text_matrix, &self.state.ctm);
        let glyphs = Bounds::of([
            apply(&to_user, 0.0, -DESCENT * size),
            apply(&to_user, advance, -DESCENT * size),
            apply(&to_user, 0.0, size),
            apply(&to_user, advance, size),
        ]);
        self.text_matrix = multiply(&translation(advance, 0.0), &self.text_matrix);
        glyphs.is_some_and(|g| {
            let glyphs = g.rect();
            self.regions.iter().any(|region| region.intersects(&glyphs))
        })
    }

    // -- Paths ----------------------------------------------------------------

    fn extend_path(&mut self, coords: &[f64]) {
        for pair in coords.chunks_exact(2) {
            let point = apply(&self.state.ctm, pair[0], pair[1]);
            self.path_bounds = Some(match self.path_bounds {
                Some(b) => b.with(point),
                None => Bounds {
                    x0: point.0,
                    y0: point.1,
                    x1: point.0,
                    y1: point.1,
                },
            });
        }
    }

    /// Emit or drop the buffered path together with its painting operator.
    fn paint(&mut self, op: Operation, out: &mut Vec<Operation>) {
        let stroking = matches!(op.operator.as_str(), "S" | "s" | "B" | "B*" | "b" | "b*");
        let half_width = if stroking {
            let c = &self.state.ctm;
            self.state.line_width * (c[0] * c[3] - c[1] * c[2]).abs().sqrt() / 2.0
        } else {
            0.0
        };
        let drop = op.operator != "n"
            && !self.path_clips
            && self
                .path_bounds
                .is_some_and(|b| self.destroyed(&b.rect().inflate(half_width)));

        if drop {
            self.path.clear();
            self.outcome.paths_removed += 1;
        } else {
            out.append(&mut self.path);
            out.push(op);
        }
        self.path_bounds = None;
        self.path_clips = false;
    }

    // -- XObjects -------------------------------------------------------------

    fn xobject(&self, name: &[u8]) -> Option<XObject> {
        let resources = self.resources?;
        let xobjects = sub_dictionary(resources.document, resources.dict, b"XObject");
        let stream = match xobjects.get(name).ok()? {
            Object::Reference(id) => resources.document.get_object(*id).ok()?.as_stream().ok()?,
            Object::Stream(stream) => stream,
            _ => return None,
        };
        match stream.dict.get(b"Subtype").and_then(Object::as_name).ok()? {
            b"Image" => Some(XObject::Image),
            b"Form" => Some(XObject::Form(stream.clone())),
            _ => None,
        }
    }

    /// An image is dropped when its placed unit square lies inside a region.
    fn image_destroyed(&self) -> bool {
        let ctm = &self.state.ctm;
        Bounds::of([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)].map(|(x, y)| apply(ctm, x, y)))
            .is_some_and(|b| self.destroyed(&b.rect()))
    }

    /// Scrub a form into a copy. `None` when nothing in it changed.
    fn scrub_form(&mut self, name: &[u8], form: Stream) -> Result<Option<(String, FormCopy)>> {
        let Some(resources) = self.resources else {
            return Ok(None);
        };
        if self.depth >= MAX_FORM_DEPTH {
            warn!(
                form = %String::from_utf8_lossy(name),
                depth = self.depth,
                "form nesting too deep, left unscrubbed"
            );
            return Ok(None);
        }

        let matrix = form
            .dict
            .get(b"Matrix")
            .and_then(Object::as_array)
            .ok()
            .and_then(|values| matrix_operands(values))
            .unwrap_or(IDENTITY);
        let own_resources = form
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|object| resolve_dictionary(resources.document, object));
        let effective = own_resources.unwrap_or_else(|| resources.dict.clone());
        let content = form
            .decompressed_content()
            .unwrap_or_else(|_| form.content.clone());

        let mut state = self.state.clone();
        state.ctm = multiply(&matrix, &self.state.ctm);
        let nested = Scrubber::new(
            self.regions,
            Some(Resources {
                document: resources.document,
                dict: &effective,
            }),
            state,
            self.depth + 1,
        )
        .run(&content)?;
        if !nested.is_changed() {
            return Ok(None);
        }
        self.outcome.absorb(&nested);

        let mut dict = form.dict;
        dict.remove(b"Filter");
        dict.remove(b"DecodeParms");
        dict.remove(b"Length");
        if !nested.forms.is_empty() || !dict.has(b"Resources") {
            dict.set("Resources", Object::Dictionary(effective));
        }

        let new_name = self.fresh_name();
        debug!(
            form = %String::from_utf8_lossy(name),
            copy = %new_name,
            text = nested.text_removed,
            "form scrubbed"
        );
        Ok(Some((
            new_name,
            FormCopy {
                dict,
                content: nested.content,
                forms: nested.forms,
            },
        )))
    }

    fn fresh_name(&mut self) -> String {
        let mut n = 1;
        loop {
            let candidate = format!("{FORM_STEM}{n}");
            if self.taken.insert(candidate.clone().into_bytes()) {
                return candidate;
            }
            n += 1;
        }
    }

    // -- Dispatch -------------------------------------------------------------

    fn step(&mut self, op: Operation, out: &mut Vec<Operation>) -> Result<()> {
        let nums: Vec<f64> = op.operands.iter().filter_map(number).collect();
        match op.operator.as_str() {
            "m" | "l" | "c" | "v" | "y" | "h" => {
                self.extend_path(&nums);
                self.path.push(op);
                return Ok(());
            }
            "re" => {
                if let &[x, y, w, h] = nums.as_slice() {
                    self.extend_path(&[x, y, x + w, y, x, y + h, x + w, y + h]);
                }
                self.path.push(op);
                return Ok(());
            }
            "W" | "W*" => {
                self.path_clips = true;
                self.path.push(op);
                return Ok(());
            }
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" | "n" => {
                self.paint(op, out);
                return Ok(());
            }
            _ => out.append(&mut self.path),
        }

        match op.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operands(&op.operands) {
                    self.state.ctm = multiply(&m, &self.state.ctm);
                }
            }
            "w" => {
                if let Some(width) = nums.first() {
                    self.state.line_width = *width;
                }
            }
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "Tf" => {
                if let Some(size) = op.operands.get(1).and_then(number) {
                    self.state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = nums.first() {
                    self.state.leading = *leading;
                }
            }
            "Tc" => {
                if let Some(spacing) = nums.first() {
                    self.state.char_spacing = *spacing;
                }
            }
            "Tw" => {
                if let Some(spacing) = nums.first() {
                    self.state.word_spacing = *spacing;
                }
            }
            "Tz" => {
                if let Some(scale) = nums.first() {
                    self.state.horizontal_scale = scale / 100.0;
                }
            }
            "Td" | "TD" => {
                if let &[tx, ty] = nums.as_slice() {
                    if op.operator == "TD" {
                        self.state.leading = -ty;
                    }
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operands(&op.operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                let advance = match op.operands.first() {
                    Some(Object::String(bytes, _)) => self.string_advance(bytes),
                    _ => 0.0,
                };
                if self.show(advance) {
                    self.outcome.text_removed += 1;
                    return Ok(());
                }
            }
            "TJ" => {
                let advance = match op.operands.first() {
                    Some(Object::Array(items)) => self.array_advance(items),
                    _ => 0.0,
                };
                if self.show(advance) {
                    self.outcome.text_removed += 1;
                    return Ok(());
                }
            }
            "'" => {
                self.next_line();
                let advance = match op.operands.first() {
                    Some(Object::String(bytes, _)) => self.string_advance(bytes),
                    _ => 0.0,
                };
                if self.show(advance) {
                    self.outcome.text_removed += 1;
                    out.push(Operation::new("T*", vec![]));
                    return Ok(());
                }
            }
            "\"" => {
                let mut operands = op.operands.iter();
                let (aw, ac) = (operands.next().cloned(), operands.next().cloned());
                if let (Some(aw), Some(ac)) = (&aw, &ac) {
                    self.state.word_spacing = number(aw).unwrap_or(0.0);
                    self.state.char_spacing = number(ac).unwrap_or(0.0);
                }
                self.next_line();
                let advance = match op.operands.get(2) {
                    Some(Object::String(bytes, _)) => self.string_advance(bytes),
                    _ => 0.0,
                };
                if self.show(advance) {
                    self.outcome.text_removed += 1;
                    if let (Some(aw), Some(ac)) = (aw, ac) {
                        out.push(Operation::new("Tw", vec![aw]));
                        out.push(Operation::new("Tc", vec![ac]));
                    }
                    out.push(Operation::new("T*", vec![]));
                    return Ok(());
                }
            }
            "Do" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    match self.xobject(name) {
                        Some(XObject::Image) if self.image_destroyed() => {
                            self.outcome.images_removed += 1;
                            return Ok(());
                        }
                        Some(XObject::Form(form)) => {
                            if let Some((new_name, copy)) = self.scrub_form(name, form)? {
                                out.push(Operation::new(
                                    "Do",
                                    vec![Object::Name(new_name.clone().into_bytes())],
                                ));
                                self.outcome.forms.push((new_name, copy));
                                return Ok(());
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        out.push(op);
        Ok(())
    }
}

/// Remove text runs whose glyph boxes intersect any of `regions`, and paths
/// lying inside one. `regions` are in the stream's user space. XObjects are
/// not looked into; see [`scrub_page`].
pub fn scrub_text(content: &[u8], regions: &[DocRect]) -> Result<ScrubOutcome> {
    let outcome = Scrubber::new(regions, None, State::default(), 0).run(content)?;
    debug!(
        text = outcome.text_removed,
        paths = outcome.paths_removed,
        "content scrubbed"
    );
    Ok(outcome)
}

/// Scrub a page's content against its `resources`: text, paths, image
/// XObjects placed inside a region, and the contents of form XObjects.
pub fn scrub_page(
    document: &Document,
    resources: &Dictionary,
    content: &[u8],
    regions: &[DocRect],
) -> Result<ScrubOutcome> {
    let outcome = Scrubber::new(
        regions,
        Some(Resources {
            document,
            dict: resources,
        }),
        State::default(),
        0,
    )
    .run(content)?;
    debug!(
        text = outcome.text_removed,
        images = outcome.images_removed,
        paths = outcome.paths_removed,
        forms = outcome.forms.len(),
        "page scrubbed"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::SourceDocument;
    use crate::testutil::{self, FixturePage};

    fn scrub(content: &str, region: DocRect) -> (String, usize) {
        let outcome = scrub_text(content.as_bytes(), &[region]).unwrap();
        (
            String::from_utf8_lossy(&outcome.content).to_string(),
            outcome.text_removed,
        )
    }

    fn scrub_fixture(page: FixturePage, region: DocRect) -> ScrubOutcome {
        let source = SourceDocument::from_bytes(&testutil::document(&[page])).unwrap();
        let resources = source.page_resources(0).unwrap();
        let content = source.page_content(0).unwrap();
        scrub_page(source.document(), &resources, &content, &[region]).unwrap()
    }

    #[test]
    fn text_under_region_is_removed_and_the_rest_kept() {
        let content = "BT /F1 12 Tf 100 700 Td (SECRET) Tj ET\nBT /F1 12 Tf 100 500 Td (PUBLIC) Tj ET";
        let (out, removed) = scrub(content, DocRect::new(90.0, 690.0, 100.0, 30.0));
        assert_eq!(removed, 1);
        assert!(!out.contains("SECRET"));
        assert!(out.contains("PUBLIC"));
    }

    #[test]
    fn transformation_matrix_is_followed() {
        let content = "q 2 0 0 2 0 0 cm BT /F1 12 Tf 50 350 Td (HIDDEN) Tj ET Q\n\
                       BT /F1 12 Tf 50 350 Td (SHOWN) Tj ET";
        let (out, removed) = scrub(content, DocRect::new(95.0, 695.0, 20.0, 30.0));
        assert_eq!(removed, 1);
        assert!(!out.contains("HIDDEN"));
        assert!(out.contains("SHOWN"));
    }

    #[test]
    fn advance_moves_later_runs_along_the_line() {
        // Each 10-char run at 12pt advances 60 units.
        let content = "BT /F1 12 Tf 0 100 Td (AAAAAAAAAA) Tj (BBBBBBBBBB) Tj ET";
        let (out, removed) = scrub(content, DocRect::new(70.0, 95.0, 20.0, 10.0));
        assert_eq!(removed, 1);
        assert!(out.contains("AAAAAAAAAA"));
        assert!(!out.contains("BBBBBBBBBB"));
    }

    #[test]
    fn quote_operator_keeps_its_line_break() {
        let content = "BT /F1 12 Tf 14 TL 100 700 Td (KEEP) Tj (GONE) ' (NEXT) Tj ET";
        let (out, removed) = scrub(content, DocRect::new(90.0, 680.0, 20.0, 10.0));
        assert_eq!(removed, 1);
        assert!(out.contains("KEEP"));
        assert!(!out.contains("GONE"));
        assert!(out.contains("T*"));
    }

    #[test]
    fn kerned_arrays_are_measured() {
        let content = "BT /F1 10 Tf 200 300 Td [(AB) -500 (CD)] TJ ET";
        let (out, removed) = scrub(content, DocRect::new(212.0, 298.0, 5.0, 5.0));
        assert_eq!(removed, 1);
        assert!(!out.contains("CD"));
    }

    #[test]
    fn nothing_in_region_changes_nothing() {
        let content = "BT /F1 12 Tf 100 700 Td (SAFE) Tj ET";
        let outcome = scrub_text(content.as_bytes(), &[DocRect::new(0.0, 0.0, 50.0, 50.0)]).unwrap();
        assert!(!outcome.is_changed());
        assert!(String::from_utf8_lossy(&outcome.content).contains("SAFE"));
    }

    #[test]
    fn enclosed_paths_go_and_crossing_paths_stay() {
        let content = "0 0 1 rg 110 110 20 20 re f\n\
                       1 0 0 RG 2 w 50 150 m 300 150 l S\n\
                       q 120 120 10 10 re W n 0 0 500 500 re f Q";
        let outcome = scrub_text(content.as_bytes(), &[DocRect::new(100.0, 100.0, 50.0, 100.0)]).unwrap();
        assert_eq!(outcome.paths_removed, 1);
        let out = String::from_utf8_lossy(&outcome.content).to_string();
        assert!(!out.contains("110 110 20 20 re"));
        assert!(out.contains("50 150 m"));
        // Clipping paths are kept, and so is the fill they clip.
        assert!(out.contains("W"));
        assert!(out.contains("0 0 500 500 re"));
    }

    #[test]
    fn stroke_width_counts_towards_the_path_box() {
        let content = "8 w 102 120 m 140 120 l S";
        let outcome = scrub_text(content.as_bytes(), &[DocRect::new(100.0, 100.0, 50.0, 50.0)]).unwrap();
        assert_eq!(outcome.paths_removed, 0);
    }

    #[test]
    fn text_inside_a_form_is_scrubbed_into_a_copy() {
        let page = FixturePage::with_content("q 1 0 0 1 50 0 cm /Fm1 Do Q\n")
            .with_form("Fm1", "BT /F1 12 Tf 50 700 Td (SECRET) Tj ET\nBT /F1 12 Tf 50 400 Td (PUBLIC) Tj ET\n");
        let outcome = scrub_fixture(page, DocRect::new(90.0, 690.0, 100.0, 30.0));

        assert_eq!(outcome.text_removed, 1);
        assert_eq!(outcome.forms.len(), 1);
        let (name, copy) = &outcome.forms[0];
        assert_eq!(name, "BwForm1");
        let content = String::from_utf8_lossy(&outcome.content).to_string();
        assert!(content.contains("/BwForm1 Do"));
        assert!(!content.contains("/Fm1 Do"));

        let form = String::from_utf8_lossy(&copy.content).to_string();
        assert!(!form.contains("SECRET"));
        assert!(form.contains("PUBLIC"));
        assert!(!copy.dict.has(b"Filter"));
    }

    #[test]
    fn untouched_form_keeps_its_name() {
        let page = FixturePage::with_content("/Fm1 Do\n")
            .with_form("Fm1", "BT /F1 12 Tf 50 400 Td (PUBLIC) Tj ET\n");
        let outcome = scrub_fixture(page, DocRect::new(90.0, 690.0, 100.0, 30.0));
        assert!(!outcome.is_changed());
        assert!(String::from_utf8_lossy(&outcome.content).contains("/Fm1 Do"));
    }

    #[test]
    fn images_inside_a_region_are_dropped() {
        let page = FixturePage::with_content(
            "q 40 0 0 40 110 110 cm /Im1 Do Q\nq 200 0 0 40 110 300 cm /Im1 Do Q\n",
        )
        .with_image("Im1");
        let outcome = scrub_fixture(page, DocRect::new(100.0, 100.0, 60.0, 250.0));
        assert_eq!(outcome.images_removed, 1);
        let content = String::from_utf8_lossy(&outcome.content).to_string();
        assert_eq!(content.matches("/Im1 Do").count(), 1);
    }

    #[test]
    fn matrix_product_composes_in_pdf_order() {
        let scale = [2.0, 0.0, 0.0, 2.0, 0.0, 0.0];
        let shift = translation(10.0, 5.0);
        // Shift first, then scale.
        assert_eq!(apply(&multiply(&shift, &scale), 0.0, 0.0), (20.0, 10.0));
    }
}
