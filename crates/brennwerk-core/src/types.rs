// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Brennwerk burn-in engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an open document session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an annotation. Stable for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationId(pub Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// -- Colour -------------------------------------------------------------------

/// Opaque RGB colour used by fills, strokes and labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };
    pub const RED: Color = Color { r: 220, g: 38, b: 38 };
    pub const BLUE: Color = Color { r: 37, g: 99, b: 235 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 {
            return None;
        }
        let value = u32::from_str_radix(digits, 16).ok()?;
        Some(Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        })
    }

    /// Channels scaled to 0.0..=1.0, as PDF colour operators expect.
    pub fn to_normalized(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// -- Document space -----------------------------------------------------------

/// A point in document space: PDF points, origin at the page's bottom-left
/// corner, y increasing upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocPoint {
    pub x: f64,
    pub y: f64,
}

impl DocPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &DocPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A rectangle in document space. `(x, y)` is the **bottom-left** corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DocRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest rectangle containing both points, regardless of drag direction.
    pub fn from_corners(a: DocPoint, b: DocPoint) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self {
            x,
            y,
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    /// Top-left corner in document space (`(x, y + height)`).
    pub fn top_left(&self) -> DocPoint {
        DocPoint::new(self.x, self.top())
    }

    /// Bottom-right corner in document space (`(x + width, y)`).
    pub fn bottom_right(&self) -> DocPoint {
        DocPoint::new(self.right(), self.y)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn contains(&self, point: DocPoint) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.top()
    }

    /// Overlapping area of two rectangles, `None` when they only touch or are
    /// disjoint.
    pub fn intersection(&self, other: &DocRect) -> Option<DocRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.top().min(other.top());
        if x1 > x0 && y1 > y0 {
            Some(DocRect::new(x0, y0, x1 - x0, y1 - y0))
        } else {
            None
        }
    }

    pub fn intersects(&self, other: &DocRect) -> bool {
        self.intersection(other).is_some()
    }

    /// Whether `other` lies entirely inside this rectangle (edges included).
    pub fn encloses(&self, other: &DocRect) -> bool {
        other.x >= self.x && other.y >= self.y && other.right() <= self.right() && other.top() <= self.top()
    }

    /// Grow the rectangle by `amount` on every side.
    pub fn inflate(&self, amount: f64) -> DocRect {
        DocRect::new(
            self.x - amount,
            self.y - amount,
            self.width + 2.0 * amount,
            self.height + 2.0 * amount,
        )
    }
}

// -- Device space -------------------------------------------------------------

/// A point in device space: pixels of a rendered raster, origin top-left,
/// y increasing downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DevicePoint {
    pub x: f64,
    pub y: f64,
}

impl DevicePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A rectangle in device space. `(x, y)` is the **top-left** corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DeviceRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalised rectangle spanned by a drag from `a` to `b`.
    pub fn from_points(a: DevicePoint, b: DevicePoint) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

// -- Annotations --------------------------------------------------------------

/// What an annotation does to its page. One variant per effect kind.
///
/// Box-shaped variants carry a document-space rectangle; `FreehandStroke`
/// carries its ordered path instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnnotationKind {
    Pixelate {
        rect: DocRect,
    },
    Blur {
        rect: DocRect,
    },
    OpaqueFill {
        rect: DocRect,
        color: Color,
    },
    StrokeRect {
        rect: DocRect,
        color: Color,
        width: f64,
    },
    FreehandStroke {
        points: Vec<DocPoint>,
        color: Color,
        width: f64,
    },
    TextLabel {
        rect: DocRect,
        text: String,
        font_size: f64,
        color: Color,
    },
}

impl AnnotationKind {
    /// Whether burning this annotation replaces the pixels underneath it.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Self::Pixelate { .. } | Self::Blur { .. } | Self::OpaqueFill { .. }
        )
    }

    /// The box of a box-shaped annotation.
    pub fn rect(&self) -> Option<DocRect> {
        match self {
            Self::Pixelate { rect }
            | Self::Blur { rect }
            | Self::OpaqueFill { rect, .. }
            | Self::StrokeRect { rect, .. }
            | Self::TextLabel { rect, .. } => Some(*rect),
            Self::FreehandStroke { .. } => None,
        }
    }

    /// The same annotation with its box replaced. Strokes are unchanged.
    pub fn with_rect(mut self, new_rect: DocRect) -> Self {
        match &mut self {
            Self::Pixelate { rect }
            | Self::Blur { rect }
            | Self::OpaqueFill { rect, .. }
            | Self::StrokeRect { rect, .. }
            | Self::TextLabel { rect, .. } => *rect = new_rect,
            Self::FreehandStroke { .. } => {}
        }
        self
    }

    /// Bounding box in document space. For strokes this includes half the
    /// stroke width on each side.
    pub fn bounds(&self) -> DocRect {
        match self {
            Self::FreehandStroke { points, width, .. } => {
                let Some(first) = points.first() else {
                    return DocRect::new(0.0, 0.0, 0.0, 0.0);
                };
                let (mut min_x, mut min_y, mut max_x, mut max_y) =
                    (first.x, first.y, first.x, first.y);
                for point in points.iter().skip(1) {
                    min_x = min_x.min(point.x);
                    min_y = min_y.min(point.y);
                    max_x = max_x.max(point.x);
                    max_y = max_y.max(point.y);
                }
                DocRect::new(min_x, min_y, max_x - min_x, max_y - min_y).inflate(width / 2.0)
            }
            Self::StrokeRect { rect, width, .. } => rect.inflate(width / 2.0),
            other => other.rect().unwrap_or(DocRect::new(0.0, 0.0, 0.0, 0.0)),
        }
    }

    /// Short lowercase name used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pixelate { .. } => "pixelate",
            Self::Blur { .. } => "blur",
            Self::OpaqueFill { .. } => "opaque_fill",
            Self::StrokeRect { .. } => "stroke_rect",
            Self::FreehandStroke { .. } => "freehand_stroke",
            Self::TextLabel { .. } => "text_label",
        }
    }
}

/// A committed mark on one page of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    /// Zero-based page index.
    pub page_index: usize,
    pub kind: AnnotationKind,
}

impl Annotation {
    pub fn new(page_index: usize, kind: AnnotationKind) -> Self {
        Self {
            id: AnnotationId::new(),
            page_index,
            kind,
        }
    }
}

// -- Tools --------------------------------------------------------------------

/// The drawing tool currently selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Pixelate,
    Blur,
    OpaqueFill,
    StrokeRect,
    Freehand,
    Text,
}

impl Tool {
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::Pixelate | Self::Blur | Self::OpaqueFill)
    }

    /// Text labels are placed with a click; every other tool is dragged.
    pub fn is_click_tool(&self) -> bool {
        matches!(self, Self::Text)
    }
}

/// Parameters the active tool stamps onto new annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    pub tool: Tool,
    pub color: Color,
    /// Stroke width in document units.
    pub stroke_width: f64,
    /// Font size in document units.
    pub font_size: f64,
    /// Initial content for new text labels.
    pub text: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: Tool::Pixelate,
            color: Color::BLACK,
            stroke_width: 2.0,
            font_size: 12.0,
            text: "Text".into(),
        }
    }
}

impl ToolSettings {
    /// Annotation this tool produces for a document-space box.
    ///
    /// Returns `None` for the freehand tool, which needs a point path.
    pub fn annotation_for_rect(&self, rect: DocRect) -> Option<AnnotationKind> {
        let kind = match self.tool {
            Tool::Pixelate => AnnotationKind::Pixelate { rect },
            Tool::Blur => AnnotationKind::Blur { rect },
            Tool::OpaqueFill => AnnotationKind::OpaqueFill {
                rect,
                color: self.color,
            },
            Tool::StrokeRect => AnnotationKind::StrokeRect {
                rect,
                color: self.color,
                width: self.stroke_width,
            },
            Tool::Text => AnnotationKind::TextLabel {
                rect,
                text: self.text.clone(),
                font_size: self.font_size,
                color: self.color,
            },
            Tool::Freehand => return None,
        };
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colours_parse_with_and_without_hash() {
        assert_eq!(Color::from_hex("#ff8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(Color::from_hex("000000"), Some(Color::BLACK));
        assert_eq!(Color::from_hex("#fff"), None);
        assert_eq!(Color::rgb(1, 2, 255).to_string(), "#0102ff");
    }

    #[test]
    fn doc_rect_corners_are_bottom_left_based() {
        let rect = DocRect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.top_left(), DocPoint::new(10.0, 60.0));
        assert_eq!(rect.bottom_right(), DocPoint::new(40.0, 20.0));
    }

    #[test]
    fn enclosure_includes_shared_edges() {
        let outer = DocRect::new(0.0, 0.0, 100.0, 50.0);
        assert!(outer.encloses(&DocRect::new(0.0, 10.0, 100.0, 40.0)));
        assert!(!outer.encloses(&DocRect::new(90.0, 10.0, 20.0, 5.0)));
    }

    #[test]
    fn intersection_of_disjoint_rects_is_none() {
        let a = DocRect::new(0.0, 0.0, 10.0, 10.0);
        let b = DocRect::new(10.0, 0.0, 10.0, 10.0);
        assert!(a.intersection(&b).is_none());
        let c = DocRect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersection(&c), Some(DocRect::new(5.0, 5.0, 5.0, 5.0)));
    }

    #[test]
    fn freehand_bounds_include_stroke_width() {
        let kind = AnnotationKind::FreehandStroke {
            points: vec![DocPoint::new(10.0, 10.0), DocPoint::new(30.0, 50.0)],
            color: Color::RED,
            width: 4.0,
        };
        assert_eq!(kind.bounds(), DocRect::new(8.0, 8.0, 24.0, 44.0));
        assert!(!kind.is_destructive());
        assert!(kind.rect().is_none());
    }

    #[test]
    fn annotation_kind_json_is_tagged() {
        let kind = AnnotationKind::OpaqueFill {
            rect: DocRect::new(1.0, 2.0, 3.0, 4.0),
            color: Color::BLACK,
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "opaque_fill");
        let back: AnnotationKind = serde_json::from_value(json).unwrap();
        assert_eq!(back, kind);
    }

    #[test]
    fn freehand_tool_has_no_box_annotation() {
        let settings = ToolSettings {
            tool: Tool::Freehand,
            ..ToolSettings::default()
        };
        assert!(settings.annotation_for_rect(DocRect::new(0.0, 0.0, 1.0, 1.0)).is_none());
    }
}
