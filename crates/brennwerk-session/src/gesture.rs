// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pointer gesture state machine: Idle -> Dragging -> Idle.
//
// Gestures arrive in device pixels and leave as document-space annotation
// kinds. A release either commits, is rejected with a `TransformError`
// (degenerate or off-page), or is ignored because nothing was in progress.

use brennwerk_core::{
    AnnotationKind, DevicePoint, DocPoint, DocRect, Tool, ToolSettings, TransformError,
};
use brennwerk_document::effects::estimated_text_width;
use brennwerk_document::geometry::{Viewport, accept_stroke, drag_to_document};
use brennwerk_document::overlay::PendingShape;

/// Line height of a text label relative to its font size.
const TEXT_LINE_FACTOR: f64 = 1.2;

/// A drag in progress on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Drag {
    pub page_index: usize,
    pub tool: Tool,
    pub start: DevicePoint,
    pub current: DevicePoint,
    /// Document-space path, only filled for the freehand tool.
    pub trail: Vec<DocPoint>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(Drag),
}

/// Result of releasing the pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    Committed {
        page_index: usize,
        kind: AnnotationKind,
    },
    Rejected(TransformError),
    Ignored,
}

impl GestureState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Dragging(_))
    }

    /// Page of the gesture in progress.
    pub fn page_index(&self) -> Option<usize> {
        match self {
            Self::Dragging(drag) => Some(drag.page_index),
            Self::Idle => None,
        }
    }

    /// Start a gesture, replacing any unfinished one.
    pub fn begin(&mut self, page_index: usize, tool: Tool, point: DevicePoint, viewport: &Viewport) {
        let trail = if tool == Tool::Freehand {
            vec![viewport.to_document(point)]
        } else {
            Vec::new()
        };
        *self = Self::Dragging(Drag {
            page_index,
            tool,
            start: point,
            current: point,
            trail,
        });
    }

    pub fn update(&mut self, point: DevicePoint, viewport: &Viewport) {
        let Self::Dragging(drag) = self else {
            return;
        };
        drag.current = point;
        if drag.tool == Tool::Freehand {
            push_distinct(&mut drag.trail, viewport.to_document(point));
        }
    }

    /// Release the pointer at `point` and return to `Idle`.
    pub fn finish(
        &mut self,
        point: DevicePoint,
        viewport: &Viewport,
        settings: &ToolSettings,
        min_px: f64,
    ) -> GestureOutcome {
        let Self::Dragging(mut drag) = std::mem::take(self) else {
            return GestureOutcome::Ignored;
        };
        drag.current = point;

        let kind = match drag.tool {
            Tool::Text => text_box(viewport, point, settings).map(|rect| AnnotationKind::TextLabel {
                rect,
                text: settings.text.clone(),
                font_size: settings.font_size,
                color: settings.color,
            }),
            Tool::Freehand => {
                push_distinct(&mut drag.trail, viewport.to_document(point));
                accept_stroke(viewport, &drag.trail).map(|points| AnnotationKind::FreehandStroke {
                    points,
                    color: settings.color,
                    width: settings.stroke_width,
                })
            }
            tool => drag_to_document(viewport, drag.start, point, min_px).map(|rect| {
                ToolSettings {
                    tool,
                    ..settings.clone()
                }
                .annotation_for_rect(rect)
                .unwrap_or(AnnotationKind::Pixelate { rect })
            }),
        };

        match kind {
            Ok(kind) => GestureOutcome::Committed {
                page_index: drag.page_index,
                kind,
            },
            Err(err) => GestureOutcome::Rejected(err),
        }
    }

    /// Drop an unfinished gesture. Returns whether one was in progress.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        *self = Self::Idle;
        was_active
    }

    /// Preview of the gesture in progress, in document space.
    pub fn pending(&self, viewport: &Viewport, settings: &ToolSettings) -> Option<PendingShape> {
        let Self::Dragging(drag) = self else {
            return None;
        };
        match drag.tool {
            Tool::Text => None,
            Tool::Freehand => Some(PendingShape::Trail {
                points: drag.trail.clone(),
                color: settings.color,
            }),
            tool => {
                let a = viewport.to_document(drag.start);
                let b = viewport.to_document(drag.current);
                Some(PendingShape::Box {
                    rect: DocRect::from_corners(a, b),
                    tool,
                    color: settings.color,
                })
            }
        }
    }
}

fn push_distinct(trail: &mut Vec<DocPoint>, point: DocPoint) {
    if trail.last() != Some(&point) {
        trail.push(point);
    }
}

/// Box of a text label whose top-left corner is the clicked point.
fn text_box(
    viewport: &Viewport,
    click: DevicePoint,
    settings: &ToolSettings,
) -> Result<DocRect, TransformError> {
    let top_left = viewport.to_document(click);
    let height = settings.font_size * TEXT_LINE_FACTOR;
    let width = estimated_text_width(settings.text.chars().count().max(1), settings.font_size);
    viewport.clip_to_page(&DocRect::new(top_left.x, top_left.y - height, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use brennwerk_core::Color;

    fn viewport() -> Viewport {
        Viewport::new(200.0, 100.0, 2.0).unwrap()
    }

    fn settings(tool: Tool) -> ToolSettings {
        ToolSettings {
            tool,
            color: Color::RED,
            ..ToolSettings::default()
        }
    }

    fn drag(tool: Tool, from: (f64, f64), to: (f64, f64)) -> GestureOutcome {
        let vp = viewport();
        let mut state = GestureState::default();
        state.begin(0, tool, DevicePoint::new(from.0, from.1), &vp);
        state.update(DevicePoint::new(to.0, to.1), &vp);
        state.finish(DevicePoint::new(to.0, to.1), &vp, &settings(tool), 5.0)
    }

    #[test]
    fn small_drag_is_rejected_large_drag_commits() {
        assert!(matches!(
            drag(Tool::Pixelate, (10.0, 10.0), (13.0, 13.0)),
            GestureOutcome::Rejected(TransformError::Degenerate { .. })
        ));
        match drag(Tool::Pixelate, (10.0, 10.0), (20.0, 20.0)) {
            GestureOutcome::Committed { page_index, kind } => {
                assert_eq!(page_index, 0);
                // Device (10,10)-(20,20) at scale 2 on a 100-unit-high page.
                assert_eq!(kind, AnnotationKind::Pixelate { rect: DocRect::new(5.0, 90.0, 5.0, 5.0) });
            }
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn drag_direction_does_not_matter() {
        let forward = drag(Tool::OpaqueFill, (10.0, 10.0), (60.0, 40.0));
        let backward = drag(Tool::OpaqueFill, (60.0, 40.0), (10.0, 10.0));
        assert_eq!(forward, backward);
    }

    #[test]
    fn drag_off_the_page_is_clipped() {
        match drag(Tool::StrokeRect, (380.0, 180.0), (500.0, 300.0)) {
            GestureOutcome::Committed { kind, .. } => {
                let rect = kind.rect().unwrap();
                assert!((rect.right() - 200.0).abs() < 1e-9);
                assert!(rect.y.abs() < 1e-9);
            }
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn sliver_left_by_the_page_edge_is_rejected() {
        // Device (-40, 196)-(60, 260) keeps only 4 px (2 units) of height.
        assert!(matches!(
            drag(Tool::Pixelate, (-40.0, 196.0), (60.0, 260.0)),
            GestureOutcome::Rejected(TransformError::Degenerate { .. })
        ));
    }

    #[test]
    fn freehand_running_off_the_page_is_clamped() {
        let vp = viewport();
        let mut state = GestureState::default();
        state.begin(0, Tool::Freehand, DevicePoint::new(20.0, 20.0), &vp);
        state.update(DevicePoint::new(4_000_000.0, 20.0), &vp);
        let outcome = state.finish(DevicePoint::new(4_000_000.0, 20.0), &vp, &settings(Tool::Freehand), 5.0);
        match outcome {
            GestureOutcome::Committed {
                kind: AnnotationKind::FreehandStroke { points, .. },
                ..
            } => assert_eq!(points, vec![DocPoint::new(10.0, 90.0), DocPoint::new(200.0, 90.0)]),
            other => panic!("expected stroke, got {other:?}"),
        }
    }

    #[test]
    fn freehand_needs_two_distinct_points() {
        assert_eq!(
            drag(Tool::Freehand, (10.0, 10.0), (10.0, 10.0)),
            GestureOutcome::Rejected(TransformError::TooFewPoints(1))
        );

        let vp = viewport();
        let mut state = GestureState::default();
        state.begin(0, Tool::Freehand, DevicePoint::new(0.0, 0.0), &vp);
        state.update(DevicePoint::new(20.0, 0.0), &vp);
        state.update(DevicePoint::new(20.0, 0.0), &vp);
        let outcome = state.finish(DevicePoint::new(20.0, 40.0), &vp, &settings(Tool::Freehand), 5.0);
        match outcome {
            GestureOutcome::Committed {
                kind: AnnotationKind::FreehandStroke { points, color, .. },
                ..
            } => {
                assert_eq!(points.len(), 3);
                assert_eq!(points[0], DocPoint::new(0.0, 100.0));
                assert_eq!(color, Color::RED);
            }
            other => panic!("expected stroke, got {other:?}"),
        }
        assert!(!state.is_active());
    }

    #[test]
    fn text_commits_on_click() {
        let outcome = drag(Tool::Text, (20.0, 20.0), (20.0, 20.0));
        match outcome {
            GestureOutcome::Committed {
                kind: AnnotationKind::TextLabel { rect, text, .. },
                ..
            } => {
                assert_eq!(text, "Text");
                assert!((rect.top() - 90.0).abs() < 1e-9);
                assert!((rect.height - 14.4).abs() < 1e-9);
            }
            other => panic!("expected label, got {other:?}"),
        }
    }

    #[test]
    fn finish_without_begin_is_ignored() {
        let mut state = GestureState::default();
        let outcome = state.finish(
            DevicePoint::new(1.0, 1.0),
            &viewport(),
            &ToolSettings::default(),
            5.0,
        );
        assert_eq!(outcome, GestureOutcome::Ignored);
    }

    #[test]
    fn cancel_returns_to_idle_and_clears_preview() {
        let vp = viewport();
        let mut state = GestureState::default();
        state.begin(3, Tool::Blur, DevicePoint::new(0.0, 0.0), &vp);
        state.update(DevicePoint::new(40.0, 40.0), &vp);
        assert_eq!(state.page_index(), Some(3));
        assert!(matches!(
            state.pending(&vp, &settings(Tool::Blur)),
            Some(PendingShape::Box { tool: Tool::Blur, .. })
        ));
        assert!(state.cancel());
        assert!(!state.cancel());
        assert!(state.pending(&vp, &settings(Tool::Blur)).is_none());
    }
}
