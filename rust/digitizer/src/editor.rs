// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polyline editor state machine.
//!
//! ```text
//!            click                 click (closes)
//!   Idle ───────────► Open ─────────────────────► PendingConfirm
//!    ▲                 │  ▲                              │
//!    │   2nd point,    │  │ answer (valid or not)        │ keep / discard
//!    │   no scale yet  ▼  │                              │
//!    │           PendingCalibration                      │
//!    └───────────────────────────────────────────────────┘
//! ```
//!
//! Operator questions are never answered inline. The editor hands out a
//! [`PromptRequest`] carrying a ticket and refuses further points until the
//! matching answer arrives through [`PolylineEditor::resolve_calibration`]
//! or [`PolylineEditor::resolve_closure`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::metrics::{self, ScaleFactor};
use crate::snap::{self, SnapTarget};
use crate::types::{Point2D, Room};

/// Identifier of an outstanding operator prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptTicket(pub u64);

impl fmt::Display for PromptTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the operator is being asked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromptKind {
    /// Real-world length of the first segment drawn
    Calibration { pixel_length: f64 },
    /// Keep or discard the polyline that just closed
    Closure { candidate: Vec<Point2D> },
}

/// A question the editor is waiting on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub ticket: PromptTicket,
    #[serde(flatten)]
    pub kind: PromptKind,
}

/// Observable editor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorState {
    Idle,
    Open,
    PendingCalibration,
    PendingConfirm,
}

/// Geometry and tolerances a click is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct EditContext<'a> {
    /// Finalized rooms to snap onto
    pub rooms: &'a [Room],
    /// Vertex snap and closure tolerance, drawing units
    pub vertex_tolerance: f64,
    /// Segment snap tolerance, drawing units
    pub segment_tolerance: f64,
    /// Whether the second point must trigger scale calibration
    pub needs_calibration: bool,
}

/// Result of placing a point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    PointAdded { point: Point2D, snapped: bool, points: usize },
    Prompt(PromptRequest),
}

/// Result of answering the calibration prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CalibrationOutcome {
    Calibrated { scale: ScaleFactor },
    /// The answer was not a positive number; the second point was removed
    Rejected { input: String },
}

/// Pointer-move feedback, computed without touching the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    /// Existing geometry the pointer would snap to
    pub snap_target: Option<Point2D>,
    /// Segment from the last placed point to the pointer
    pub rubber_band: Option<(Point2D, Point2D)>,
    /// Whether a click here would close the polyline
    pub would_close: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Pending {
    Calibration {
        ticket: PromptTicket,
        pixel_length: f64,
    },
    Closure {
        ticket: PromptTicket,
        candidate: Vec<Point2D>,
    },
}

impl Pending {
    fn request(&self) -> PromptRequest {
        match self {
            Pending::Calibration {
                ticket,
                pixel_length,
            } => PromptRequest {
                ticket: *ticket,
                kind: PromptKind::Calibration {
                    pixel_length: *pixel_length,
                },
            },
            Pending::Closure { ticket, candidate } => PromptRequest {
                ticket: *ticket,
                kind: PromptKind::Closure {
                    candidate: candidate.clone(),
                },
            },
        }
    }

    fn ticket(&self) -> PromptTicket {
        match self {
            Pending::Calibration { ticket, .. } | Pending::Closure { ticket, .. } => *ticket,
        }
    }
}

/// Distinct vertices a polyline needs before a click can close it
pub const MIN_RING_VERTICES: usize = 3;

/// Accumulates clicked points into an open polyline
#[derive(Debug, Clone, Default)]
pub struct PolylineEditor {
    points: Vec<Point2D>,
    pending: Option<Pending>,
    next_ticket: u64,
}

impl PolylineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EditorState {
        match (&self.pending, self.points.is_empty()) {
            (Some(Pending::Calibration { .. }), _) => EditorState::PendingCalibration,
            (Some(Pending::Closure { .. }), _) => EditorState::PendingConfirm,
            (None, true) => EditorState::Idle,
            (None, false) => EditorState::Open,
        }
    }

    /// Points of the open polyline
    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn pending_prompt(&self) -> Option<PromptRequest> {
        self.pending.as_ref().map(Pending::request)
    }

    fn ensure_ready(&self) -> Result<()> {
        match &self.pending {
            Some(pending) => Err(Error::PromptPending(pending.ticket())),
            None => Ok(()),
        }
    }

    fn issue_ticket(&mut self) -> PromptTicket {
        self.next_ticket += 1;
        PromptTicket(self.next_ticket)
    }

    /// Snap and constrain a drawing-space point the way a click would
    fn resolve_point(&self, raw: Point2D, constrain: bool, ctx: &EditContext<'_>) -> (Point2D, SnapTarget) {
        let target = snap::snap_point(raw, ctx.rooms, ctx.vertex_tolerance, ctx.segment_tolerance);
        let point = match (constrain, self.points.last()) {
            (true, Some(previous)) => snap::constrain_axis(previous, target.point()),
            _ => target.point(),
        };
        (point, target)
    }

    /// Add a drawing-space click to the polyline
    pub fn place(&mut self, raw: Point2D, constrain: bool, ctx: &EditContext<'_>) -> Result<ClickOutcome> {
        self.ensure_ready()?;

        let (point, target) = self.resolve_point(raw, constrain, ctx);
        self.points.push(point);

        if self.points.len() == 2 && ctx.needs_calibration {
            let pixel_length = metrics::pixel_distance(&self.points[0], &self.points[1]);
            let ticket = self.issue_ticket();
            let pending = Pending::Calibration {
                ticket,
                pixel_length,
            };
            let request = pending.request();
            self.pending = Some(pending);
            tracing::debug!(%ticket, pixel_length, "Requesting scale calibration");
            return Ok(ClickOutcome::Prompt(request));
        }

        // The closing click itself is the last entry
        if self.points.len() > MIN_RING_VERTICES
            && snap::is_closing(&self.points[0], &point, ctx.vertex_tolerance)
        {
            let first = self.points[0];
            if let Some(last) = self.points.last_mut() {
                *last = first;
            }
            let candidate = std::mem::take(&mut self.points);
            let ticket = self.issue_ticket();
            let pending = Pending::Closure { ticket, candidate };
            let request = pending.request();
            self.pending = Some(pending);
            tracing::debug!(%ticket, "Polyline closed, awaiting confirmation");
            return Ok(ClickOutcome::Prompt(request));
        }

        Ok(ClickOutcome::PointAdded {
            point,
            snapped: target.is_snapped(),
            points: self.points.len(),
        })
    }

    /// Answer the calibration prompt with the operator's text
    pub fn resolve_calibration(&mut self, ticket: PromptTicket, input: &str) -> Result<CalibrationOutcome> {
        let pixel_length = match &self.pending {
            Some(Pending::Calibration {
                ticket: pending,
                pixel_length,
            }) if *pending == ticket => *pixel_length,
            _ => return Err(Error::UnknownPrompt(ticket)),
        };
        self.pending = None;

        let scale = metrics::parse_positive(input)
            .and_then(|real| ScaleFactor::from_calibration(pixel_length, real).ok());

        match scale {
            Some(scale) => {
                tracing::info!(scale = scale.value(), pixel_length, "Scale factor set");
                Ok(CalibrationOutcome::Calibrated { scale })
            }
            None => {
                self.points.pop();
                tracing::warn!(input, "Rejected calibration input, segment removed");
                Ok(CalibrationOutcome::Rejected {
                    input: input.to_string(),
                })
            }
        }
    }

    /// Answer the closure prompt; returns the closed ring when kept
    pub fn resolve_closure(&mut self, ticket: PromptTicket, keep: bool) -> Result<Option<Vec<Point2D>>> {
        match self.pending.take() {
            Some(Pending::Closure {
                ticket: pending,
                candidate,
            }) if pending == ticket => Ok(keep.then_some(candidate)),
            other => {
                self.pending = other;
                Err(Error::UnknownPrompt(ticket))
            }
        }
    }

    /// Drop an unclosed polyline
    pub fn abandon(&mut self) -> Result<usize> {
        self.ensure_ready()?;
        let dropped = self.points.len();
        self.points.clear();
        Ok(dropped)
    }

    /// Forget points and any outstanding prompt; tickets keep counting
    pub fn reset(&mut self) {
        self.points.clear();
        self.pending = None;
    }

    /// Feedback for a pointer at `raw` (drawing space)
    pub fn preview(&self, raw: Point2D, constrain: bool, ctx: &EditContext<'_>) -> Preview {
        let (point, target) = self.resolve_point(raw, constrain, ctx);
        let rubber_band = self.points.last().map(|last| (*last, point));
        let would_close = self.pending.is_none()
            && self.points.len() >= MIN_RING_VERTICES
            && snap::is_closing(&self.points[0], &point, ctx.vertex_tolerance);
        Preview {
            snap_target: target.is_snapped().then(|| target.point()),
            rubber_band,
            would_close,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(needs_calibration: bool) -> EditContext<'static> {
        EditContext {
            rooms: &[],
            vertex_tolerance: 10.0,
            segment_tolerance: 5.0,
            needs_calibration,
        }
    }

    fn ticket_of(outcome: &ClickOutcome) -> PromptTicket {
        match outcome {
            ClickOutcome::Prompt(request) => request.ticket,
            other => panic!("expected a prompt, got {:?}", other),
        }
    }

    #[test]
    fn second_point_requests_calibration_once() {
        let mut editor = PolylineEditor::new();
        editor.place(Point2D::new(0.0, 0.0), false, &ctx(true)).unwrap();
        let outcome = editor.place(Point2D::new(100.0, 0.0), false, &ctx(true)).unwrap();
        let ticket = ticket_of(&outcome);
        assert_eq!(editor.state(), EditorState::PendingCalibration);

        assert!(matches!(
            editor.place(Point2D::new(100.0, 50.0), false, &ctx(true)),
            Err(Error::PromptPending(t)) if t == ticket
        ));

        let answer = editor.resolve_calibration(ticket, "5").unwrap();
        match answer {
            CalibrationOutcome::Calibrated { scale } => assert!((scale.value() - 0.05).abs() < 1e-12),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(editor.state(), EditorState::Open);
        assert_eq!(editor.points().len(), 2);
    }

    #[test]
    fn invalid_calibration_removes_the_segment() {
        let mut editor = PolylineEditor::new();
        editor.place(Point2D::new(0.0, 0.0), false, &ctx(true)).unwrap();
        let ticket = ticket_of(&editor.place(Point2D::new(100.0, 0.0), false, &ctx(true)).unwrap());

        let answer = editor.resolve_calibration(ticket, "-3").unwrap();
        assert!(matches!(answer, CalibrationOutcome::Rejected { .. }));
        assert_eq!(editor.points(), &[Point2D::new(0.0, 0.0)]);

        // The next second point asks again
        let outcome = editor.place(Point2D::new(0.0, 80.0), false, &ctx(true)).unwrap();
        assert!(matches!(outcome, ClickOutcome::Prompt(_)));
    }

    #[test]
    fn closing_click_snaps_exactly_onto_first_point() {
        let mut editor = PolylineEditor::new();
        for p in [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)] {
            editor.place(Point2D::new(p.0, p.1), false, &ctx(false)).unwrap();
        }
        let outcome = editor.place(Point2D::new(3.0, 4.0), false, &ctx(false)).unwrap();
        let request = match outcome {
            ClickOutcome::Prompt(request) => request,
            other => panic!("expected closure, got {:?}", other),
        };
        match &request.kind {
            PromptKind::Closure { candidate } => {
                assert_eq!(candidate.len(), 4);
                assert_eq!(candidate[3], candidate[0]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(editor.state(), EditorState::PendingConfirm);

        let ring = editor.resolve_closure(request.ticket, true).unwrap();
        assert_eq!(ring.map(|r| r.len()), Some(4));
        assert_eq!(editor.state(), EditorState::Idle);
    }

    #[test]
    fn two_vertices_cannot_close() {
        let mut editor = PolylineEditor::new();
        editor.place(Point2D::new(0.0, 0.0), false, &ctx(false)).unwrap();
        editor.place(Point2D::new(100.0, 0.0), false, &ctx(false)).unwrap();
        assert!(!editor.preview(Point2D::new(2.0, 1.0), false, &ctx(false)).would_close);

        let outcome = editor.place(Point2D::new(2.0, 1.0), false, &ctx(false)).unwrap();
        assert!(matches!(outcome, ClickOutcome::PointAdded { points: 3, .. }));
        assert_eq!(editor.state(), EditorState::Open);

        // A third vertex makes the next click near the start a closure
        let outcome = editor.place(Point2D::new(1.0, 2.0), false, &ctx(false)).unwrap();
        match outcome {
            ClickOutcome::Prompt(PromptRequest {
                kind: PromptKind::Closure { candidate },
                ..
            }) => {
                assert_eq!(candidate.len(), 4);
                assert_eq!(candidate[3], Point2D::new(0.0, 0.0));
            }
            other => panic!("expected closure, got {:?}", other),
        }
    }

    #[test]
    fn reset_keeps_ticket_sequence() {
        let mut editor = PolylineEditor::new();
        editor.place(Point2D::new(0.0, 0.0), false, &ctx(true)).unwrap();
        let first = ticket_of(&editor.place(Point2D::new(10.0, 0.0), false, &ctx(true)).unwrap());
        editor.reset();
        editor.place(Point2D::new(0.0, 0.0), false, &ctx(true)).unwrap();
        let second = ticket_of(&editor.place(Point2D::new(10.0, 0.0), false, &ctx(true)).unwrap());
        assert_ne!(first, second);
        assert!(matches!(
            editor.resolve_calibration(first, "5"),
            Err(Error::UnknownPrompt(t)) if t == first
        ));
    }

    #[test]
    fn far_click_does_not_close() {
        let mut editor = PolylineEditor::new();
        for p in [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (20.0, 20.0)] {
            let outcome = editor.place(Point2D::new(p.0, p.1), false, &ctx(false)).unwrap();
            assert!(matches!(outcome, ClickOutcome::PointAdded { .. }));
        }
        assert_eq!(editor.state(), EditorState::Open);
    }

    #[test]
    fn discard_returns_to_idle_without_ring() {
        let mut editor = PolylineEditor::new();
        for p in [(0.0, 0.0), (50.0, 0.0), (50.0, 50.0)] {
            editor.place(Point2D::new(p.0, p.1), false, &ctx(false)).unwrap();
        }
        let ticket = ticket_of(&editor.place(Point2D::new(1.0, 1.0), false, &ctx(false)).unwrap());
        assert!(editor.resolve_closure(PromptTicket(999), false).is_err());
        assert_eq!(editor.state(), EditorState::PendingConfirm);
        assert_eq!(editor.resolve_closure(ticket, false).unwrap(), None);
        assert_eq!(editor.state(), EditorState::Idle);
    }

    #[test]
    fn constrained_click_copies_previous_axis() {
        let mut editor = PolylineEditor::new();
        editor.place(Point2D::new(10.0, 10.0), false, &ctx(false)).unwrap();
        let outcome = editor.place(Point2D::new(80.0, 13.0), true, &ctx(false)).unwrap();
        assert!(matches!(
            outcome,
            ClickOutcome::PointAdded { point, .. } if point == Point2D::new(80.0, 10.0)
        ));
    }

    #[test]
    fn preview_reports_closure_and_rubber_band() {
        let mut editor = PolylineEditor::new();
        for p in [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)] {
            editor.place(Point2D::new(p.0, p.1), false, &ctx(false)).unwrap();
        }
        let preview = editor.preview(Point2D::new(2.0, 2.0), false, &ctx(false));
        assert!(preview.would_close);
        assert_eq!(
            preview.rubber_band,
            Some((Point2D::new(100.0, 100.0), Point2D::new(2.0, 2.0)))
        );
        assert_eq!(editor.points().len(), 3);
    }

    #[test]
    fn abandon_is_refused_while_prompt_is_open() {
        let mut editor = PolylineEditor::new();
        editor.place(Point2D::new(0.0, 0.0), false, &ctx(true)).unwrap();
        editor.place(Point2D::new(10.0, 0.0), false, &ctx(true)).unwrap();
        assert!(editor.abandon().is_err());
        editor.reset();
        assert_eq!(editor.state(), EditorState::Idle);
    }
}
