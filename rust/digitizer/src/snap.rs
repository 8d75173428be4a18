// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapping of clicked points onto existing room geometry.

use nalgebra::Vector2;

use crate::types::{Point2D, Room};

/// Where a clicked point ended up after snapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapTarget {
    /// Snapped onto an existing room vertex
    Vertex(Point2D),
    /// Projected onto an existing room segment
    Segment(Point2D),
    /// Nothing within tolerance; the raw point
    Free(Point2D),
}

impl SnapTarget {
    pub fn point(&self) -> Point2D {
        match *self {
            SnapTarget::Vertex(p) | SnapTarget::Segment(p) | SnapTarget::Free(p) => p,
        }
    }

    pub fn is_snapped(&self) -> bool {
        !matches!(self, SnapTarget::Free(_))
    }
}

/// Closest point of segment `a`–`b` to `p`
///
/// A zero-length segment projects everything onto `a`.
pub fn closest_point_on_segment(a: &Point2D, b: &Point2D, p: &Point2D) -> Point2D {
    let ab: Vector2<f64> = b.to_nalgebra() - a.to_nalgebra();
    let ap: Vector2<f64> = p.to_nalgebra() - a.to_nalgebra();
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return *a;
    }
    let t = (ap.dot(&ab) / len_sq).clamp(0.0, 1.0);
    Point2D::from_nalgebra(&(a.to_nalgebra() + ab * t))
}

/// Nearest vertex of any room strictly within `tolerance` of `point`
pub fn closest_vertex(point: &Point2D, rooms: &[Room], tolerance: f64) -> Option<Point2D> {
    let mut best: Option<(f64, Point2D)> = None;
    for vertex in rooms.iter().flat_map(|r| r.points.iter()) {
        let d = point.distance_to(vertex);
        if d < tolerance && best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, *vertex));
        }
    }
    best.map(|(_, p)| p)
}

/// Nearest point on any room segment strictly within `tolerance` of `point`
pub fn closest_point_on_rooms(point: &Point2D, rooms: &[Room], tolerance: f64) -> Option<Point2D> {
    let mut best: Option<(f64, Point2D)> = None;
    for (a, b) in rooms.iter().flat_map(|r| r.segments()) {
        let projected = closest_point_on_segment(&a, &b, point);
        let d = point.distance_to(&projected);
        if d < tolerance && best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, projected));
        }
    }
    best.map(|(_, p)| p)
}

/// Vertex snap first, then segment snap, else the point itself
pub fn snap_point(
    point: Point2D,
    rooms: &[Room],
    vertex_tolerance: f64,
    segment_tolerance: f64,
) -> SnapTarget {
    if let Some(v) = closest_vertex(&point, rooms, vertex_tolerance) {
        return SnapTarget::Vertex(v);
    }
    if let Some(s) = closest_point_on_rooms(&point, rooms, segment_tolerance) {
        return SnapTarget::Segment(s);
    }
    SnapTarget::Free(point)
}

/// Force the segment `previous`–`point` to be horizontal or vertical
///
/// The dominant axis of the movement is kept; ties become vertical.
pub fn constrain_axis(previous: &Point2D, point: Point2D) -> Point2D {
    let dx = (point.x - previous.x).abs();
    let dy = (point.y - previous.y).abs();
    if dx > dy {
        Point2D::new(point.x, previous.y)
    } else {
        Point2D::new(previous.x, point.y)
    }
}

/// Whether `candidate` closes a polyline that starts at `first`
pub fn is_closing(first: &Point2D, candidate: &Point2D, tolerance: f64) -> bool {
    first.distance_to(candidate) < tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RoomId, RoomType};
    use approx::assert_relative_eq;

    fn square(x: f64, y: f64, size: f64) -> Room {
        Room {
            id: RoomId(1),
            points: vec![
                Point2D::new(x, y),
                Point2D::new(x + size, y),
                Point2D::new(x + size, y + size),
                Point2D::new(x, y + size),
                Point2D::new(x, y),
            ],
            room_type: RoomType::Bedroom,
        }
    }

    #[test]
    fn closure_within_tolerance() {
        let first = Point2D::new(0.0, 0.0);
        assert!(is_closing(&first, &Point2D::new(3.0, 4.0), 10.0));
        assert!(!is_closing(&first, &Point2D::new(20.0, 20.0), 10.0));
    }

    #[test]
    fn projection_is_clamped_to_segment() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(10.0, 0.0);
        let p = closest_point_on_segment(&a, &b, &Point2D::new(4.0, 3.0));
        assert_relative_eq!(p.x, 4.0);
        assert_relative_eq!(p.y, 0.0);
        let beyond = closest_point_on_segment(&a, &b, &Point2D::new(15.0, 1.0));
        assert_eq!(beyond, b);
        let degenerate = closest_point_on_segment(&a, &a, &Point2D::new(1.0, 1.0));
        assert_eq!(degenerate, a);
    }

    #[test]
    fn vertex_snap_wins_over_segment_snap() {
        let rooms = vec![square(0.0, 0.0, 100.0)];
        let target = snap_point(Point2D::new(97.0, 2.0), &rooms, 10.0, 5.0);
        assert_eq!(target, SnapTarget::Vertex(Point2D::new(100.0, 0.0)));
    }

    #[test]
    fn segment_snap_when_no_vertex_is_near() {
        let rooms = vec![square(0.0, 0.0, 100.0)];
        let target = snap_point(Point2D::new(50.0, 3.0), &rooms, 10.0, 5.0);
        assert_eq!(target, SnapTarget::Segment(Point2D::new(50.0, 0.0)));
    }

    #[test]
    fn free_point_when_nothing_is_near() {
        let rooms = vec![square(0.0, 0.0, 100.0)];
        let target = snap_point(Point2D::new(50.0, 50.0), &rooms, 10.0, 5.0);
        assert!(!target.is_snapped());
        assert_eq!(target.point(), Point2D::new(50.0, 50.0));
    }

    #[test]
    fn axis_constraint_keeps_dominant_direction() {
        let prev = Point2D::new(10.0, 10.0);
        assert_eq!(
            constrain_axis(&prev, Point2D::new(50.0, 14.0)),
            Point2D::new(50.0, 10.0)
        );
        assert_eq!(
            constrain_axis(&prev, Point2D::new(12.0, 60.0)),
            Point2D::new(10.0, 60.0)
        );
    }
}
