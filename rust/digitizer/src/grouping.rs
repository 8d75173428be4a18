// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Apartment outlines from groups of adjacent rooms.
//!
//! Rooms drawn with vertex snapping share exact endpoints, so a wall between
//! two selected rooms appears once in each room's ring, in opposite
//! directions. Counting edges by their unordered endpoint pair separates:
//!
//! - **exterior** edges: seen exactly once, kept
//! - **interior** edges: seen twice or more, dropped
//!
//! The exterior edges are then walked tail-to-head into rings. A selection
//! whose exterior edges do not form one loop is reported through
//! [`BoundaryStatus`] rather than patched up.

use rustc_hash::FxHashMap;

use crate::types::{ApartmentBoundary, BoundaryStatus, Point2D, Room, RoomType};

/// Directed polygon edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub start: Point2D,
    pub end: Point2D,
}

impl Edge {
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    fn touches(&self, p: &Point2D) -> bool {
        self.start.same_as(p) || self.end.same_as(p)
    }

    /// Endpoint opposite to `p` (assumes `touches(p)`)
    fn far_end(&self, p: &Point2D) -> Point2D {
        if self.start.same_as(p) {
            self.end
        } else {
            self.start
        }
    }
}

type PointKey = (u64, u64);
type EdgeKey = (PointKey, PointKey);

fn point_key(p: &Point2D) -> PointKey {
    // Adding 0.0 folds -0.0 into 0.0 so both hash alike
    ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits())
}

/// Orientation-independent key of an edge
fn edge_key(edge: &Edge) -> EdgeKey {
    let a = point_key(&edge.start);
    let b = point_key(&edge.end);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Directed edges of a ring, including the wrap-around edge
///
/// Zero-length edges (such as the wrap-around of a ring that already
/// repeats its first point) are skipped.
pub fn polygon_edges(points: &[Point2D]) -> Vec<Edge> {
    let n = points.len();
    (0..n)
        .map(|i| Edge::new(points[i], points[(i + 1) % n]))
        .filter(|e| !e.start.same_as(&e.end))
        .collect()
}

/// Edges that occur exactly once, in first-seen order and orientation
pub fn exterior_edges(edges: &[Edge]) -> Vec<Edge> {
    let mut order: Vec<(EdgeKey, Edge)> = Vec::with_capacity(edges.len());
    let mut counts: FxHashMap<EdgeKey, usize> = FxHashMap::default();

    for edge in edges {
        let key = edge_key(edge);
        let count = counts.entry(key).or_insert(0);
        if *count == 0 {
            order.push((key, *edge));
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter(|(key, _)| counts.get(key) == Some(&1))
        .map(|(_, edge)| edge)
        .collect()
}

/// Walk edges into rings, following any unused edge that touches the tail
pub fn trace_rings(mut pool: Vec<Edge>) -> ApartmentBoundary {
    let mut rings = Vec::new();
    let mut forced_closure = false;

    while !pool.is_empty() {
        let first = pool.remove(0);
        let mut ring = vec![first.start, first.end];
        let mut tail = first.end;

        while let Some(index) = pool.iter().position(|e| e.touches(&tail)) {
            let next = pool.remove(index).far_end(&tail);
            if !next.same_as(&tail) {
                ring.push(next);
                tail = next;
            }
        }

        if !ring[0].same_as(&tail) {
            ring.push(ring[0]);
            forced_closure = true;
        }
        rings.push(ring);
    }

    let status = match rings.len() {
        0 => BoundaryStatus::Empty,
        1 if forced_closure => BoundaryStatus::Unclosed,
        1 => BoundaryStatus::Closed,
        components => BoundaryStatus::Disconnected { components },
    };

    ApartmentBoundary { rings, status }
}

/// Outline and room-type union of a group of rooms
#[derive(Debug, Clone, PartialEq)]
pub struct Grouping {
    pub boundary: ApartmentBoundary,
    /// Member room types in first-seen order
    pub room_types: Vec<RoomType>,
}

/// Merge rooms into one outline by eliminating their shared edges
pub fn group_rooms<'a>(rooms: impl IntoIterator<Item = &'a Room>) -> Grouping {
    let mut edges = Vec::new();
    let mut room_types: Vec<RoomType> = Vec::new();

    for room in rooms {
        edges.extend(polygon_edges(&room.points));
        if !room_types.contains(&room.room_type) {
            room_types.push(room.room_type.clone());
        }
    }

    Grouping {
        boundary: trace_rings(exterior_edges(&edges)),
        room_types,
    }
}
