// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for floor plan digitizing

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D point in drawing space (unscaled, unpanned page pixels)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_nalgebra(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn from_nalgebra(p: &Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        let d: Vector2<f64> = other.to_nalgebra() - self.to_nalgebra();
        d.norm()
    }

    /// Same point with both coordinates multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Exact coordinate equality, treating `-0.0` and `0.0` as equal
    pub fn same_as(&self, other: &Point2D) -> bool {
        self.x == other.x && self.y == other.y
    }
}

/// Room classification chosen by the operator before closing a polyline
///
/// Unknown strings from a restored snapshot are kept verbatim in
/// [`RoomType::Other`] so that they round-trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoomType {
    #[default]
    LivingRoom,
    Kitchen,
    Bathroom,
    Bedroom,
    Corridor,
    Core,
    Other(String),
}

impl RoomType {
    /// The room types offered by the tool, in menu order
    pub const KNOWN: [RoomType; 6] = [
        RoomType::LivingRoom,
        RoomType::Kitchen,
        RoomType::Bathroom,
        RoomType::Bedroom,
        RoomType::Corridor,
        RoomType::Core,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            RoomType::LivingRoom => "living_room",
            RoomType::Kitchen => "kitchen",
            RoomType::Bathroom => "bathroom",
            RoomType::Bedroom => "bedroom",
            RoomType::Corridor => "corridor",
            RoomType::Core => "core",
            RoomType::Other(name) => name,
        }
    }
}

impl From<String> for RoomType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "living_room" => RoomType::LivingRoom,
            "kitchen" => RoomType::Kitchen,
            "bathroom" => RoomType::Bathroom,
            "bedroom" => RoomType::Bedroom,
            "corridor" => RoomType::Corridor,
            "core" => RoomType::Core,
            _ => RoomType::Other(value),
        }
    }
}

impl From<&str> for RoomType {
    fn from(value: &str) -> Self {
        RoomType::from(value.to_string())
    }
}

impl From<RoomType> for String {
    fn from(value: RoomType) -> Self {
        match value {
            RoomType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifier of a finalized room, never reused within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room-{}", self.0)
    }
}

/// Sequential apartment number, starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApartmentId(pub u32);

impl fmt::Display for ApartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Apartment {}", self.0)
    }
}

/// A finalized closed polyline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: RoomId,
    /// Click-ordered ring; the last point is an exact copy of the first
    pub points: Vec<Point2D>,
    pub room_type: RoomType,
}

impl Room {
    /// Number of wall segments (consecutive point pairs)
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Consecutive point pairs of the ring
    pub fn segments(&self) -> impl Iterator<Item = (Point2D, Point2D)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }
}

/// Label placed at a room's centroid, used to pick rooms for apartments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomTag {
    pub room: RoomId,
    pub position: Point2D,
    pub room_type: RoomType,
    pub selected: bool,
    pub apartment: Option<ApartmentId>,
}

/// How well the exterior edges of a grouping closed up
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BoundaryStatus {
    /// A single ring that returned to its start on its own
    Closed,
    /// A single ring that had to be closed by appending its start point
    Unclosed,
    /// The exterior edges form more than one ring
    Disconnected { components: usize },
    /// No exterior edges at all
    Empty,
}

impl BoundaryStatus {
    pub fn is_closed(&self) -> bool {
        matches!(self, BoundaryStatus::Closed)
    }
}

/// Boundary derived from the exterior edges of grouped rooms
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApartmentBoundary {
    /// Traced rings; each ends with a copy of its first point
    pub rings: Vec<Vec<Point2D>>,
    pub status: BoundaryStatus,
}

impl ApartmentBoundary {
    /// The first traced ring, which is the apartment outline when closed
    pub fn outline(&self) -> &[Point2D] {
        self.rings.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct vertices of the outline (closing duplicate dropped)
    pub fn vertices(&self) -> &[Point2D] {
        let outline = self.outline();
        match (outline.first(), outline.last()) {
            (Some(first), Some(last)) if outline.len() > 1 && first.same_as(last) => {
                &outline[..outline.len() - 1]
            }
            _ => outline,
        }
    }
}

/// Operator-defined group of rooms
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Apartment {
    pub id: ApartmentId,
    pub members: Vec<RoomId>,
    pub boundary: ApartmentBoundary,
    /// Member room types in first-seen order, without duplicates
    pub room_types: Vec<RoomType>,
}

impl Apartment {
    /// Comma-separated room types, as shown next to the apartment
    pub fn room_type_summary(&self) -> String {
        self.room_types
            .iter()
            .map(RoomType::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
