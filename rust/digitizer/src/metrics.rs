// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Real-world lengths and areas from drawing-space points

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::types::Point2D;

/// Real-world units per drawing-space unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    /// Scale used for display while no calibration exists
    pub const UNCALIBRATED: ScaleFactor = ScaleFactor(1.0);

    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(Error::InvalidDistance(value.to_string()))
        }
    }

    /// Scale from a segment of `pixel_length` that measures `real_length`
    pub fn from_calibration(pixel_length: f64, real_length: f64) -> Result<Self> {
        if !(real_length.is_finite() && real_length > 0.0) {
            return Err(Error::InvalidDistance(real_length.to_string()));
        }
        if !(pixel_length.is_finite() && pixel_length > 0.0) {
            return Err(Error::InvalidDistance(pixel_length.to_string()));
        }
        Self::new(real_length / pixel_length)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1 px = {:.4} units", self.0)
    }
}

/// Parse operator input as a strictly positive, finite number
pub fn parse_positive(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Euclidean distance in drawing units
pub fn pixel_distance(a: &Point2D, b: &Point2D) -> f64 {
    a.distance_to(b)
}

/// Real-world length of the segment `a`–`b`
pub fn real_length(a: &Point2D, b: &Point2D, scale: ScaleFactor) -> f64 {
    pixel_distance(a, b) * scale.value()
}

/// Shoelace area of a polygon, independent of orientation
///
/// The ring may or may not repeat its first point; a repeated closing
/// point contributes a zero-length edge. Fewer than three points give 0.
pub fn polygon_area(points: &[Point2D]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let current = &points[i];
        let next = &points[(i + 1) % n];
        area += current.x * next.y - next.x * current.y;
    }

    area.abs() / 2.0
}

/// Area of the polygon after converting every point to real-world units
pub fn real_area(points: &[Point2D], scale: ScaleFactor) -> f64 {
    let scaled: Vec<Point2D> = points.iter().map(|p| p.scaled(scale.value())).collect();
    polygon_area(&scaled)
}

/// Arithmetic mean of the points (tag anchor)
pub fn centroid(points: &[Point2D]) -> Point2D {
    if points.is_empty() {
        return Point2D::new(0.0, 0.0);
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point2D::new(sx / n, sy / n)
}

/// Segment lengths and enclosed area of a ring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingMetrics {
    /// Real-world length of each consecutive point pair
    pub segment_lengths: Vec<f64>,
    /// Real-world enclosed area
    pub area: f64,
}

impl RingMetrics {
    pub fn perimeter(&self) -> f64 {
        self.segment_lengths.iter().sum()
    }
}

/// Measure a ring, falling back to 1:1 while no scale is calibrated
pub fn measure(points: &[Point2D], scale: Option<ScaleFactor>) -> RingMetrics {
    let scale = scale.unwrap_or(ScaleFactor::UNCALIBRATED);
    RingMetrics {
        segment_lengths: points
            .windows(2)
            .map(|w| real_length(&w[0], &w[1], scale))
            .collect(),
        area: real_area(points, scale),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn unit_square() -> Vec<Point2D> {
        vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(0.0, 0.0),
        ]
    }

    #[test]
    fn unit_square_at_scale_two_has_area_four() {
        let scale = ScaleFactor::new(2.0).unwrap();
        assert_relative_eq!(real_area(&unit_square(), scale), 4.0);
        assert_relative_eq!(polygon_area(&unit_square()) * 2.0 * 2.0, 4.0);
    }

    #[test]
    fn degenerate_polygons_have_zero_area() {
        assert_eq!(polygon_area(&[]), 0.0);
        assert_eq!(
            polygon_area(&[Point2D::new(0.0, 0.0), Point2D::new(5.0, 5.0)]),
            0.0
        );
    }

    #[test]
    fn calibration_from_first_segment() {
        let scale = ScaleFactor::from_calibration(100.0, 5.0).unwrap();
        assert_relative_eq!(scale.value(), 0.05);

        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(30.0, 40.0);
        assert_relative_eq!(real_length(&a, &b, scale), 2.5);
    }

    #[test]
    fn calibration_rejects_non_positive_lengths() {
        assert!(ScaleFactor::from_calibration(100.0, 0.0).is_err());
        assert!(ScaleFactor::from_calibration(100.0, -2.0).is_err());
        assert!(ScaleFactor::from_calibration(0.0, 2.0).is_err());
    }

    #[test]
    fn parse_positive_accepts_only_positive_numbers() {
        assert_eq!(parse_positive(" 4.5 "), Some(4.5));
        assert_eq!(parse_positive("abc"), None);
        assert_eq!(parse_positive("0"), None);
        assert_eq!(parse_positive("-1"), None);
        assert_eq!(parse_positive("inf"), None);
        assert_eq!(parse_positive(""), None);
    }

    #[test]
    fn measure_falls_back_to_one_to_one() {
        let m = measure(&unit_square(), None);
        assert_eq!(m.segment_lengths, vec![1.0, 1.0, 1.0, 1.0]);
        assert_relative_eq!(m.area, 1.0);
        assert_relative_eq!(m.perimeter(), 4.0);
    }

    #[test]
    fn centroid_of_square_ring_includes_closing_point() {
        let c = centroid(&unit_square());
        assert_relative_eq!(c.x, 0.4);
        assert_relative_eq!(c.y, 0.4);
    }

    proptest! {
        #[test]
        fn area_ignores_orientation_and_is_repeatable(
            coords in proptest::collection::vec((-500.0..500.0f64, -500.0..500.0f64), 3..12)
        ) {
            let points: Vec<Point2D> = coords.iter().map(|&(x, y)| Point2D::new(x, y)).collect();
            let mut reversed = points.clone();
            reversed.reverse();

            let first = polygon_area(&points);
            prop_assert_eq!(first, polygon_area(&points));
            prop_assert!((first - polygon_area(&reversed)).abs() <= 1e-6 * first.max(1.0));
            prop_assert!(first >= 0.0);
        }
    }
}
