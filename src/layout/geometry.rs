//! Spatial value types and the math shared by every facet: points,
//! dimensions, rectangles, distance, AABB collision, and clipping. All
//! types are plain `Copy` values; validation rejects NaN and infinity at
//! the facet boundaries so the math below can assume finite inputs.

use serde::{Deserialize, Serialize};

use crate::layout::errors::LayoutError;

/// A position in board coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Dimensions {
        Dimensions { width, height }
    }

    /// Finite and non-negative on both axes.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// Strictly positive on both axes (and finite).
    pub fn is_positive(&self) -> bool {
        self.is_valid() && self.width > 0.0 && self.height > 0.0
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub origin: Point,
    pub size: Dimensions,
}

impl Rectangle {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Rectangle {
        Rectangle {
            origin: Point::new(x, y),
            size: Dimensions::new(width, height),
        }
    }

    pub fn right(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> f64 {
        self.origin.y + self.size.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// Standard AABB overlap; touching edges do not collide.
    pub fn collides(&self, other: &Rectangle) -> bool {
        self.origin.x < other.right()
            && other.origin.x < self.right()
            && self.origin.y < other.bottom()
            && other.origin.y < self.bottom()
    }

    /// True when `other` lies fully inside this rectangle (edges inclusive).
    pub fn contains_rect(&self, other: &Rectangle) -> bool {
        other.origin.x >= self.origin.x
            && other.origin.y >= self.origin.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Clip this rectangle to `container` on both axes.
    pub fn clip_to(&self, container: &Rectangle) -> Rectangle {
        let x = self.origin.x.max(container.origin.x);
        let y = self.origin.y.max(container.origin.y);
        let right = self.right().min(container.right());
        let bottom = self.bottom().min(container.bottom());
        Rectangle::new(x, y, (right - x).max(0.0), (bottom - y).max(0.0))
    }

    pub fn is_valid(&self) -> bool {
        self.origin.is_finite() && self.size.is_valid()
    }
}

/// Placement request for [`calculate_bounds`]: a size at an offset inside a
/// container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsSpec {
    pub size: Dimensions,
    pub offset: Point,
}

/// Resolve a placement request against a container, clipping the result to
/// the container on both axes. Rejects NaN, infinite, or negative inputs.
pub fn calculate_bounds(
    spec: &BoundsSpec,
    container: &Rectangle,
) -> Result<Rectangle, LayoutError> {
    if !spec.size.is_valid() {
        return Err(LayoutError::invalid_input(
            "calculate-bounds",
            format!("size {}x{} is not finite non-negative", spec.size.width, spec.size.height),
        ));
    }
    if !spec.offset.is_finite() {
        return Err(LayoutError::invalid_input(
            "calculate-bounds",
            format!("offset ({}, {}) is not finite", spec.offset.x, spec.offset.y),
        ));
    }
    if !container.is_valid() {
        return Err(LayoutError::invalid_input(
            "calculate-bounds",
            "container rectangle is not finite",
        ));
    }

    let absolute = Rectangle {
        origin: Point::new(
            container.origin.x + spec.offset.x,
            container.origin.y + spec.offset.y,
        ),
        size: spec.size,
    };
    Ok(absolute.clip_to(container))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3-4-5 triangle.
    #[test]
    fn test_distance() {
        let d = Point::new(0.0, 0.0).distance(&Point::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-9);
    }

    /// Overlap collides; touching edges do not.
    #[test]
    fn test_collides() {
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let overlapping = Rectangle::new(5.0, 5.0, 10.0, 10.0);
        let touching = Rectangle::new(10.0, 0.0, 10.0, 10.0);
        let apart = Rectangle::new(20.0, 20.0, 5.0, 5.0);

        assert!(a.collides(&overlapping));
        assert!(!a.collides(&touching));
        assert!(!a.collides(&apart));
    }

    /// Containment is edge-inclusive.
    #[test]
    fn test_contains_rect() {
        let outer = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains_rect(&Rectangle::new(0.0, 0.0, 100.0, 100.0)));
        assert!(outer.contains_rect(&Rectangle::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!outer.contains_rect(&Rectangle::new(90.0, 90.0, 20.0, 20.0)));
    }

    /// calculate_bounds clips to the container on both axes.
    #[test]
    fn test_calculate_bounds_clips() {
        let container = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        let spec = BoundsSpec {
            size: Dimensions::new(50.0, 50.0),
            offset: Point::new(80.0, 90.0),
        };
        let bounds = calculate_bounds(&spec, &container).unwrap();
        assert_eq!(bounds, Rectangle::new(80.0, 90.0, 20.0, 10.0));
    }

    /// NaN, infinity, and negative sizes are rejected.
    #[test]
    fn test_calculate_bounds_rejects() {
        let container = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        let bad_sizes = [
            Dimensions::new(f64::NAN, 10.0),
            Dimensions::new(f64::INFINITY, 10.0),
            Dimensions::new(-1.0, 10.0),
        ];
        for size in bad_sizes {
            let spec = BoundsSpec {
                size,
                offset: Point::new(0.0, 0.0),
            };
            assert!(calculate_bounds(&spec, &container).is_err());
        }

        let spec = BoundsSpec {
            size: Dimensions::new(10.0, 10.0),
            offset: Point::new(f64::NAN, 0.0),
        };
        assert!(calculate_bounds(&spec, &container).is_err());
    }

    /// Zero-size dimensions are valid but not positive.
    #[test]
    fn test_dimension_validity() {
        assert!(Dimensions::new(0.0, 0.0).is_valid());
        assert!(!Dimensions::new(0.0, 0.0).is_positive());
        assert!(Dimensions::new(1.0, 1.0).is_positive());
        assert!(!Dimensions::new(f64::NAN, 1.0).is_valid());
    }
}
