//! Drag-drop facet: candidate drop zones near a drag position, drop
//! previews, target containment validation, and snap point computation.
//!
//! Zones open up for visible components whose center is within 100 of the
//! drag position, with priority falling off linearly by distance. Snapping
//! always offers the nearest 8 px grid point at half strength, plus a
//! component snap for every origin within 20, strength rising as the
//! distance closes.

use serde::{Deserialize, Serialize};

use crate::layout::{
    LayoutEngine,
    errors::LayoutError,
    geometry::{Point, Rectangle},
    spec::{ComponentLayout, LayoutSpec},
};

/// Activation radius for drop zones around a drag position.
pub const DROP_ZONE_RADIUS: f64 = 100.0;
/// Activation radius for component snaps.
pub const SNAP_RADIUS: f64 = 20.0;
/// Grid pitch for grid snaps.
pub const SNAP_GRID: f64 = 8.0;

/// Visual feedback a zone requests while hovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropFeedback {
    Highlight,
    Outline,
}

/// A rectangular region accepting a drag payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropZone {
    pub bounds: Rectangle,
    pub target_id: String,
    /// `round(100 − distance)`: closer zones outrank farther ones.
    pub priority: i32,
    pub feedback: DropFeedback,
}

/// Snap point categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapKind {
    Grid,
    Edge,
    Center,
    Component,
}

/// A candidate alignment position with a strength weight in `(0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapPoint {
    pub position: Point,
    pub kind: SnapKind,
    pub strength: f64,
}

/// A drop being considered: which payload lands where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropOperation {
    pub payload_id: String,
    pub target_id: String,
    pub position: Point,
}

/// Predicted outcome of a drop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPreview {
    pub layout: LayoutSpec,
    pub valid: bool,
    pub warnings: Vec<String>,
}

fn ensure_finite_point(op: &'static str, point: Point) -> Result<(), LayoutError> {
    if !point.is_finite() {
        return Err(LayoutError::invalid_input(
            op,
            format!("position ({}, {}) is not finite", point.x, point.y),
        ));
    }
    Ok(())
}

impl LayoutEngine {
    /// Drop zones for every visible component whose center is within
    /// [`DROP_ZONE_RADIUS`] of the drag position.
    pub fn drop_zones(
        &self,
        layout: &LayoutSpec,
        drag_position: Point,
    ) -> Result<Vec<DropZone>, LayoutError> {
        ensure_finite_point("drop-zones", drag_position)?;

        let mut zones = Vec::new();
        for component in &layout.components {
            if !component.visible {
                continue;
            }
            let distance = component.bounds.center().distance(&drag_position);
            if distance > DROP_ZONE_RADIUS {
                continue;
            }
            zones.push(DropZone {
                bounds: component.bounds,
                target_id: component.id.clone(),
                priority: (DROP_ZONE_RADIUS - distance).round() as i32,
                feedback: DropFeedback::Highlight,
            });
        }
        Ok(zones)
    }

    /// Predict the layout after a drop. The baseline preview is the identity
    /// (drop accepted, nothing moved); richer prediction hooks in here.
    pub fn predict_changes(&self, layout: &LayoutSpec, _drop: &DropOperation) -> LayoutPreview {
        LayoutPreview {
            layout: layout.clone(),
            valid: true,
            warnings: Vec::new(),
        }
    }

    /// True iff the target's bounds lie fully inside the layout bounds.
    pub fn validate_drop_target(&self, layout: &LayoutSpec, target: &ComponentLayout) -> bool {
        layout.bounds.contains_rect(&target.bounds)
    }

    /// Snap candidates for a position: the nearest grid point at half
    /// strength, plus a component snap for every origin within
    /// [`SNAP_RADIUS`].
    pub fn snap_points(
        &self,
        layout: &LayoutSpec,
        position: Point,
    ) -> Result<Vec<SnapPoint>, LayoutError> {
        ensure_finite_point("snap-points", position)?;

        let mut points = vec![SnapPoint {
            position: Point::new(
                (position.x / SNAP_GRID).round() * SNAP_GRID,
                (position.y / SNAP_GRID).round() * SNAP_GRID,
            ),
            kind: SnapKind::Grid,
            strength: 0.5,
        }];

        for component in &layout.components {
            let distance = component.bounds.origin.distance(&position);
            if distance < SNAP_RADIUS {
                points.push(SnapPoint {
                    position: component.bounds.origin,
                    kind: SnapKind::Component,
                    strength: 1.0 - distance / SNAP_RADIUS,
                });
            }
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::geometry::Rectangle;

    fn layout_with(components: &[(&str, Rectangle, bool)]) -> LayoutSpec {
        let mut layout = LayoutSpec::new(Rectangle::new(0.0, 0.0, 800.0, 600.0));
        for (id, bounds, visible) in components {
            let mut component = ComponentLayout::new(*id, *bounds);
            component.visible = *visible;
            layout.components.push(component);
        }
        layout
    }

    /// Zones open for nearby visible components; hidden and distant ones
    /// are skipped.
    #[test]
    fn test_drop_zones() {
        let layout = layout_with(&[
            ("near", Rectangle::new(0.0, 0.0, 100.0, 100.0), true), // center (50, 50)
            ("hidden", Rectangle::new(0.0, 0.0, 100.0, 100.0), false),
            ("far", Rectangle::new(500.0, 500.0, 100.0, 100.0), true),
        ]);
        let engine = LayoutEngine::new();

        let zones = engine.drop_zones(&layout, Point::new(50.0, 110.0)).unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].target_id, "near");
        assert_eq!(zones[0].priority, 40); // round(100 - 60)
        assert_eq!(zones[0].feedback, DropFeedback::Highlight);
    }

    /// Non-finite drag positions are rejected.
    #[test]
    fn test_drop_zones_rejects() {
        let engine = LayoutEngine::new();
        let layout = layout_with(&[]);
        assert!(engine
            .drop_zones(&layout, Point::new(f64::NAN, 0.0))
            .is_err());
    }

    /// The baseline preview is the identity with no warnings.
    #[test]
    fn test_predict_changes() {
        let engine = LayoutEngine::new();
        let layout = layout_with(&[("a", Rectangle::new(0.0, 0.0, 10.0, 10.0), true)]);
        let preview = engine.predict_changes(
            &layout,
            &DropOperation {
                payload_id: "task-1".to_string(),
                target_id: "a".to_string(),
                position: Point::new(5.0, 5.0),
            },
        );
        assert!(preview.valid);
        assert!(preview.warnings.is_empty());
        assert_eq!(preview.layout, layout);
    }

    /// Containment decides drop target validity, edges inclusive.
    #[test]
    fn test_validate_drop_target() {
        let engine = LayoutEngine::new();
        let layout = layout_with(&[]);

        let inside = ComponentLayout::new("in", Rectangle::new(700.0, 500.0, 100.0, 100.0));
        let overflowing = ComponentLayout::new("out", Rectangle::new(750.0, 550.0, 100.0, 100.0));
        assert!(engine.validate_drop_target(&layout, &inside));
        assert!(!engine.validate_drop_target(&layout, &overflowing));
    }

    /// Scenario: (105, 98) snaps to grid (104, 96) and component (100, 100).
    #[test]
    fn test_snap_points() {
        let engine = LayoutEngine::new();
        let layout = layout_with(&[("a", Rectangle::new(100.0, 100.0, 50.0, 50.0), true)]);

        let points = engine
            .snap_points(&layout, Point::new(105.0, 98.0))
            .unwrap();
        assert_eq!(points.len(), 2);

        assert_eq!(points[0].kind, SnapKind::Grid);
        assert_eq!(points[0].position, Point::new(104.0, 96.0));
        assert_eq!(points[0].strength, 0.5);

        assert_eq!(points[1].kind, SnapKind::Component);
        assert_eq!(points[1].position, Point::new(100.0, 100.0));
        let expected = 1.0 - (25.0f64 + 4.0).sqrt() / 20.0;
        assert!((points[1].strength - expected).abs() < 1e-9);
    }

    /// An on-grid position yields a grid snap at exactly that point.
    #[test]
    fn test_snap_grid_idempotent() {
        let engine = LayoutEngine::new();
        let layout = layout_with(&[]);
        let points = engine
            .snap_points(&layout, Point::new(104.0, 96.0))
            .unwrap();
        assert_eq!(points[0].position, Point::new(104.0, 96.0));
    }

    /// Component snaps cut off at the radius; strength stays in (0, 1].
    #[test]
    fn test_snap_radius() {
        let engine = LayoutEngine::new();
        let layout = layout_with(&[
            ("at", Rectangle::new(0.0, 0.0, 10.0, 10.0), true),
            ("edge", Rectangle::new(20.0, 0.0, 10.0, 10.0), true),
        ]);

        let points = engine.snap_points(&layout, Point::new(0.0, 0.0)).unwrap();
        let component_snaps: Vec<&SnapPoint> = points
            .iter()
            .filter(|p| p.kind == SnapKind::Component)
            .collect();
        // The origin exactly 20 away is outside the open radius.
        assert_eq!(component_snaps.len(), 1);
        assert_eq!(component_snaps[0].strength, 1.0);
    }
}
