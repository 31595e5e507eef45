//! Responsive facet: scaling a layout to a new size, breakpoint selection,
//! space optimization, and constraint replacement. Adaptation scales every
//! component's origin and size by the per-axis ratio of new to old bounds,
//! then reruns constraint validation.

use serde::{Deserialize, Serialize};

use crate::layout::{
    LayoutEngine,
    errors::LayoutError,
    geometry::{Dimensions, Point, Rectangle},
    spec::{LayoutConstraint, LayoutSpec, validate_constraints},
};

/// A named width range carrying a layout configuration. `max_width == 0`
/// means unbounded above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub name: String,
    pub min_width: f64,
    pub max_width: f64,
}

impl Breakpoint {
    fn contains(&self, width: f64) -> bool {
        width >= self.min_width && (self.max_width == 0.0 || width <= self.max_width)
    }
}

fn adapt(layout: &LayoutSpec, new_size: Dimensions) -> Result<LayoutSpec, LayoutError> {
    if !new_size.is_positive() {
        return Err(LayoutError::invalid_input(
            "adapt-to-size",
            format!(
                "target size {}x{} must be positive and finite",
                new_size.width, new_size.height
            ),
        ));
    }
    let old_size = layout.bounds.size;
    if !old_size.is_positive() {
        return Err(LayoutError::invalid_input(
            "adapt-to-size",
            "layout bounds must be positive before adaptation",
        ));
    }

    let scale_x = new_size.width / old_size.width;
    let scale_y = new_size.height / old_size.height;
    let anchor = layout.bounds.origin;

    let mut adapted = layout.clone();
    adapted.bounds.size = new_size;
    for component in &mut adapted.components {
        let relative = Point::new(
            component.bounds.origin.x - anchor.x,
            component.bounds.origin.y - anchor.y,
        );
        component.bounds.origin = Point::new(
            anchor.x + relative.x * scale_x,
            anchor.y + relative.y * scale_y,
        );
        component.bounds.size = Dimensions::new(
            component.bounds.size.width * scale_x,
            component.bounds.size.height * scale_y,
        );
    }

    validate_constraints(&adapted)?;
    Ok(adapted)
}

impl LayoutEngine {
    /// Scale a layout to `new_size`, preserving relative placement.
    pub fn adapt_to_size(
        &self,
        layout: &LayoutSpec,
        new_size: Dimensions,
    ) -> Result<LayoutSpec, LayoutError> {
        self.results
            .get_or_compute("adapt-to-size", &(layout, new_size), || {
                adapt(layout, new_size)
            })
    }

    /// Select the first breakpoint whose range contains the layout width and
    /// record its name in `metadata.version`. No match returns the layout
    /// unchanged.
    pub fn apply_breakpoints(&self, layout: &LayoutSpec, breakpoints: &[Breakpoint]) -> LayoutSpec {
        let width = layout.bounds.size.width;
        let mut result = layout.clone();
        if let Some(active) = breakpoints.iter().find(|bp| bp.contains(width)) {
            result.metadata.version = active.name.clone();
        }
        result
    }

    /// Fit the layout to the available region. Component packing inside the
    /// region is a hook for the enclosing application; the baseline only
    /// moves the bounds.
    pub fn optimize_for_space(&self, layout: &LayoutSpec, available: Rectangle) -> LayoutSpec {
        let mut result = layout.clone();
        result.bounds = available;
        result
    }

    /// Replace the constraint list and revalidate.
    pub fn handle_constraints(
        &self,
        layout: &LayoutSpec,
        constraints: Vec<LayoutConstraint>,
    ) -> Result<LayoutSpec, LayoutError> {
        let mut result = layout.clone();
        result.constraints = constraints;
        validate_constraints(&result)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::spec::ComponentLayout;

    fn board_layout() -> LayoutSpec {
        let mut layout = LayoutSpec::new(Rectangle::new(0.0, 0.0, 800.0, 600.0));
        layout.components.push(ComponentLayout::new(
            "card",
            Rectangle::new(10.0, 10.0, 100.0, 50.0),
        ));
        layout
    }

    /// Halving both axes halves every origin and size.
    #[test]
    fn test_adapt_scales_components() {
        let engine = LayoutEngine::new();
        let adapted = engine
            .adapt_to_size(&board_layout(), Dimensions::new(400.0, 300.0))
            .unwrap();

        assert_eq!(adapted.bounds.size, Dimensions::new(400.0, 300.0));
        let card = adapted.component("card").unwrap();
        assert_eq!(card.bounds, Rectangle::new(5.0, 5.0, 50.0, 25.0));
    }

    /// Non-positive targets and degenerate layouts are rejected.
    #[test]
    fn test_adapt_rejects() {
        let engine = LayoutEngine::new();
        assert!(engine
            .adapt_to_size(&board_layout(), Dimensions::new(0.0, 300.0))
            .is_err());
        assert!(engine
            .adapt_to_size(&board_layout(), Dimensions::new(f64::NAN, 300.0))
            .is_err());

        let degenerate = LayoutSpec::new(Rectangle::new(0.0, 0.0, 0.0, 600.0));
        assert!(engine
            .adapt_to_size(&degenerate, Dimensions::new(400.0, 300.0))
            .is_err());
    }

    /// Adaptation that breaks a minimum constraint fails validation.
    #[test]
    fn test_adapt_revalidates() {
        let engine = LayoutEngine::new();
        let mut layout = board_layout();
        layout
            .constraints
            .push(LayoutConstraint::min_size("card", Dimensions::new(80.0, 40.0)));

        assert!(engine
            .adapt_to_size(&layout, Dimensions::new(400.0, 300.0))
            .is_err());
    }

    /// The first containing breakpoint wins and lands in metadata.
    #[test]
    fn test_breakpoints() {
        let engine = LayoutEngine::new();
        let breakpoints = vec![
            Breakpoint {
                name: "compact".to_string(),
                min_width: 0.0,
                max_width: 600.0,
            },
            Breakpoint {
                name: "regular".to_string(),
                min_width: 600.0,
                max_width: 0.0,
            },
        ];

        let selected = engine.apply_breakpoints(&board_layout(), &breakpoints);
        assert_eq!(selected.metadata.version, "regular");

        // No match: returned unchanged.
        let none = engine.apply_breakpoints(
            &board_layout(),
            &[Breakpoint {
                name: "narrow".to_string(),
                min_width: 0.0,
                max_width: 100.0,
            }],
        );
        assert_eq!(none, board_layout());
    }

    /// optimize_for_space retargets the bounds and leaves components alone.
    #[test]
    fn test_optimize_for_space() {
        let engine = LayoutEngine::new();
        let available = Rectangle::new(0.0, 0.0, 1024.0, 768.0);
        let result = engine.optimize_for_space(&board_layout(), available);
        assert_eq!(result.bounds, available);
        assert_eq!(result.components, board_layout().components);
    }

    /// handle_constraints replaces the list and revalidates.
    #[test]
    fn test_handle_constraints() {
        let engine = LayoutEngine::new();
        let ok = engine.handle_constraints(
            &board_layout(),
            vec![LayoutConstraint::min_size("card", Dimensions::new(50.0, 25.0))],
        );
        assert!(ok.is_ok());

        let too_strict = engine.handle_constraints(
            &board_layout(),
            vec![LayoutConstraint::min_size("card", Dimensions::new(500.0, 500.0))],
        );
        assert!(too_strict.is_err());
    }
}
