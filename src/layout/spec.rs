//! Layout description types: the component list, its bounds, the constraint
//! set, and the metadata block facets annotate. Constraint validation lives
//! here because both the responsive facet and `calculate_bounds` callers
//! rerun it after mutating a layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::layout::{
    errors::LayoutError,
    geometry::{Dimensions, Point, Rectangle},
};

/// One positioned component of a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentLayout {
    pub id: String,
    pub bounds: Rectangle,
    pub z_index: i32,
    pub visible: bool,
    /// Opaque component properties, carried through untouched.
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl ComponentLayout {
    pub fn new(id: impl Into<String>, bounds: Rectangle) -> ComponentLayout {
        ComponentLayout {
            id: id.into(),
            bounds,
            z_index: 0,
            visible: true,
            properties: BTreeMap::new(),
        }
    }
}

/// Constraint kinds the engine understands. Only the size bounds are
/// enforced by validation; the rest are carried for the enclosing
/// application's layout passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    MinSize,
    MaxSize,
    AspectRatio,
    Alignment,
    Spacing,
    Position,
}

/// Typed payload of a constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintValue {
    Size(Dimensions),
    Ratio(f64),
    Alignment(String),
    Spacing(f64),
    Position(Point),
}

/// A constraint on one named component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConstraint {
    pub kind: ConstraintKind,
    pub target_id: String,
    pub value: ConstraintValue,
}

impl LayoutConstraint {
    pub fn min_size(target_id: impl Into<String>, size: Dimensions) -> LayoutConstraint {
        LayoutConstraint {
            kind: ConstraintKind::MinSize,
            target_id: target_id.into(),
            value: ConstraintValue::Size(size),
        }
    }

    pub fn max_size(target_id: impl Into<String>, size: Dimensions) -> LayoutConstraint {
        LayoutConstraint {
            kind: ConstraintKind::MaxSize,
            target_id: target_id.into(),
            value: ConstraintValue::Size(size),
        }
    }
}

/// Annotations carried alongside a layout. `version` records the active
/// breakpoint name after a breakpoint pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutMetadata {
    pub version: String,
}

/// A complete layout: ordered components inside bounds, plus constraints
/// and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSpec {
    pub components: Vec<ComponentLayout>,
    pub bounds: Rectangle,
    #[serde(default)]
    pub constraints: Vec<LayoutConstraint>,
    #[serde(default)]
    pub metadata: LayoutMetadata,
}

impl LayoutSpec {
    pub fn new(bounds: Rectangle) -> LayoutSpec {
        LayoutSpec {
            components: Vec::new(),
            bounds,
            constraints: Vec::new(),
            metadata: LayoutMetadata::default(),
        }
    }

    /// Find a component by id.
    pub fn component(&self, id: &str) -> Option<&ComponentLayout> {
        self.components.iter().find(|c| c.id == id)
    }
}

/// Enforce the `min_size`/`max_size` constraints against each named
/// component. Constraints naming absent components are skipped.
pub fn validate_constraints(layout: &LayoutSpec) -> Result<(), LayoutError> {
    for constraint in &layout.constraints {
        let ConstraintValue::Size(limit) = &constraint.value else {
            continue;
        };
        let Some(component) = layout.component(&constraint.target_id) else {
            continue;
        };
        let size = component.bounds.size;

        match constraint.kind {
            ConstraintKind::MinSize => {
                if size.width < limit.width || size.height < limit.height {
                    return Err(LayoutError::ConstraintViolation {
                        op: "validate-constraints",
                        target: constraint.target_id.clone(),
                        constraint: "min_size",
                        reason: format!(
                            "{}x{} is below the {}x{} minimum",
                            size.width, size.height, limit.width, limit.height
                        ),
                    });
                }
            }
            ConstraintKind::MaxSize => {
                if size.width > limit.width || size.height > limit.height {
                    return Err(LayoutError::ConstraintViolation {
                        op: "validate-constraints",
                        target: constraint.target_id.clone(),
                        constraint: "max_size",
                        reason: format!(
                            "{}x{} exceeds the {}x{} maximum",
                            size.width, size.height, limit.width, limit.height
                        ),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(())
}
