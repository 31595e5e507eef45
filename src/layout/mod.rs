//! Stateless spatial layout engine for Kanban boards: responsive adaptation,
//! animation state interpolation, column/card placement, and drag-drop
//! zone/snap computation.
//!
//! All inputs and outputs are plain values; the engine's only interior state
//! is a result cache that memoizes pure computations. Facet operations are
//! grouped as `impl LayoutEngine` blocks in the facet modules, a closed set
//! of four rather than an open class hierarchy.

pub mod animation;
pub mod drag_drop;
pub mod errors;
pub mod geometry;
pub mod kanban;
pub mod responsive;
pub mod spec;

mod result_cache;

pub use animation::{
    ComponentDifference, ComponentState, Easing, LayoutDiff, LayoutState, Transform,
    TransitionParams, TransitionPath, TransitionState, TransitionStep,
};
pub use drag_drop::{DropFeedback, DropOperation, DropZone, LayoutPreview, SnapKind, SnapPoint};
pub use errors::LayoutError;
pub use geometry::{BoundsSpec, Dimensions, Point, Rectangle, calculate_bounds};
pub use kanban::{CardChange, Column, ColumnLayout, ScrollConfig, TaskCard, TaskCardPosition};
pub use responsive::Breakpoint;
pub use spec::{
    ComponentLayout, ConstraintKind, ConstraintValue, LayoutConstraint, LayoutMetadata, LayoutSpec,
    validate_constraints,
};

use result_cache::ResultCache;

/// The layout engine. One instance serves any number of threads; facet
/// operations are pure apart from the internal result cache.
#[derive(Default)]
pub struct LayoutEngine {
    results: ResultCache,
}

impl LayoutEngine {
    pub fn new() -> LayoutEngine {
        LayoutEngine::default()
    }
}
