//! Animation facet: capturing layout state, restoring it, interpolating
//! between two captures, diffing states, and building transition paths.
//!
//! A capture carries a timestamp and a CRC32 checksum over its component
//! map; two states are equal when their checksums agree. Interpolation is
//! linear on origin and size; visibility follows the end state throughout
//! so nothing flickers mid-transition, and transform/properties ride along
//! from the start state.

use std::{collections::BTreeMap, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::layout::{
    LayoutEngine,
    errors::LayoutError,
    geometry::{Dimensions, Point, Rectangle},
    spec::{ComponentLayout, LayoutSpec},
};

/// Per-component transform captured alongside the bounds. Captures start at
/// the identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Point,
    pub rotation: f64,
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            translation: Point::default(),
            rotation: 0.0,
            scale: 1.0,
        }
    }
}

/// Captured state of one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentState {
    pub bounds: Rectangle,
    pub transform: Transform,
    pub visible: bool,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

/// Snapshot of a layout for animation, keyed by component id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutState {
    pub components: BTreeMap<String, ComponentState>,
    pub captured_at: DateTime<Utc>,
    pub checksum: u32,
}

/// Equality is checksum equality: two captures of identical component maps
/// compare equal regardless of when they were taken.
impl PartialEq for LayoutState {
    fn eq(&self, other: &Self) -> bool {
        self.checksum == other.checksum
    }
}

fn checksum_components(components: &BTreeMap<String, ComponentState>) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    // BTreeMap ordering makes the serialization stable.
    if let Ok(bytes) = serde_json::to_vec(components) {
        hasher.update(&bytes);
    }
    hasher.finalize()
}

impl LayoutState {
    fn from_components(components: BTreeMap<String, ComponentState>) -> LayoutState {
        let checksum = checksum_components(&components);
        LayoutState {
            components,
            captured_at: Utc::now(),
            checksum,
        }
    }
}

/// Easing curves a transition can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
}

/// Prepared transition settings for a target layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionState {
    pub duration: Duration,
    pub easing: Easing,
}

/// Parameters checked by [`LayoutEngine::validate_transition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionParams {
    pub duration: Duration,
    pub frame_rate: f64,
    pub easing: Easing,
}

/// One step of a transition path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionStep {
    pub progress: f64,
    pub state: LayoutState,
}

/// Eleven uniformly spaced steps from progress 0.0 to 1.0 inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionPath {
    pub steps: Vec<TransitionStep>,
}

/// Result of comparing two layout states.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutDiff {
    /// Ids present in both whose bounds or visibility differ.
    pub changed: Vec<String>,
    /// Ids present only in the newer state.
    pub added: Vec<String>,
    /// Ids present only in the older state.
    pub removed: Vec<String>,
    pub differences: Vec<ComponentDifference>,
}

/// Before/after detail for one changed component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDifference {
    pub id: String,
    pub old_bounds: Rectangle,
    pub new_bounds: Rectangle,
    pub old_visible: bool,
    pub new_visible: bool,
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn ensure_progress(op: &'static str, progress: f64) -> Result<(), LayoutError> {
    if !progress.is_finite() || !(0.0..=1.0).contains(&progress) {
        return Err(LayoutError::InvalidProgress {
            op,
            value: progress,
        });
    }
    Ok(())
}

const PATH_STEPS: usize = 11;

impl LayoutEngine {
    /// Snapshot each component's bounds, visibility, and properties with an
    /// identity transform.
    pub fn capture(&self, layout: &LayoutSpec) -> LayoutState {
        let components = layout
            .components
            .iter()
            .map(|component| {
                (
                    component.id.clone(),
                    ComponentState {
                        bounds: component.bounds,
                        transform: Transform::default(),
                        visible: component.visible,
                        properties: component.properties.clone(),
                    },
                )
            })
            .collect();
        LayoutState::from_components(components)
    }

    /// Rebuild a layout from a capture. The layout bounds become the
    /// bounding box of the restored components; component order follows the
    /// capture's key order.
    pub fn restore(&self, state: &LayoutState) -> LayoutSpec {
        let mut layout = LayoutSpec::new(Rectangle::default());
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_right = f64::MIN;
        let mut max_bottom = f64::MIN;

        for (id, component) in &state.components {
            min_x = min_x.min(component.bounds.origin.x);
            min_y = min_y.min(component.bounds.origin.y);
            max_right = max_right.max(component.bounds.right());
            max_bottom = max_bottom.max(component.bounds.bottom());

            let mut restored = ComponentLayout::new(id.clone(), component.bounds);
            restored.visible = component.visible;
            restored.properties = component.properties.clone();
            layout.components.push(restored);
        }

        if !layout.components.is_empty() {
            layout.bounds = Rectangle::new(min_x, min_y, max_right - min_x, max_bottom - min_y);
        }
        layout
    }

    /// Linear interpolation between two captures at `progress ∈ [0, 1]`.
    /// Only ids present in both states appear in the result; visibility is
    /// the end value, transform and properties come from the start.
    pub fn interpolate(
        &self,
        start: &LayoutState,
        end: &LayoutState,
        progress: f64,
    ) -> Result<LayoutState, LayoutError> {
        ensure_progress("interpolate", progress)?;

        let mut components = BTreeMap::new();
        for (id, from) in &start.components {
            let Some(to) = end.components.get(id) else {
                continue;
            };
            components.insert(
                id.clone(),
                ComponentState {
                    bounds: Rectangle {
                        origin: Point::new(
                            lerp(from.bounds.origin.x, to.bounds.origin.x, progress),
                            lerp(from.bounds.origin.y, to.bounds.origin.y, progress),
                        ),
                        size: Dimensions::new(
                            lerp(from.bounds.size.width, to.bounds.size.width, progress),
                            lerp(from.bounds.size.height, to.bounds.size.height, progress),
                        ),
                    },
                    transform: from.transform,
                    visible: to.visible,
                    properties: from.properties.clone(),
                },
            );
        }
        Ok(LayoutState::from_components(components))
    }

    /// Structural diff of two captures. A component counts as changed when
    /// its bounds or visibility differ.
    pub fn compare(&self, older: &LayoutState, newer: &LayoutState) -> LayoutDiff {
        let mut diff = LayoutDiff::default();

        for (id, old) in &older.components {
            match newer.components.get(id) {
                None => diff.removed.push(id.clone()),
                Some(new) => {
                    if old.bounds != new.bounds || old.visible != new.visible {
                        diff.changed.push(id.clone());
                        diff.differences.push(ComponentDifference {
                            id: id.clone(),
                            old_bounds: old.bounds,
                            new_bounds: new.bounds,
                            old_visible: old.visible,
                            new_visible: new.visible,
                        });
                    }
                }
            }
        }
        for id in newer.components.keys() {
            if !older.components.contains_key(id) {
                diff.added.push(id.clone());
            }
        }
        diff
    }

    /// Default transition settings for a target layout: 250 ms, ease-in-out.
    pub fn prepare_transition(&self, _target: &LayoutSpec) -> TransitionState {
        TransitionState {
            duration: Duration::from_millis(250),
            easing: Easing::EaseInOut,
        }
    }

    /// Eleven uniformly spaced interpolation steps between two layouts,
    /// progress 0.0 through 1.0 inclusive.
    pub fn calculate_path(
        &self,
        start_layout: &LayoutSpec,
        end_layout: &LayoutSpec,
    ) -> Result<TransitionPath, LayoutError> {
        self.results
            .get_or_compute("calculate-path", &(start_layout, end_layout), || {
                let start = self.capture(start_layout);
                let end = self.capture(end_layout);

                let mut steps = Vec::with_capacity(PATH_STEPS);
                for i in 0..PATH_STEPS {
                    let progress = i as f64 / (PATH_STEPS - 1) as f64;
                    steps.push(TransitionStep {
                        progress,
                        state: self.interpolate(&start, &end, progress)?,
                    });
                }
                Ok(TransitionPath { steps })
            })
    }

    /// Layout at the path step nearest to `progress`.
    pub fn intermediate(
        &self,
        path: &TransitionPath,
        progress: f64,
    ) -> Result<LayoutSpec, LayoutError> {
        ensure_progress("intermediate", progress)?;

        let nearest = path
            .steps
            .iter()
            .min_by(|a, b| {
                let da = (a.progress - progress).abs();
                let db = (b.progress - progress).abs();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .ok_or_else(|| {
                LayoutError::invalid_input("intermediate", "transition path has no steps")
            })?;
        Ok(self.restore(&nearest.state))
    }

    /// Reject non-positive durations and frame rates outside `(0, 120]`.
    pub fn validate_transition(&self, params: &TransitionParams) -> Result<(), LayoutError> {
        if params.duration.is_zero() {
            return Err(LayoutError::invalid_input(
                "validate-transition",
                "duration must be positive",
            ));
        }
        if !params.frame_rate.is_finite()
            || params.frame_rate <= 0.0
            || params.frame_rate > 120.0
        {
            return Err(LayoutError::invalid_input(
                "validate-transition",
                format!("frame rate {} outside (0, 120]", params.frame_rate),
            ));
        }
        Ok(())
    }
}
