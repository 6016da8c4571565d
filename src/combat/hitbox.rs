//! Hit-moment resolution.
//!
//! On a hit moment the attacker sweeps a sphere placed relative to its pose,
//! collects overlapping colliders into a bounded scratch buffer and deals the
//! step's damage once to every distinct target behind those colliders.

use bevy::math::Vec3;
use bevy::prelude::Transform;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::steps::ComboStep;
use crate::constants::*;

/// Position and facing of a character at the instant of a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub forward: Vec3,
}

impl Pose {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }

    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            position: transform.translation,
            forward: transform.forward().as_vec3(),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::NEG_Z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl HitSphere {
    /// World-space sphere of `step` for an attacker standing at `pose`
    pub fn for_step(step: &ComboStep, pose: &Pose) -> Self {
        let center = pose.position
            + Vec3::Y * step.hit_height
            + pose.forward.normalize_or_zero() * step.hit_forward_offset;
        Self {
            center,
            radius: step.hit_radius.max(0.0),
        }
    }

    /// Sphere-sphere overlap against a body of radius `body_radius`
    pub fn overlaps(&self, point: Vec3, body_radius: f32) -> bool {
        let reach = self.radius + body_radius.max(0.0);
        self.center.distance_squared(point) <= reach * reach
    }
}

/// Bit set of hittable physics layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    pub fn intersects(&self, layers: u32) -> bool {
        self.0 & layers != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask(DEFAULT_HIT_LAYERS)
    }
}

/// Stable identity of a collider reported by a spatial query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(pub u64);

/// Stable identity of a damageable target (one target may own many colliders)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColliderHit {
    pub collider: ColliderId,
    /// Trigger-only volumes never take hits
    pub is_trigger: bool,
}

impl ColliderHit {
    pub fn solid(collider: ColliderId) -> Self {
        Self {
            collider,
            is_trigger: false,
        }
    }
}

/// Fixed-capacity scratch buffer filled by [`SpatialQuery::overlap_sphere`].
///
/// Pushing past capacity drops the hit and marks the buffer overflowed.
#[derive(Debug, Clone)]
pub struct HitBuffer {
    hits: Vec<ColliderHit>,
    capacity: usize,
    overflowed: bool,
}

impl HitBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            hits: Vec::with_capacity(capacity),
            capacity,
            overflowed: false,
        }
    }

    pub fn push(&mut self, hit: ColliderHit) -> bool {
        if self.hits.len() >= self.capacity {
            self.overflowed = true;
            return false;
        }
        self.hits.push(hit);
        true
    }

    pub fn clear(&mut self) {
        self.hits.clear();
        self.overflowed = false;
    }

    pub fn hits(&self) -> &[ColliderHit] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.hits.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn overflowed(&self) -> bool {
        self.overflowed
    }
}

/// Physics overlap query
pub trait SpatialQuery {
    /// Append colliders overlapping `sphere` on `layers` to `out`, stopping when it is full
    fn overlap_sphere(&self, sphere: &HitSphere, layers: LayerMask, out: &mut HitBuffer);
}

/// Maps colliders to damage sinks and applies damage to them
pub trait DamageTargets {
    /// Nearest damage sink owning `collider`, if any
    fn resolve(&self, collider: ColliderId) -> Option<TargetId>;

    /// Returns false if the target no longer exists
    fn apply_damage(&mut self, target: TargetId, amount: i32) -> bool;
}

/// What a single hit moment did
#[derive(Debug, Clone, PartialEq)]
pub struct HitReport {
    pub step: u32,
    pub sphere: HitSphere,
    pub damage: i32,
    /// Colliders returned by the query
    pub candidates: usize,
    pub damaged: Vec<TargetId>,
    pub overflowed: bool,
}

impl HitReport {
    pub fn hit_count(&self) -> usize {
        self.damaged.len()
    }
}

#[derive(Debug, Clone)]
pub struct HitResolver {
    layers: LayerMask,
    self_target: Option<TargetId>,
    scratch: HitBuffer,
    seen: Vec<TargetId>,
}

impl HitResolver {
    pub fn new(layers: LayerMask, self_target: Option<TargetId>, capacity: usize) -> Self {
        Self {
            layers,
            self_target,
            scratch: HitBuffer::with_capacity(capacity),
            seen: Vec::with_capacity(capacity),
        }
    }

    pub fn layers(&self) -> LayerMask {
        self.layers
    }

    pub fn self_target(&self) -> Option<TargetId> {
        self.self_target
    }

    /// Identity of the attacker's own body, excluded from every hit
    pub fn set_self_target(&mut self, target: Option<TargetId>) {
        self.self_target = target;
    }

    /// Most colliders a single hit moment will look at
    pub fn capacity(&self) -> usize {
        self.scratch.capacity()
    }

    pub fn reconfigure(&mut self, layers: LayerMask, capacity: usize) {
        self.layers = layers;
        if capacity != self.scratch.capacity() {
            self.scratch = HitBuffer::with_capacity(capacity);
            self.seen = Vec::with_capacity(capacity);
        }
    }

    /// Sweep `step` from `pose` and damage every distinct target once
    pub fn resolve(
        &mut self,
        step_index: u32,
        step: &ComboStep,
        pose: &Pose,
        query: &dyn SpatialQuery,
        targets: &mut dyn DamageTargets,
    ) -> HitReport {
        let sphere = HitSphere::for_step(step, pose);
        self.scratch.clear();
        self.seen.clear();
        query.overlap_sphere(&sphere, self.layers, &mut self.scratch);

        if self.scratch.overflowed() {
            warn!(
                capacity = self.scratch.capacity(),
                "Hit scratch buffer full, extra colliders dropped"
            );
        }

        let mut damaged = Vec::new();
        for hit in self.scratch.hits() {
            if hit.is_trigger {
                continue;
            }
            let Some(target) = targets.resolve(hit.collider) else {
                trace!(collider = hit.collider.0, "Collider has no damage sink");
                continue;
            };
            if Some(target) == self.self_target || self.seen.contains(&target) {
                continue;
            }
            self.seen.push(target);

            if targets.apply_damage(target, step.damage) {
                trace!(target = target.0, damage = step.damage, "Hit landed");
                damaged.push(target);
            }
        }

        debug!(
            step = step_index,
            candidates = self.scratch.len(),
            hits = damaged.len(),
            "Hit moment resolved"
        );

        HitReport {
            step: step_index,
            sphere,
            damage: step.damage,
            candidates: self.scratch.len(),
            damaged,
            overflowed: self.scratch.overflowed(),
        }
    }
}
