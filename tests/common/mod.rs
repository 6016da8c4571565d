//! Shared doubles for the integration suites.

#![allow(dead_code)]

use std::collections::HashMap;

use bevy::math::Vec3;
use combat_core::combat::{
    AnimationDriver, ColliderHit, ColliderId, DamageTargets, HitBuffer, HitSphere, LayerMask, SpatialQuery, TargetId,
};

/// One write the core pushed into the animator
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Int(String, i32),
    Bool(String, bool),
    Fire(String),
    Reset(String),
}

/// Animator that records writes and reports scripted state tags
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<Call>,
    pub current_tag: Option<String>,
    pub next_tag: Option<String>,
    pub in_transition: bool,
}

impl Recorder {
    pub fn fired(&self, name: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Fire(n) if n == name))
            .count()
    }

    pub fn last_int(&self, name: &str) -> Option<i32> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::Int(n, v) if n == name => Some(*v),
            _ => None,
        })
    }
}

impl AnimationDriver for Recorder {
    fn set_int_parameter(&mut self, name: &str, value: i32) {
        self.calls.push(Call::Int(name.into(), value));
    }

    fn set_bool_parameter(&mut self, name: &str, value: bool) {
        self.calls.push(Call::Bool(name.into(), value));
    }

    fn fire_trigger(&mut self, name: &str) {
        self.calls.push(Call::Fire(name.into()));
    }

    fn reset_trigger(&mut self, name: &str) {
        self.calls.push(Call::Reset(name.into()));
    }

    fn current_state_tag(&self, _layer: usize) -> Option<&str> {
        self.current_tag.as_deref()
    }

    fn is_in_transition(&self, _layer: usize) -> bool {
        self.in_transition
    }

    fn next_state_tag(&self, _layer: usize) -> Option<&str> {
        self.next_tag.as_deref()
    }
}

/// Spherical bodies; several colliders may share one owner
#[derive(Debug, Default)]
pub struct Arena {
    /// (collider, owner, center, radius)
    pub bodies: Vec<(u64, u64, Vec3, f32)>,
    pub damage: HashMap<u64, i32>,
    pub applications: Vec<(u64, i32)>,
}

impl Arena {
    pub fn with_bodies(bodies: Vec<(u64, u64, Vec3, f32)>) -> Self {
        Self {
            bodies,
            ..Default::default()
        }
    }

    pub fn damage_of(&self, owner: u64) -> i32 {
        self.damage.get(&owner).copied().unwrap_or(0)
    }
}

/// Query view over an arena's bodies
pub struct ArenaQuery(pub Vec<(u64, u64, Vec3, f32)>);

impl SpatialQuery for ArenaQuery {
    fn overlap_sphere(&self, sphere: &HitSphere, _layers: LayerMask, out: &mut HitBuffer) {
        for &(collider, _, center, radius) in &self.0 {
            if sphere.overlaps(center, radius) && !out.push(ColliderHit::solid(ColliderId(collider))) {
                return;
            }
        }
    }
}

impl DamageTargets for Arena {
    fn resolve(&self, collider: ColliderId) -> Option<TargetId> {
        self.bodies
            .iter()
            .find(|b| b.0 == collider.0)
            .map(|b| TargetId(b.1))
    }

    fn apply_damage(&mut self, target: TargetId, amount: i32) -> bool {
        *self.damage.entry(target.0).or_default() += amount;
        self.applications.push((target.0, amount));
        true
    }
}
