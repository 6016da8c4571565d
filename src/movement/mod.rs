//! Locomotion gate.
//!
//! Locomotion itself is a pass-through: input direction times speed. What
//! matters here is that it asks the fighter how much it may move: nothing
//! while an attack holds the character, the guard multiplier while blocking.

use bevy::prelude::*;

use crate::combat::{CombatSet, Fighter};

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (process_movement_input, update_velocity).chain().after(CombatSet),
        );
    }
}

#[derive(Component, Debug)]
pub struct MovementState {
    pub velocity: Vec3,
    pub move_speed: f32,
    pub facing: Vec3,
    /// Scale applied this frame (0 = locked by an attack)
    pub speed_scale: f32,
}

impl Default for MovementState {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            move_speed: 6.5,
            facing: Vec3::NEG_Z,
            speed_scale: 1.0,
        }
    }
}

/// Input vector from player or AI controller
#[derive(Component, Debug, Default)]
pub struct MovementInput {
    pub direction: Vec2, // normalized XZ movement
}

/// Planar velocity for `direction` at `speed`, scaled by the combat gate
pub fn gated_velocity(direction: Vec2, speed: f32, scale: f32) -> Vec3 {
    let dir = Vec3::new(direction.x, 0.0, direction.y).clamp_length_max(1.0);
    dir * speed * scale
}

fn process_movement_input(mut query: Query<(&mut MovementState, &MovementInput, Option<&Fighter>)>) {
    for (mut state, input, fighter) in &mut query {
        let scale = fighter.map_or(1.0, |f| f.0.movement_scale());
        state.speed_scale = scale;
        state.velocity = gated_velocity(input.direction, state.move_speed, scale);

        // Facing only follows actual motion, so a locked attack keeps its aim
        if state.velocity.length_squared() > 0.01 {
            state.facing = state.velocity.normalize();
        }
    }
}

fn update_velocity(time: Res<Time>, mut query: Query<(&MovementState, &mut Transform)>) {
    let dt = time.delta_secs();
    for (state, mut transform) in &mut query {
        transform.translation += state.velocity * dt;
        if state.facing.length_squared() > 0.0 {
            let target = transform.translation + state.facing;
            transform.look_at(target, Vec3::Y);
        }
    }
}
