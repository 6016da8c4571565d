//! Melee combat core.
//!
//! The engine-agnostic pieces (combo machine, guard, hit resolution, damage
//! sinks and the reference clip clock) live in plain modules; [`systems`]
//! wires them into bevy.

use bevy::prelude::*;

pub mod animation;
pub mod character;
pub mod combo;
pub mod damage;
pub mod defense;
pub mod hitbox;
pub mod input;
pub mod steps;
pub mod systems;
pub mod timeline;

pub use animation::{AnimEvent, AnimParams, AnimationDriver};
pub use character::{CombatCharacter, EventReaction, FrameReport, HitWorld, InputReaction};
pub use combo::{AdvanceOutcome, AttackResponse, ComboPhase, ComboStateMachine};
pub use damage::{Damageable, Health, HitTaken};
pub use defense::{BlockConfig, BlockIntent, BlockOutcome, BlockResolver};
pub use hitbox::{
    ColliderHit, ColliderId, DamageTargets, HitBuffer, HitReport, HitResolver, HitSphere, LayerMask, Pose,
    SpatialQuery, TargetId,
};
pub use input::{CombatInput, InputBuffer};
pub use steps::{ComboStep, ComboTable};
pub use systems::{CombatInputEvent, DamageEvent, Fighter, GuardBroken, Hurtbox, IncomingHit};
pub use timeline::{AttackClip, ClipEvent, ClipPlayer};

use crate::config::CombatConfig;

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CombatConfig>()
            .add_event::<CombatInputEvent>()
            .add_event::<DamageEvent>()
            .add_event::<IncomingHit>()
            .add_event::<GuardBroken>()
            .add_systems(
                Update,
                (
                    systems::bind_new_fighters,
                    systems::route_combat_input,
                    systems::drive_fighters,
                    systems::apply_damage,
                )
                    .chain()
                    .in_set(CombatSet),
            );
    }
}

/// Ordering anchor for systems that read combat state (locomotion, UI)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CombatSet;
