//! Blocking.
//!
//! - Guard is held while the block input is held
//! - Front-only guard: attacks from outside the cone pass through
//! - Heavy attacks inside the cone break the guard and land at full damage
//! - Light attacks inside the cone are scaled by the blocked-damage multiplier

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::animation::{AnimParams, AnimationDriver};
use super::Pose;
use crate::constants::*;

/// Static block tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    /// Only attacks arriving inside the cone are blocked
    pub front_only: bool,
    /// Full opening of the guarded arc (140 = 70 to each side)
    pub cone_angle_degrees: f32,
    /// 0 = absorb everything, 0.2 = take 20%
    pub blocked_damage_multiplier: f32,
    pub move_speed_multiplier: f32,
    /// A block press mid-attack drops the combo and raises the guard
    pub cancel_combo_on_block: bool,
    /// Attacking and blocking may overlap
    pub allow_block_while_attacking: bool,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            front_only: true,
            cone_angle_degrees: BLOCK_CONE_DEGREES,
            blocked_damage_multiplier: BLOCKED_DAMAGE_MULT,
            move_speed_multiplier: BLOCK_MOVE_MULT,
            cancel_combo_on_block: true,
            allow_block_while_attacking: false,
        }
    }
}

/// Result of testing an incoming attack against the guard
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BlockOutcome {
    /// Guard was not raised
    NotBlocking,
    /// Attack came from outside the guarded arc
    OutsideGuard,
    /// Heavy attack broke the guard
    GuardBroken,
    Blocked { multiplier: f32 },
}

impl BlockOutcome {
    pub fn blocked(&self) -> bool {
        matches!(self, BlockOutcome::Blocked { .. })
    }

    pub fn damage_multiplier(&self) -> f32 {
        match self {
            BlockOutcome::Blocked { multiplier } => *multiplier,
            _ => 1.0,
        }
    }

    /// Damage that gets through, rounded half-to-even when blocked
    pub fn apply(&self, amount: i32) -> i32 {
        match self {
            BlockOutcome::Blocked { multiplier } => (amount as f32 * multiplier).round_ties_even() as i32,
            _ => amount,
        }
    }
}

/// What a block press does given the current combo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockIntent {
    Raise,
    CancelComboThenRaise,
    /// The attack owns the character; the press is dropped
    Ignore,
}

#[derive(Debug, Clone)]
pub struct BlockResolver {
    config: BlockConfig,
    params: AnimParams,
    is_blocking: bool,
}

impl BlockResolver {
    pub fn new(config: BlockConfig, params: AnimParams) -> Self {
        Self {
            config,
            params,
            is_blocking: false,
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.is_blocking
    }

    pub fn config(&self) -> &BlockConfig {
        &self.config
    }

    pub fn reconfigure(&mut self, config: BlockConfig, params: AnimParams) {
        self.config = config;
        self.params = params;
    }

    /// Speed factor locomotion should apply (1.0 when the guard is down)
    pub fn move_speed_multiplier(&self) -> f32 {
        if self.is_blocking {
            self.config.move_speed_multiplier
        } else {
            1.0
        }
    }

    pub fn intent_for_press(&self, is_attacking: bool) -> BlockIntent {
        if !is_attacking || self.config.allow_block_while_attacking {
            BlockIntent::Raise
        } else if self.config.cancel_combo_on_block {
            BlockIntent::CancelComboThenRaise
        } else {
            BlockIntent::Ignore
        }
    }

    /// A fresh combo lowers the guard unless overlap is allowed
    pub fn drops_on_combo_start(&self) -> bool {
        self.is_blocking && !self.config.allow_block_while_attacking
    }

    pub fn set_blocking(&mut self, active: bool, anim: Option<&mut dyn AnimationDriver>) {
        if self.is_blocking != active {
            debug!(active, "Guard changed");
        }
        self.is_blocking = active;
        if let Some(anim) = anim {
            anim.set_bool_parameter(&self.params.is_blocking, active);
        }
    }

    /// Planar angle in degrees between the defender's facing and the attacker.
    ///
    /// `None` when the attacker stands on top of the defender or the defender
    /// has no planar facing; the facing check is skipped then.
    pub fn guard_angle_degrees(defender: &Pose, attack_origin: Vec3) -> Option<f32> {
        let mut to_attacker = attack_origin - defender.position;
        to_attacker.y = 0.0;
        if to_attacker.length_squared() <= BLOCK_MIN_PLANAR_DIST_SQ {
            return None;
        }

        let mut forward = defender.forward;
        forward.y = 0.0;
        if forward.length_squared() <= f32::EPSILON {
            return None;
        }

        Some(forward.angle_between(to_attacker).to_degrees())
    }

    /// Test an incoming attack against the guard.
    ///
    /// Facing is checked before weight: a heavy attack from behind simply
    /// lands, it does not break the guard.
    pub fn try_block(
        &mut self,
        defender: &Pose,
        attack_origin: Vec3,
        is_heavy: bool,
        anim: Option<&mut dyn AnimationDriver>,
    ) -> BlockOutcome {
        if !self.is_blocking {
            return BlockOutcome::NotBlocking;
        }

        if self.config.front_only {
            if let Some(angle) = Self::guard_angle_degrees(defender, attack_origin) {
                if angle > self.config.cone_angle_degrees * 0.5 {
                    debug!(angle, "Attack outside guard arc");
                    return BlockOutcome::OutsideGuard;
                }
            }
        }

        if is_heavy {
            info!("Guard broken by heavy attack");
            self.is_blocking = false;
            if let Some(anim) = anim {
                anim.fire_trigger(&self.params.guard_break_trigger);
                anim.set_bool_parameter(&self.params.is_blocking, false);
            }
            return BlockOutcome::GuardBroken;
        }

        let multiplier = self.config.blocked_damage_multiplier;
        if let Some(anim) = anim {
            anim.fire_trigger(&self.params.block_hit_trigger);
        }
        debug!(multiplier, "Attack blocked");
        BlockOutcome::Blocked { multiplier }
    }
}
