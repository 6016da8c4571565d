//! Damage sinks.

use bevy::prelude::Component;
use serde::{Deserialize, Serialize};

use super::defense::BlockOutcome;
use crate::constants::PLAYER_HEALTH;

/// Anything that can take damage
pub trait Damageable {
    fn take_damage(&mut self, amount: i32);
}

/// Integer hit points. No floor: health may go negative, death is handled elsewhere.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    /// Damage taken since full health
    pub fn missing(&self) -> i32 {
        self.max - self.current
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(PLAYER_HEALTH)
    }
}

impl Damageable for Health {
    fn take_damage(&mut self, amount: i32) {
        self.current -= amount;
    }
}

/// Result of a context-aware hit on a guarded character
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitTaken {
    pub outcome: BlockOutcome,
    /// Damage actually subtracted from health
    pub dealt: i32,
}

impl HitTaken {
    pub fn resolve(amount: i32, outcome: BlockOutcome) -> Self {
        Self {
            outcome,
            dealt: outcome.apply(amount),
        }
    }
}
