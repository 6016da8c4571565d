//! Animation clock port.
//!
//! The combat core never plays animation itself. It pushes parameters into an
//! animator through [`AnimationDriver`] and receives [`AnimEvent`] callbacks
//! fired at authored timestamps inside attack clips. Callbacks must be fed to
//! the core in the order the clip authored them.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Timestamped callbacks emitted by attack clips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimEvent {
    /// The animator entered the clip for this 1-based step
    StepConfirmed(u32),
    WindowOpened,
    WindowClosed,
    HitMoment,
    AttackEnded,
}

/// Write/read surface of an animator.
///
/// Implementations are free to ignore unknown parameter names.
pub trait AnimationDriver {
    fn set_int_parameter(&mut self, name: &str, value: i32);
    fn set_bool_parameter(&mut self, name: &str, value: bool);
    fn fire_trigger(&mut self, name: &str);
    fn reset_trigger(&mut self, name: &str);

    fn current_state_tag(&self, layer: usize) -> Option<&str>;
    fn is_in_transition(&self, layer: usize) -> bool;
    fn next_state_tag(&self, layer: usize) -> Option<&str>;
}

/// Names of the animator parameters and tags the combat core touches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimParams {
    pub combo_step: String,
    pub attack_trigger: String,
    pub next_attack_trigger: String,
    pub is_blocking: String,
    pub block_hit_trigger: String,
    pub guard_break_trigger: String,
    pub attack_tag: String,
    pub attack_layer: usize,
}

impl Default for AnimParams {
    fn default() -> Self {
        Self {
            combo_step: PARAM_COMBO_STEP.into(),
            attack_trigger: PARAM_ATTACK_TRIGGER.into(),
            next_attack_trigger: PARAM_NEXT_ATTACK_TRIGGER.into(),
            is_blocking: PARAM_IS_BLOCKING.into(),
            block_hit_trigger: PARAM_BLOCK_HIT_TRIGGER.into(),
            guard_break_trigger: PARAM_GUARD_BREAK_TRIGGER.into(),
            attack_tag: ATTACK_STATE_TAG.into(),
            attack_layer: ATTACK_LAYER,
        }
    }
}

impl AnimParams {
    /// True if the animator sits in, or is blending into, an attack-tagged state
    pub fn in_attack_state(&self, animator: &dyn AnimationDriver) -> bool {
        let layer = self.attack_layer;
        if animator.current_state_tag(layer) == Some(self.attack_tag.as_str()) {
            return true;
        }
        animator.is_in_transition(layer)
            && animator.next_state_tag(layer) == Some(self.attack_tag.as_str())
    }
}
