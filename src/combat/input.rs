//! Combat intents and the attack input buffer.
//!
//! Intents are edge-triggered: at most one of each per frame. The buffer is the
//! only thing that lets an attack press outlive its frame.

use serde::{Deserialize, Serialize};

/// Discrete combat intents delivered by the input source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatInput {
    AttackPressed,
    BlockPressed,
    BlockReleased,
}

/// Single-slot buffer for attack presses.
///
/// A press stays live until `valid_until`; pressing again before it is
/// consumed only refreshes the deadline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputBuffer {
    duration: f32,
    valid_until: Option<f32>,
}

impl InputBuffer {
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            valid_until: None,
        }
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f32) {
        self.duration = duration.max(0.0);
    }

    pub fn valid_until(&self) -> Option<f32> {
        self.valid_until
    }

    /// Record a press at `now`
    pub fn record(&mut self, now: f32) {
        self.valid_until = Some(now + self.duration);
    }

    pub fn is_live(&self, now: f32) -> bool {
        matches!(self.valid_until, Some(until) if now <= until)
    }

    /// Take the buffered press if it is still live
    pub fn consume(&mut self, now: f32) -> bool {
        if self.is_live(now) {
            self.valid_until = None;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.valid_until = None;
    }
}
