//! Combo state machine.
//!
//! The machine only trusts the animator for *when* things happen: a step is
//! current once the animator confirms it, the combo window is open between the
//! window callbacks, and the attack is over when the clip says so. Player
//! intent only ever requests; it never advances the step on its own.
//!
//! ```text
//! Idle --attack--> Attacking(1, closed, -)
//!   StepConfirmed(n) -> step = n, window closed, queue cleared
//!   WindowOpened     -> window open, try to consume the buffered press
//!   WindowClosed     -> window closed (queue kept)
//!   HitMoment        -> hit resolver on the current step
//!   AttackEnded      -> Idle
//!   cancel           -> Idle + animator advance signaling cleared
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::animation::{AnimParams, AnimationDriver};
use super::input::InputBuffer;
use super::steps::{ComboStep, ComboTable};

/// Observable state of the combo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComboPhase {
    Idle,
    Attacking {
        step: u32,
        window_open: bool,
        next_queued: bool,
    },
}

/// Result of asking for the next step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Advance requested from the animator
    Queued { next_step: u32 },
    NotAttacking,
    WindowClosed,
    AlreadyQueued,
    BufferExpired,
    /// Current step is the last authored one
    ChainComplete,
}

impl AdvanceOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, AdvanceOutcome::Queued { .. })
    }
}

/// Result of an attack press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackResponse {
    /// A fresh combo started at step 1
    Started,
    /// The press was routed to the next-step request
    Advance(AdvanceOutcome),
    /// The step table is empty, nothing to start
    NoSteps,
}

#[derive(Debug, Clone)]
pub struct ComboStateMachine {
    table: ComboTable,
    params: AnimParams,
    buffer: InputBuffer,
    lock_movement: bool,

    is_attacking: bool,
    current_step: u32,
    step_confirmed: bool,
    window_open: bool,
    next_queued: bool,
}

impl ComboStateMachine {
    pub fn new(table: ComboTable, params: AnimParams, buffer_secs: f32, lock_movement: bool) -> Self {
        Self {
            table,
            params,
            buffer: InputBuffer::new(buffer_secs),
            lock_movement,
            is_attacking: false,
            current_step: 0,
            step_confirmed: false,
            window_open: false,
            next_queued: false,
        }
    }

    pub fn is_attacking(&self) -> bool {
        self.is_attacking
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    /// False between starting a combo and the animator confirming step 1
    pub fn step_confirmed(&self) -> bool {
        self.step_confirmed
    }

    pub fn window_open(&self) -> bool {
        self.window_open
    }

    pub fn next_queued(&self) -> bool {
        self.next_queued
    }

    pub fn step_count(&self) -> u32 {
        self.table.step_count()
    }

    pub fn table(&self) -> &ComboTable {
        &self.table
    }

    pub fn params(&self) -> &AnimParams {
        &self.params
    }

    pub fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    pub fn phase(&self) -> ComboPhase {
        if self.is_attacking {
            ComboPhase::Attacking {
                step: self.current_step,
                window_open: self.window_open,
                next_queued: self.next_queued,
            }
        } else {
            ComboPhase::Idle
        }
    }

    /// Swap static tuning. Runtime state survives; the current step is clamped
    /// into the new table.
    pub fn reconfigure(&mut self, table: ComboTable, params: AnimParams, buffer_secs: f32, lock_movement: bool) {
        self.table = table;
        self.params = params;
        self.buffer.set_duration(buffer_secs);
        self.lock_movement = lock_movement;

        if self.is_attacking {
            let clamped = self.table.clamp_step(self.current_step);
            if clamped == 0 {
                self.reset();
            } else {
                self.current_step = clamped;
            }
        }
    }

    // ------------------------------------------------------------------
    // Intents
    // ------------------------------------------------------------------

    /// Attack press at `now`. Always buffered; starts a combo when idle,
    /// otherwise requests the next step.
    pub fn attack_pressed(&mut self, now: f32, anim: Option<&mut dyn AnimationDriver>) -> AttackResponse {
        self.buffer.record(now);

        if !self.is_attacking {
            return self.start_combo(anim);
        }

        AttackResponse::Advance(self.try_advance(now, anim))
    }

    fn start_combo(&mut self, anim: Option<&mut dyn AnimationDriver>) -> AttackResponse {
        if self.table.is_empty() {
            warn!("Attack pressed with an empty combo table");
            return AttackResponse::NoSteps;
        }

        self.is_attacking = true;
        self.current_step = 1;
        self.step_confirmed = false;
        self.window_open = false;
        self.next_queued = false;

        if let Some(anim) = anim {
            anim.set_int_parameter(&self.params.combo_step, 1);
            anim.reset_trigger(&self.params.next_attack_trigger);
            anim.fire_trigger(&self.params.attack_trigger);
        }

        debug!("Combo started (step 1 pending)");
        AttackResponse::Started
    }

    /// Consume the buffered press into a next-step request.
    ///
    /// Succeeds only inside an open window, once per window, while the press is
    /// live and another step exists.
    pub fn try_advance(&mut self, now: f32, anim: Option<&mut dyn AnimationDriver>) -> AdvanceOutcome {
        if !self.is_attacking {
            return AdvanceOutcome::NotAttacking;
        }
        if !self.window_open {
            return AdvanceOutcome::WindowClosed;
        }
        if self.next_queued {
            return AdvanceOutcome::AlreadyQueued;
        }
        if !self.buffer.is_live(now) {
            return AdvanceOutcome::BufferExpired;
        }

        let next_step = self.current_step + 1;
        if next_step > self.table.step_count() {
            return AdvanceOutcome::ChainComplete;
        }

        self.buffer.consume(now);
        self.next_queued = true;

        if let Some(anim) = anim {
            anim.set_int_parameter(&self.params.combo_step, next_step as i32);
            anim.fire_trigger(&self.params.next_attack_trigger);
        }

        debug!(next_step, "Next combo step queued");
        AdvanceOutcome::Queued { next_step }
    }

    /// Drop the combo immediately (block interrupt). Returns false if idle.
    pub fn cancel(&mut self, anim: Option<&mut dyn AnimationDriver>) -> bool {
        if !self.is_attacking {
            return false;
        }

        self.reset();
        self.buffer.clear();

        if let Some(anim) = anim {
            anim.reset_trigger(&self.params.attack_trigger);
            anim.reset_trigger(&self.params.next_attack_trigger);
            anim.set_int_parameter(&self.params.combo_step, 0);
        }

        debug!("Combo cancelled");
        true
    }

    // ------------------------------------------------------------------
    // Animator callbacks
    // ------------------------------------------------------------------

    pub fn on_step_confirmed(&mut self, step: u32) {
        if !self.is_attacking {
            trace!(step, "Step confirmation while idle ignored");
            return;
        }

        let step = self.table.clamp_step(step);
        if step == 0 {
            return;
        }

        self.current_step = step;
        self.step_confirmed = true;
        // A window left open by the previous clip must not leak into this one
        self.window_open = false;
        self.next_queued = false;

        debug!(step, "Combo step confirmed");
    }

    /// Opens the window and immediately tries the buffered press
    pub fn on_window_opened(&mut self, now: f32, anim: Option<&mut dyn AnimationDriver>) -> Option<AdvanceOutcome> {
        if !self.is_attacking {
            trace!("Window open while idle ignored");
            return None;
        }

        self.window_open = true;
        Some(self.try_advance(now, anim))
    }

    pub fn on_window_closed(&mut self) {
        self.window_open = false;
    }

    /// Step whose geometry the hit-moment should use
    pub fn hit_step(&self) -> Option<&ComboStep> {
        if !self.is_attacking {
            return None;
        }
        self.table.get(self.current_step)
    }

    pub fn on_attack_ended(&mut self) {
        if self.is_attacking {
            debug!(step = self.current_step, "Combo ended");
        }
        self.reset();
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether locomotion should drop movement input this frame.
    ///
    /// The animator check covers the frame where the flag already dropped but
    /// the animator is still in (or blending into) an attack state.
    pub fn blocks_movement(&self, anim: Option<&dyn AnimationDriver>) -> bool {
        if !self.lock_movement {
            return false;
        }
        if self.is_attacking {
            return true;
        }
        anim.is_some_and(|a| self.params.in_attack_state(a))
    }

    fn reset(&mut self) {
        self.is_attacking = false;
        self.current_step = 0;
        self.step_confirmed = false;
        self.window_open = false;
        self.next_queued = false;
    }
}
