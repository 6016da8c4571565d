//! Reference animation clock.
//!
//! [`ClipPlayer`] is a small, deterministic animator: a parameter blackboard,
//! one authored clip per combo step and a frame-stepped playhead that emits
//! clip events in timestamp order. It drives the headless demo, the
//! integration tests and the benchmarks.
//!
//! Graph rules:
//! - Idle + `Attack` trigger: blend into the clip for `ComboStep`
//! - Playing + `NextAttack` trigger at or after the chain time: jump to the clip for `ComboStep`
//! - Playing + `ComboStep == 0`: interrupted, back to idle without an end event
//! - Clip runs out: `AttackEnded`, back to idle

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::animation::{AnimEvent, AnimParams, AnimationDriver};
use crate::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipEvent {
    pub time: f32,
    pub event: AnimEvent,
}

/// One authored attack animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackClip {
    pub duration: f32,
    /// Earliest time a queued advance may leave this clip
    pub chain_time: f32,
    events: Vec<ClipEvent>,
}

impl AttackClip {
    pub fn new(duration: f32, chain_time: f32, mut events: Vec<ClipEvent>) -> Self {
        events.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self {
            duration,
            chain_time: chain_time.min(duration),
            events,
        }
    }

    /// Standard clip layout: confirm, hit, window, end
    pub fn standard(step: u32) -> Self {
        Self::new(
            CLIP_DURATION,
            CLIP_CHAIN_TIME,
            vec![
                ClipEvent {
                    time: 0.0,
                    event: AnimEvent::StepConfirmed(step),
                },
                ClipEvent {
                    time: CLIP_HIT_TIME,
                    event: AnimEvent::HitMoment,
                },
                ClipEvent {
                    time: CLIP_WINDOW_OPEN,
                    event: AnimEvent::WindowOpened,
                },
                ClipEvent {
                    time: CLIP_WINDOW_CLOSE,
                    event: AnimEvent::WindowClosed,
                },
            ],
        )
    }

    pub fn events(&self) -> &[ClipEvent] {
        &self.events
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Playback {
    Idle,
    Entering { step: u32, left: f32 },
    Playing { step: u32, time: f32, cursor: usize },
}

#[derive(Debug, Clone)]
pub struct ClipPlayer {
    params: AnimParams,
    clips: Vec<AttackClip>,
    entry_blend: f32,
    chain_blend: f32,

    ints: HashMap<String, i32>,
    bools: HashMap<String, bool>,
    triggers: HashSet<String>,

    playback: Playback,
    /// Remaining chain blend, reported as a transition
    blend_left: f32,
}

impl ClipPlayer {
    pub fn new(params: AnimParams, clips: Vec<AttackClip>) -> Self {
        Self {
            params,
            clips,
            entry_blend: CLIP_ENTRY_BLEND,
            chain_blend: CLIP_CHAIN_BLEND,
            ints: HashMap::new(),
            bools: HashMap::new(),
            triggers: HashSet::new(),
            playback: Playback::Idle,
            blend_left: 0.0,
        }
    }

    /// One standard clip per step
    pub fn standard(params: AnimParams, step_count: u32) -> Self {
        Self::new(params, (1..=step_count).map(AttackClip::standard).collect())
    }

    pub fn with_blends(mut self, entry: f32, chain: f32) -> Self {
        self.entry_blend = entry.max(0.0);
        self.chain_blend = chain.max(0.0);
        self
    }

    pub fn int_parameter(&self, name: &str) -> i32 {
        self.ints.get(name).copied().unwrap_or(0)
    }

    pub fn bool_parameter(&self, name: &str) -> bool {
        self.bools.get(name).copied().unwrap_or(false)
    }

    pub fn is_trigger_set(&self, name: &str) -> bool {
        self.triggers.contains(name)
    }

    /// Step of the clip under the playhead
    pub fn playing_step(&self) -> Option<u32> {
        match self.playback {
            Playback::Playing { step, .. } => Some(step),
            _ => None,
        }
    }

    pub fn clip_time(&self) -> Option<f32> {
        match self.playback {
            Playback::Playing { time, .. } => Some(time),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.playback == Playback::Idle
    }

    fn clip_for(&self, step: u32) -> Option<&AttackClip> {
        let index = step.max(1) as usize - 1;
        self.clips.get(index).or_else(|| self.clips.last())
    }

    fn requested_step(&self) -> u32 {
        self.int_parameter(&self.params.combo_step).max(1) as u32
    }

    fn interrupted(&self) -> bool {
        self.int_parameter(&self.params.combo_step) == 0
    }

    /// Move the playhead forward by `dt`, appending fired events to `out` in order
    pub fn advance(&mut self, dt: f32, out: &mut Vec<AnimEvent>) {
        let mut remaining = dt.max(0.0);
        self.blend_left = (self.blend_left - remaining).max(0.0);

        loop {
            match self.playback {
                Playback::Idle => {
                    if !self.triggers.remove(&self.params.attack_trigger) {
                        return;
                    }
                    if self.clips.is_empty() {
                        warn!("Attack requested but no clips are authored");
                        return;
                    }
                    let step = self.requested_step();
                    trace!(step, "Entering attack");
                    self.playback = Playback::Entering {
                        step,
                        left: self.entry_blend,
                    };
                }
                Playback::Entering { step, left } => {
                    if self.interrupted() {
                        self.playback = Playback::Idle;
                        return;
                    }
                    if remaining < left {
                        self.playback = Playback::Entering {
                            step,
                            left: left - remaining,
                        };
                        return;
                    }
                    remaining -= left;
                    self.playback = Playback::Playing {
                        step,
                        time: 0.0,
                        cursor: 0,
                    };
                }
                Playback::Playing { step, time, cursor } => {
                    if self.interrupted() {
                        trace!(step, "Attack clip interrupted");
                        self.playback = Playback::Idle;
                        self.blend_left = 0.0;
                        return;
                    }
                    let Some(clip) = self.clip_for(step) else {
                        self.playback = Playback::Idle;
                        return;
                    };
                    let duration = clip.duration;
                    let target = time + remaining;

                    let chain_at = time.max(clip.chain_time);
                    if self.triggers.contains(&self.params.next_attack_trigger) && chain_at <= target {
                        Self::emit_until(clip, cursor, chain_at, out);
                        self.triggers.remove(&self.params.next_attack_trigger);
                        let next = self.requested_step();
                        trace!(from = step, to = next, "Chaining attack clip");
                        self.playback = Playback::Playing {
                            step: next,
                            time: 0.0,
                            cursor: 0,
                        };
                        self.blend_left = self.chain_blend;
                        remaining = target - chain_at;
                        continue;
                    }

                    if target >= duration {
                        Self::emit_until(clip, cursor, duration, out);
                        out.push(AnimEvent::AttackEnded);
                        self.playback = Playback::Idle;
                        remaining = target - duration;
                        continue;
                    }

                    let cursor = Self::emit_until(clip, cursor, target, out);
                    self.playback = Playback::Playing {
                        step,
                        time: target,
                        cursor,
                    };
                    return;
                }
            }
        }
    }

    /// Emit events from `cursor` up to and including `until`; returns the new cursor
    fn emit_until(clip: &AttackClip, mut cursor: usize, until: f32, out: &mut Vec<AnimEvent>) -> usize {
        while let Some(event) = clip.events.get(cursor) {
            if event.time > until {
                break;
            }
            out.push(event.event);
            cursor += 1;
        }
        cursor
    }

    fn on_attack_layer(&self, layer: usize) -> bool {
        layer == self.params.attack_layer
    }
}

impl AnimationDriver for ClipPlayer {
    fn set_int_parameter(&mut self, name: &str, value: i32) {
        self.ints.insert(name.to_owned(), value);
        // Step 0 leaves the attack at once, so a restart in the same frame
        // starts from Idle instead of resuming the old clip
        if value == 0 && name == self.params.combo_step && !self.is_idle() {
            trace!("Attack clip stopped");
            self.playback = Playback::Idle;
            self.blend_left = 0.0;
        }
    }

    fn set_bool_parameter(&mut self, name: &str, value: bool) {
        self.bools.insert(name.to_owned(), value);
    }

    fn fire_trigger(&mut self, name: &str) {
        self.triggers.insert(name.to_owned());
    }

    fn reset_trigger(&mut self, name: &str) {
        self.triggers.remove(name);
    }

    fn current_state_tag(&self, layer: usize) -> Option<&str> {
        match self.playback {
            Playback::Playing { .. } if self.on_attack_layer(layer) => Some(self.params.attack_tag.as_str()),
            _ => None,
        }
    }

    fn is_in_transition(&self, layer: usize) -> bool {
        if !self.on_attack_layer(layer) {
            return false;
        }
        match self.playback {
            Playback::Entering { .. } => true,
            Playback::Playing { .. } => self.blend_left > 0.0,
            Playback::Idle => false,
        }
    }

    fn next_state_tag(&self, layer: usize) -> Option<&str> {
        if self.is_in_transition(layer) {
            Some(self.params.attack_tag.as_str())
        } else {
            None
        }
    }
}
