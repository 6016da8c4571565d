//! A fighting character.
//!
//! [`CombatCharacter`] owns one combo machine, one guard, one hit resolver and
//! one health pool, plus the animator they all talk to. Collaborators are
//! handed in at construction; nothing is looked up per frame.

use bevy::math::Vec3;
use tracing::debug;

use super::animation::{AnimEvent, AnimationDriver};
use super::combo::{AdvanceOutcome, AttackResponse, ComboStateMachine};
use super::damage::{Damageable, Health, HitTaken};
use super::defense::{BlockIntent, BlockOutcome, BlockResolver};
use super::hitbox::{DamageTargets, HitReport, HitResolver, HitSphere, Pose, SpatialQuery, TargetId};
use super::input::CombatInput;
use super::timeline::ClipPlayer;
use crate::config::CombatConfig;

/// Physics and damage collaborators needed on a hit moment
pub struct HitWorld<'a> {
    pub query: &'a dyn SpatialQuery,
    pub targets: &'a mut dyn DamageTargets,
}

impl<'a> HitWorld<'a> {
    pub fn new(query: &'a dyn SpatialQuery, targets: &'a mut dyn DamageTargets) -> Self {
        Self { query, targets }
    }

    fn reborrow(&mut self) -> HitWorld<'_> {
        HitWorld {
            query: self.query,
            targets: &mut *self.targets,
        }
    }
}

/// What an input intent did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputReaction {
    Attack(AttackResponse),
    BlockRaised { cancelled_combo: bool },
    BlockLowered,
    /// Block press dropped because the attack owns the character
    BlockIgnored,
}

/// What an animation callback did
#[derive(Debug, Clone, PartialEq)]
pub enum EventReaction {
    None,
    StepConfirmed(u32),
    Advance(AdvanceOutcome),
    Hit(HitReport),
    /// Hit moment with no step, no world or nothing to hit with
    HitSkipped,
    Ended,
}

fn driver<A: AnimationDriver>(animator: &mut Option<A>) -> Option<&mut dyn AnimationDriver> {
    animator.as_mut().map(|a| a as &mut dyn AnimationDriver)
}

pub struct CombatCharacter<A> {
    combo: ComboStateMachine,
    block: Option<BlockResolver>,
    hits: HitResolver,
    health: Health,
    animator: Option<A>,
}

impl<A: AnimationDriver> CombatCharacter<A> {
    pub fn new(config: &CombatConfig, animator: Option<A>) -> Self {
        Self {
            combo: ComboStateMachine::new(
                config.steps.clone(),
                config.animator.clone(),
                config.input_buffer_secs,
                config.lock_movement_while_attacking,
            ),
            block: Some(BlockResolver::new(config.block.clone(), config.animator.clone())),
            hits: HitResolver::new(config.hit_layers, None, config.hit_scratch_capacity),
            health: Health::new(config.player_health),
            animator,
        }
    }

    /// Character that can never raise a guard
    pub fn without_guard(mut self) -> Self {
        self.block = None;
        self
    }

    /// Identity of this character's own body, never hit by its attacks
    pub fn with_self_target(mut self, target: TargetId) -> Self {
        self.hits.set_self_target(Some(target));
        self
    }

    pub fn set_self_target(&mut self, target: Option<TargetId>) {
        self.hits.set_self_target(target);
    }

    pub fn combo(&self) -> &ComboStateMachine {
        &self.combo
    }

    pub fn block(&self) -> Option<&BlockResolver> {
        self.block.as_ref()
    }

    pub fn hit_resolver(&self) -> &HitResolver {
        &self.hits
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn animator(&self) -> Option<&A> {
        self.animator.as_ref()
    }

    pub fn animator_mut(&mut self) -> Option<&mut A> {
        self.animator.as_mut()
    }

    pub fn is_attacking(&self) -> bool {
        self.combo.is_attacking()
    }

    pub fn is_blocking(&self) -> bool {
        self.block.as_ref().is_some_and(|b| b.is_blocking())
    }

    /// Replace static tuning; runtime state carries over
    pub fn apply_config(&mut self, config: &CombatConfig) {
        self.combo.reconfigure(
            config.steps.clone(),
            config.animator.clone(),
            config.input_buffer_secs,
            config.lock_movement_while_attacking,
        );
        if let Some(block) = self.block.as_mut() {
            block.reconfigure(config.block.clone(), config.animator.clone());
        }
        self.hits.reconfigure(config.hit_layers, config.hit_scratch_capacity);
        self.health.max = config.player_health;
    }

    pub fn handle_input(&mut self, input: CombatInput, now: f32) -> InputReaction {
        match input {
            CombatInput::AttackPressed => {
                if !self.combo.is_attacking() && !self.combo.table().is_empty() {
                    if let Some(block) = self.block.as_mut() {
                        if block.drops_on_combo_start() {
                            block.set_blocking(false, driver(&mut self.animator));
                        }
                    }
                }
                InputReaction::Attack(self.combo.attack_pressed(now, driver(&mut self.animator)))
            }
            CombatInput::BlockPressed => {
                let Some(block) = self.block.as_mut() else {
                    return InputReaction::BlockIgnored;
                };
                match block.intent_for_press(self.combo.is_attacking()) {
                    BlockIntent::Raise => {
                        block.set_blocking(true, driver(&mut self.animator));
                        InputReaction::BlockRaised { cancelled_combo: false }
                    }
                    BlockIntent::CancelComboThenRaise => {
                        self.combo.cancel(driver(&mut self.animator));
                        block.set_blocking(true, driver(&mut self.animator));
                        InputReaction::BlockRaised { cancelled_combo: true }
                    }
                    BlockIntent::Ignore => InputReaction::BlockIgnored,
                }
            }
            CombatInput::BlockReleased => {
                if let Some(block) = self.block.as_mut() {
                    block.set_blocking(false, driver(&mut self.animator));
                }
                InputReaction::BlockLowered
            }
        }
    }

    /// Feed one animator callback, in authored order
    pub fn handle_anim_event(
        &mut self,
        event: AnimEvent,
        now: f32,
        pose: &Pose,
        world: Option<HitWorld<'_>>,
    ) -> EventReaction {
        match event {
            AnimEvent::StepConfirmed(step) => {
                self.combo.on_step_confirmed(step);
                EventReaction::StepConfirmed(self.combo.current_step())
            }
            AnimEvent::WindowOpened => match self.combo.on_window_opened(now, driver(&mut self.animator)) {
                Some(outcome) => EventReaction::Advance(outcome),
                None => EventReaction::None,
            },
            AnimEvent::WindowClosed => {
                self.combo.on_window_closed();
                EventReaction::None
            }
            AnimEvent::HitMoment => {
                let index = self.combo.current_step();
                let (Some(step), Some(world)) = (self.combo.hit_step().copied(), world) else {
                    return EventReaction::HitSkipped;
                };
                EventReaction::Hit(self.hits.resolve(index, &step, pose, world.query, world.targets))
            }
            AnimEvent::AttackEnded => {
                self.combo.on_attack_ended();
                EventReaction::Ended
            }
        }
    }

    /// Unconditional damage, no guard involved
    pub fn take_damage(&mut self, amount: i32) {
        self.health.take_damage(amount);
        debug!(amount, health = self.health.current, "Damage taken");
    }

    /// Damage from an attacker at `attack_origin`, filtered through the guard
    pub fn take_hit(&mut self, amount: i32, attack_origin: Vec3, is_heavy: bool, pose: &Pose) -> HitTaken {
        let outcome = match self.block.as_mut() {
            Some(block) => block.try_block(pose, attack_origin, is_heavy, driver(&mut self.animator)),
            None => BlockOutcome::NotBlocking,
        };
        let hit = HitTaken::resolve(amount, outcome);
        self.health.take_damage(hit.dealt);
        debug!(amount, dealt = hit.dealt, ?outcome, health = self.health.current, "Hit taken");
        hit
    }

    pub fn blocks_movement(&self) -> bool {
        self.combo
            .blocks_movement(self.animator.as_ref().map(|a| a as &dyn AnimationDriver))
    }

    /// Locomotion speed factor: 0 under the attack lock, the guard multiplier
    /// while blocking, 1 otherwise
    pub fn movement_scale(&self) -> f32 {
        if self.blocks_movement() {
            return 0.0;
        }
        self.block.as_ref().map_or(1.0, |b| b.move_speed_multiplier())
    }

    /// World-space sphere of `step`, if the table has it
    pub fn hit_sphere_for(&self, step: u32, pose: &Pose) -> Option<HitSphere> {
        self.combo.table().get(step).map(|s| HitSphere::for_step(s, pose))
    }

    /// Sphere of the current step, or step 1 while idle
    pub fn preview_hit_sphere(&self, pose: &Pose) -> Option<HitSphere> {
        let step = self.combo.table().clamp_step(self.combo.current_step());
        self.hit_sphere_for(step, pose)
    }
}

/// Per-frame output of a clip-driven character
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameReport {
    pub events: Vec<AnimEvent>,
    pub hits: Vec<HitReport>,
}

impl CombatCharacter<ClipPlayer> {
    /// Advance the clip clock by `dt` and dispatch the fired callbacks in order
    pub fn tick(&mut self, dt: f32, now: f32, pose: &Pose, mut world: Option<HitWorld<'_>>) -> FrameReport {
        let mut report = FrameReport::default();
        let Some(player) = self.animator.as_mut() else {
            return report;
        };
        player.advance(dt, &mut report.events);

        for &event in &report.events {
            let frame_world = world.as_mut().map(|w| w.reborrow());
            if let EventReaction::Hit(hit) = self.handle_anim_event(event, now, pose, frame_world) {
                report.hits.push(hit);
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::animation::test_support::RecordingAnimator;
    use crate::combat::hitbox::{ColliderHit, ColliderId, HitBuffer, LayerMask};
    use crate::combat::{BlockConfig, ComboPhase};
    use std::collections::HashMap;

    type Recorded = CombatCharacter<RecordingAnimator>;

    fn character() -> Recorded {
        CombatCharacter::new(&CombatConfig::default(), Some(RecordingAnimator::default()))
    }

    /// Everything within reach is one collider per target
    struct Dummies(Vec<(u64, Vec3)>);

    impl SpatialQuery for Dummies {
        fn overlap_sphere(&self, sphere: &HitSphere, _layers: LayerMask, out: &mut HitBuffer) {
            for &(id, pos) in &self.0 {
                if sphere.overlaps(pos, 0.3) {
                    out.push(ColliderHit::solid(ColliderId(id)));
                }
            }
        }
    }

    #[derive(Default)]
    struct Tally(HashMap<u64, i32>);

    impl DamageTargets for Tally {
        fn resolve(&self, collider: ColliderId) -> Option<TargetId> {
            Some(TargetId(collider.0))
        }

        fn apply_damage(&mut self, target: TargetId, amount: i32) -> bool {
            *self.0.entry(target.0).or_default() += amount;
            true
        }
    }

    #[test]
    fn test_attack_press_drops_guard() {
        let mut c = character();
        c.handle_input(CombatInput::BlockPressed, 0.0);
        assert!(c.is_blocking());

        let reaction = c.handle_input(CombatInput::AttackPressed, 0.1);
        assert_eq!(reaction, InputReaction::Attack(AttackResponse::Started));
        assert!(!c.is_blocking(), "New combo lowers the guard");
    }

    #[test]
    fn test_block_press_cancels_attack() {
        let mut c = character();
        c.handle_input(CombatInput::AttackPressed, 0.0);
        let reaction = c.handle_input(CombatInput::BlockPressed, 0.1);
        assert_eq!(reaction, InputReaction::BlockRaised { cancelled_combo: true });
        assert!(!c.is_attacking());
        assert!(c.is_blocking());
        assert_eq!(c.animator().unwrap().last_int("ComboStep"), Some(0));
    }

    #[test]
    fn test_block_press_ignored_when_cancel_disabled() {
        let mut config = CombatConfig::default();
        config.block.cancel_combo_on_block = false;
        let mut c: Recorded = CombatCharacter::new(&config, Some(RecordingAnimator::default()));
        c.handle_input(CombatInput::AttackPressed, 0.0);
        assert_eq!(c.handle_input(CombatInput::BlockPressed, 0.1), InputReaction::BlockIgnored);
        assert!(c.is_attacking());
        assert!(!c.is_blocking());
    }

    #[test]
    fn test_block_and_attack_overlap_when_allowed() {
        let mut config = CombatConfig::default();
        config.block = BlockConfig {
            allow_block_while_attacking: true,
            ..Default::default()
        };
        let mut c: Recorded = CombatCharacter::new(&config, Some(RecordingAnimator::default()));
        c.handle_input(CombatInput::BlockPressed, 0.0);
        c.handle_input(CombatInput::AttackPressed, 0.1);
        assert!(c.is_attacking());
        assert!(c.is_blocking());
    }

    #[test]
    fn test_block_release_lowers_guard() {
        let mut c = character();
        c.handle_input(CombatInput::BlockPressed, 0.0);
        assert_eq!(c.handle_input(CombatInput::BlockReleased, 0.5), InputReaction::BlockLowered);
        assert!(!c.is_blocking());
    }

    #[test]
    fn test_take_hit_blocked_and_broken() {
        let mut config = CombatConfig::default();
        config.block.blocked_damage_multiplier = 0.2;
        let mut c: Recorded = CombatCharacter::new(&config, None);
        c.handle_input(CombatInput::BlockPressed, 0.0);

        let pose = Pose::default();
        let front = Vec3::new(0.0, 0.0, -2.0);
        let hit = c.take_hit(10, front, false, &pose);
        assert!(hit.outcome.blocked());
        assert_eq!(hit.dealt, 2);
        assert_eq!(c.health().current, 8);

        let hit = c.take_hit(3, front, true, &pose);
        assert_eq!(hit.outcome, BlockOutcome::GuardBroken);
        assert_eq!(hit.dealt, 3);
        assert_eq!(c.health().current, 5);
        assert!(!c.is_blocking());
    }

    #[test]
    fn test_without_guard_takes_full_damage() {
        let mut c = character().without_guard();
        assert_eq!(c.handle_input(CombatInput::BlockPressed, 0.0), InputReaction::BlockIgnored);
        let hit = c.take_hit(4, Vec3::new(0.0, 0.0, -1.0), false, &Pose::default());
        assert_eq!(hit.outcome, BlockOutcome::NotBlocking);
        assert_eq!(c.health().current, 6);
    }

    #[test]
    fn test_take_damage_ignores_guard() {
        let mut c = character();
        c.handle_input(CombatInput::BlockPressed, 0.0);
        c.take_damage(4);
        assert_eq!(c.health().current, 6);
    }

    #[test]
    fn test_hit_moment_uses_confirmed_step() {
        let mut c = character().with_self_target(TargetId(99));
        let dummies = Dummies(vec![(1, Vec3::new(0.0, 1.0, -1.05)), (99, Vec3::new(0.0, 1.0, -0.9))]);
        let mut tally = Tally::default();
        let pose = Pose::default();

        c.handle_input(CombatInput::AttackPressed, 0.0);
        c.handle_anim_event(AnimEvent::StepConfirmed(3), 0.0, &pose, None);
        let reaction = c.handle_anim_event(
            AnimEvent::HitMoment,
            0.3,
            &pose,
            Some(HitWorld::new(&dummies, &mut tally)),
        );

        let EventReaction::Hit(report) = reaction else {
            panic!("Expected a hit report, got {reaction:?}");
        };
        assert_eq!(report.step, 3);
        assert_eq!(report.damaged, vec![TargetId(1)]);
        assert_eq!(tally.0[&1], 2);
        assert!(!tally.0.contains_key(&99));
    }

    #[test]
    fn test_hit_moment_without_world_is_skipped() {
        let mut c = character();
        c.handle_input(CombatInput::AttackPressed, 0.0);
        let reaction = c.handle_anim_event(AnimEvent::HitMoment, 0.3, &Pose::default(), None);
        assert_eq!(reaction, EventReaction::HitSkipped);
        assert!(c.is_attacking(), "Hit moment never changes combo state");
    }

    #[test]
    fn test_movement_scale() {
        let mut c = character();
        assert_eq!(c.movement_scale(), 1.0);
        c.handle_input(CombatInput::BlockPressed, 0.0);
        assert!((c.movement_scale() - 0.6).abs() < f32::EPSILON);
        c.handle_input(CombatInput::AttackPressed, 0.1);
        assert_eq!(c.movement_scale(), 0.0, "Attack lock wins over the guard multiplier");
    }

    #[test]
    fn test_movement_lock_can_be_disabled() {
        let config = CombatConfig {
            lock_movement_while_attacking: false,
            ..Default::default()
        };
        let mut c: Recorded = CombatCharacter::new(&config, None);
        c.handle_input(CombatInput::AttackPressed, 0.0);
        assert!(!c.blocks_movement());
        assert_eq!(c.movement_scale(), 1.0);
    }

    #[test]
    fn test_apply_config_keeps_runtime_state() {
        let mut c = character();
        c.handle_input(CombatInput::AttackPressed, 0.0);
        c.handle_anim_event(AnimEvent::StepConfirmed(2), 0.0, &Pose::default(), None);

        let mut config = CombatConfig::default();
        config.block.move_speed_multiplier = 0.8;
        c.apply_config(&config);

        assert!(matches!(c.combo().phase(), ComboPhase::Attacking { step: 2, .. }));
        assert_eq!(c.block().unwrap().config().move_speed_multiplier, 0.8);
    }

    #[test]
    fn test_preview_sphere_defaults_to_first_step() {
        let c = character();
        let sphere = c.preview_hit_sphere(&Pose::default()).unwrap();
        assert!((sphere.center - Vec3::new(0.0, 1.0, -0.9)).length() < 1e-5);
        assert!(c.hit_sphere_for(4, &Pose::default()).is_none());
    }

    #[test]
    fn test_block_then_attack_in_one_frame_restarts_clip() {
        let config = CombatConfig::default();
        let player = ClipPlayer::standard(config.animator.clone(), config.steps.step_count());
        let mut c = CombatCharacter::new(&config, Some(player));
        let dummies = Dummies(vec![(1, Vec3::new(0.0, 1.0, -1.0))]);
        let mut tally = Tally::default();
        let pose = Pose::default();
        let dt = 1.0 / 60.0;
        let mut now = 0.0;

        c.handle_input(CombatInput::AttackPressed, now);
        for _ in 0..9 {
            c.tick(dt, now, &pose, Some(HitWorld::new(&dummies, &mut tally)));
            now += dt;
        }
        assert_eq!(c.animator().unwrap().playing_step(), Some(1));

        c.handle_input(CombatInput::BlockPressed, now);
        c.handle_input(CombatInput::AttackPressed, now);
        assert!(c.is_attacking());
        assert!(c.animator().unwrap().is_idle(), "Cancel stops the old clip");

        let mut desync_frames = 0;
        let mut hit_frames = Vec::new();
        for frame in 0..150 {
            let report = c.tick(dt, now, &pose, Some(HitWorld::new(&dummies, &mut tally)));
            now += dt;
            if report.hits.iter().any(|h| h.hit_count() > 0) {
                hit_frames.push(frame);
            }
            if c.animator().unwrap().playing_step().is_some() && !c.is_attacking() {
                desync_frames += 1;
            }
        }

        assert_eq!(desync_frames, 0, "Clip kept playing while the combo was idle");
        assert_eq!(hit_frames.len(), 1);
        assert!(hit_frames[0] > 15, "Hit came from a stale clip at frame {}", hit_frames[0]);
        assert_eq!(tally.0[&1], 1);
        assert!(!c.is_attacking());
    }

    #[test]
    fn test_clip_driven_full_combo() {
        let config = CombatConfig::default();
        let player = ClipPlayer::standard(config.animator.clone(), config.steps.step_count());
        let mut c = CombatCharacter::new(&config, Some(player));
        let dummies = Dummies(vec![(1, Vec3::new(0.0, 1.0, -1.0))]);
        let mut tally = Tally::default();
        let pose = Pose::default();

        let dt = 1.0 / 60.0;
        let mut now = 0.0;
        let mut hits = 0;
        c.handle_input(CombatInput::AttackPressed, now);
        for frame in 0..300 {
            // Mash attack every tenth frame
            if frame % 10 == 5 {
                c.handle_input(CombatInput::AttackPressed, now);
            }
            let report = c.tick(dt, now, &pose, Some(HitWorld::new(&dummies, &mut tally)));
            hits += report.hits.iter().filter(|h| h.hit_count() > 0).count();
            now += dt;
            if !c.is_attacking() && frame > 30 {
                break;
            }
        }

        assert_eq!(hits, 3, "All three steps should land");
        assert_eq!(tally.0[&1], 1 + 1 + 2);
    }
}
