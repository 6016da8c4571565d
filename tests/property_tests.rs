//! Property-based tests using proptest
//!
//! Invariants that must hold for any interleaving of intents and callbacks:
//! - Combo: step stays in range, idle means step 0, queue implies an open window
//! - Buffer: a press never outlives its deadline
//! - Guard: blocked damage stays within [0, incoming]
//! - Hits: each target is damaged at most once per activation, never the attacker

mod common;

use bevy::math::Vec3;
use proptest::prelude::*;

use combat_core::combat::{
    AnimEvent, AnimParams, BlockConfig, BlockOutcome, BlockResolver, CombatCharacter, CombatInput, ComboStateMachine,
    ComboStep, ComboTable, EventReaction, HitWorld, InputBuffer, Pose, TargetId,
};
use combat_core::config::CombatConfig;
use common::{Arena, ArenaQuery, Recorder};

#[derive(Debug, Clone, Copy)]
enum Op {
    Attack,
    Confirm(u32),
    Open,
    Close,
    End,
    Cancel,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Attack),
        2 => (0u32..6).prop_map(Op::Confirm),
        2 => Just(Op::Open),
        1 => Just(Op::Close),
        1 => Just(Op::End),
        1 => Just(Op::Cancel),
    ]
}

fn table(len: usize) -> ComboTable {
    ComboTable::new((0..len).map(|i| ComboStep::new(i as i32 + 1, 0.4, 1.0, 1.0)).collect())
}

// ============================================================
// Combo Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_combo_state_stays_consistent(
        steps in 1usize..=5,
        ops in prop::collection::vec((op(), 0.0f32..0.2), 1..80),
    ) {
        let mut combo = ComboStateMachine::new(table(steps), AnimParams::default(), 0.15, true);
        let mut anim = Recorder::default();
        let mut now = 0.0f32;

        for (op, dt) in ops {
            now += dt;
            let window_was_open = combo.window_open();
            let queued_before = combo.next_queued();

            match op {
                Op::Attack => { combo.attack_pressed(now, Some(&mut anim)); }
                Op::Confirm(step) => combo.on_step_confirmed(step),
                Op::Open => { combo.on_window_opened(now, Some(&mut anim)); }
                Op::Close => combo.on_window_closed(),
                Op::End => combo.on_attack_ended(),
                Op::Cancel => { combo.cancel(Some(&mut anim)); }
            }

            prop_assert!(combo.current_step() <= combo.step_count());
            if !combo.is_attacking() {
                prop_assert_eq!(combo.current_step(), 0);
                prop_assert!(!combo.window_open());
                prop_assert!(!combo.next_queued());
            } else {
                prop_assert!(combo.current_step() >= 1);
            }

            // A queue can only appear through an open window
            if combo.next_queued() && !queued_before {
                prop_assert!(combo.window_open());
                prop_assert!(
                    window_was_open || matches!(op, Op::Open),
                    "Queued without a window after {:?}", op
                );
            }
        }
    }

    #[test]
    fn prop_advance_requests_never_exceed_table(
        steps in 1usize..=4,
        presses in prop::collection::vec(0.0f32..0.1, 1..40),
    ) {
        let mut combo = ComboStateMachine::new(table(steps), AnimParams::default(), 0.15, true);
        let mut anim = Recorder::default();
        let mut now = 0.0f32;

        combo.attack_pressed(now, Some(&mut anim));
        combo.on_step_confirmed(1);
        for dt in presses {
            now += dt;
            combo.on_window_opened(now, Some(&mut anim));
            combo.attack_pressed(now, Some(&mut anim));
            if combo.next_queued() {
                combo.on_step_confirmed(combo.current_step() + 1);
            }
        }

        prop_assert!(anim.last_int("ComboStep").unwrap_or(0) <= steps as i32);
        prop_assert!(anim.fired("NextAttack") < steps);
    }

    #[test]
    fn prop_buffered_press_expires(duration in 0.0f32..1.0, pressed in 0.0f32..100.0, later in 0.0f32..2.0) {
        let mut buffer = InputBuffer::new(duration);
        buffer.record(pressed);
        let now = pressed + later;
        if later + 1e-3 < duration {
            prop_assert!(buffer.is_live(now));
        } else if later > duration + 1e-3 {
            prop_assert!(!buffer.is_live(now));
            prop_assert!(!buffer.consume(now));
        }
        if buffer.consume(now) {
            prop_assert!(!buffer.is_live(now));
        }
    }
}

// ============================================================
// Guard Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_blocked_damage_is_bounded(
        multiplier in 0.0f32..=1.0,
        amount in 0i32..10_000,
        angle in -std::f32::consts::PI..std::f32::consts::PI,
        heavy in any::<bool>(),
    ) {
        let config = BlockConfig { blocked_damage_multiplier: multiplier, ..Default::default() };
        let mut block = BlockResolver::new(config, AnimParams::default());
        block.set_blocking(true, None);

        let origin = Vec3::new(angle.sin() * 3.0, 0.0, -angle.cos() * 3.0);
        let outcome = block.try_block(&Pose::default(), origin, heavy, None);
        let dealt = outcome.apply(amount);

        prop_assert!((0..=amount).contains(&dealt), "dealt {} of {}", dealt, amount);
        match outcome {
            BlockOutcome::Blocked { .. } => prop_assert!(block.is_blocking()),
            BlockOutcome::GuardBroken => {
                prop_assert!(heavy);
                prop_assert!(!block.is_blocking());
                prop_assert_eq!(dealt, amount);
            }
            BlockOutcome::OutsideGuard => prop_assert_eq!(dealt, amount),
            BlockOutcome::NotBlocking => prop_assert!(false, "Guard was raised"),
        }
    }

    #[test]
    fn prop_guard_arc_is_symmetric(angle in 0.0f32..180.0) {
        let radians = angle.to_radians();
        let left = Vec3::new(-radians.sin(), 0.0, -radians.cos());
        let right = Vec3::new(radians.sin(), 0.0, -radians.cos());
        let pose = Pose::default();

        let a = BlockResolver::guard_angle_degrees(&pose, left);
        let b = BlockResolver::guard_angle_degrees(&pose, right);
        prop_assert!(a.is_some() && b.is_some());
        prop_assert!((a.unwrap_or(0.0) - b.unwrap_or(0.0)).abs() < 0.05);
    }
}

// ============================================================
// Hit Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_targets_hit_at_most_once(
        bodies in prop::collection::vec(
            (1u64..6, -1.5f32..1.5, 0.0f32..2.0, -2.5f32..0.5, 0.1f32..0.6),
            0..24,
        ),
    ) {
        let bodies: Vec<_> = bodies
            .into_iter()
            .enumerate()
            .map(|(i, (owner, x, y, z, r))| (i as u64 + 100, owner, Vec3::new(x, y, z), r))
            .collect();
        let query = ArenaQuery(bodies.clone());
        let mut arena = Arena::with_bodies(bodies);
        let pose = Pose::default();

        let mut fighter: CombatCharacter<Recorder> =
            CombatCharacter::new(&CombatConfig::default(), None).with_self_target(TargetId(1));
        fighter.handle_input(CombatInput::AttackPressed, 0.0);
        fighter.handle_anim_event(AnimEvent::StepConfirmed(1), 0.0, &pose, None);
        let reaction = fighter.handle_anim_event(
            AnimEvent::HitMoment,
            0.3,
            &pose,
            Some(HitWorld::new(&query, &mut arena)),
        );

        let EventReaction::Hit(report) = reaction else {
            return Err(TestCaseError::fail("hit moment inside an attack must resolve"));
        };
        let mut seen = std::collections::HashSet::new();
        for target in &report.damaged {
            prop_assert!(seen.insert(*target), "{:?} damaged twice", target);
            prop_assert_ne!(*target, TargetId(1));
        }
        prop_assert_eq!(arena.damage_of(1), 0);
        prop_assert_eq!(arena.applications.len(), report.damaged.len());
        prop_assert!(report.candidates <= fighter.hit_resolver().capacity());
    }
}
