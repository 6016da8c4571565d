//! Headless sparring demo.
//!
//! Spawns a fighter, two training dummies and a scripted aggressor, then runs
//! a fixed number of 60 Hz frames with seeded button mashing and prints a summary.
//!
//! Usage: `vhalor-combat-core [--config PATH] [--seed N] [--frames N] [--log-level LEVEL]`

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use combat_core::combat::{
    CombatInput, CombatInputEvent, CombatPlugin, CombatSet, DamageEvent, Fighter, GuardBroken, Health, Hurtbox,
    IncomingHit,
};
use combat_core::config::{CombatConfig, DEFAULT_CONFIG_PATH};
use combat_core::constants::FRAME_DT;
use combat_core::hotreload::{HotReloadPlugin, HotReloadState, HotReloadStatus};
use combat_core::logging::{frame_span, LogLevel, LoggingPlugin, TracingConfig};
use combat_core::movement::{MovementInput, MovementPlugin, MovementState};
use combat_core::player::Player;

/// Headless sparring session against training dummies
#[derive(Parser, Debug)]
#[command(name = "vhalor-combat-core")]
#[command(version)]
struct Args {
    /// Combat config (.ron or .json); defaults apply if the file is missing
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Seed of the sparring script
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Number of 60 Hz frames to simulate
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Level for the combat modules (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,
}

impl Args {
    fn tracing_config(&self) -> TracingConfig {
        let config = TracingConfig::default();
        match self.log_level {
            Some(level) => config.with_combat_level(level),
            None => config,
        }
    }
}

/// Seeded input script for the player and the aggressor
#[derive(Resource)]
struct SparringScript {
    rng: Xoshiro256PlusPlus,
    next_attack: f32,
    next_guard_toggle: f32,
    guarding: bool,
    next_incoming: f32,
}

impl SparringScript {
    fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            next_attack: 0.0,
            next_guard_toggle: 2.0,
            guarding: false,
            next_incoming: 1.0,
        }
    }
}

#[derive(Resource, Debug, Default)]
struct SparringStats {
    hits: u32,
    damage_dealt: i32,
    guard_breaks: u32,
}

#[derive(Component)]
struct Dummy;

#[derive(Component)]
struct Aggressor;

fn main() -> Result<()> {
    let args = Args::parse();
    let config = CombatConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(LoggingPlugin {
            config: args.tracing_config(),
        })
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(FRAME_DT)))
        .insert_resource(config)
        .insert_resource(SparringScript::new(args.seed))
        .init_resource::<SparringStats>()
        .add_plugins((CombatPlugin, MovementPlugin))
        .add_plugins(HotReloadPlugin {
            path: args.config.clone(),
        })
        .add_systems(Startup, spawn_arena)
        .add_systems(Update, drive_script.before(CombatSet))
        .add_systems(Update, tally.after(CombatSet));

    info!("Sparring for {} frames (seed {})", args.frames, args.seed);
    for frame in 0..args.frames {
        let _span = frame_span(frame);
        app.update();
    }

    report(app.world_mut());
    Ok(())
}

fn spawn_arena(mut commands: Commands, config: Res<CombatConfig>) {
    commands.spawn((
        Player::default(),
        Transform::default(),
        MovementState::default(),
        MovementInput::default(),
        Fighter::from_config(&config),
        Hurtbox::default(),
    ));

    for x in [-0.3, 0.3] {
        commands.spawn((
            Dummy,
            Transform::from_xyz(x, 1.0, -1.0),
            GlobalTransform::from_translation(Vec3::new(x, 1.0, -1.0)),
            Health::new(50),
            Hurtbox::default(),
        ));
    }

    commands.spawn((Aggressor, Transform::from_xyz(0.0, 0.0, -1.5)));
}

fn drive_script(
    time: Res<Time>,
    mut script: ResMut<SparringScript>,
    player: Query<Entity, With<Player>>,
    aggressor: Query<&Transform, With<Aggressor>>,
    mut inputs: EventWriter<CombatInputEvent>,
    mut incoming: EventWriter<IncomingHit>,
) {
    let Ok(entity) = player.get_single() else {
        return;
    };
    let now = time.elapsed_secs();
    let script = &mut *script;

    if now >= script.next_attack && !script.guarding {
        inputs.send(CombatInputEvent {
            entity,
            input: CombatInput::AttackPressed,
        });
        script.next_attack = now + script.rng.gen_range(0.08..0.35);
    }

    if now >= script.next_guard_toggle {
        script.guarding = !script.guarding;
        let input = if script.guarding {
            CombatInput::BlockPressed
        } else {
            CombatInput::BlockReleased
        };
        inputs.send(CombatInputEvent { entity, input });
        script.next_guard_toggle = now + script.rng.gen_range(0.5..2.0);
    }

    if now >= script.next_incoming {
        if let Ok(origin) = aggressor.get_single() {
            incoming.send(IncomingHit {
                target: entity,
                amount: script.rng.gen_range(1..=3),
                origin: origin.translation,
                is_heavy: script.rng.gen_bool(0.25),
            });
        }
        script.next_incoming = now + script.rng.gen_range(0.6..1.5);
    }
}

fn tally(
    mut stats: ResMut<SparringStats>,
    mut damage: EventReader<DamageEvent>,
    mut broken: EventReader<GuardBroken>,
) {
    for event in damage.read() {
        stats.hits += 1;
        stats.damage_dealt += event.amount;
    }
    stats.guard_breaks += broken.read().count() as u32;
}

fn report(world: &mut World) {
    let stats = world.resource::<SparringStats>();
    info!(
        "Hits landed: {}, damage dealt: {}, guard breaks: {}",
        stats.hits, stats.damage_dealt, stats.guard_breaks
    );

    let mut dummies = world.query_filtered::<&Health, With<Dummy>>();
    for health in dummies.iter(world) {
        info!("Dummy health: {}/{}", health.current, health.max);
    }

    let mut fighters = world.query_filtered::<&Fighter, With<Player>>();
    for fighter in fighters.iter(world) {
        info!("Player health: {}/{}", fighter.0.health().current, fighter.0.health().max);
    }

    if let Some(status) = hot_reload_summary(world) {
        info!("Hot reload: {}", status);
    }
}

/// JSON status of the config watcher, if hot reload is installed
fn hot_reload_summary(world: &World) -> Option<String> {
    world
        .get_resource::<HotReloadState>()
        .map(|state| HotReloadStatus::from_state(state).to_json())
}
