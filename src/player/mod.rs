//! Player character.
//!
//! Maps raw mouse/keyboard edges to combat intents for the `Player` entity
//! and WASD to locomotion input.

use bevy::prelude::*;

use crate::combat::{CombatInput, CombatInputEvent, CombatSet, Fighter, Hurtbox};
use crate::config::CombatConfig;
use crate::movement::{MovementInput, MovementState};

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_player)
            .add_systems(Update, read_keyboard_input.before(CombatSet));
    }
}

/// Marker for the player entity
#[derive(Component, Debug)]
pub struct Player {
    pub name: String,
}

impl Default for Player {
    fn default() -> Self {
        Self { name: "Vhalor".into() }
    }
}

fn spawn_player(mut commands: Commands, config: Res<CombatConfig>) {
    commands.spawn((
        Player::default(),
        Transform::default(),
        MovementState::default(),
        MovementInput::default(),
        Fighter::from_config(&config),
        Hurtbox::default(),
    ));

    info!("Player spawned with {} combo steps", config.steps.step_count());
}

/// Combat intents from this frame's button edges
pub fn combat_intents(
    mouse: &ButtonInput<MouseButton>,
    keyboard: &ButtonInput<KeyCode>,
) -> Vec<CombatInput> {
    let mut intents = Vec::new();
    if mouse.just_pressed(MouseButton::Left) || keyboard.just_pressed(KeyCode::KeyJ) {
        intents.push(CombatInput::AttackPressed);
    }
    if mouse.just_pressed(MouseButton::Right) || keyboard.just_pressed(KeyCode::KeyK) {
        intents.push(CombatInput::BlockPressed);
    }
    if mouse.just_released(MouseButton::Right) || keyboard.just_released(KeyCode::KeyK) {
        intents.push(CombatInput::BlockReleased);
    }
    intents
}

fn read_keyboard_input(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    mouse: Option<Res<ButtonInput<MouseButton>>>,
    mut intents: EventWriter<CombatInputEvent>,
    mut query: Query<(Entity, &mut MovementInput), With<Player>>,
) {
    let (Some(keyboard), Some(mouse)) = (keyboard, mouse) else {
        return;
    };
    let Ok((entity, mut move_input)) = query.get_single_mut() else {
        return;
    };

    // Movement WASD
    let mut dir = Vec2::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        dir.y -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        dir.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        dir.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        dir.x += 1.0;
    }
    if dir.length_squared() > 0.01 {
        dir = dir.normalize();
    }
    move_input.direction = dir;

    for input in combat_intents(&mouse, &keyboard) {
        intents.send(CombatInputEvent { entity, input });
    }
}
