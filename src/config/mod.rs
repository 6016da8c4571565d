//! Combat configuration.
//!
//! Every tunable of the combat core lives in [`CombatConfig`]. Files are read
//! as RON or JSON depending on the extension and validated before use; a
//! config that fails validation is never applied.

use std::path::{Path, PathBuf};

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::combat::{AnimParams, BlockConfig, ComboTable, LayerMask};
use crate::constants::*;

/// Default location of the combat config, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/combat.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid RON in {}: {source}", path.display())]
    Ron {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported config format: {} (expected .ron or .json)", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub steps: ComboTable,
    pub input_buffer_secs: f32,
    /// Suppress locomotion while attacking
    pub lock_movement_while_attacking: bool,
    pub block: BlockConfig,
    pub animator: AnimParams,
    pub hit_layers: LayerMask,
    pub hit_scratch_capacity: usize,
    pub player_health: i32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            steps: ComboTable::default(),
            input_buffer_secs: INPUT_BUFFER_SECS,
            lock_movement_while_attacking: true,
            block: BlockConfig::default(),
            animator: AnimParams::default(),
            hit_layers: LayerMask::default(),
            hit_scratch_capacity: HIT_SCRATCH_CAPACITY,
            player_health: PLAYER_HEALTH,
        }
    }
}

impl CombatConfig {
    /// Load and validate a `.ron` or `.json` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("ron") => ron::from_str(&content).map_err(|source| ConfigError::Ron {
                path: path.to_path_buf(),
                source,
            })?,
            Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, step) in self.steps.steps().iter().enumerate() {
            let index = i + 1;
            if step.damage < 0 {
                return Err(invalid(format!("step {index}: damage must be >= 0, got {}", step.damage)));
            }
            if !step.hit_radius.is_finite() || step.hit_radius <= 0.0 {
                return Err(invalid(format!("step {index}: hit_radius must be > 0, got {}", step.hit_radius)));
            }
            if !step.hit_forward_offset.is_finite() || !step.hit_height.is_finite() {
                return Err(invalid(format!("step {index}: offsets must be finite")));
            }
        }

        if !self.input_buffer_secs.is_finite() || self.input_buffer_secs < 0.0 {
            return Err(invalid(format!(
                "input_buffer_secs must be >= 0, got {}",
                self.input_buffer_secs
            )));
        }

        let block = &self.block;
        if !(BLOCK_CONE_MIN_DEGREES..=BLOCK_CONE_MAX_DEGREES).contains(&block.cone_angle_degrees) {
            return Err(invalid(format!(
                "block.cone_angle_degrees must be in {BLOCK_CONE_MIN_DEGREES}..={BLOCK_CONE_MAX_DEGREES}, got {}",
                block.cone_angle_degrees
            )));
        }
        if !(0.0..=1.0).contains(&block.blocked_damage_multiplier) {
            return Err(invalid(format!(
                "block.blocked_damage_multiplier must be in 0..=1, got {}",
                block.blocked_damage_multiplier
            )));
        }
        if !(BLOCK_MOVE_MULT_MIN..=1.0).contains(&block.move_speed_multiplier) {
            return Err(invalid(format!(
                "block.move_speed_multiplier must be in {BLOCK_MOVE_MULT_MIN}..=1, got {}",
                block.move_speed_multiplier
            )));
        }

        let names = &self.animator;
        for (field, value) in [
            ("combo_step", &names.combo_step),
            ("attack_trigger", &names.attack_trigger),
            ("next_attack_trigger", &names.next_attack_trigger),
            ("is_blocking", &names.is_blocking),
            ("block_hit_trigger", &names.block_hit_trigger),
            ("guard_break_trigger", &names.guard_break_trigger),
            ("attack_tag", &names.attack_tag),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(format!("animator.{field} must not be empty")));
            }
        }

        if self.hit_scratch_capacity == 0 {
            return Err(invalid("hit_scratch_capacity must be >= 1".into()));
        }
        if self.player_health <= 0 {
            return Err(invalid(format!("player_health must be > 0, got {}", self.player_health)));
        }

        Ok(())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}
