//! Centralized combat constants.
//!
//! Defaults for every tunable exposed by `CombatConfig`. Per-module constants
//! that are not configurable stay in their respective modules.

// =====================================================
// Combo
// =====================================================

/// How long an attack press stays consumable after it was pressed (seconds)
pub const INPUT_BUFFER_SECS: f32 = 0.15;

/// Capacity of the per-attack hit scratch buffer
pub const HIT_SCRATCH_CAPACITY: usize = 16;

/// Default hittable layer mask (every layer)
pub const DEFAULT_HIT_LAYERS: u32 = u32::MAX;

// =====================================================
// Blocking
// =====================================================

/// Full opening of the guarded arc in degrees (70 to each side)
pub const BLOCK_CONE_DEGREES: f32 = 140.0;

/// Allowed range for the guarded arc
pub const BLOCK_CONE_MIN_DEGREES: f32 = 10.0;
pub const BLOCK_CONE_MAX_DEGREES: f32 = 180.0;

/// Damage multiplier applied to blocked hits (0 = fully absorbed)
pub const BLOCKED_DAMAGE_MULT: f32 = 0.0;

/// Move speed multiplier while the guard is raised
pub const BLOCK_MOVE_MULT: f32 = 0.60;

/// Lower bound for the blocking move multiplier
pub const BLOCK_MOVE_MULT_MIN: f32 = 0.1;

/// Attack origins closer than this (squared, planar) skip the facing check
pub const BLOCK_MIN_PLANAR_DIST_SQ: f32 = 0.0001;

// =====================================================
// Damage sink
// =====================================================

/// Starting health of the player character
pub const PLAYER_HEALTH: i32 = 10;

// =====================================================
// Animator parameter names
// =====================================================

pub const PARAM_COMBO_STEP: &str = "ComboStep";
pub const PARAM_ATTACK_TRIGGER: &str = "Attack";
pub const PARAM_NEXT_ATTACK_TRIGGER: &str = "NextAttack";
pub const PARAM_IS_BLOCKING: &str = "IsBlocking";
pub const PARAM_BLOCK_HIT_TRIGGER: &str = "BlockHit";
pub const PARAM_GUARD_BREAK_TRIGGER: &str = "GuardBreak";

/// Tag carried by every attack state in the animator
pub const ATTACK_STATE_TAG: &str = "Attack";

/// Animator layer hosting the attack states (0 = base layer)
pub const ATTACK_LAYER: usize = 0;

// =====================================================
// Reference clip timing (ClipPlayer)
// =====================================================

/// Length of a standard attack clip (seconds)
pub const CLIP_DURATION: f32 = 0.80;

/// Hit-moment inside a standard clip
pub const CLIP_HIT_TIME: f32 = 0.30;

/// Combo window inside a standard clip
pub const CLIP_WINDOW_OPEN: f32 = 0.35;
pub const CLIP_WINDOW_CLOSE: f32 = 0.60;

/// Earliest point at which a queued advance leaves the clip
pub const CLIP_CHAIN_TIME: f32 = 0.60;

/// Blend from locomotion into the first attack clip
pub const CLIP_ENTRY_BLEND: f32 = 0.05;

/// Blend between two chained attack clips
pub const CLIP_CHAIN_BLEND: f32 = 0.05;

// =====================================================
// Simulation
// =====================================================

/// Fixed frame length used by the headless demo and tests (60 Hz)
pub const FRAME_DT: f32 = 1.0 / 60.0;
