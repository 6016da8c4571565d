//! Vhalor combat core.
//!
//! Melee combat for a player-controlled character:
//! - Multi-step attack combo gated by animation timing windows
//! - Buffered attack input with expiry
//! - Front-cone blocking with guard breaks
//! - Sphere-sweep hit resolution with per-target de-duplication
//! - Bevy integration (rapier-backed hit queries), config hot reload, logging

pub mod combat;
pub mod config;
pub mod constants;
pub mod hotreload;
pub mod logging;
pub mod movement;
pub mod player;
