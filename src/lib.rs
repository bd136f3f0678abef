//! Village simulation library
//!
//! Physics-based character locomotion on top of rapier3d: a rigid-body world,
//! static colliders, a capsule (or mesh) player and the controller that moves it.

pub mod config;
pub mod physics;
pub mod player_state;

pub use config::{BackgroundTerrainConfig, PlayerConfig, SimConfig};
pub use physics::locomotion::MovementIntent;
pub use physics::{PhysicsError, PhysicsManager, PlayerTelemetry};
