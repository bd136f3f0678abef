//! Simulation configuration parsing from sim.toml files

use rapier3d::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Physical parameters for the controllable player body
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Capsule radius
    pub capsule_radius: f32,
    /// Total capsule height, tip to tip
    pub capsule_height: f32,
    pub mass: f32,
    pub start_position: [f32; 3],
    /// Walk speed in units/second
    pub move_speed: f32,
    /// Run speed in units/second
    pub run_speed: f32,
    /// Jump impulse magnitude (N·s)
    pub jump_force: f32,
    /// Fraction of input applied while airborne
    pub air_control: f32,
    /// Horizontal velocity multiplier applied each frame when grounded without input
    pub ground_damping: f32,
    /// Contact friction while standing; driven movement runs frictionless
    pub friction: f32,
    /// Accepted for scene compatibility; the player body never rotates, so it has no effect
    pub rolling_friction: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            capsule_radius: 0.15,
            capsule_height: 1.3,
            mass: 100.0,
            start_position: [30.0, 10.0, 15.0],
            move_speed: 2.3,
            run_speed: 3.5,
            jump_force: 350.0,
            air_control: 0.3,
            ground_damping: 0.5,
            friction: 2.5,
            rolling_friction: 5.1,
        }
    }
}

impl PlayerConfig {
    pub fn start_position(&self) -> Vector<Real> {
        let [x, y, z] = self.start_position;
        vector![x, y, z]
    }

    /// Half of the total capsule height (center to tip).
    pub fn half_height(&self) -> f32 {
        self.capsule_height * 0.5
    }

    /// Rejects values the simulation cannot build a body from.
    pub fn validate(&self) -> Result<(), String> {
        let finite = [
            self.capsule_radius,
            self.capsule_height,
            self.mass,
            self.move_speed,
            self.run_speed,
            self.jump_force,
            self.air_control,
            self.ground_damping,
            self.friction,
            self.rolling_friction,
        ]
        .iter()
        .chain(self.start_position.iter())
        .all(|v| v.is_finite());
        if !finite {
            return Err("player config contains non-finite values".to_string());
        }
        if self.capsule_radius <= 0.0 {
            return Err(format!("capsule_radius must be positive, got {}", self.capsule_radius));
        }
        if self.capsule_height < 2.0 * self.capsule_radius {
            return Err(format!(
                "capsule_height ({}) must be at least twice capsule_radius ({})",
                self.capsule_height, self.capsule_radius
            ));
        }
        if self.mass <= 0.0 {
            return Err(format!("mass must be positive, got {}", self.mass));
        }
        if self.move_speed < 0.0 || self.run_speed < 0.0 || self.jump_force < 0.0 {
            return Err("speeds and jump force must not be negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.ground_damping) {
            return Err(format!("ground_damping must be within [0, 1], got {}", self.ground_damping));
        }
        Ok(())
    }
}

/// Large flat plane used as fallback ground when no terrain mesh is loaded.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackgroundTerrainConfig {
    /// Half side length of the terrain square
    pub size: f32,
    pub position: [f32; 3],
}

impl Default for BackgroundTerrainConfig {
    fn default() -> Self {
        Self {
            size: 500.0,
            position: [0.0, 0.0, 0.0],
        }
    }
}

impl BackgroundTerrainConfig {
    pub fn position(&self) -> Vector<Real> {
        let [x, y, z] = self.position;
        vector![x, y, z]
    }
}

/// Simulation configuration from sim.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimConfig {
    /// Disables gravity and inertia; the player moves freely in 3D
    #[serde(default)]
    pub fly_mode: bool,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub terrain: BackgroundTerrainConfig,
}

impl SimConfig {
    /// Load simulation configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;

        toml::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}

/// Errors that can occur when loading simulation configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
