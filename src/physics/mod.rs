//! Physics-driven character locomotion.
//!
//! [`PhysicsManager`] owns the rapier world and every body in it, and enforces
//! the setup and teardown order: world, fallback terrain, player, statics on
//! the way up; the reverse on the way down.

pub mod body;
pub mod constants;
pub mod ground;
pub mod locomotion;
pub mod mesh;
pub mod player;
pub mod statics;
pub mod world;

use log::{error, info, warn};
use rapier3d::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::config::{BackgroundTerrainConfig, PlayerConfig, SimConfig};
use crate::player_state::{ActionState, MovementState, PlayerStateTracker};
use body::{CollisionBody, ShapeKind};
use ground::GroundState;
use locomotion::{LocomotionController, MovementIntent};
use mesh::{MeshInstance, ModelData};
use player::PlayerBody;
use statics::StaticColliderRegistry;
use world::PhysicsWorld;

#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to build terrain shape: {0}")]
    TerrainShape(String),
    #[error("physics world is not initialized")]
    NotInitialized,
    #[error("model has no usable collision geometry")]
    EmptyMesh,
    #[error("model index {index} out of range ({models} models loaded)")]
    InvalidModelIndex { index: usize, models: usize },
}

/// Snapshot of the player read back after a step, for camera and debug overlays.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerTelemetry {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub grounded: bool,
    pub slope_degrees: f32,
    pub ground_normal: [f32; 3],
    pub rigid_bodies: usize,
    pub movement: MovementState,
    pub action: ActionState,
}

fn to_array(v: Vector<Real>) -> [f32; 3] {
    [v.x, v.y, v.z]
}

/// Fallback ground: a square of half side `size`, as two upward-facing triangles.
fn terrain_shape(size: f32) -> Result<SharedShape, PhysicsError> {
    let vertices = vec![
        point![-size, 0.0, -size],
        point![size, 0.0, -size],
        point![size, 0.0, size],
        point![-size, 0.0, size],
    ];
    let indices = vec![[0, 3, 2], [0, 2, 1]];
    SharedShape::trimesh(vertices, indices).map_err(|e| PhysicsError::TerrainShape(format!("{:?}", e)))
}

/// Owns the physics world and everything registered in it.
///
/// Every per-frame entry point is a no-op (or returns a zeroed default) until
/// [`PhysicsManager::initialize`] succeeds and a player exists.
pub struct PhysicsManager {
    world: Option<PhysicsWorld>,
    terrain: Option<CollisionBody>,
    player: Option<PlayerBody>,
    statics: StaticColliderRegistry,
    controller: LocomotionController,
    state: PlayerStateTracker,
    fly_mode: bool,
    player_config: PlayerConfig,
    terrain_config: BackgroundTerrainConfig,
}

impl Default for PhysicsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsManager {
    pub fn new() -> Self {
        Self {
            world: None,
            terrain: None,
            player: None,
            statics: StaticColliderRegistry::new(),
            controller: LocomotionController::new(false),
            state: PlayerStateTracker::new(),
            fly_mode: false,
            player_config: PlayerConfig::default(),
            terrain_config: BackgroundTerrainConfig::default(),
        }
    }

    /// Builds a manager and initializes it from a loaded configuration.
    pub fn from_config(config: &SimConfig) -> Result<Self, PhysicsError> {
        let mut manager = Self::new();
        manager.initialize(config.fly_mode, config.player.clone(), config.terrain.clone())?;
        Ok(manager)
    }

    /// Creates the world and the fallback terrain. Any previous world is torn
    /// down first. On failure nothing is left allocated.
    pub fn initialize(
        &mut self,
        fly_mode: bool,
        player_config: PlayerConfig,
        terrain_config: BackgroundTerrainConfig,
    ) -> Result<(), PhysicsError> {
        self.cleanup();

        if let Err(e) = self.try_initialize(fly_mode, player_config, terrain_config) {
            error!("Physics initialization failed: {}", e);
            self.cleanup();
            return Err(e);
        }

        info!(
            "Physics initialized (fly_mode={}, terrain half size {})",
            self.fly_mode, self.terrain_config.size
        );
        Ok(())
    }

    fn try_initialize(
        &mut self,
        fly_mode: bool,
        player_config: PlayerConfig,
        terrain_config: BackgroundTerrainConfig,
    ) -> Result<(), PhysicsError> {
        player_config.validate().map_err(PhysicsError::InvalidConfig)?;
        if !terrain_config.size.is_finite() || terrain_config.size <= 0.0 {
            return Err(PhysicsError::InvalidConfig(format!(
                "terrain size must be positive, got {}",
                terrain_config.size
            )));
        }

        let mut world = PhysicsWorld::new(fly_mode);
        let shape = terrain_shape(terrain_config.size)?;
        let terrain = CollisionBody::fixed(
            &mut world,
            shape,
            ShapeKind::TriangleMesh { triangles: 2 },
            terrain_config.position(),
            Rotation::identity(),
        );

        self.world = Some(world);
        self.terrain = Some(terrain);
        self.controller = LocomotionController::new(fly_mode);
        self.state = PlayerStateTracker::new();
        self.fly_mode = fly_mode;
        self.player_config = player_config;
        self.terrain_config = terrain_config;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.world.is_some()
    }

    pub fn fly_mode(&self) -> bool {
        self.fly_mode
    }

    pub fn player_config(&self) -> &PlayerConfig {
        &self.player_config
    }

    pub fn has_player(&self) -> bool {
        self.player.is_some()
    }

    pub fn player(&self) -> Option<&PlayerBody> {
        self.player.as_ref()
    }

    pub fn world(&self) -> Option<&PhysicsWorld> {
        self.world.as_ref()
    }

    pub fn statics(&self) -> &StaticColliderRegistry {
        &self.statics
    }

    fn replace_player(&mut self, world: &mut PhysicsWorld, player: PlayerBody) {
        if let Some(old) = self.player.replace(player) {
            old.release(world);
        }
        self.controller.reset();
    }

    /// Creates the capsule player from the configured dimensions, replacing any existing player.
    pub fn add_capsule_player(&mut self) -> Result<(), PhysicsError> {
        let mut world = self.world.take().ok_or(PhysicsError::NotInitialized)?;
        let player = PlayerBody::capsule(&mut world, self.player_config.clone());
        self.replace_player(&mut world, player);
        self.world = Some(world);
        Ok(())
    }

    /// Creates the player from model geometry. On failure no body is created
    /// and any existing player is kept.
    pub fn add_player_from_model(&mut self, model: &ModelData) -> Result<(), PhysicsError> {
        let mut world = self.world.take().ok_or(PhysicsError::NotInitialized)?;
        let result = PlayerBody::from_model(&mut world, model, self.player_config.clone())
            .map(|player| self.replace_player(&mut world, player));
        self.world = Some(world);
        result
    }

    pub fn add_static_box(&mut self, position: Vector<Real>, size: Vector<Real>) -> Option<RigidBodyHandle> {
        self.add_static_box_rotated(position, size, Rotation::identity())
    }

    pub fn add_static_box_rotated(
        &mut self,
        position: Vector<Real>,
        size: Vector<Real>,
        rotation: Rotation<Real>,
    ) -> Option<RigidBodyHandle> {
        let Some(world) = self.world.as_mut() else {
            warn!("add_static_box ignored: physics not initialized");
            return None;
        };
        Some(self.statics.add_static_box_rotated(world, position, size, rotation))
    }

    pub fn add_static_sphere(&mut self, position: Vector<Real>, radius: f32) -> Option<RigidBodyHandle> {
        let Some(world) = self.world.as_mut() else {
            warn!("add_static_sphere ignored: physics not initialized");
            return None;
        };
        Some(self.statics.add_static_sphere(world, position, radius))
    }

    /// Registers every physics-flagged instance. Returns how many bodies were added.
    pub fn add_static_meshes(&mut self, models: &[ModelData], instances: &[MeshInstance]) -> usize {
        let Some(world) = self.world.as_mut() else {
            warn!("add_static_meshes ignored: physics not initialized");
            return 0;
        };
        let added = self.statics.add_static_meshes(world, models, instances);
        info!("Added {} static meshes ({} static bodies total)", added, self.statics.len());
        added
    }

    /// Steps the world and refreshes the player's ground state.
    pub fn update(&mut self, dt: f32) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        self.controller.update(world, self.player.as_ref(), dt);
    }

    pub fn move_player(&mut self, direction: Vector<Real>, running: bool) {
        let (Some(world), Some(player)) = (self.world.as_mut(), self.player.as_ref()) else {
            return;
        };
        self.controller.move_player(world, player, direction, running);
    }

    pub fn jump_player(&mut self) -> bool {
        let (Some(world), Some(player)) = (self.world.as_mut(), self.player.as_ref()) else {
            return false;
        };
        self.controller.jump_player(world, player)
    }

    /// Runs one frame: movement, then the jump if requested, then the step.
    /// Returns whether a jump fired.
    pub fn frame(&mut self, dt: f32, intent: &MovementIntent) -> bool {
        self.move_player(intent.direction, intent.running);
        let jumped = intent.jump && self.jump_player();
        self.update(dt);

        let has_input = intent.direction.norm() > constants::world::EPSILON;
        self.state.update(dt, has_input, intent.running, jumped);
        jumped
    }

    pub fn can_jump(&self) -> bool {
        self.player.is_some() && self.controller.can_jump()
    }

    pub fn player_position(&self) -> Vector<Real> {
        match (self.world.as_ref(), self.player.as_ref()) {
            (Some(world), Some(player)) => player.position(world),
            _ => Vector::zeros(),
        }
    }

    pub fn player_velocity(&self) -> Vector<Real> {
        match (self.world.as_ref(), self.player.as_ref()) {
            (Some(world), Some(player)) => player.velocity(world),
            _ => Vector::zeros(),
        }
    }

    /// Teleports the player and clears its velocity.
    pub fn set_player_position(&mut self, position: Vector<Real>) {
        if let (Some(world), Some(player)) = (self.world.as_mut(), self.player.as_ref()) {
            player.set_position(world, position);
        }
    }

    pub fn is_player_grounded(&self) -> bool {
        self.player.is_some() && self.controller.is_grounded()
    }

    pub fn ground_state(&self) -> GroundState {
        *self.controller.ground_state()
    }

    pub fn ground_slope_degrees(&self) -> f32 {
        self.controller.ground_state().slope_degrees()
    }

    pub fn ground_normal(&self) -> Vector<Real> {
        self.controller.ground_state().normal
    }

    pub fn movement_state(&self) -> MovementState {
        self.state.movement()
    }

    pub fn action_state(&self) -> ActionState {
        self.state.action()
    }

    pub fn set_gravity(&mut self, gravity: Vector<Real>) {
        if let Some(world) = self.world.as_mut() {
            world.set_gravity(gravity);
        }
    }

    pub fn num_rigid_bodies(&self) -> usize {
        self.world.as_ref().map_or(0, PhysicsWorld::num_rigid_bodies)
    }

    pub fn telemetry(&self) -> PlayerTelemetry {
        PlayerTelemetry {
            position: to_array(self.player_position()),
            velocity: to_array(self.player_velocity()),
            grounded: self.is_player_grounded(),
            slope_degrees: self.ground_slope_degrees(),
            ground_normal: to_array(self.ground_normal()),
            rigid_bodies: self.num_rigid_bodies(),
            movement: self.state.movement(),
            action: self.state.action(),
        }
    }

    /// Releases statics, player and terrain, then tears the world down.
    /// Safe to call repeatedly.
    pub fn cleanup(&mut self) {
        let Some(mut world) = self.world.take() else {
            return;
        };

        let statics = self.statics.len();
        self.statics.clear(&mut world);
        if let Some(player) = self.player.take() {
            player.release(&mut world);
        }
        if let Some(terrain) = self.terrain.take() {
            terrain.release(&mut world);
        }
        world.shutdown();

        self.controller.reset();
        self.state = PlayerStateTracker::new();
        info!("Physics cleaned up ({} static bodies released)", statics);
    }
}

impl Drop for PhysicsManager {
    fn drop(&mut self) {
        self.cleanup();
    }
}
