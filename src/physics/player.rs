use log::{error, info};
use rapier3d::prelude::*;

use super::body::{CollisionBody, ShapeKind};
use super::mesh::{convex_hull_from_model, ModelData};
use super::world::PhysicsWorld;
use super::PhysicsError;
use crate::config::PlayerConfig;

/// The single dynamic body driven by the locomotion controller.
#[derive(Debug)]
pub struct PlayerBody {
    body: CollisionBody,
    config: PlayerConfig,
    /// Distance from the body origin down to the lowest point of its shape
    foot_offset: f32,
    /// Horizontal half extent used to spread the ground rays
    probe_radius: f32,
}

fn dynamic_body(config: &PlayerConfig) -> RigidBody {
    // Rotations are locked, so `rolling_friction` has nothing to act on here
    RigidBodyBuilder::dynamic()
        .translation(config.start_position())
        .can_sleep(false)
        .lock_rotations()
        .build()
}

impl PlayerBody {
    /// Builds the capsule player at `config.start_position`.
    pub fn capsule(world: &mut PhysicsWorld, config: PlayerConfig) -> Self {
        // Capsule half-height is the segment part: total = 2*half_segment + 2*radius
        let half_segment = (config.capsule_height - 2.0 * config.capsule_radius).max(0.0) / 2.0;
        let collider = ColliderBuilder::capsule_y(half_segment, config.capsule_radius)
            .mass(config.mass)
            .friction(config.friction)
            .friction_combine_rule(CoefficientCombineRule::Max)
            .build();

        let kind = ShapeKind::Capsule {
            radius: config.capsule_radius,
            height: config.capsule_height,
        };
        let body = CollisionBody::register(world, dynamic_body(&config), collider, kind);
        info!(
            "Player capsule created at {:?} (r={}, h={}, m={})",
            config.start_position, config.capsule_radius, config.capsule_height, config.mass
        );

        Self {
            body,
            foot_offset: config.half_height(),
            probe_radius: config.capsule_radius,
            config,
        }
    }

    /// Builds the player from model geometry instead of a capsule.
    /// No body is created when the model yields no usable shape.
    pub fn from_model(
        world: &mut PhysicsWorld,
        model: &ModelData,
        config: PlayerConfig,
    ) -> Result<Self, PhysicsError> {
        let Some((shape, points)) = convex_hull_from_model(model) else {
            error!("Player model produced no collision geometry; player not created");
            return Err(PhysicsError::EmptyMesh);
        };

        let aabb = shape.compute_local_aabb();
        let foot_offset = (-aabb.mins.y).max(0.0);
        let probe_radius = aabb.half_extents().x.min(aabb.half_extents().z);

        let collider = ColliderBuilder::new(shape)
            .mass(config.mass)
            .friction(config.friction)
            .friction_combine_rule(CoefficientCombineRule::Max)
            .build();
        let body = CollisionBody::register(
            world,
            dynamic_body(&config),
            collider,
            ShapeKind::ConvexHull { points },
        );
        info!("Player created from model ({} hull points)", points);

        Ok(Self {
            body,
            config,
            foot_offset,
            probe_radius,
        })
    }

    pub fn handle(&self) -> RigidBodyHandle {
        self.body.handle()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn shape_kind(&self) -> ShapeKind {
        self.body.kind()
    }

    pub fn foot_offset(&self) -> f32 {
        self.foot_offset
    }

    pub fn probe_radius(&self) -> f32 {
        self.probe_radius
    }

    pub fn mass(&self) -> f32 {
        self.config.mass
    }

    /// Current world position, or zero if the body is gone.
    pub fn position(&self, world: &PhysicsWorld) -> Vector<Real> {
        world
            .body(self.handle())
            .map(|body| *body.translation())
            .unwrap_or_else(Vector::zeros)
    }

    /// Current linear velocity, or zero if the body is gone.
    pub fn velocity(&self, world: &PhysicsWorld) -> Vector<Real> {
        world
            .body(self.handle())
            .map(|body| *body.linvel())
            .unwrap_or_else(Vector::zeros)
    }

    pub fn set_velocity(&self, world: &mut PhysicsWorld, velocity: Vector<Real>) {
        if let Some(body) = world.body_mut(self.handle()) {
            body.set_linvel(velocity, true);
        }
    }

    pub fn apply_impulse(&self, world: &mut PhysicsWorld, impulse: Vector<Real>) {
        if let Some(body) = world.body_mut(self.handle()) {
            body.apply_impulse(impulse, true);
        }
    }

    /// Adds a force that acts during the next world step only.
    pub fn add_force(&self, world: &mut PhysicsWorld, force: Vector<Real>) {
        if let Some(body) = world.body_mut(self.handle()) {
            body.add_force(force, true);
        }
    }

    /// Switches contact friction between standing and driven.
    ///
    /// With grip the configured friction wins over the surface's; without it
    /// friction is zero so commanded velocity is not eaten by the contacts.
    pub fn set_grip(&self, world: &mut PhysicsWorld, grip: bool) {
        let Some(collider) = world.collider_set.get_mut(self.body.collider_handle()) else {
            return;
        };
        if grip {
            collider.set_friction(self.config.friction);
            collider.set_friction_combine_rule(CoefficientCombineRule::Max);
        } else {
            collider.set_friction(0.0);
            collider.set_friction_combine_rule(CoefficientCombineRule::Min);
        }
    }

    /// Teleports the body, clearing linear and angular velocity.
    pub fn set_position(&self, world: &mut PhysicsWorld, position: Vector<Real>) {
        if let Some(body) = world.body_mut(self.handle()) {
            body.set_translation(position, true);
            body.set_linvel(Vector::zeros(), true);
            body.set_angvel(Vector::zeros(), true);
            body.wake_up(true);
        }
    }

    pub fn release(self, world: &mut PhysicsWorld) -> bool {
        self.body.release(world)
    }
}
