use log::debug;
use rapier3d::prelude::*;

use super::constants::world as consts;

/// Nearest intersection returned by [`PhysicsWorld::cast_ray`].
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub point: Point<Real>,
    /// Surface normal, oriented toward the ray origin
    pub normal: Vector<Real>,
    pub distance: Real,
    pub collider: ColliderHandle,
}

/// Wrapper around the Rapier3D simulation context.
/// Owns every body and collider; other components only keep handles into it.
pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    /// Creates a new physics world. Gravity is disabled when `flying`.
    pub fn new(flying: bool) -> Self {
        let gravity = if flying {
            vector![0.0, 0.0, 0.0]
        } else {
            vector![0.0, -consts::GRAVITY, 0.0]
        };

        Self {
            gravity,
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Sets the gravity vector for the physics world
    pub fn set_gravity(&mut self, gravity: Vector<Real>) {
        self.gravity = gravity;
    }

    /// Steps the simulation forward by `dt` seconds using a fixed number of substeps.
    /// Forces accumulated on bodies are cleared afterwards.
    pub fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let dt = dt.min(consts::MAX_FRAME_DT);
        self.integration_parameters.dt = dt / consts::SUBSTEPS as f32;

        for _ in 0..consts::SUBSTEPS {
            self.physics_pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.rigid_body_set,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                &mut self.ccd_solver,
                Some(&mut self.query_pipeline),
                &(),
                &(),
            );
        }

        for (_, body) in self.rigid_body_set.iter_mut() {
            body.reset_forces(false);
        }
    }

    /// Inserts a body with its single collider and makes it visible to ray queries.
    pub fn add_body(&mut self, body: RigidBody, collider: Collider) -> (RigidBodyHandle, ColliderHandle) {
        let body_handle = self.rigid_body_set.insert(body);
        let collider_handle = self
            .collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);
        self.query_pipeline.update(&self.collider_set);
        (body_handle, collider_handle)
    }

    /// Removes a body together with its colliders. Returns false if it was not registered.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        let removed = self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        if removed.is_some() {
            self.query_pipeline.update(&self.collider_set);
        }
        removed.is_some()
    }

    /// Removes every remaining body and collider. Returns the number of bodies removed.
    pub fn drain_bodies(&mut self) -> usize {
        let handles: Vec<RigidBodyHandle> = self.rigid_body_set.iter().map(|(h, _)| h).collect();
        for &handle in &handles {
            self.rigid_body_set.remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
        }

        // Parentless colliders are not removed along with any body
        let orphans: Vec<ColliderHandle> = self.collider_set.iter().map(|(h, _)| h).collect();
        for handle in orphans {
            self.collider_set
                .remove(handle, &mut self.island_manager, &mut self.rigid_body_set, true);
        }

        self.query_pipeline.update(&self.collider_set);
        handles.len()
    }

    /// Tears the world down: drains remaining bodies, then releases the solver
    /// and collision structures in reverse construction order.
    pub fn shutdown(mut self) {
        let drained = self.drain_bodies();
        if drained > 0 {
            debug!("Removed {} remaining rigid bodies before world teardown", drained);
        }

        let PhysicsWorld {
            rigid_body_set,
            collider_set,
            physics_pipeline,
            island_manager,
            broad_phase,
            narrow_phase,
            impulse_joint_set,
            multibody_joint_set,
            ccd_solver,
            query_pipeline,
            ..
        } = self;

        drop(rigid_body_set);
        drop(collider_set);
        drop(impulse_joint_set);
        drop(multibody_joint_set);
        drop(island_manager);
        drop(physics_pipeline);
        drop(ccd_solver);
        drop(query_pipeline);
        drop(narrow_phase);
        drop(broad_phase);
    }

    /// Casts a ray from `from` to `to` and returns the nearest hit.
    pub fn cast_ray(
        &self,
        from: Point<Real>,
        to: Point<Real>,
        exclude_body: Option<RigidBodyHandle>,
    ) -> Option<RayHit> {
        let delta = to - from;
        let max_dist = delta.norm();
        if max_dist < consts::EPSILON {
            return None;
        }

        let direction = delta / max_dist;
        let ray = Ray::new(from, direction);

        let filter = if let Some(body_handle) = exclude_body {
            QueryFilter::default().exclude_sensors().exclude_rigid_body(body_handle)
        } else {
            QueryFilter::default().exclude_sensors()
        };

        let (collider, hit) = self.query_pipeline.cast_ray_and_get_normal(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_dist,
            true, // solid
            filter,
        )?;

        // Triangle meshes report the face normal regardless of winding
        let normal = if hit.normal.dot(&direction) > 0.0 {
            -hit.normal
        } else {
            hit.normal
        };

        Some(RayHit {
            point: ray.point_at(hit.time_of_impact),
            normal,
            distance: hit.time_of_impact,
            collider,
        })
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.rigid_body_set.get(handle)
    }

    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.rigid_body_set.get_mut(handle)
    }

    pub fn contains_body(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set.contains(handle)
    }

    pub fn num_rigid_bodies(&self) -> usize {
        self.rigid_body_set.len()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor(world: &mut PhysicsWorld) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed().translation(vector![0.0, -0.5, 0.0]).build();
        let collider = ColliderBuilder::cuboid(50.0, 0.5, 50.0).build();
        world.add_body(body, collider).0
    }

    #[test]
    fn test_physics_world_creation() {
        let world = PhysicsWorld::new(false);
        assert_eq!(world.gravity.y, -consts::GRAVITY);
        assert_eq!(world.num_rigid_bodies(), 0);

        let flying = PhysicsWorld::new(true);
        assert_eq!(flying.gravity, vector![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_dynamic_body_falls() {
        let mut world = PhysicsWorld::new(false);
        let (handle, _) = world.add_body(
            RigidBodyBuilder::dynamic().translation(vector![0.0, 10.0, 0.0]).build(),
            ColliderBuilder::ball(0.5).build(),
        );

        for _ in 0..10 {
            world.step(1.0 / 60.0);
        }

        let y = world.body(handle).unwrap().translation().y;
        assert!(y < 10.0, "Body should fall under gravity, y={}", y);
    }

    #[test]
    fn test_non_positive_dt_does_not_advance() {
        let mut world = PhysicsWorld::new(false);
        let (handle, _) = world.add_body(
            RigidBodyBuilder::dynamic().translation(vector![0.0, 10.0, 0.0]).build(),
            ColliderBuilder::ball(0.5).build(),
        );

        world.step(0.0);
        world.step(-1.0);
        world.step(f32::NAN);

        assert_eq!(world.body(handle).unwrap().translation().y, 10.0);
    }

    #[test]
    fn test_forces_cleared_after_step() {
        let mut world = PhysicsWorld::new(true);
        let (handle, _) = world.add_body(
            RigidBodyBuilder::dynamic().build(),
            ColliderBuilder::ball(0.5).mass(1.0).build(),
        );
        world.body_mut(handle).unwrap().add_force(vector![0.0, 10.0, 0.0], true);
        world.step(1.0 / 60.0);

        let body = world.body(handle).unwrap();
        assert!(body.linvel().y > 0.0);
        assert_eq!(body.user_force(), vector![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cast_ray_hits_floor_with_upward_normal() {
        let mut world = PhysicsWorld::new(false);
        floor(&mut world);

        let hit = world
            .cast_ray(point![0.0, 5.0, 0.0], point![0.0, -5.0, 0.0], None)
            .expect("Should detect floor");
        assert!((hit.distance - 5.0).abs() < 1e-3, "distance={}", hit.distance);
        assert!(hit.point.y.abs() < 1e-3);
        assert!((hit.normal.y - 1.0).abs() < 1e-3, "normal={:?}", hit.normal);
    }

    #[test]
    fn test_cast_ray_respects_length_and_exclusion() {
        let mut world = PhysicsWorld::new(false);
        let floor_handle = floor(&mut world);

        assert!(world
            .cast_ray(point![0.0, 5.0, 0.0], point![0.0, 1.0, 0.0], None)
            .is_none());
        assert!(world
            .cast_ray(point![0.0, 5.0, 0.0], point![0.0, -5.0, 0.0], Some(floor_handle))
            .is_none());
        assert!(world
            .cast_ray(point![0.0, 5.0, 0.0], point![0.0, 5.0, 0.0], None)
            .is_none());
    }

    #[test]
    fn test_remove_and_drain_bodies() {
        let mut world = PhysicsWorld::new(false);
        let a = floor(&mut world);
        floor(&mut world);
        assert_eq!(world.num_rigid_bodies(), 2);

        assert!(world.remove_body(a));
        assert!(!world.remove_body(a), "Second removal must be a no-op");
        assert_eq!(world.num_rigid_bodies(), 1);

        assert_eq!(world.drain_bodies(), 1);
        assert_eq!(world.num_rigid_bodies(), 0);
        assert_eq!(world.collider_set.len(), 0);
    }
}
