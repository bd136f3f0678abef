use log::{debug, warn};
use rapier3d::prelude::*;

use super::body::{CollisionBody, ShapeKind};
use super::mesh::{trimesh_from_model, MeshInstance, ModelData};
use super::world::PhysicsWorld;
use super::PhysicsError;

/// Owns every immovable collider added after the fallback terrain.
#[derive(Debug, Default)]
pub struct StaticColliderRegistry {
    bodies: Vec<CollisionBody>,
}

impl StaticColliderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, body: CollisionBody) -> RigidBodyHandle {
        let handle = body.handle();
        self.bodies.push(body);
        handle
    }

    /// Adds an axis-aligned box of full extents `size` centered at `position`.
    pub fn add_static_box(
        &mut self,
        world: &mut PhysicsWorld,
        position: Vector<Real>,
        size: Vector<Real>,
    ) -> RigidBodyHandle {
        self.add_static_box_rotated(world, position, size, Rotation::identity())
    }

    /// Adds a box of full extents `size`, rotated about its center.
    pub fn add_static_box_rotated(
        &mut self,
        world: &mut PhysicsWorld,
        position: Vector<Real>,
        size: Vector<Real>,
        rotation: Rotation<Real>,
    ) -> RigidBodyHandle {
        let half = size * 0.5;
        let body = CollisionBody::fixed(
            world,
            SharedShape::cuboid(half.x, half.y, half.z),
            ShapeKind::Box { size: [size.x, size.y, size.z] },
            position,
            rotation,
        );
        self.push(body)
    }

    pub fn add_static_sphere(
        &mut self,
        world: &mut PhysicsWorld,
        position: Vector<Real>,
        radius: f32,
    ) -> RigidBodyHandle {
        let body = CollisionBody::fixed(
            world,
            SharedShape::ball(radius),
            ShapeKind::Sphere { radius },
            position,
            Rotation::identity(),
        );
        self.push(body)
    }

    /// Registers one model instance as a static triangle mesh, regardless of
    /// its physics flag. The instance's rotation and scale are baked into the
    /// vertices; the body sits at the instance translation.
    pub fn add_static_mesh(
        &mut self,
        world: &mut PhysicsWorld,
        models: &[ModelData],
        instance: &MeshInstance,
    ) -> Result<RigidBodyHandle, PhysicsError> {
        let model = models.get(instance.model_index).ok_or(PhysicsError::InvalidModelIndex {
            index: instance.model_index,
            models: models.len(),
        })?;
        let (shape, triangles) =
            trimesh_from_model(model, &instance.linear()).ok_or(PhysicsError::EmptyMesh)?;

        let body = CollisionBody::fixed(
            world,
            shape,
            ShapeKind::TriangleMesh { triangles },
            instance.translation(),
            Rotation::identity(),
        );
        Ok(self.push(body))
    }

    /// Registers a triangle-mesh body for every instance flagged for physics.
    ///
    /// Instances with an invalid model index or degenerate geometry are logged
    /// and skipped; the rest of the batch is still processed. Returns the
    /// number of bodies added.
    pub fn add_static_meshes(
        &mut self,
        world: &mut PhysicsWorld,
        models: &[ModelData],
        instances: &[MeshInstance],
    ) -> usize {
        let mut added = 0;

        for (instance_idx, instance) in instances.iter().enumerate() {
            if !instance.used_for_physics {
                continue;
            }
            match self.add_static_mesh(world, models, instance) {
                Ok(_) => added += 1,
                Err(e) => warn!("Static instance {}: {}, skipping", instance_idx, e),
            }
        }

        debug!("Registered {} static meshes from {} instances", added, instances.len());
        added
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollisionBody> {
        self.bodies.iter()
    }

    /// Deregisters and drops every static body.
    pub fn clear(&mut self, world: &mut PhysicsWorld) {
        for body in self.bodies.drain(..) {
            body.release(world);
        }
    }
}
