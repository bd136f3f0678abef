use log::warn;
use rapier3d::prelude::*;

use super::world::PhysicsWorld;

/// Collision geometry carried by a [`CollisionBody`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeKind {
    /// Radius and total height (tip to tip)
    Capsule { radius: f32, height: f32 },
    /// Full extents
    Box { size: [f32; 3] },
    Sphere { radius: f32 },
    TriangleMesh { triangles: usize },
    ConvexHull { points: usize },
}

/// A body registered in the [`PhysicsWorld`] with exactly one collider.
///
/// The world owns the underlying rigid body, collider and shape; this handle
/// owns the registration. It must be released with [`CollisionBody::release`]
/// before the world is torn down, which drops the shape along with the body.
#[derive(Debug)]
pub struct CollisionBody {
    body_handle: RigidBodyHandle,
    collider_handle: ColliderHandle,
    kind: ShapeKind,
    initial_position: Vector<Real>,
}

impl CollisionBody {
    /// Registers `body` and `collider` into `world`.
    pub fn register(
        world: &mut PhysicsWorld,
        body: RigidBody,
        collider: Collider,
        kind: ShapeKind,
    ) -> Self {
        let initial_position = *body.translation();
        let (body_handle, collider_handle) = world.add_body(body, collider);
        Self {
            body_handle,
            collider_handle,
            kind,
            initial_position,
        }
    }

    /// Builds and registers a zero-mass body that never moves.
    pub fn fixed(
        world: &mut PhysicsWorld,
        shape: SharedShape,
        kind: ShapeKind,
        position: Vector<Real>,
        rotation: Rotation<Real>,
    ) -> Self {
        let body = RigidBodyBuilder::fixed()
            .translation(position)
            .rotation(rotation.scaled_axis())
            .build();
        let collider = ColliderBuilder::new(shape).build();
        Self::register(world, body, collider, kind)
    }

    pub fn handle(&self) -> RigidBodyHandle {
        self.body_handle
    }

    pub fn collider_handle(&self) -> ColliderHandle {
        self.collider_handle
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn initial_position(&self) -> Vector<Real> {
        self.initial_position
    }

    /// Deregisters the body from the world, dropping its collider and shape.
    pub fn release(self, world: &mut PhysicsWorld) -> bool {
        let removed = world.remove_body(self.body_handle);
        if !removed {
            warn!(
                "{:?} body {:?} was already gone from the world on release",
                self.kind, self.body_handle
            );
        }
        removed
    }
}
