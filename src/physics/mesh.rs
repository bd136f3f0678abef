//! Triangle extraction from rendered model buffers.
//!
//! Models arrive as raw interleaved vertex bytes plus a u32 index list. Only
//! the position attribute (three little-endian f32 values) is read.

use log::warn;
use nalgebra::{Matrix3, Matrix4};
use rapier3d::prelude::*;

/// Fewest vertices (three triangles) accepted for a collision mesh
pub const MIN_MESH_VERTICES: usize = 9;

/// Where the position attribute lives inside one interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Bytes between two consecutive vertices
    pub stride: u32,
    /// Byte offset of the position attribute inside a vertex
    pub position_offset: u32,
}

impl VertexLayout {
    /// Tightly packed `[x, y, z]` positions.
    pub const POSITION_ONLY: VertexLayout = VertexLayout {
        stride: 12,
        position_offset: 0,
    };
}

/// Geometry of a loaded model as handed over by the scene loader.
#[derive(Debug, Clone)]
pub struct ModelData {
    pub vertices: Vec<u8>,
    pub indices: Vec<u32>,
    pub layout: VertexLayout,
}

impl ModelData {
    /// Packs float positions with [`VertexLayout::POSITION_ONLY`].
    pub fn from_positions(positions: &[[f32; 3]], indices: Vec<u32>) -> Self {
        let vertices = positions
            .iter()
            .flat_map(|p| p.iter().flat_map(|c| c.to_le_bytes()))
            .collect();
        Self {
            vertices,
            indices,
            layout: VertexLayout::POSITION_ONLY,
        }
    }
}

/// One placement of a model in the scene.
#[derive(Debug, Clone)]
pub struct MeshInstance {
    /// Index into the model list passed alongside the instances
    pub model_index: usize,
    pub used_for_physics: bool,
    /// Column-major world matrix
    pub world_transform: Matrix4<f32>,
}

impl MeshInstance {
    pub fn translation(&self) -> Vector<Real> {
        self.world_transform.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Rotation and scale part of the world matrix.
    pub fn linear(&self) -> Matrix3<f32> {
        self.world_transform.fixed_view::<3, 3>(0, 0).into_owned()
    }
}

/// Triangle soup produced by [`extract_triangles`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleSoup {
    pub points: Vec<Point<Real>>,
}

impl TriangleSoup {
    pub fn triangle_count(&self) -> usize {
        self.points.len() / 3
    }

    /// Sequential index triples over `points`.
    pub fn indices(&self) -> Vec<[u32; 3]> {
        (0..self.triangle_count() as u32)
            .map(|t| [3 * t, 3 * t + 1, 3 * t + 2])
            .collect()
    }

    /// Applies a linear transform (rotation/scale) to every point.
    pub fn transformed(mut self, linear: &Matrix3<f32>) -> Self {
        for p in &mut self.points {
            p.coords = linear * p.coords;
        }
        self
    }
}

fn read_position(vertices: &[u8], index: u32, layout: VertexLayout) -> Option<Point<Real>> {
    let base = (index as usize)
        .checked_mul(layout.stride as usize)?
        .checked_add(layout.position_offset as usize)?;
    let bytes = vertices.get(base..base.checked_add(12)?)?;
    let component = |i: usize| f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
    Some(point![component(0), component(4), component(8)])
}

/// Dereferences `indices` into a flat triangle list.
///
/// Triangles referencing vertices outside the buffer are dropped, as is any
/// trailing partial triangle. Returns `None` when fewer than
/// [`MIN_MESH_VERTICES`] vertices survive.
pub fn extract_triangles(vertices: &[u8], indices: &[u32], layout: VertexLayout) -> Option<TriangleSoup> {
    let mut points = Vec::with_capacity(indices.len() - indices.len() % 3);
    let mut skipped = 0usize;

    for tri in indices.chunks_exact(3) {
        let corners = [
            read_position(vertices, tri[0], layout),
            read_position(vertices, tri[1], layout),
            read_position(vertices, tri[2], layout),
        ];
        match corners {
            [Some(a), Some(b), Some(c)] => points.extend([a, b, c]),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {} triangles with out-of-range vertex indices", skipped);
    }

    if points.len() < MIN_MESH_VERTICES {
        return None;
    }
    Some(TriangleSoup { points })
}

/// Builds a static triangle-mesh shape from a model, baking `linear` into the vertices.
pub fn trimesh_from_model(model: &ModelData, linear: &Matrix3<f32>) -> Option<(SharedShape, usize)> {
    let soup = extract_triangles(&model.vertices, &model.indices, model.layout)?.transformed(linear);
    let triangles = soup.triangle_count();
    let indices = soup.indices();
    match SharedShape::trimesh(soup.points, indices) {
        Ok(shape) => Some((shape, triangles)),
        Err(e) => {
            warn!("Failed to build triangle mesh from model: {:?}", e);
            None
        }
    }
}

/// Builds a convex shape from a model, for bodies that must move.
pub fn convex_hull_from_model(model: &ModelData) -> Option<(SharedShape, usize)> {
    let soup = extract_triangles(&model.vertices, &model.indices, model.layout)?;
    let points = soup.points.len();
    let shape = SharedShape::convex_hull(&soup.points);
    if shape.is_none() {
        warn!("Model vertices do not span a volume; no convex hull");
    }
    shape.map(|s| (s, points))
}
