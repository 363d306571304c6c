use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::compute::FieldId;
use crate::field::{cell_count, linear_index};

use super::error::{ensure_len, SdfResult};
use super::SDF_EMPTY_DISTANCE;

/// One object contributing to the scene SDF
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    /// The object's own distance field, sampled over its unit cube
    pub sdf: FieldId,
    /// Object-to-world transform of that unit cube
    pub transform: Mat4,
    /// Converts the object's local distances to world units
    pub uniform_scale: f32,
}

/// Uniform block of the scene SDF kernels
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SceneSdfUniforms {
    /// Lattice (unit cube) to world
    pub simulation: [[f32; 4]; 4],
    /// World to object lattice
    pub inverse_object: [[f32; 4]; 4],
    /// Scene SDF extent (w unused)
    pub dims: [u32; 4],
    /// Object SDF extent (w unused)
    pub object_dims: [u32; 4],
    pub uniform_scale: f32,
    pub empty_distance: f32,
    pub _padding: [f32; 2],
}

impl SceneSdfUniforms {
    pub fn new(simulation: Mat4, dims: [u32; 3]) -> Self {
        Self {
            simulation: simulation.to_cols_array_2d(),
            inverse_object: Mat4::IDENTITY.to_cols_array_2d(),
            dims: [dims[0], dims[1], dims[2], 0],
            object_dims: [1, 1, 1, 0],
            uniform_scale: 1.0,
            empty_distance: SDF_EMPTY_DISTANCE,
            _padding: [0.0; 2],
        }
    }

    /// Same block with one object's parameters filled in
    pub fn with_object(self, object: &SceneObject, object_dims: [u32; 3]) -> Self {
        Self {
            inverse_object: object.transform.inverse().to_cols_array_2d(),
            object_dims: [object_dims[0], object_dims[1], object_dims[2], 0],
            uniform_scale: object.uniform_scale,
            ..self
        }
    }

    pub fn simulation(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.simulation)
    }

    pub fn inverse_object(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.inverse_object)
    }

    /// World-space spacing of the scene lattice along each axis
    pub fn cell_size(&self) -> Vec3 {
        let simulation = self.simulation();
        let extent = |n: u32| n.max(2) as f32 - 1.0;
        Vec3::new(
            simulation.x_axis.truncate().length() / extent(self.dims[0]),
            simulation.y_axis.truncate().length() / extent(self.dims[1]),
            simulation.z_axis.truncate().length() / extent(self.dims[2]),
        )
    }
}

/// Host copy of the scene SDF and its gradient, flat with x fastest
#[derive(Debug, Clone, PartialEq)]
pub struct CpuSdf {
    pub resolution: [u32; 3],
    pub distance: Vec<f32>,
    pub gradient: Vec<Vec3>,
}

impl CpuSdf {
    /// Empty space: maximal distance, zero gradient
    pub fn empty(resolution: [u32; 3]) -> Self {
        let len = cell_count(resolution);
        Self {
            resolution,
            distance: vec![SDF_EMPTY_DISTANCE; len],
            gradient: vec![Vec3::ZERO; len],
        }
    }

    /// Builds the mirror from a distance readback and a 4-component gradient readback
    pub fn from_readback(
        resolution: [u32; 3],
        distance: Vec<f32>,
        gradient: &[f32],
    ) -> SdfResult<Self> {
        let len = cell_count(resolution);
        ensure_len("scene SDF readback", len, distance.len())?;
        ensure_len("scene SDF gradient readback", len * 4, gradient.len())?;
        let gradient = gradient
            .chunks_exact(4)
            .map(|g| Vec3::new(g[0], g[1], g[2]))
            .collect();
        Ok(Self {
            resolution,
            distance,
            gradient,
        })
    }

    pub fn len(&self) -> usize {
        self.distance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distance.is_empty()
    }

    pub fn distance_at(&self, x: u32, y: u32, z: u32) -> f32 {
        self.distance[linear_index(self.resolution, x, y, z)]
    }

    pub fn gradient_at(&self, x: u32, y: u32, z: u32) -> Vec3 {
        self.gradient[linear_index(self.resolution, x, y, z)]
    }
}
