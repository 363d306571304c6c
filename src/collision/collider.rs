use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::sdf::error::ensure_invertible;
use crate::sdf::CpuSdf;

use super::sampling::{sample_distance, sample_gradient};

/// Gradients shorter than this carry no usable surface direction
const DEGENERATE_GRADIENT: f32 = 1.0e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionParams {
    /// Steepest walkable slope in degrees
    pub max_incline_degrees: f32,
    /// Height the camera keeps above the surface, in world units
    pub surface_offset: f32,
}

impl Default for CollisionParams {
    fn default() -> Self {
        Self {
            max_incline_degrees: 75.0,
            surface_offset: 2.0,
        }
    }
}

impl CollisionParams {
    pub fn min_slope_cos(&self) -> f32 {
        self.max_incline_degrees.to_radians().cos()
    }
}

/// Resolves proposed camera moves against a static scene SDF.
///
/// A move is projected onto the offset surface in a single step. Fast
/// motion can leave the camera short of the exact resting height.
pub struct SdfCollider {
    sdf: CpuSdf,
    inverse_simulation: Mat4,
    params: CollisionParams,
}

impl SdfCollider {
    pub fn new(sdf: CpuSdf, simulation_transform: Mat4, params: CollisionParams) -> EngineResult<Self> {
        ensure_invertible("simulation transform", &simulation_transform)?;
        Ok(Self {
            sdf,
            inverse_simulation: simulation_transform.inverse(),
            params,
        })
    }

    pub fn sdf(&self) -> &CpuSdf {
        &self.sdf
    }

    /// Swap in a freshly downloaded mirror
    pub fn replace_sdf(&mut self, sdf: CpuSdf) {
        self.sdf = sdf;
    }

    pub fn params(&self) -> CollisionParams {
        self.params
    }

    pub fn set_params(&mut self, params: CollisionParams) {
        self.params = params;
    }

    /// Normalized lattice coordinate of a world position
    pub fn to_lattice(&self, world: Vec3) -> Vec3 {
        self.inverse_simulation.transform_point3(world)
    }

    pub fn distance(&self, world: Vec3) -> f32 {
        sample_distance(&self.sdf.distance, self.sdf.resolution, self.to_lattice(world))
    }

    /// Returns where the camera ends up when it tries to move to `proposed`
    pub fn resolve(&self, previous: Vec3, proposed: Vec3) -> Vec3 {
        let uv = self.to_lattice(proposed);
        if uv.cmplt(Vec3::ZERO).any() || uv.cmpgt(Vec3::ONE).any() {
            return previous;
        }

        let gradient = sample_gradient(&self.sdf.gradient, self.sdf.resolution, uv);
        if gradient.length() <= DEGENERATE_GRADIENT {
            return proposed;
        }
        let normal = gradient.normalize();

        if normal.dot(Vec3::Y) < self.params.min_slope_cos() {
            log::trace!("[SdfCollider] Rejected move onto slope {:?}", normal);
            return previous;
        }

        let distance = sample_distance(&self.sdf.distance, self.sdf.resolution, uv);
        proposed - normal * (distance - self.params.surface_offset)
    }
}
