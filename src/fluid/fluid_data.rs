use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::compute::{ComputeBackend, FieldDesc, FieldId};
use crate::error::EngineResult;
use crate::field::{PingPong, StaggeredDims};

/// Tunable fluid coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidParams {
    /// Upward acceleration per unit density
    pub buoyancy: f32,
    /// Vorticity confinement strength (epsilon)
    pub vorticity: f32,
    /// Wind acceleration along +x, modulated by the noise volume
    pub wind_strength: f32,
    /// Density emitted per second where the noise is positive
    pub density_emission: f32,
    /// Fraction of density lost per second
    pub density_decay: f32,
    /// Diffusion coefficient
    pub diffusion_rate: f32,
    /// Run the density diffusion iterations before density advection
    pub diffusion_enabled: bool,
}

impl Default for FluidParams {
    fn default() -> Self {
        Self {
            buoyancy: 1.0,
            vorticity: 0.2,
            wind_strength: 0.5,
            density_emission: 1.0,
            density_decay: 0.1,
            diffusion_rate: 0.0005,
            diffusion_enabled: false,
        }
    }
}

/// Uniform block shared by every fluid kernel
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FluidUniforms {
    /// Logical simulation extent (w unused)
    pub sim_dims: [u32; 4],
    /// Bound SDF extent
    pub sdf_dims: [u32; 4],
    /// Bound noise volume extent
    pub noise_dims: [u32; 4],
    /// Bound surface heightfield extent
    pub surface_dims: [u32; 4],
    pub delta_time: f32,
    pub elapsed_time: f32,
    pub buoyancy: f32,
    pub vorticity: f32,
    pub wind_strength: f32,
    pub density_emission: f32,
    pub density_decay: f32,
    pub diffusion_rate: f32,
}

impl FluidUniforms {
    pub fn sim_dims(&self) -> [u32; 3] {
        [self.sim_dims[0], self.sim_dims[1], self.sim_dims[2]]
    }
}

/// Three face-centred velocity components, swapped together
#[derive(Debug, Clone)]
pub struct StaggeredVelocity {
    dims: StaggeredDims,
    x: PingPong<FieldId>,
    y: PingPong<FieldId>,
    z: PingPong<FieldId>,
}

impl StaggeredVelocity {
    pub fn new(backend: &mut dyn ComputeBackend, sim_dims: [u32; 3]) -> EngineResult<Self> {
        let dims = StaggeredDims::new(sim_dims);
        let mut pair = |name: &str, dims: [u32; 3]| -> EngineResult<PingPong<FieldId>> {
            Ok(PingPong::new(
                backend.create_field(FieldDesc::scalar(format!("fluid.velocity_{}.0", name), dims))?,
                backend.create_field(FieldDesc::scalar(format!("fluid.velocity_{}.1", name), dims))?,
            ))
        };
        Ok(Self {
            x: pair("x", dims.x)?,
            y: pair("y", dims.y)?,
            z: pair("z", dims.z)?,
            dims,
        })
    }

    pub fn dims(&self) -> StaggeredDims {
        self.dims
    }

    /// Read side, x/y/z
    pub fn current(&self) -> [FieldId; 3] {
        [*self.x.current(), *self.y.current(), *self.z.current()]
    }

    /// Write side, x/y/z
    pub fn next(&self) -> [FieldId; 3] {
        [*self.x.next(), *self.y.next(), *self.z.next()]
    }

    pub fn swap(&mut self) {
        self.x.swap();
        self.y.swap();
        self.z.swap();
    }

    pub fn all(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.x
            .slots()
            .iter()
            .chain(self.y.slots())
            .chain(self.z.slots())
            .copied()
    }
}
