use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::compute::{run_stage, ComputeBackend, FieldDesc, FieldId, Kernel};
use crate::error::EngineResult;
use crate::fractal::{FractalNoiseParams, GradientNoise, PERMUTATION_SIZE};

/// Grid extents of the displacement outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplacementDims {
    /// Heightfield and normal map extent
    pub height: [u32; 3],
    /// Terrain sub-SDF extent
    pub sdf: [u32; 3],
}

impl Default for DisplacementDims {
    fn default() -> Self {
        Self {
            height: [136, 136, 1],
            sdf: [64, 64, 64],
        }
    }
}

/// Terrain SDF generation parameters
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct TerrainSdfUniforms {
    /// SDF grid extent (w unused)
    pub dims: [u32; 4],
    /// Heightfield extent (w unused)
    pub height_dims: [u32; 4],
    /// Local height at the bottom of the SDF volume
    pub min_y: f32,
    /// Local height at the top of the SDF volume
    pub max_y: f32,
    pub _padding: [f32; 2],
}

/// GPU terrain displacement.
///
/// Produces the heightfield and normals that displace the terrain mesh,
/// and the terrain's own SDF which the scene SDF consumes as an object.
pub struct DisplacementGenerator {
    dims: DisplacementDims,
    params: FractalNoiseParams,
    noise: GradientNoise,
    permutation: FieldId,
    height: FieldId,
    normal: FieldId,
    sdf: FieldId,
}

impl DisplacementGenerator {
    pub fn new(
        backend: &mut dyn ComputeBackend,
        dims: DisplacementDims,
        noise: GradientNoise,
        params: FractalNoiseParams,
    ) -> EngineResult<Self> {
        let permutation = backend.create_field(FieldDesc::scalar(
            "terrain.permutation",
            [PERMUTATION_SIZE as u32 * 2, 1, 1],
        ))?;
        let height = backend.create_field(FieldDesc::scalar("terrain.height", dims.height))?;
        let normal = backend.create_field(FieldDesc::vector("terrain.normal", dims.height))?;
        let sdf = backend.create_field(FieldDesc::scalar("terrain.sdf", dims.sdf))?;

        log::info!(
            "[DisplacementGenerator] Heightfield {:?}, terrain SDF {:?}",
            dims.height,
            dims.sdf
        );

        Ok(Self {
            dims,
            params,
            noise,
            permutation,
            height,
            normal,
            sdf,
        })
    }

    /// Regenerate heightfield, normals and terrain SDF from the current parameters
    pub fn compute(&mut self, backend: &mut dyn ComputeBackend) -> EngineResult<()> {
        backend.write_field(self.permutation, &self.noise.permutation_field())?;

        run_stage(
            backend,
            Kernel::TerrainHeight,
            &self.params.uniforms(self.dims.height, false),
            &[self.permutation, self.height, self.normal],
            self.dims.height,
        )?;

        let max_height = self.estimate_max();
        let sdf_uniforms = TerrainSdfUniforms {
            dims: extend(self.dims.sdf),
            height_dims: extend(self.dims.height),
            min_y: -max_height,
            max_y: max_height,
            _padding: [0.0; 2],
        };
        run_stage(
            backend,
            Kernel::TerrainSdf,
            &sdf_uniforms,
            &[self.height, self.sdf],
            self.dims.sdf,
        )?;

        log::debug!(
            "[DisplacementGenerator] Regenerated terrain (octaves {}, height bound {:.3})",
            self.params.octaves,
            max_height
        );
        Ok(())
    }

    /// Sum of octave amplitudes, the bound used for the terrain SDF's vertical range
    pub fn estimate_max(&self) -> f32 {
        self.params.estimate_max()
    }

    pub fn dims(&self) -> DisplacementDims {
        self.dims
    }

    pub fn params(&self) -> &FractalNoiseParams {
        &self.params
    }

    pub fn set_params(&mut self, params: FractalNoiseParams) {
        self.params = params;
    }

    pub fn noise(&self) -> &GradientNoise {
        &self.noise
    }

    pub fn frequency(&self) -> f32 {
        self.params.frequency
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.params.frequency = frequency;
    }

    pub fn amplitude(&self) -> f32 {
        self.params.amplitude
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.params.amplitude = amplitude;
    }

    pub fn lacunarity(&self) -> f32 {
        self.params.lacunarity
    }

    pub fn set_lacunarity(&mut self, lacunarity: f32) {
        self.params.lacunarity = lacunarity;
    }

    pub fn gain(&self) -> f32 {
        self.params.gain
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.params.gain = gain;
    }

    pub fn offset(&self) -> Vec3 {
        self.params.offset
    }

    pub fn set_offset(&mut self, offset: Vec3) {
        self.params.offset = offset;
    }

    pub fn octaves(&self) -> u32 {
        self.params.octaves
    }

    pub fn set_octaves(&mut self, octaves: u32) {
        self.params.octaves = octaves;
    }

    pub fn height_field(&self) -> FieldId {
        self.height
    }

    pub fn normal_field(&self) -> FieldId {
        self.normal
    }

    pub fn sdf_field(&self) -> FieldId {
        self.sdf
    }
}

fn extend(dims: [u32; 3]) -> [u32; 4] {
    [dims[0], dims[1], dims[2], 0]
}
