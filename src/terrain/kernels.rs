//! Host reference kernels for terrain displacement

use glam::Vec3;

use crate::compute::{FieldTarget, KernelInputs};
use crate::error::EngineResult;
use crate::fractal::kernels::permutation_from;
use crate::fractal::{FractalNoiseParams, FractalUniforms, GradientNoise};

use super::TerrainSdfUniforms;

/// Height at normalized heightfield coordinates (u, v)
fn height_at(params: &FractalNoiseParams, noise: &GradientNoise, u: f32, v: f32) -> f32 {
    params.fbm(noise, Vec3::new(u, 0.0, v) + params.offset)
}

/// Heightfield plus central-difference normals
pub fn terrain_height(inputs: &KernelInputs<'_>, outputs: &mut [FieldTarget]) -> EngineResult<()> {
    let uniforms: FractalUniforms = inputs.uniforms()?;
    let noise = permutation_from(&inputs.field(0)?)?;
    let params = uniforms.params();
    let dims = uniforms.dims();

    let du = 1.0 / (dims[0].max(2) - 1) as f32;
    let dv = 1.0 / (dims[1].max(2) - 1) as f32;

    let (height, normal) = outputs.split_at_mut(1);
    height[0].fill(inputs.grid, |x, y, _| {
        height_at(&params, &noise, x as f32 * du, y as f32 * dv)
    });
    normal[0].fill_vec3(inputs.grid, |x, y, _| {
        let u = x as f32 * du;
        let v = y as f32 * dv;
        let left = height_at(&params, &noise, u - du, v);
        let right = height_at(&params, &noise, u + du, v);
        let down = height_at(&params, &noise, u, v - dv);
        let up = height_at(&params, &noise, u, v + dv);
        Vec3::new(
            (left - right) / (2.0 * du),
            1.0,
            (down - up) / (2.0 * dv),
        )
        .normalize()
    });
    Ok(())
}

/// Terrain SDF: local height minus the bilinear terrain height
pub fn terrain_sdf(inputs: &KernelInputs<'_>, outputs: &mut [FieldTarget]) -> EngineResult<()> {
    let uniforms: TerrainSdfUniforms = inputs.uniforms()?;
    let height = inputs.field(0)?;
    let out = &mut outputs[0];
    let extent = Vec3::new(
        (out.dims[0].max(2) - 1) as f32,
        (out.dims[1].max(2) - 1) as f32,
        (out.dims[2].max(2) - 1) as f32,
    );
    let height_extent = height.extent();

    out.fill(inputs.grid, |x, y, z| {
        let uv = Vec3::new(x as f32, y as f32, z as f32) / extent;
        let local_y = uniforms.min_y + (uniforms.max_y - uniforms.min_y) * uv.y;
        let surface = height.sample(Vec3::new(
            uv.x * height_extent.x,
            uv.z * height_extent.y,
            0.0,
        ));
        local_y - surface
    });
    Ok(())
}
