//! Host reference kernels for procedural noise

use glam::Vec3;

use crate::compute::{FieldTarget, FieldView, KernelInputs};
use crate::error::{EngineError, EngineResult};

use super::{FractalUniforms, GradientNoise, PERMUTATION_SIZE};

/// Rebuild the noise evaluator from a bound permutation field
pub(crate) fn permutation_from(view: &FieldView<'_>) -> EngineResult<GradientNoise> {
    if view.data.len() < PERMUTATION_SIZE * 2 {
        return Err(EngineError::SizeMismatch {
            what: "permutation table".to_string(),
            expected: PERMUTATION_SIZE * 2,
            actual: view.data.len(),
        });
    }
    Ok(GradientNoise::from_permutation_field(view.data))
}

/// Tiling fBm volume: `noise[id] = fbm(id / dims)`
pub fn noise_volume(inputs: &KernelInputs<'_>, outputs: &mut [FieldTarget]) -> EngineResult<()> {
    let uniforms: FractalUniforms = inputs.uniforms()?;
    let noise = permutation_from(&inputs.field(0)?)?;
    let params = uniforms.params();
    let periodic = uniforms.periodic != 0;

    let out = &mut outputs[0];
    let size = Vec3::new(out.dims[0] as f32, out.dims[1] as f32, out.dims[2] as f32);
    out.fill(inputs.grid, |x, y, z| {
        let uv = Vec3::new(x as f32, y as f32, z as f32) / size;
        if periodic {
            params.fbm_periodic(&noise, uv)
        } else {
            params.fbm(&noise, uv + params.offset)
        }
    });
    Ok(())
}
