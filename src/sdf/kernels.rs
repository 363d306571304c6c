//! Host reference kernels for the scene SDF

use glam::Vec3;

use crate::compute::{FieldTarget, KernelInputs};
use crate::error::EngineResult;

use super::SceneSdfUniforms;

fn lattice_extent(dims: [u32; 3]) -> Vec3 {
    Vec3::new(
        (dims[0].max(2) - 1) as f32,
        (dims[1].max(2) - 1) as f32,
        (dims[2].max(2) - 1) as f32,
    )
}

pub fn sdf_clear(inputs: &KernelInputs<'_>, outputs: &mut [FieldTarget]) -> EngineResult<()> {
    let uniforms: SceneSdfUniforms = inputs.uniforms()?;
    outputs[0].fill(inputs.grid, |_, _, _| uniforms.empty_distance);
    Ok(())
}

/// Min-union of one object into the scene field
pub fn sdf_combine(inputs: &KernelInputs<'_>, outputs: &mut [FieldTarget]) -> EngineResult<()> {
    let uniforms: SceneSdfUniforms = inputs.uniforms()?;
    let object = inputs.field(0)?;
    let scene = &mut outputs[0];
    let extent = lattice_extent(scene.dims);
    let to_object = uniforms.inverse_object() * uniforms.simulation();

    scene.update(inputs.grid, |x, y, z, current| {
        let uv = Vec3::new(x as f32, y as f32, z as f32) / extent;
        let local = to_object.transform_point3(uv);
        // Outside the object's unit cube, add the distance to the cube
        let inside = local.clamp(Vec3::ZERO, Vec3::ONE);
        let distance = object.sample_normalized(inside) + (local - inside).length();
        current.min(distance * uniforms.uniform_scale)
    });
    Ok(())
}

/// Central differences (one-sided at borders) in world units
pub fn sdf_gradient(inputs: &KernelInputs<'_>, outputs: &mut [FieldTarget]) -> EngineResult<()> {
    let uniforms: SceneSdfUniforms = inputs.uniforms()?;
    let sdf = inputs.field(0)?;
    let cell_size = uniforms.cell_size();
    let dims = sdf.dims;

    outputs[0].fill_vec3(inputs.grid, |x, y, z| {
        let c = [x, y, z];
        let mut gradient = Vec3::ZERO;
        for axis in 0..3 {
            let lo = c[axis].saturating_sub(1);
            let hi = (c[axis] + 1).min(dims[axis] - 1);
            if hi == lo {
                continue;
            }
            let mut a = c;
            let mut b = c;
            a[axis] = lo;
            b[axis] = hi;
            let span = (hi - lo) as f32 * cell_size[axis];
            gradient[axis] = (sdf.at(b[0], b[1], b[2]) - sdf.at(a[0], a[1], a[2])) / span;
        }
        gradient
    });
    Ok(())
}
