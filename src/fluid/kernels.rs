//! Host reference kernels for the fluid solver.
//!
//! Grid conventions: scalar cell `c` sits at grid-space `c`, interior cells
//! are `1..=n`. Face `f` of the axis-`a` velocity grid sits at
//! `f - 0.5 * e_a`, between cells `f - e_a` and `f`. Normalized coordinates
//! map cell 0 to 0 and cell `n + 1` to 1 on every axis.

use glam::{IVec3, Vec3};

use crate::compute::{FieldTarget, FieldView, KernelInputs};
use crate::error::EngineResult;

use super::{FluidUniforms, NOISE_SCROLL_SPEED};

const NEIGHBOURS: [IVec3; 6] = [
    IVec3::X,
    IVec3::NEG_X,
    IVec3::Y,
    IVec3::NEG_Y,
    IVec3::Z,
    IVec3::NEG_Z,
];

#[inline]
fn axis_unit(axis: usize) -> IVec3 {
    match axis {
        0 => IVec3::X,
        1 => IVec3::Y,
        _ => IVec3::Z,
    }
}

#[inline]
fn cell(x: u32, y: u32, z: u32) -> IVec3 {
    IVec3::new(x as i32, y as i32, z as i32)
}

#[inline]
fn at(view: &FieldView<'_>, c: IVec3) -> f32 {
    view.at(c.x as u32, c.y as u32, c.z as u32)
}

/// Simulation-space helpers shared by every stage
#[derive(Debug, Clone, Copy)]
struct FluidGrid {
    n: IVec3,
    inv_extent: Vec3,
    scroll: Vec3,
}

impl FluidGrid {
    fn new(uniforms: &FluidUniforms) -> Self {
        let [nx, ny, nz] = uniforms.sim_dims();
        let n = IVec3::new(nx as i32, ny as i32, nz as i32);
        Self {
            n,
            inv_extent: Vec3::ONE / (n + IVec3::ONE).as_vec3(),
            scroll: Vec3::new(uniforms.elapsed_time * NOISE_SCROLL_SPEED, 0.0, 0.0),
        }
    }

    fn is_interior_cell(&self, c: IVec3) -> bool {
        c.cmpge(IVec3::ONE).all() && c.cmple(self.n).all()
    }

    /// Faces strictly between two interior cells
    fn is_interior_face(&self, axis: usize, f: IVec3) -> bool {
        let lower = IVec3::ONE + axis_unit(axis);
        f.cmpge(lower).all() && f.cmple(self.n).all()
    }

    fn normalized(&self, p: Vec3) -> Vec3 {
        p * self.inv_extent
    }

    fn is_solid(&self, sdf: &FieldView<'_>, c: IVec3) -> bool {
        sdf.sample_normalized(self.normalized(c.as_vec3())) < 0.0
    }

    fn face_blocked(&self, sdf: &FieldView<'_>, axis: usize, f: IVec3) -> bool {
        self.is_solid(sdf, f - axis_unit(axis)) || self.is_solid(sdf, f)
    }

    fn face_position(axis: usize, f: IVec3) -> Vec3 {
        f.as_vec3() - 0.5 * axis_unit(axis).as_vec3()
    }

    /// Scrolling tiled noise at grid-space position `p`
    fn noise_at(&self, noise: &FieldView<'_>, p: Vec3) -> f32 {
        noise.sample_wrapped((self.normalized(p) + self.scroll) * noise.dims_vec())
    }
}

/// The three staggered velocity components bound to consecutive slots
struct Velocity<'a> {
    components: [FieldView<'a>; 3],
}

impl<'a> Velocity<'a> {
    fn from_inputs(inputs: &KernelInputs<'a>, first_slot: usize) -> EngineResult<Self> {
        Ok(Self {
            components: [
                inputs.field(first_slot)?,
                inputs.field(first_slot + 1)?,
                inputs.field(first_slot + 2)?,
            ],
        })
    }

    fn component(&self, axis: usize) -> &FieldView<'a> {
        &self.components[axis]
    }

    /// One component at grid-space position `p`
    fn sample_component(&self, axis: usize, p: Vec3) -> f32 {
        self.components[axis].sample(p + 0.5 * axis_unit(axis).as_vec3())
    }

    fn sample(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            self.sample_component(0, p),
            self.sample_component(1, p),
            self.sample_component(2, p),
        )
    }
}

/// Semi-Lagrangian velocity advection with buoyancy and wind forcing
pub fn advect_velocity(inputs: &KernelInputs<'_>, outputs: &mut [FieldTarget]) -> EngineResult<()> {
    let uniforms: FluidUniforms = inputs.uniforms()?;
    let grid = FluidGrid::new(&uniforms);
    let velocity = Velocity::from_inputs(inputs, 0)?;
    let density = inputs.field(3)?;
    let sdf = inputs.field(4)?;
    let noise = inputs.field(5)?;
    let dt = uniforms.delta_time;

    for (axis, out) in outputs.iter_mut().enumerate().take(3) {
        out.fill(inputs.grid, |x, y, z| {
            let f = cell(x, y, z);
            if !grid.is_interior_face(axis, f) || grid.face_blocked(&sdf, axis, f) {
                return 0.0;
            }
            let p = FluidGrid::face_position(axis, f);
            let back = p - dt * velocity.sample(p);
            let advected = velocity.sample_component(axis, back);
            let force = match axis {
                0 => uniforms.wind_strength * grid.noise_at(&noise, p),
                1 => uniforms.buoyancy * density.sample(p),
                _ => 0.0,
            };
            advected + dt * force
        });
    }
    Ok(())
}

/// Zeroes wall, ghost and solid faces in place
pub fn bounds(inputs: &KernelInputs<'_>, outputs: &mut [FieldTarget]) -> EngineResult<()> {
    let uniforms: FluidUniforms = inputs.uniforms()?;
    let grid = FluidGrid::new(&uniforms);
    let sdf = inputs.field(0)?;

    for (axis, out) in outputs.iter_mut().enumerate().take(3) {
        out.update(inputs.grid, |x, y, z, value| {
            let f = cell(x, y, z);
            if grid.is_interior_face(axis, f) && !grid.face_blocked(&sdf, axis, f) {
                value
            } else {
                0.0
            }
        });
    }
    Ok(())
}

/// Cell-centred curl over the `n` interior cells
pub fn curl(inputs: &KernelInputs<'_>, outputs: &mut [FieldTarget]) -> EngineResult<()> {
    let velocity = Velocity::from_inputs(inputs, 0)?;

    outputs[0].fill_vec3(inputs.grid, |x, y, z| {
        let c = (cell(x, y, z) + IVec3::ONE).as_vec3();
        let d = |axis: usize| {
            let e = axis_unit(axis).as_vec3();
            (velocity.sample(c + e) - velocity.sample(c - e)) * 0.5
        };
        let (dx, dy, dz) = (d(0), d(1), d(2));
        Vec3::new(dy.z - dz.y, dz.x - dx.z, dx.y - dy.x)
    });
    Ok(())
}

/// Vorticity confinement: `u += dt * eps * (N x w)`, averaged onto faces
pub fn vorticity(inputs: &KernelInputs<'_>, outputs: &mut [FieldTarget]) -> EngineResult<()> {
    let uniforms: FluidUniforms = inputs.uniforms()?;
    let grid = FluidGrid::new(&uniforms);
    let velocity = Velocity::from_inputs(inputs, 0)?;
    let curl = inputs.field(3)?;
    let dt = uniforms.delta_time;
    let strength = uniforms.vorticity;

    // Curl is stored for interior cells only, indexed from cell 1
    let omega = |c: IVec3| {
        let i = (c - IVec3::ONE).clamp(IVec3::ZERO, grid.n - IVec3::ONE);
        curl.at_vec3(i.x as u32, i.y as u32, i.z as u32)
    };
    let force = |c: IVec3| {
        let eta = Vec3::new(
            omega(c + IVec3::X).length() - omega(c - IVec3::X).length(),
            omega(c + IVec3::Y).length() - omega(c - IVec3::Y).length(),
            omega(c + IVec3::Z).length() - omega(c - IVec3::Z).length(),
        ) * 0.5;
        strength * eta.normalize_or_zero().cross(omega(c))
    };

    for (axis, out) in outputs.iter_mut().enumerate().take(3) {
        let current = velocity.component(axis);
        out.fill(inputs.grid, |x, y, z| {
            let value = current.at(x, y, z);
            let f = cell(x, y, z);
            if !grid.is_interior_face(axis, f) {
                return value;
            }
            let confinement = 0.5 * (force(f - axis_unit(axis)) + force(f));
            value + dt * confinement[axis]
        });
    }
    Ok(())
}

/// Net outflow of every interior cell
pub fn divergence(inputs: &KernelInputs<'_>, outputs: &mut [FieldTarget]) -> EngineResult<()> {
    let uniforms: FluidUniforms = inputs.uniforms()?;
    let grid = FluidGrid::new(&uniforms);
    let velocity = Velocity::from_inputs(inputs, 0)?;

    outputs[0].fill(inputs.grid, |x, y, z| {
        let c = cell(x, y, z);
        if !grid.is_interior_cell(c) {
            return 0.0;
        }
        (0..3)
            .map(|axis| {
                let v = velocity.component(axis);
                at(v, c + axis_unit(axis)) - at(v, c)
            })
            .sum()
    });
    Ok(())
}

/// One Jacobi relaxation of the pressure Poisson equation
pub fn jacobi(inputs: &KernelInputs<'_>, outputs: &mut [FieldTarget]) -> EngineResult<()> {
    let uniforms: FluidUniforms = inputs.uniforms()?;
    let grid = FluidGrid::new(&uniforms);
    let pressure = inputs.field(0)?;
    let divergence = inputs.field(1)?;
    let sdf = inputs.field(2)?;

    outputs[0].fill(inputs.grid, |x, y, z| {
        let c = cell(x, y, z);
        if !grid.is_interior_cell(c) || grid.is_solid(&sdf, c) {
            return 0.0;
        }
        let mut sum = 0.0;
        let mut count = 0u32;
        for offset in NEIGHBOURS {
            let nb = c + offset;
            // Walls and solids: zero normal gradient, the neighbour drops out
            if grid.is_interior_cell(nb) && !grid.is_solid(&sdf, nb) {
                sum += at(&pressure, nb);
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            (sum - divergence.at(x, y, z)) / count as f32
        }
    });
    Ok(())
}

/// Subtracts the pressure gradient from every open interior face
pub fn gradient(inputs: &KernelInputs<'_>, outputs: &mut [FieldTarget]) -> EngineResult<()> {
    let uniforms: FluidUniforms = inputs.uniforms()?;
    let grid = FluidGrid::new(&uniforms);
    let pressure = inputs.field(0)?;
    let velocity = Velocity::from_inputs(inputs, 1)?;
    let sdf = inputs.field(4)?;

    for (axis, out) in outputs.iter_mut().enumerate().take(3) {
        let current = velocity.component(axis);
        out.fill(inputs.grid, |x, y, z| {
            let f = cell(x, y, z);
            if !grid.is_interior_face(axis, f) || grid.face_blocked(&sdf, axis, f) {
                return 0.0;
            }
            current.at(x, y, z) - (at(&pressure, f) - at(&pressure, f - axis_unit(axis)))
        });
    }
    Ok(())
}

/// Density advection with decay and noise-driven emission near the terrain
pub fn advect_density(inputs: &KernelInputs<'_>, outputs: &mut [FieldTarget]) -> EngineResult<()> {
    let uniforms: FluidUniforms = inputs.uniforms()?;
    let grid = FluidGrid::new(&uniforms);
    let velocity = Velocity::from_inputs(inputs, 0)?;
    let density = inputs.field(3)?;
    let sdf = inputs.field(4)?;
    let surface = inputs.field(5)?;
    let noise = inputs.field(6)?;
    let dt = uniforms.delta_time;
    let retain = (1.0 - uniforms.density_decay * dt).max(0.0);

    outputs[0].fill(inputs.grid, |x, y, z| {
        let c = cell(x, y, z);
        if !grid.is_interior_cell(c) || grid.is_solid(&sdf, c) {
            return 0.0;
        }
        let p = c.as_vec3();
        let back = p - dt * velocity.sample(p);
        let advected = density.sample(back) * retain;

        let uv = grid.normalized(p);
        let height = surface.sample_normalized(Vec3::new(uv.x, uv.z, 0.0));
        let surface_factor = (0.5 + height).clamp(0.0, 1.0);
        let emission =
            uniforms.density_emission * dt * grid.noise_at(&noise, p).max(0.0) * surface_factor;
        advected + emission
    });
    Ok(())
}

/// One Jacobi iteration of implicit density diffusion
pub fn diffuse(inputs: &KernelInputs<'_>, outputs: &mut [FieldTarget]) -> EngineResult<()> {
    let uniforms: FluidUniforms = inputs.uniforms()?;
    let grid = FluidGrid::new(&uniforms);
    let initial = inputs.field(0)?;
    let current = inputs.field(1)?;
    let size = grid.n.max_element() as f32;
    let a = uniforms.delta_time * uniforms.diffusion_rate * size * size;

    outputs[0].fill(inputs.grid, |x, y, z| {
        let c = cell(x, y, z);
        if !grid.is_interior_cell(c) {
            return 0.0;
        }
        let neighbours: f32 = NEIGHBOURS.iter().map(|&o| at(&current, c + o)).sum();
        (initial.at(x, y, z) + a * neighbours) / (1.0 + 6.0 * a)
    });
    Ok(())
}
