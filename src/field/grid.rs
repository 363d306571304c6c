use std::ops::{Add, Mul};

use glam::Vec3;

/// Number of lattice cells in a grid of `dims`
#[inline]
pub fn cell_count(dims: [u32; 3]) -> usize {
    dims[0] as usize * dims[1] as usize * dims[2] as usize
}

/// Flat index of cell (x, y, z), x fastest
#[inline]
pub fn linear_index(dims: [u32; 3], x: u32, y: u32, z: u32) -> usize {
    ((z as usize * dims[1] as usize) + y as usize) * dims[0] as usize + x as usize
}

/// Scalar grid dimensions for a simulation extent (one ghost layer per side)
#[inline]
pub fn with_ghost_layer(sim: [u32; 3]) -> [u32; 3] {
    [sim[0] + 2, sim[1] + 2, sim[2] + 2]
}

/// Dimensions of the three face-centred velocity grids.
///
/// Each component carries one extra face along its own axis on top of the
/// ghost layer: face `i` of the X grid sits at grid-space `x = i - 0.5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaggeredDims {
    pub x: [u32; 3],
    pub y: [u32; 3],
    pub z: [u32; 3],
}

impl StaggeredDims {
    pub fn new(sim: [u32; 3]) -> Self {
        let [nx, ny, nz] = sim;
        Self {
            x: [nx + 3, ny + 2, nz + 2],
            y: [nx + 2, ny + 3, nz + 2],
            z: [nx + 2, ny + 2, nz + 3],
        }
    }

    /// Per-axis maximum, i.e. the dispatch extent that covers all three grids
    pub fn envelope(&self) -> [u32; 3] {
        [self.x[0], self.y[1], self.z[2]]
    }

    pub fn axis(&self, axis: usize) -> [u32; 3] {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

/// Corner indices and weights of the trilinear stencil around `p`.
///
/// `p` is in lattice units and is clamped into the grid; the upper corner
/// is clamped to `dims - 1` so there is no wraparound.
#[inline]
fn stencil(dims: [u32; 3], p: Vec3) -> ([u32; 3], [u32; 3], Vec3) {
    let max = Vec3::new(
        (dims[0] - 1) as f32,
        (dims[1] - 1) as f32,
        (dims[2] - 1) as f32,
    );
    let p = p.clamp(Vec3::ZERO, max);
    let base = p.floor();
    let t = p - base;
    let p0 = [base.x as u32, base.y as u32, base.z as u32];
    let p1 = [
        (p0[0] + 1).min(dims[0] - 1),
        (p0[1] + 1).min(dims[1] - 1),
        (p0[2] + 1).min(dims[2] - 1),
    ];
    (p0, p1, t)
}

/// Trilinear interpolation of any lattice quantity.
///
/// `fetch` maps a flat cell index to its value. Lattice-aligned positions
/// return the stored value exactly.
pub fn trilinear_with<T, F>(dims: [u32; 3], p: Vec3, fetch: F) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
    F: Fn(usize) -> T,
{
    let (p0, p1, t) = stencil(dims, p);
    let at = |x: u32, y: u32, z: u32| fetch(linear_index(dims, x, y, z));
    let lerp = |a: T, b: T, t: f32| a * (1.0 - t) + b * t;

    let c00 = lerp(at(p0[0], p0[1], p0[2]), at(p1[0], p0[1], p0[2]), t.x);
    let c10 = lerp(at(p0[0], p1[1], p0[2]), at(p1[0], p1[1], p0[2]), t.x);
    let c01 = lerp(at(p0[0], p0[1], p1[2]), at(p1[0], p0[1], p1[2]), t.x);
    let c11 = lerp(at(p0[0], p1[1], p1[2]), at(p1[0], p1[1], p1[2]), t.x);

    lerp(lerp(c00, c10, t.y), lerp(c01, c11, t.y), t.z)
}

/// Trilinear sample of a scalar field at lattice position `p`
pub fn trilinear(data: &[f32], dims: [u32; 3], p: Vec3) -> f32 {
    trilinear_with(dims, p, |i| data[i])
}

/// Trilinear sample of the xyz part of a 4-component field
pub fn trilinear_vec3(data: &[f32], dims: [u32; 3], p: Vec3) -> Vec3 {
    trilinear_with(dims, p, |i| {
        Vec3::new(data[i * 4], data[i * 4 + 1], data[i * 4 + 2])
    })
}

/// Trilinear sample of a periodic scalar field (lattice wraps on every axis)
pub fn sample_wrapped(data: &[f32], dims: [u32; 3], p: Vec3) -> f32 {
    let size = Vec3::new(dims[0] as f32, dims[1] as f32, dims[2] as f32);
    let p = p - (p / size).floor() * size;
    let base = p.floor();
    let t = p - base;
    let wrap = |v: f32, n: u32| (v as u32) % n;
    let x0 = wrap(base.x, dims[0]);
    let y0 = wrap(base.y, dims[1]);
    let z0 = wrap(base.z, dims[2]);
    let x1 = (x0 + 1) % dims[0];
    let y1 = (y0 + 1) % dims[1];
    let z1 = (z0 + 1) % dims[2];
    let at = |x: u32, y: u32, z: u32| data[linear_index(dims, x, y, z)];

    let c00 = at(x0, y0, z0) * (1.0 - t.x) + at(x1, y0, z0) * t.x;
    let c10 = at(x0, y1, z0) * (1.0 - t.x) + at(x1, y1, z0) * t.x;
    let c01 = at(x0, y0, z1) * (1.0 - t.x) + at(x1, y0, z1) * t.x;
    let c11 = at(x0, y1, z1) * (1.0 - t.x) + at(x1, y1, z1) * t.x;

    let c0 = c00 * (1.0 - t.y) + c10 * t.y;
    let c1 = c01 * (1.0 - t.y) + c11 * t.y;
    c0 * (1.0 - t.z) + c1 * t.z
}
