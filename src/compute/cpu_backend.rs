use bytemuck::Pod;
use glam::Vec3;
use rayon::prelude::*;

use crate::compute::{ComputeBackend, FieldArena, FieldDesc, FieldId, Kernel, StageBinding};
use crate::error::{EngineError, EngineResult};
use crate::field::{linear_index, sample_wrapped, trilinear, trilinear_vec3};

/// Read-only view of a bound field
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'a> {
    pub dims: [u32; 3],
    pub components: u32,
    pub data: &'a [f32],
}

impl<'a> FieldView<'a> {
    #[inline]
    pub fn at(&self, x: u32, y: u32, z: u32) -> f32 {
        self.data[linear_index(self.dims, x, y, z) * self.components as usize]
    }

    #[inline]
    pub fn at_vec3(&self, x: u32, y: u32, z: u32) -> Vec3 {
        let i = linear_index(self.dims, x, y, z) * self.components as usize;
        Vec3::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// Clamped read; coordinates outside the grid snap to the border
    #[inline]
    pub fn at_clamped(&self, x: i32, y: i32, z: i32) -> f32 {
        let clamp = |v: i32, n: u32| v.clamp(0, n as i32 - 1) as u32;
        self.at(
            clamp(x, self.dims[0]),
            clamp(y, self.dims[1]),
            clamp(z, self.dims[2]),
        )
    }

    #[inline]
    pub fn sample(&self, p: Vec3) -> f32 {
        trilinear(self.data, self.dims, p)
    }

    #[inline]
    pub fn sample_vec3(&self, p: Vec3) -> Vec3 {
        trilinear_vec3(self.data, self.dims, p)
    }

    /// Trilinear sample at normalized coordinates (`uv * (dims - 1)`)
    #[inline]
    pub fn sample_normalized(&self, uv: Vec3) -> f32 {
        self.sample(uv * self.extent())
    }

    #[inline]
    pub fn sample_wrapped(&self, p: Vec3) -> f32 {
        sample_wrapped(self.data, self.dims, p)
    }

    /// `dims - 1` per axis
    #[inline]
    pub fn extent(&self) -> Vec3 {
        Vec3::new(
            (self.dims[0] - 1) as f32,
            (self.dims[1] - 1) as f32,
            (self.dims[2] - 1) as f32,
        )
    }

    #[inline]
    pub fn dims_vec(&self) -> Vec3 {
        Vec3::new(self.dims[0] as f32, self.dims[1] as f32, self.dims[2] as f32)
    }
}

/// A written field, moved out of the arena for the duration of a dispatch
#[derive(Debug)]
pub struct FieldTarget {
    pub dims: [u32; 3],
    pub components: u32,
    pub data: Vec<f32>,
}

impl FieldTarget {
    pub fn view(&self) -> FieldView<'_> {
        FieldView {
            dims: self.dims,
            components: self.components,
            data: &self.data,
        }
    }

    /// Overwrites every scalar cell inside `grid`; cells beyond it keep their value
    pub fn fill<F>(&mut self, grid: [u32; 3], f: F)
    where
        F: Fn(u32, u32, u32) -> f32 + Sync + Send,
    {
        self.update(grid, |x, y, z, _| f(x, y, z));
    }

    /// Rewrites each scalar cell inside `grid` from its previous value
    pub fn update<F>(&mut self, grid: [u32; 3], f: F)
    where
        F: Fn(u32, u32, u32, f32) -> f32 + Sync + Send,
    {
        let [nx, ny, _] = self.dims;
        let limit = clamp_grid(grid, self.dims);
        let stride = self.components as usize;
        let slice_len = nx as usize * ny as usize * stride;
        self.data
            .par_chunks_mut(slice_len)
            .enumerate()
            .filter(|(z, _)| (*z as u32) < limit[2])
            .for_each(|(z, slice)| {
                let z = z as u32;
                for y in 0..limit[1] {
                    for x in 0..limit[0] {
                        let i = (y as usize * nx as usize + x as usize) * stride;
                        slice[i] = f(x, y, z, slice[i]);
                    }
                }
            });
    }

    /// Overwrites every vector cell inside `grid` (xyz, w = 0)
    pub fn fill_vec3<F>(&mut self, grid: [u32; 3], f: F)
    where
        F: Fn(u32, u32, u32) -> Vec3 + Sync + Send,
    {
        let [nx, ny, _] = self.dims;
        let limit = clamp_grid(grid, self.dims);
        let stride = self.components as usize;
        let slice_len = nx as usize * ny as usize * stride;
        self.data
            .par_chunks_mut(slice_len)
            .enumerate()
            .filter(|(z, _)| (*z as u32) < limit[2])
            .for_each(|(z, slice)| {
                let z = z as u32;
                for y in 0..limit[1] {
                    for x in 0..limit[0] {
                        let i = (y as usize * nx as usize + x as usize) * stride;
                        let v = f(x, y, z);
                        slice[i] = v.x;
                        slice[i + 1] = v.y;
                        slice[i + 2] = v.z;
                        slice[i + 3] = 0.0;
                    }
                }
            });
    }
}

fn clamp_grid(grid: [u32; 3], dims: [u32; 3]) -> [u32; 3] {
    [
        grid[0].min(dims[0]),
        grid[1].min(dims[1]),
        grid[2].min(dims[2]),
    ]
}

/// Everything a CPU kernel reads: uniforms, dispatch grid and read-only fields
#[derive(Debug)]
pub struct KernelInputs<'a> {
    pub uniforms: &'a [u8],
    pub grid: [u32; 3],
    pub fields: Vec<FieldView<'a>>,
}

impl<'a> KernelInputs<'a> {
    pub fn uniforms<U: Pod>(&self) -> EngineResult<U> {
        let size = std::mem::size_of::<U>();
        if self.uniforms.len() < size {
            return Err(EngineError::SizeMismatch {
                what: "uniform block".to_string(),
                expected: size,
                actual: self.uniforms.len(),
            });
        }
        Ok(bytemuck::pod_read_unaligned(&self.uniforms[..size]))
    }

    pub fn field(&self, slot: usize) -> EngineResult<FieldView<'a>> {
        self.fields
            .get(slot)
            .copied()
            .ok_or_else(|| EngineError::Internal {
                message: format!("kernel input slot {} is not bound", slot),
            })
    }
}

/// Reference implementation of one kernel.
///
/// `outputs` holds the write and read-write slots in layout order.
pub type CpuKernelFn = fn(&KernelInputs<'_>, &mut [FieldTarget]) -> EngineResult<()>;

fn cpu_kernel(kernel: Kernel) -> CpuKernelFn {
    use crate::{fluid, fractal, sdf, terrain};
    match kernel {
        Kernel::AdvectVelocity => fluid::kernels::advect_velocity,
        Kernel::Bounds => fluid::kernels::bounds,
        Kernel::Curl => fluid::kernels::curl,
        Kernel::Vorticity => fluid::kernels::vorticity,
        Kernel::Divergence => fluid::kernels::divergence,
        Kernel::Jacobi => fluid::kernels::jacobi,
        Kernel::Gradient => fluid::kernels::gradient,
        Kernel::AdvectDensity => fluid::kernels::advect_density,
        Kernel::Diffuse => fluid::kernels::diffuse,
        Kernel::NoiseVolume => fractal::kernels::noise_volume,
        Kernel::TerrainHeight => terrain::kernels::terrain_height,
        Kernel::TerrainSdf => terrain::kernels::terrain_sdf,
        Kernel::SdfClear => sdf::kernels::sdf_clear,
        Kernel::SdfCombine => sdf::kernels::sdf_combine,
        Kernel::SdfGradient => sdf::kernels::sdf_gradient,
    }
}

/// One dispatch as seen by the CPU backend
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRecord {
    pub kernel: Kernel,
    pub reads: Vec<FieldId>,
    pub writes: Vec<FieldId>,
    pub grid: [u32; 3],
}

/// Stage protocol events, in issue order
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    Bind(Kernel),
    Dispatch(DispatchRecord),
    Unbind,
}

/// Runs every kernel on the host
#[derive(Debug, Default)]
pub struct CpuBackend {
    fields: FieldArena<Vec<f32>>,
    stage: StageBinding,
    events: Vec<StageEvent>,
    record_events: bool,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that keeps a log of every bind, dispatch and unbind
    pub fn with_event_log() -> Self {
        Self {
            record_events: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> &[StageEvent] {
        &self.events
    }

    pub fn dispatches(&self) -> impl Iterator<Item = &DispatchRecord> {
        self.events.iter().filter_map(|event| match event {
            StageEvent::Dispatch(record) => Some(record),
            _ => None,
        })
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Direct read access without a readback
    pub fn field_data(&self, id: FieldId) -> EngineResult<&[f32]> {
        self.fields.get(id).map(|data| data.as_slice())
    }

    fn record(&mut self, event: StageEvent) {
        if self.record_events {
            self.events.push(event);
        }
    }
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "CpuBackend"
    }

    fn create_field(&mut self, desc: FieldDesc) -> EngineResult<FieldId> {
        log::debug!(
            "[CpuBackend] Creating field '{}' {:?} x{}",
            desc.label,
            desc.dims,
            desc.components
        );
        let data = vec![0.0; desc.len()];
        Ok(self.fields.insert(desc, data))
    }

    fn field_desc(&self, id: FieldId) -> EngineResult<&FieldDesc> {
        self.fields.desc(id)
    }

    fn field_by_label(&self, label: &str) -> Option<FieldId> {
        self.fields.by_label(label)
    }

    fn write_field(&mut self, id: FieldId, data: &[f32]) -> EngineResult<()> {
        let target = self.fields.get_mut(id)?;
        if target.len() != data.len() {
            return Err(EngineError::SizeMismatch {
                what: format!("write to {:?}", id),
                expected: target.len(),
                actual: data.len(),
            });
        }
        target.copy_from_slice(data);
        Ok(())
    }

    fn copy_field(&mut self, src: FieldId, dst: FieldId) -> EngineResult<()> {
        let data = self.fields.get(src)?.clone();
        self.write_field(dst, &data)
    }

    fn read_field(&mut self, id: FieldId) -> EngineResult<Vec<f32>> {
        self.fields.get(id).cloned()
    }

    fn bind(&mut self, kernel: Kernel) -> EngineResult<()> {
        self.stage.bind(kernel)?;
        self.record(StageEvent::Bind(kernel));
        Ok(())
    }

    fn set_uniforms(&mut self, bytes: &[u8]) -> EngineResult<()> {
        self.stage.set_uniforms(bytes)
    }

    fn set_fields(&mut self, fields: &[FieldId]) -> EngineResult<()> {
        self.stage.set_fields(fields)
    }

    fn dispatch(&mut self, grid: [u32; 3]) -> EngineResult<()> {
        let kernel = self.stage.validate(&self.fields)?;
        let layout = kernel.layout();
        let bound = self.stage.fields().to_vec();

        let mut reads = Vec::new();
        let mut writes = Vec::new();
        for (&id, access) in bound.iter().zip(layout) {
            if access.writes() {
                writes.push(id);
            } else {
                reads.push(id);
            }
        }

        // Move write targets out so the read views can borrow the arena
        let mut outputs = Vec::with_capacity(writes.len());
        for &id in &writes {
            let desc = self.fields.desc(id)?.clone();
            let data = std::mem::take(self.fields.get_mut(id)?);
            outputs.push(FieldTarget {
                dims: desc.dims,
                components: desc.components,
                data,
            });
        }

        let result = {
            let mut fields = Vec::with_capacity(reads.len());
            for &id in &reads {
                let (desc, data) = self.fields.entry(id)?;
                fields.push(FieldView {
                    dims: desc.dims,
                    components: desc.components,
                    data,
                });
            }
            let inputs = KernelInputs {
                uniforms: self.stage.uniforms(),
                grid,
                fields,
            };
            cpu_kernel(kernel)(&inputs, &mut outputs)
        };

        for (&id, target) in writes.iter().zip(outputs) {
            *self.fields.get_mut(id)? = target.data;
        }
        result?;

        self.record(StageEvent::Dispatch(DispatchRecord {
            kernel,
            reads,
            writes,
            grid,
        }));
        Ok(())
    }

    fn unbind(&mut self) {
        self.stage.unbind();
        self.record(StageEvent::Unbind);
    }
}
