/// GPU Compute Pipeline Abstraction
///
/// The boundary between the simulation code and whatever executes the
/// kernels. A stage is: bind a kernel, upload its uniform block, attach its
/// fields, dispatch over a grid, unbind. `ComputeStage` enforces the unbind
/// on drop so a field written by one stage can be read by the next.
///
/// Two backends implement the protocol:
/// - `WgpuBackend` runs the WGSL kernels on the GPU
/// - `CpuBackend` runs the reference kernels with rayon (headless runs, tests)

pub mod arena;
pub mod cpu_backend;
pub mod error;
pub mod kernel;
pub mod wgpu_backend;

pub use arena::FieldArena;
pub use cpu_backend::{CpuBackend, DispatchRecord, FieldTarget, FieldView, KernelInputs, StageEvent};
pub use kernel::{Access, Kernel};
pub use wgpu_backend::WgpuBackend;

use bytemuck::Pod;

use crate::error::{EngineError, EngineResult};
use crate::field::cell_count;

/// Threads per workgroup along each axis (4 x 4 x 4)
pub const WORKGROUP_SIZE: u32 = 4;

/// Shared WGSL prelude, prepended to every kernel
pub const COMMON_WGSL: &str = include_str!("shaders/common.wgsl");

/// Gradient-noise helpers, prepended to the procedural kernels
pub const GRADIENT_NOISE_WGSL: &str = include_str!("../fractal/shaders/gradient_noise.wgsl");

/// Fluid uniform block and staggered-grid helpers, prepended to the solver kernels
pub const FLUID_WGSL: &str = include_str!("../fluid/shaders/fluid_common.wgsl");

/// Handle to a field owned by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(pub(crate) u32);

/// Creation parameters of a field. Dimensions never change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDesc {
    pub label: String,
    pub dims: [u32; 3],
    pub components: u32,
}

impl FieldDesc {
    pub fn scalar(label: impl Into<String>, dims: [u32; 3]) -> Self {
        Self {
            label: label.into(),
            dims,
            components: 1,
        }
    }

    pub fn vector(label: impl Into<String>, dims: [u32; 3]) -> Self {
        Self {
            label: label.into(),
            dims,
            components: 4,
        }
    }

    /// Number of f32 values stored
    pub fn len(&self) -> usize {
        cell_count(self.dims) * self.components as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn size_bytes(&self) -> u64 {
        (self.len() * std::mem::size_of::<f32>()) as u64
    }
}

/// Workgroup counts covering `grid` cells
pub fn calculate_workgroups(grid: [u32; 3]) -> (u32, u32, u32) {
    (
        (grid[0] + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE,
        (grid[1] + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE,
        (grid[2] + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE,
    )
}

/// Executes compute stages and owns the fields they touch
pub trait ComputeBackend {
    fn name(&self) -> &'static str;

    fn create_field(&mut self, desc: FieldDesc) -> EngineResult<FieldId>;

    fn field_desc(&self, id: FieldId) -> EngineResult<&FieldDesc>;

    fn field_by_label(&self, label: &str) -> Option<FieldId>;

    fn write_field(&mut self, id: FieldId, data: &[f32]) -> EngineResult<()>;

    fn fill_field(&mut self, id: FieldId, value: f32) -> EngineResult<()> {
        let len = self.field_desc(id)?.len();
        self.write_field(id, &vec![value; len])
    }

    fn copy_field(&mut self, src: FieldId, dst: FieldId) -> EngineResult<()>;

    /// Blocking readback
    fn read_field(&mut self, id: FieldId) -> EngineResult<Vec<f32>>;

    fn bind(&mut self, kernel: Kernel) -> EngineResult<()>;

    fn set_uniforms(&mut self, bytes: &[u8]) -> EngineResult<()>;

    fn set_fields(&mut self, fields: &[FieldId]) -> EngineResult<()>;

    fn dispatch(&mut self, grid: [u32; 3]) -> EngineResult<()>;

    fn unbind(&mut self);
}

/// Binding state of the active stage, shared by both backends
#[derive(Debug, Default)]
pub(crate) struct StageBinding {
    kernel: Option<Kernel>,
    uniforms: Vec<u8>,
    fields: Vec<FieldId>,
}

impl StageBinding {
    pub fn bind(&mut self, kernel: Kernel) -> EngineResult<()> {
        if let Some(bound) = self.kernel {
            return Err(EngineError::StageStillBound {
                bound,
                requested: kernel,
            });
        }
        self.kernel = Some(kernel);
        self.uniforms.clear();
        self.fields.clear();
        Ok(())
    }

    pub fn kernel(&self) -> EngineResult<Kernel> {
        self.kernel.ok_or(EngineError::NoStageBound)
    }

    pub fn set_uniforms(&mut self, bytes: &[u8]) -> EngineResult<()> {
        self.kernel()?;
        self.uniforms.clear();
        self.uniforms.extend_from_slice(bytes);
        Ok(())
    }

    pub fn set_fields(&mut self, fields: &[FieldId]) -> EngineResult<()> {
        let kernel = self.kernel()?;
        let expected = kernel.layout().len();
        if fields.len() != expected {
            return Err(EngineError::LayoutMismatch {
                kernel,
                expected,
                actual: fields.len(),
            });
        }
        self.fields.clear();
        self.fields.extend_from_slice(fields);
        Ok(())
    }

    pub fn uniforms(&self) -> &[u8] {
        &self.uniforms
    }

    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }

    pub fn unbind(&mut self) {
        self.kernel = None;
        self.uniforms.clear();
        self.fields.clear();
    }

    /// Checks the attached fields against the kernel layout.
    ///
    /// A field may appear in several read slots, but never in a write slot
    /// together with any other slot of the same dispatch.
    pub fn validate<T>(&self, arena: &FieldArena<T>) -> EngineResult<Kernel> {
        let kernel = self.kernel()?;
        let layout = kernel.layout();
        if self.fields.len() != layout.len() {
            return Err(EngineError::LayoutMismatch {
                kernel,
                expected: layout.len(),
                actual: self.fields.len(),
            });
        }

        for (i, (&a, access_a)) in self.fields.iter().zip(layout).enumerate() {
            arena.desc(a)?;
            for (&b, access_b) in self.fields.iter().zip(layout).skip(i + 1) {
                if a == b && (access_a.writes() || access_b.writes()) {
                    return Err(EngineError::BindingHazard {
                        kernel,
                        field: arena.desc(a)?.label.clone(),
                    });
                }
            }
        }
        Ok(kernel)
    }
}

/// RAII guard around one bound kernel; unbinds when dropped
pub struct ComputeStage<'a> {
    backend: &'a mut dyn ComputeBackend,
    kernel: Kernel,
}

impl<'a> ComputeStage<'a> {
    pub fn bind(backend: &'a mut dyn ComputeBackend, kernel: Kernel) -> EngineResult<Self> {
        backend.bind(kernel)?;
        Ok(Self { backend, kernel })
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    pub fn uniforms<U: Pod>(&mut self, uniforms: &U) -> EngineResult<()> {
        self.backend.set_uniforms(bytemuck::bytes_of(uniforms))
    }

    pub fn fields(&mut self, fields: &[FieldId]) -> EngineResult<()> {
        self.backend.set_fields(fields)
    }

    pub fn dispatch(&mut self, grid: [u32; 3]) -> EngineResult<()> {
        log::trace!("[{}] dispatch {:?} over {:?}", self.backend.name(), self.kernel, grid);
        self.backend.dispatch(grid)
    }
}

impl Drop for ComputeStage<'_> {
    fn drop(&mut self) {
        self.backend.unbind();
    }
}

/// Binds `kernel`, dispatches once over `grid` and unbinds
pub fn run_stage<U: Pod>(
    backend: &mut dyn ComputeBackend,
    kernel: Kernel,
    uniforms: &U,
    fields: &[FieldId],
    grid: [u32; 3],
) -> EngineResult<()> {
    let mut stage = ComputeStage::bind(backend, kernel)?;
    stage.uniforms(uniforms)?;
    stage.fields(fields)?;
    stage.dispatch(grid)
}

#[cfg(test)]
mod tests;
