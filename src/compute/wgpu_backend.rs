use std::collections::HashMap;
use std::sync::Arc;

use wgpu::{BindGroupLayout, Buffer, ComputePipeline, Device, Queue};

use crate::compute::error::{gpu_operation_error, pipeline_error, readback_error, ComputeErrorContext};
use crate::compute::{
    calculate_workgroups, Access, ComputeBackend, FieldArena, FieldDesc, FieldId, Kernel,
    StageBinding, COMMON_WGSL, FLUID_WGSL, GRADIENT_NOISE_WGSL,
};
use crate::error::{EngineError, EngineResult};

/// Size reserved for every kernel's uniform block
pub const UNIFORM_BLOCK_SIZE: u64 = 256;

/// Pipeline objects of one kernel
struct KernelPipeline {
    pipeline: ComputePipeline,
    bind_group_layout: BindGroupLayout,
    uniform_buffer: Buffer,
}

/// Runs the WGSL kernels on a wgpu device.
///
/// Each dispatch is submitted on its own so uniform uploads made between
/// stages are ordered with the passes that read them.
pub struct WgpuBackend {
    device: Arc<Device>,
    queue: Arc<Queue>,
    fields: FieldArena<Buffer>,
    kernels: HashMap<Kernel, KernelPipeline>,
    stage: StageBinding,
}

impl WgpuBackend {
    /// Request an adapter and device, then build every kernel
    pub fn new() -> EngineResult<Self> {
        pollster::block_on(Self::new_async())
    }

    pub async fn new_async() -> EngineResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .compute_context("GPU adapter")?;

        let info = adapter.get_info();
        log::info!("[WgpuBackend] Using adapter {} ({:?})", info.name, info.backend);

        let required_limits = Self::required_limits(&adapter.limits())?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Compute Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits,
                },
                None,
            )
            .await
            .map_err(|e| gpu_operation_error("request_device", e))?;

        Self::from_device(Arc::new(device), Arc::new(queue))
    }

    /// Limits needed by the kernel set, checked against what the adapter offers
    pub fn required_limits(adapter_limits: &wgpu::Limits) -> EngineResult<wgpu::Limits> {
        let needed = Kernel::max_storage_bindings();
        if adapter_limits.max_storage_buffers_per_shader_stage < needed {
            return Err(gpu_operation_error(
                "adapter limits",
                format!(
                    "{} storage buffers per stage required, adapter offers {}",
                    needed, adapter_limits.max_storage_buffers_per_shader_stage
                ),
            ));
        }
        Ok(wgpu::Limits {
            max_storage_buffers_per_shader_stage: needed,
            max_storage_buffer_binding_size: adapter_limits.max_storage_buffer_binding_size,
            max_buffer_size: adapter_limits.max_buffer_size,
            ..wgpu::Limits::default()
        })
    }

    /// Build every kernel pipeline on an existing device
    pub fn from_device(device: Arc<Device>, queue: Arc<Queue>) -> EngineResult<Self> {
        let mut kernels = HashMap::new();
        for kernel in Kernel::ALL {
            kernels.insert(kernel, create_kernel_pipeline(&device, kernel)?);
        }
        log::info!("[WgpuBackend] {} compute pipelines created", kernels.len());

        Ok(Self {
            device,
            queue,
            fields: FieldArena::default(),
            kernels,
            stage: StageBinding::default(),
        })
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<Queue> {
        &self.queue
    }

    /// GPU buffer behind a field, for renderers that bind it directly
    pub fn buffer(&self, id: FieldId) -> EngineResult<&Buffer> {
        self.fields.get(id)
    }
}

impl ComputeBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "WgpuBackend"
    }

    fn create_field(&mut self, desc: FieldDesc) -> EngineResult<FieldId> {
        log::debug!(
            "[WgpuBackend] Creating field '{}' {:?} x{} ({} bytes)",
            desc.label,
            desc.dims,
            desc.components,
            desc.size_bytes()
        );
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(desc.label.as_str()),
            size: desc.size_bytes().max(4),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Ok(self.fields.insert(desc, buffer))
    }

    fn field_desc(&self, id: FieldId) -> EngineResult<&FieldDesc> {
        self.fields.desc(id)
    }

    fn field_by_label(&self, label: &str) -> Option<FieldId> {
        self.fields.by_label(label)
    }

    fn write_field(&mut self, id: FieldId, data: &[f32]) -> EngineResult<()> {
        let (desc, buffer) = self.fields.entry(id)?;
        if desc.len() != data.len() {
            return Err(EngineError::SizeMismatch {
                what: format!("write to '{}'", desc.label),
                expected: desc.len(),
                actual: data.len(),
            });
        }
        self.queue.write_buffer(buffer, 0, bytemuck::cast_slice(data));
        Ok(())
    }

    fn copy_field(&mut self, src: FieldId, dst: FieldId) -> EngineResult<()> {
        let (src_desc, src_buffer) = self.fields.entry(src)?;
        let (dst_desc, dst_buffer) = self.fields.entry(dst)?;
        if src_desc.len() != dst_desc.len() {
            return Err(EngineError::SizeMismatch {
                what: format!("copy '{}' -> '{}'", src_desc.label, dst_desc.label),
                expected: dst_desc.len(),
                actual: src_desc.len(),
            });
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Field Copy Encoder"),
            });
        encoder.copy_buffer_to_buffer(src_buffer, 0, dst_buffer, 0, src_desc.size_bytes());
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn read_field(&mut self, id: FieldId) -> EngineResult<Vec<f32>> {
        let (desc, buffer) = self.fields.entry(id)?;
        let size = desc.size_bytes();

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Field Readback Staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Field Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = staging.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            // The receiver is only gone if the readback was abandoned
            let _ = tx.send(result);
        });

        self.device.poll(wgpu::Maintain::Wait);

        pollster::block_on(rx)
            .map_err(|_| readback_error(&desc.label, "map callback dropped"))?
            .map_err(|e| readback_error(&desc.label, e))?;

        let data = {
            let mapped = buffer_slice.get_mapped_range();
            bytemuck::cast_slice::<u8, f32>(&mapped).to_vec()
        };
        staging.unmap();
        Ok(data)
    }

    fn bind(&mut self, kernel: Kernel) -> EngineResult<()> {
        self.stage.bind(kernel)
    }

    fn set_uniforms(&mut self, bytes: &[u8]) -> EngineResult<()> {
        if bytes.len() as u64 > UNIFORM_BLOCK_SIZE {
            return Err(EngineError::SizeMismatch {
                what: "uniform block".to_string(),
                expected: UNIFORM_BLOCK_SIZE as usize,
                actual: bytes.len(),
            });
        }
        self.stage.set_uniforms(bytes)
    }

    fn set_fields(&mut self, fields: &[FieldId]) -> EngineResult<()> {
        self.stage.set_fields(fields)
    }

    fn dispatch(&mut self, grid: [u32; 3]) -> EngineResult<()> {
        let kernel = self.stage.validate(&self.fields)?;
        let pipeline = self.kernels.get(&kernel).compute_context(kernel.label())?;

        if !self.stage.uniforms().is_empty() {
            self.queue
                .write_buffer(&pipeline.uniform_buffer, 0, self.stage.uniforms());
        }

        let mut entries = Vec::with_capacity(self.stage.fields().len() + 1);
        entries.push(wgpu::BindGroupEntry {
            binding: 0,
            resource: pipeline.uniform_buffer.as_entire_binding(),
        });
        for (slot, &id) in self.stage.fields().iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: slot as u32 + 1,
                resource: self.fields.get(id)?.as_entire_binding(),
            });
        }

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(kernel.label()),
            layout: &pipeline.bind_group_layout,
            entries: &entries,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Compute Stage Encoder"),
            });
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(kernel.label()),
                timestamp_writes: None,
            });

            compute_pass.set_pipeline(&pipeline.pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);

            let workgroups = calculate_workgroups(grid);
            compute_pass.dispatch_workgroups(workgroups.0, workgroups.1, workgroups.2);
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn unbind(&mut self) {
        self.stage.unbind();
    }
}

/// Create the bind group layout of a kernel: uniforms at 0, fields after
fn create_kernel_bind_group_layout(device: &Device, kernel: Kernel) -> BindGroupLayout {
    let mut entries = vec![wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }];

    for (slot, access) in kernel.layout().iter().enumerate() {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: slot as u32 + 1,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage {
                    read_only: *access == Access::Read,
                },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });
    }

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(kernel.label()),
        entries: &entries,
    })
}

/// Full WGSL module text of a kernel
pub fn kernel_module_source(kernel: Kernel) -> String {
    let mut source = String::from(COMMON_WGSL);
    if kernel.uses_gradient_noise() {
        source.push('\n');
        source.push_str(GRADIENT_NOISE_WGSL);
    }
    if kernel.uses_fluid_prelude() {
        source.push('\n');
        source.push_str(FLUID_WGSL);
    }
    source.push('\n');
    source.push_str(kernel.wgsl_source());
    source
}

/// Create a kernel's shader, layout, pipeline and uniform buffer
fn create_kernel_pipeline(device: &Device, kernel: Kernel) -> EngineResult<KernelPipeline> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(kernel.label()),
        source: wgpu::ShaderSource::Wgsl(kernel_module_source(kernel).into()),
    });

    let bind_group_layout = create_kernel_bind_group_layout(device, kernel);

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(kernel.label()),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(kernel.label()),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: kernel.entry_point(),
    });

    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(pipeline_error(kernel, error));
    }

    let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(kernel.label()),
        size: UNIFORM_BLOCK_SIZE,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    log::debug!("[WgpuBackend] Pipeline '{}' ready", kernel.label());

    Ok(KernelPipeline {
        pipeline,
        bind_group_layout,
        uniform_buffer,
    })
}
