use glam::Mat4;

use crate::compute::{run_stage, ComputeBackend, FieldDesc, FieldId, Kernel};
use crate::error::EngineResult;
use crate::field::with_ghost_layer;

use super::error::{ensure_invertible, SdfErrorContext, SdfResult};
use super::{CpuSdf, SceneObject, SceneSdfUniforms};

/// Builds the scene SDF from the registered objects.
///
/// The grid carries one ghost layer per side, so a generator created for
/// `[x, y, z]` writes `(x + 2, y + 2, z + 2)` cells.
pub struct SceneSdfGenerator {
    resolution: [u32; 3],
    simulation_transform: Mat4,
    objects: Vec<SceneObject>,
    distance: FieldId,
    gradient: FieldId,
}

impl SceneSdfGenerator {
    pub fn new(backend: &mut dyn ComputeBackend, dims: [u32; 3]) -> EngineResult<Self> {
        let resolution = with_ghost_layer(dims);
        let distance = backend.create_field(FieldDesc::scalar("scene_sdf.distance", resolution))?;
        let gradient = backend.create_field(FieldDesc::vector("scene_sdf.gradient", resolution))?;

        log::info!("[SceneSdfGenerator] Scene SDF lattice {:?}", resolution);

        Ok(Self {
            resolution,
            simulation_transform: Mat4::IDENTITY,
            objects: Vec::new(),
            distance,
            gradient,
        })
    }

    /// Lattice-to-world transform shared with the fluid domain
    pub fn set_simulation_transform(&mut self, transform: Mat4) {
        self.simulation_transform = transform;
    }

    pub fn simulation_transform(&self) -> Mat4 {
        self.simulation_transform
    }

    /// Registers an object; takes effect on the next `compute`
    pub fn add_scene_object(
        &mut self,
        sdf: FieldId,
        transform: Mat4,
        uniform_scale: f32,
    ) -> EngineResult<usize> {
        ensure_invertible("scene object transform", &transform)?;
        self.objects.push(SceneObject {
            sdf,
            transform,
            uniform_scale,
        });
        log::debug!(
            "[SceneSdfGenerator] Added scene object {} (scale {})",
            self.objects.len() - 1,
            uniform_scale
        );
        Ok(self.objects.len() - 1)
    }

    pub fn scene_objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn scene_object(&self, index: usize) -> SdfResult<&SceneObject> {
        self.objects
            .get(index)
            .sdf_context(&format!("scene object {}", index))
    }

    pub fn resolution(&self) -> [u32; 3] {
        self.resolution
    }

    pub fn distance_field(&self) -> FieldId {
        self.distance
    }

    pub fn gradient_field(&self) -> FieldId {
        self.gradient
    }

    /// Regenerate the scene SDF and its gradient, then read both back
    pub fn compute(&mut self, backend: &mut dyn ComputeBackend) -> SdfResult<CpuSdf> {
        let uniforms = SceneSdfUniforms::new(self.simulation_transform, self.resolution);

        run_stage(backend, Kernel::SdfClear, &uniforms, &[self.distance], self.resolution)?;

        if self.objects.is_empty() {
            log::warn!("[SceneSdfGenerator] No scene objects; SDF is empty space everywhere");
        }
        for object in &self.objects {
            let object_dims = backend.field_desc(object.sdf)?.dims;
            run_stage(
                backend,
                Kernel::SdfCombine,
                &uniforms.with_object(object, object_dims),
                &[object.sdf, self.distance],
                self.resolution,
            )?;
        }

        run_stage(
            backend,
            Kernel::SdfGradient,
            &uniforms,
            &[self.distance, self.gradient],
            self.resolution,
        )?;

        let sdf = self.copy_to_cpu(backend)?;
        log::info!(
            "[SceneSdfGenerator] Regenerated scene SDF from {} objects",
            self.objects.len()
        );
        Ok(sdf)
    }

    /// Blocking readback of the current distance and gradient fields
    pub fn copy_to_cpu(&self, backend: &mut dyn ComputeBackend) -> SdfResult<CpuSdf> {
        let distance = backend
            .read_field(self.distance)
            .sdf_context("reading scene SDF")?;
        let gradient = backend
            .read_field(self.gradient)
            .sdf_context("reading scene SDF gradient")?;
        CpuSdf::from_readback(self.resolution, distance, &gradient)
    }
}
