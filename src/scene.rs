//! Scene orchestration
//!
//! Wires the generators and the solver together in startup order and owns
//! the collider built from the downloaded scene SDF.

use glam::Vec3;

use crate::collision::locomotion::update_motor;
use crate::collision::{MotorState, MoveInput, SdfCollider};
use crate::compute::{ComputeBackend, FieldId};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::fluid::FluidSolver;
use crate::fractal::FractalNoiseParams;
use crate::sdf::{CpuSdf, SceneSdfGenerator};
use crate::terrain::DisplacementGenerator;
use crate::volume::{CloudDetail, VolumeParams};

pub struct CloudScene {
    displacement: DisplacementGenerator,
    scene_sdf: SceneSdfGenerator,
    fluid: FluidSolver,
    detail: CloudDetail,
    collider: SdfCollider,
    volume: VolumeParams,
    elapsed_time: f32,
    frame: u64,
}

impl CloudScene {
    /// Build every field and run the one-off generators.
    ///
    /// Terrain comes first since both the scene SDF and the solver's
    /// emission read its outputs.
    pub fn new(backend: &mut dyn ComputeBackend, config: &EngineConfig) -> EngineResult<Self> {
        let noise = config.gradient_noise();

        let mut displacement =
            DisplacementGenerator::new(backend, config.displacement, noise.clone(), config.fractal)?;
        displacement.compute(backend)?;

        let mut fluid = FluidSolver::with_noise(
            backend,
            config.simulation_dims,
            config.fluid,
            noise,
            config.noise_dims,
        )?;
        fluid.set_surface_field(displacement.height_field());

        let simulation = config.simulation.matrix();
        let mut scene_sdf = SceneSdfGenerator::new(backend, config.sdf_dims)?;
        scene_sdf.set_simulation_transform(simulation);
        scene_sdf.add_scene_object(
            displacement.sdf_field(),
            config.terrain_object.transform.matrix(),
            config.terrain_object.uniform_scale,
        )?;
        let cpu_sdf = scene_sdf.compute(backend)?;

        fluid.set_sdf_field(scene_sdf.distance_field());
        fluid.set_sdf_gradient_field(scene_sdf.gradient_field());
        fluid.swap_density_buffers();

        let detail = CloudDetail::new(backend, config.detail_dims, config.detail_seed())?;
        detail.compute(backend)?;
        fluid.compute_noise(backend)?;

        let collider = SdfCollider::new(cpu_sdf, simulation, config.collision)?;

        log::info!("[CloudScene] Scene ready on {}", backend.name());

        Ok(Self {
            displacement,
            scene_sdf,
            fluid,
            detail,
            collider,
            volume: config.volume,
            elapsed_time: 0.0,
            frame: 0,
        })
    }

    /// Advance the fluid by one frame
    pub fn step(&mut self, backend: &mut dyn ComputeBackend, delta_time: f32) -> EngineResult<()> {
        self.elapsed_time += delta_time;
        self.fluid.set_delta_time(delta_time);
        self.fluid.set_elapsed_time(self.elapsed_time);
        self.fluid.compute(backend)?;
        self.frame += 1;
        Ok(())
    }

    /// Regenerate terrain and the scene SDF with new fractal parameters.
    ///
    /// The terrain object is already registered and reads the regenerated
    /// sub-SDF in place, so nothing is appended.
    pub fn update_displacement(
        &mut self,
        backend: &mut dyn ComputeBackend,
        params: FractalNoiseParams,
    ) -> EngineResult<()> {
        self.displacement.set_params(params.clamped());
        self.displacement.compute(backend)?;
        let cpu_sdf = self.scene_sdf.compute(backend)?;
        self.collider.replace_sdf(cpu_sdf);
        log::info!("[CloudScene] Terrain regenerated");
        Ok(())
    }

    /// Where the camera ends up when it tries to move from `previous` to `proposed`
    pub fn resolve_camera(&self, previous: Vec3, proposed: Vec3) -> Vec3 {
        self.collider.resolve(previous, proposed)
    }

    /// One frame of first-person movement against the scene
    pub fn update_camera(
        &self,
        state: &MotorState,
        input: &MoveInput,
        mouse_delta: (f32, f32),
        delta_time: f32,
    ) -> MotorState {
        update_motor(state, input, mouse_delta, delta_time, Some(&self.collider))
    }

    pub fn volume_params(&self) -> VolumeParams {
        self.volume
    }

    pub fn set_volume_params(&mut self, params: VolumeParams) {
        self.volume = params.clamped();
    }

    pub fn fractal_params(&self) -> &FractalNoiseParams {
        self.displacement.params()
    }

    pub fn cpu_sdf(&self) -> &CpuSdf {
        self.collider.sdf()
    }

    pub fn density_field(&self) -> FieldId {
        self.fluid.density_field()
    }

    pub fn height_field(&self) -> FieldId {
        self.displacement.height_field()
    }

    pub fn normal_field(&self) -> FieldId {
        self.displacement.normal_field()
    }

    pub fn terrain_sdf_field(&self) -> FieldId {
        self.displacement.sdf_field()
    }

    pub fn sdf_field(&self) -> FieldId {
        self.scene_sdf.distance_field()
    }

    pub fn sdf_gradient_field(&self) -> FieldId {
        self.scene_sdf.gradient_field()
    }

    pub fn noise_field(&self) -> FieldId {
        self.fluid.noise_field()
    }

    pub fn detail_field(&self) -> FieldId {
        self.detail.field()
    }

    pub fn fluid(&self) -> &FluidSolver {
        &self.fluid
    }

    pub fn scene_sdf(&self) -> &SceneSdfGenerator {
        &self.scene_sdf
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}
