use crate::compute::{run_stage, ComputeBackend, FieldDesc, FieldId, Kernel};
use crate::error::EngineResult;
use crate::field::{with_ghost_layer, DensityRing, PingPong};
use crate::fractal::{FractalNoiseParams, GradientNoise, PERMUTATION_SIZE};
use crate::sdf::SDF_EMPTY_DISTANCE;

use super::{
    FluidParams, FluidUniforms, StaggeredVelocity, DIFFUSION_ITERATIONS, NOISE_DIMENSION,
    PRESSURE_ITERATIONS,
};

/// Staggered-grid smoke solver.
///
/// Owns every simulation field. The SDF, its gradient and the surface
/// heightfield are borrowed by id from the generators that produce them;
/// until they are set the solver runs against built-in fallbacks (an empty
/// scene and a flat surface).
pub struct FluidSolver {
    sim_dims: [u32; 3],
    noise_dims: [u32; 3],
    params: FluidParams,
    delta_time: f32,
    elapsed_time: f32,

    velocity: StaggeredVelocity,
    pressure: PingPong<FieldId>,
    density: DensityRing<FieldId>,
    divergence: FieldId,
    curl: FieldId,

    noise_source: GradientNoise,
    noise_permutation: FieldId,
    noise: FieldId,

    sdf: FieldId,
    sdf_gradient: Option<FieldId>,
    surface: FieldId,
}

impl FluidSolver {
    pub fn new(
        backend: &mut dyn ComputeBackend,
        sim_dims: [u32; 3],
        params: FluidParams,
    ) -> EngineResult<Self> {
        Self::with_noise(
            backend,
            sim_dims,
            params,
            GradientNoise::default(),
            [NOISE_DIMENSION; 3],
        )
    }

    pub fn with_noise(
        backend: &mut dyn ComputeBackend,
        sim_dims: [u32; 3],
        params: FluidParams,
        noise_source: GradientNoise,
        noise_dims: [u32; 3],
    ) -> EngineResult<Self> {
        let cells = with_ghost_layer(sim_dims);

        let velocity = StaggeredVelocity::new(backend, sim_dims)?;
        let pressure = PingPong::new(
            backend.create_field(FieldDesc::scalar("fluid.pressure.0", cells))?,
            backend.create_field(FieldDesc::scalar("fluid.pressure.1", cells))?,
        );
        let density = DensityRing::new([
            backend.create_field(FieldDesc::scalar("fluid.density.0", cells))?,
            backend.create_field(FieldDesc::scalar("fluid.density.1", cells))?,
            backend.create_field(FieldDesc::scalar("fluid.density.2", cells))?,
        ]);
        let divergence = backend.create_field(FieldDesc::scalar("fluid.divergence", cells))?;
        let curl = backend.create_field(FieldDesc::vector("fluid.curl", sim_dims))?;

        let noise_permutation = backend.create_field(FieldDesc::scalar(
            "fluid.noise_permutation",
            [PERMUTATION_SIZE as u32 * 2, 1, 1],
        ))?;
        let noise = backend.create_field(FieldDesc::scalar("fluid.noise", noise_dims))?;

        let sdf = backend.create_field(FieldDesc::scalar("fluid.fallback_sdf", [2, 2, 2]))?;
        backend.fill_field(sdf, SDF_EMPTY_DISTANCE)?;
        let surface = backend.create_field(FieldDesc::scalar("fluid.fallback_surface", [2, 2, 1]))?;
        backend.fill_field(surface, 0.0)?;

        let zeroed = velocity
            .all()
            .chain(pressure.slots().iter().copied())
            .chain(density.slots().iter().copied())
            .chain([divergence, curl, noise]);
        for id in zeroed {
            backend.fill_field(id, 0.0)?;
        }

        log::info!(
            "[FluidSolver] Initialized {:?} simulation (noise {:?}, {} pressure iterations)",
            sim_dims,
            noise_dims,
            PRESSURE_ITERATIONS
        );

        Ok(Self {
            sim_dims,
            noise_dims,
            params,
            delta_time: 0.0,
            elapsed_time: 0.0,
            velocity,
            pressure,
            density,
            divergence,
            curl,
            noise_source,
            noise_permutation,
            noise,
            sdf,
            sdf_gradient: None,
            surface,
        })
    }

    fn uniforms(&self, backend: &dyn ComputeBackend) -> EngineResult<FluidUniforms> {
        let extend = |d: [u32; 3]| [d[0], d[1], d[2], 0];
        Ok(FluidUniforms {
            sim_dims: extend(self.sim_dims),
            sdf_dims: extend(backend.field_desc(self.sdf)?.dims),
            noise_dims: extend(self.noise_dims),
            surface_dims: extend(backend.field_desc(self.surface)?.dims),
            delta_time: self.delta_time,
            elapsed_time: self.elapsed_time,
            buoyancy: self.params.buoyancy,
            vorticity: self.params.vorticity,
            wind_strength: self.params.wind_strength,
            density_emission: self.params.density_emission,
            density_decay: self.params.density_decay,
            diffusion_rate: self.params.diffusion_rate,
        })
    }

    /// Advance the simulation by one step of `delta_time`
    pub fn compute(&mut self, backend: &mut dyn ComputeBackend) -> EngineResult<()> {
        let uniforms = self.uniforms(backend)?;
        let faces = self.velocity.dims().envelope();
        let cells = with_ghost_layer(self.sim_dims);

        // Advection and external forces
        let [ux, uy, uz] = self.velocity.current();
        let [wx, wy, wz] = self.velocity.next();
        run_stage(
            backend,
            Kernel::AdvectVelocity,
            &uniforms,
            &[ux, uy, uz, *self.density.current(), self.sdf, self.noise, wx, wy, wz],
            faces,
        )?;
        self.enforce_bounds(backend, &uniforms)?;

        // Vorticity confinement
        let [ux, uy, uz] = self.velocity.current();
        let [wx, wy, wz] = self.velocity.next();
        run_stage(backend, Kernel::Curl, &uniforms, &[ux, uy, uz, self.curl], self.sim_dims)?;
        run_stage(
            backend,
            Kernel::Vorticity,
            &uniforms,
            &[ux, uy, uz, self.curl, wx, wy, wz],
            faces,
        )?;
        self.enforce_bounds(backend, &uniforms)?;

        // Projection
        let [ux, uy, uz] = self.velocity.current();
        let [wx, wy, wz] = self.velocity.next();
        run_stage(
            backend,
            Kernel::Divergence,
            &uniforms,
            &[ux, uy, uz, self.divergence],
            cells,
        )?;
        for _ in 0..PRESSURE_ITERATIONS {
            run_stage(
                backend,
                Kernel::Jacobi,
                &uniforms,
                &[*self.pressure.current(), self.divergence, self.sdf, *self.pressure.next()],
                cells,
            )?;
            self.pressure.swap();
        }
        run_stage(
            backend,
            Kernel::Gradient,
            &uniforms,
            &[*self.pressure.current(), ux, uy, uz, self.sdf, wx, wy, wz],
            faces,
        )?;
        self.enforce_bounds(backend, &uniforms)?;

        if self.params.diffusion_enabled {
            self.diffuse_density(backend, &uniforms)?;
        }

        // Density transport
        let [ux, uy, uz] = self.velocity.current();
        run_stage(
            backend,
            Kernel::AdvectDensity,
            &uniforms,
            &[
                ux,
                uy,
                uz,
                *self.density.current(),
                self.sdf,
                self.surface,
                self.noise,
                *self.density.next(),
            ],
            cells,
        )?;
        self.density.advance();

        log::trace!(
            "[FluidSolver] Step dt={:.4} t={:.3}, density slot {}",
            self.delta_time,
            self.elapsed_time,
            self.density.index()
        );
        Ok(())
    }

    /// Bounds pass on the velocity write side, then swap
    fn enforce_bounds(
        &mut self,
        backend: &mut dyn ComputeBackend,
        uniforms: &FluidUniforms,
    ) -> EngineResult<()> {
        let [wx, wy, wz] = self.velocity.next();
        run_stage(
            backend,
            Kernel::Bounds,
            uniforms,
            &[wx, wy, wz, self.sdf],
            self.velocity.dims().envelope(),
        )?;
        self.velocity.swap();
        Ok(())
    }

    /// Jacobi diffusion between ring slots +1 and +2; slot +0 keeps the
    /// pre-diffusion density the iteration is anchored to.
    fn diffuse_density(
        &mut self,
        backend: &mut dyn ComputeBackend,
        uniforms: &FluidUniforms,
    ) -> EngineResult<()> {
        let cells = with_ghost_layer(self.sim_dims);
        let initial = *self.density.current();
        backend.copy_field(initial, *self.density.slot(1))?;

        for i in 0..DIFFUSION_ITERATIONS as usize {
            let read = *self.density.slot(1 + i % 2);
            let write = *self.density.slot(1 + (i + 1) % 2);
            run_stage(backend, Kernel::Diffuse, uniforms, &[initial, read, write], cells)?;
        }

        // The last iterate was written to slot 1 + (iterations % 2)
        self.density.advance_by(1 + DIFFUSION_ITERATIONS as usize % 2);
        Ok(())
    }

    /// Fill the tiling noise volume that drives wind and emission
    pub fn compute_noise(&mut self, backend: &mut dyn ComputeBackend) -> EngineResult<()> {
        backend.write_field(self.noise_permutation, &self.noise_source.permutation_field())?;
        let params = FractalNoiseParams::noise_volume();
        run_stage(
            backend,
            Kernel::NoiseVolume,
            &params.uniforms(self.noise_dims, true),
            &[self.noise_permutation, self.noise],
            self.noise_dims,
        )?;
        log::info!("[FluidSolver] Generated {:?} noise volume", self.noise_dims);
        Ok(())
    }

    pub fn swap_density_buffers(&mut self) {
        self.density.advance();
    }

    pub fn set_delta_time(&mut self, delta_time: f32) {
        self.delta_time = delta_time;
    }

    pub fn set_elapsed_time(&mut self, elapsed_time: f32) {
        self.elapsed_time = elapsed_time;
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    /// Terrain heightfield used to modulate emission
    pub fn set_surface_field(&mut self, surface: FieldId) {
        self.surface = surface;
    }

    /// Scene SDF; cells with negative distance are solid
    pub fn set_sdf_field(&mut self, sdf: FieldId) {
        self.sdf = sdf;
    }

    pub fn set_sdf_gradient_field(&mut self, gradient: FieldId) {
        self.sdf_gradient = Some(gradient);
    }

    pub fn params(&self) -> &FluidParams {
        &self.params
    }

    pub fn set_params(&mut self, params: FluidParams) {
        self.params = params;
    }

    pub fn sim_dims(&self) -> [u32; 3] {
        self.sim_dims
    }

    /// Current read side of the density ring
    pub fn density_field(&self) -> FieldId {
        *self.density.current()
    }

    pub fn density_index(&self) -> usize {
        self.density.index()
    }

    /// Current read side of the x/y/z velocity pairs
    pub fn velocity_fields(&self) -> [FieldId; 3] {
        self.velocity.current()
    }

    pub fn pressure_field(&self) -> FieldId {
        *self.pressure.current()
    }

    pub fn divergence_field(&self) -> FieldId {
        self.divergence
    }

    pub fn curl_field(&self) -> FieldId {
        self.curl
    }

    pub fn noise_field(&self) -> FieldId {
        self.noise
    }

    pub fn sdf_field(&self) -> FieldId {
        self.sdf
    }

    pub fn sdf_gradient_field(&self) -> Option<FieldId> {
        self.sdf_gradient
    }

    pub fn surface_field(&self) -> FieldId {
        self.surface
    }
}
