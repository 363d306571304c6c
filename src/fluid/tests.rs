use super::*;
use crate::compute::{run_stage, ComputeBackend, CpuBackend, FieldDesc, FieldId, Kernel, StageEvent};
use crate::field::{linear_index, with_ghost_layer, StaggeredDims};
use crate::fractal::GradientNoise;

const EPSILON: f32 = 1e-4;
const SIM: [u32; 3] = [4, 4, 4];

fn small_solver(backend: &mut CpuBackend, params: FluidParams) -> FluidSolver {
    FluidSolver::with_noise(backend, SIM, params, GradientNoise::identity(), [8, 8, 8]).unwrap()
}

fn max_abs(data: &[f32]) -> f32 {
    data.iter().fold(0.0f32, |m, v| m.max(v.abs()))
}

/// Largest |divergence| over interior cells, computed from the read side
fn max_divergence(backend: &mut CpuBackend, solver: &FluidSolver) -> f32 {
    let dims = StaggeredDims::new(SIM);
    let [vx, vy, vz] = solver.velocity_fields();
    let vx = backend.read_field(vx).unwrap();
    let vy = backend.read_field(vy).unwrap();
    let vz = backend.read_field(vz).unwrap();

    let mut worst = 0.0f32;
    for z in 1..=SIM[2] {
        for y in 1..=SIM[1] {
            for x in 1..=SIM[0] {
                let div = vx[linear_index(dims.x, x + 1, y, z)] - vx[linear_index(dims.x, x, y, z)]
                    + vy[linear_index(dims.y, x, y + 1, z)]
                    - vy[linear_index(dims.y, x, y, z)]
                    + vz[linear_index(dims.z, x, y, z + 1)]
                    - vz[linear_index(dims.z, x, y, z)];
                worst = worst.max(div.abs());
            }
        }
    }
    worst
}

fn uniforms(delta_time: f32, params: &FluidParams) -> FluidUniforms {
    FluidUniforms {
        sim_dims: [SIM[0], SIM[1], SIM[2], 0],
        sdf_dims: [2, 2, 2, 0],
        noise_dims: [2, 2, 2, 0],
        surface_dims: [2, 2, 1, 0],
        delta_time,
        elapsed_time: 0.0,
        buoyancy: params.buoyancy,
        vorticity: params.vorticity,
        wind_strength: params.wind_strength,
        density_emission: params.density_emission,
        density_decay: params.density_decay,
        diffusion_rate: params.diffusion_rate,
    }
}

#[test]
fn test_uniform_block_layout() {
    assert_eq!(std::mem::size_of::<FluidUniforms>(), 96);
}

#[test]
fn test_default_params() {
    let params = FluidParams::default();
    assert!(!params.diffusion_enabled);
    assert!(params.buoyancy > 0.0);
    assert!(params.density_decay >= 0.0);
}

#[test]
fn test_staggered_velocity_swaps_together() {
    let mut backend = CpuBackend::new();
    let mut velocity = StaggeredVelocity::new(&mut backend, SIM).unwrap();
    let current = velocity.current();
    let next = velocity.next();
    assert!(current.iter().all(|id| !next.contains(id)));

    velocity.swap();
    assert_eq!(velocity.current(), next);
    assert_eq!(velocity.next(), current);

    let dims = velocity.dims();
    assert_eq!(backend.field_desc(current[0]).unwrap().dims, dims.x);
    assert_eq!(backend.field_desc(current[1]).unwrap().dims, dims.y);
    assert_eq!(backend.field_desc(current[2]).unwrap().dims, dims.z);
    assert_eq!(velocity.all().count(), 6);
}

#[test]
fn test_step_stage_order() {
    let mut backend = CpuBackend::with_event_log();
    let mut solver = small_solver(&mut backend, FluidParams::default());
    solver.set_delta_time(0.016);
    backend.clear_events();

    solver.compute(&mut backend).unwrap();

    let kernels: Vec<Kernel> = backend.dispatches().map(|d| d.kernel).collect();
    let mut expected = vec![
        Kernel::AdvectVelocity,
        Kernel::Bounds,
        Kernel::Curl,
        Kernel::Vorticity,
        Kernel::Bounds,
        Kernel::Divergence,
    ];
    expected.extend(std::iter::repeat(Kernel::Jacobi).take(PRESSURE_ITERATIONS as usize));
    expected.extend([Kernel::Gradient, Kernel::Bounds, Kernel::AdvectDensity]);
    assert_eq!(kernels, expected);

    // Every dispatch sits between its own bind and unbind
    for triple in backend.events().chunks(3) {
        assert!(matches!(triple[0], StageEvent::Bind(_)));
        assert!(matches!(triple[1], StageEvent::Dispatch(_)));
        assert_eq!(triple[2], StageEvent::Unbind);
    }
}

#[test]
fn test_jacobi_ping_pongs_pressure() {
    let mut backend = CpuBackend::with_event_log();
    let mut solver = small_solver(&mut backend, FluidParams::default());
    let start = solver.pressure_field();
    backend.clear_events();
    solver.compute(&mut backend).unwrap();

    let jacobi: Vec<_> = backend
        .dispatches()
        .filter(|d| d.kernel == Kernel::Jacobi)
        .collect();
    for pair in jacobi.windows(2) {
        assert_eq!(pair[1].reads[0], pair[0].writes[0]);
    }
    // Even iteration count: the read side ends where it started
    assert_eq!(solver.pressure_field(), start);
}

#[test]
fn test_density_ring_advances_once_per_step() {
    let mut backend = CpuBackend::new();
    let mut solver = small_solver(&mut backend, FluidParams::default());
    assert_eq!(solver.density_index(), 0);
    solver.compute(&mut backend).unwrap();
    assert_eq!(solver.density_index(), 1);
    solver.compute(&mut backend).unwrap();
    assert_eq!(solver.density_index(), 2);
    solver.compute(&mut backend).unwrap();
    assert_eq!(solver.density_index(), 0);

    solver.swap_density_buffers();
    assert_eq!(solver.density_index(), 1);
}

#[test]
fn test_quiescent_fluid_stays_zero() {
    let mut backend = CpuBackend::new();
    let mut solver = small_solver(&mut backend, FluidParams::default());

    for step in 0..5 {
        solver.set_delta_time(0.016);
        solver.set_elapsed_time(step as f32 * 0.016);
        solver.compute(&mut backend).unwrap();
    }

    let density = backend.read_field(solver.density_field()).unwrap();
    let pressure = backend.read_field(solver.pressure_field()).unwrap();
    assert_eq!(max_abs(&density), 0.0);
    assert_eq!(max_abs(&pressure), 0.0);
    for id in solver.velocity_fields() {
        assert_eq!(max_abs(&backend.read_field(id).unwrap()), 0.0);
    }
}

#[test]
fn test_projection_removes_divergence() {
    let mut backend = CpuBackend::new();
    let mut solver = small_solver(&mut backend, FluidParams::default());

    // A single interior x face carrying flow: one source, one sink
    let dims = StaggeredDims::new(SIM);
    let vx = solver.velocity_fields()[0];
    let mut data = vec![0.0; backend.field_desc(vx).unwrap().len()];
    data[linear_index(dims.x, 2, 2, 2)] = 1.0;
    backend.write_field(vx, &data).unwrap();

    let before = max_divergence(&mut backend, &solver);
    assert!((before - 1.0).abs() < EPSILON);

    solver.set_delta_time(0.0);
    solver.compute(&mut backend).unwrap();

    let after = max_divergence(&mut backend, &solver);
    assert!(after < 0.5 * before, "divergence {} -> {}", before, after);
}

#[test]
fn test_solid_scene_blocks_all_flow() {
    let mut backend = CpuBackend::new();
    let mut solver = small_solver(&mut backend, FluidParams::default());

    let solid = backend
        .create_field(FieldDesc::scalar("test.solid_sdf", [3, 3, 3]))
        .unwrap();
    backend.fill_field(solid, -1.0).unwrap();
    solver.set_sdf_field(solid);

    for id in solver.velocity_fields() {
        backend.fill_field(id, 1.0).unwrap();
    }
    backend.fill_field(solver.density_field(), 1.0).unwrap();

    solver.set_delta_time(0.016);
    solver.compute(&mut backend).unwrap();

    for id in solver.velocity_fields() {
        assert_eq!(max_abs(&backend.read_field(id).unwrap()), 0.0);
    }
    assert_eq!(max_abs(&backend.read_field(solver.density_field()).unwrap()), 0.0);
}

#[test]
fn test_buoyancy_lifts_dense_cells() {
    let mut backend = CpuBackend::new();
    let params = FluidParams::default();
    let cells = with_ghost_layer(SIM);
    let dims = StaggeredDims::new(SIM);

    let create = |backend: &mut CpuBackend, label: &str, dims: [u32; 3]| -> FieldId {
        backend.create_field(FieldDesc::scalar(label, dims)).unwrap()
    };
    let velocity: Vec<FieldId> = (0..3)
        .map(|axis| create(&mut backend, &format!("in_{}", axis), dims.axis(axis)))
        .collect();
    let output: Vec<FieldId> = (0..3)
        .map(|axis| create(&mut backend, &format!("out_{}", axis), dims.axis(axis)))
        .collect();
    let density = create(&mut backend, "density", cells);
    let sdf = create(&mut backend, "sdf", [2, 2, 2]);
    let noise = create(&mut backend, "noise", [2, 2, 2]);
    backend.fill_field(density, 1.0).unwrap();
    backend.fill_field(sdf, 10.0).unwrap();

    let dt = 0.5;
    run_stage(
        &mut backend,
        Kernel::AdvectVelocity,
        &uniforms(dt, &params),
        &[
            velocity[0], velocity[1], velocity[2], density, sdf, noise, output[0], output[1],
            output[2],
        ],
        dims.envelope(),
    )
    .unwrap();

    let vy = backend.read_field(output[1]).unwrap();
    let expected = dt * params.buoyancy;
    assert!((vy[linear_index(dims.y, 2, 2, 2)] - expected).abs() < EPSILON);
    assert!((vy[linear_index(dims.y, 3, 4, 1)] - expected).abs() < EPSILON);
    // Floor and ceiling walls stay closed
    assert_eq!(vy[linear_index(dims.y, 2, 1, 2)], 0.0);
    assert_eq!(vy[linear_index(dims.y, 2, 5, 2)], 0.0);

    // No wind without noise
    assert_eq!(max_abs(&backend.read_field(output[0]).unwrap()), 0.0);
}

#[test]
fn test_density_decays_without_emission() {
    let mut backend = CpuBackend::new();
    let params = FluidParams {
        density_emission: 0.0,
        ..FluidParams::default()
    };
    let mut solver = small_solver(&mut backend, params);
    backend.fill_field(solver.density_field(), 1.0).unwrap();

    solver.set_delta_time(0.5);
    solver.compute(&mut backend).unwrap();

    let density = backend.read_field(solver.density_field()).unwrap();
    let cells = with_ghost_layer(SIM);
    let centre = density[linear_index(cells, 2, 2, 2)];
    assert!(centre < 1.0);
    assert!(centre >= 0.0);
    // Ghost layer is never filled
    assert_eq!(density[linear_index(cells, 0, 2, 2)], 0.0);
}

#[test]
fn test_noise_volume_drives_emission() {
    let mut backend = CpuBackend::new();
    let mut solver = small_solver(&mut backend, FluidParams::default());
    solver.compute_noise(&mut backend).unwrap();

    let noise = backend.read_field(solver.noise_field()).unwrap();
    let min = noise.iter().cloned().fold(f32::MAX, f32::min);
    let max = noise.iter().cloned().fold(f32::MIN, f32::max);
    assert!(max > min);

    solver.set_delta_time(0.1);
    solver.compute(&mut backend).unwrap();
    let density = backend.read_field(solver.density_field()).unwrap();
    assert!(density.iter().all(|&d| d >= 0.0));
    assert!(density.iter().any(|&d| d > 0.0));
}

#[test]
fn test_diffusion_keeps_initial_slot_and_advances() {
    let mut backend = CpuBackend::with_event_log();
    let params = FluidParams {
        diffusion_enabled: true,
        diffusion_rate: 0.01,
        density_emission: 0.0,
        ..FluidParams::default()
    };
    let mut solver = small_solver(&mut backend, params);

    let cells = with_ghost_layer(SIM);
    let mut blob = vec![0.0; crate::field::cell_count(cells)];
    blob[linear_index(cells, 2, 2, 2)] = 1.0;
    backend.write_field(solver.density_field(), &blob).unwrap();
    let initial = solver.density_field();
    backend.clear_events();

    solver.set_delta_time(0.1);
    solver.compute(&mut backend).unwrap();

    let diffuse: Vec<_> = backend
        .dispatches()
        .filter(|d| d.kernel == Kernel::Diffuse)
        .collect();
    assert_eq!(diffuse.len(), DIFFUSION_ITERATIONS as usize);
    assert!(diffuse.iter().all(|d| d.reads[0] == initial));
    assert!(diffuse.iter().all(|d| !d.writes.contains(&initial)));

    // Diffusion advanced once, density advection once more
    assert_eq!(solver.density_index(), 2);

    let density = backend.read_field(solver.density_field()).unwrap();
    let centre = density[linear_index(cells, 2, 2, 2)];
    let neighbour = density[linear_index(cells, 3, 2, 2)];
    assert!(centre < 1.0);
    assert!(neighbour > 0.0);
}
