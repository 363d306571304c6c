//! End-to-end scenarios on the CPU reference backend

use cloud_engine::collision::locomotion::set_player_controls;
use cloud_engine::compute::StageEvent;
use cloud_engine::{
    CloudScene, ComputeBackend, CpuBackend, DisplacementDims, EngineConfig, FluidParams, Kernel,
    MotorState, MoveInput, SceneSdfGenerator, SDF_EMPTY_DISTANCE,
};
use glam::Vec3;

const STAGES_PER_STEP: usize = 79;

fn small_config() -> EngineConfig {
    EngineConfig {
        simulation_dims: [4, 4, 4],
        sdf_dims: [6, 6, 6],
        displacement: DisplacementDims {
            height: [12, 12, 1],
            sdf: [8, 8, 8],
        },
        noise_dims: [8, 8, 8],
        detail_dims: [4, 4, 4],
        ..EngineConfig::default()
    }
}

fn quiescent_config() -> EngineConfig {
    EngineConfig {
        fluid: FluidParams {
            buoyancy: 0.0,
            vorticity: 0.0,
            wind_strength: 0.0,
            density_emission: 0.0,
            ..FluidParams::default()
        },
        ..small_config()
    }
}

#[test]
fn test_quiescent_run_stays_zero() {
    let mut backend = CpuBackend::new();
    let mut scene = CloudScene::new(&mut backend, &quiescent_config()).unwrap();

    for _ in 0..10 {
        scene.step(&mut backend, 1.0 / 60.0).unwrap();
    }

    assert_eq!(scene.frame(), 10);
    for id in scene.fluid().velocity_fields() {
        assert!(backend.read_field(id).unwrap().iter().all(|&v| v == 0.0));
    }
    let density = backend.read_field(scene.density_field()).unwrap();
    assert!(density.iter().all(|&d| d == 0.0));
    let pressure = backend.read_field(scene.fluid().pressure_field()).unwrap();
    assert!(pressure.iter().all(|&p| p == 0.0));
}

#[test]
fn test_emission_produces_density() {
    let mut backend = CpuBackend::new();
    let mut scene = CloudScene::new(&mut backend, &small_config()).unwrap();
    for _ in 0..3 {
        scene.step(&mut backend, 0.1).unwrap();
    }
    let density = backend.read_field(scene.density_field()).unwrap();
    assert!(density.iter().all(|d| d.is_finite() && *d >= 0.0));
    assert!(density.iter().any(|&d| d > 0.0));
}

#[test]
fn test_step_stage_order() {
    let mut backend = CpuBackend::with_event_log();
    let mut scene = CloudScene::new(&mut backend, &small_config()).unwrap();
    backend.clear_events();

    scene.step(&mut backend, 1.0 / 60.0).unwrap();

    let kernels: Vec<Kernel> = backend.dispatches().map(|d| d.kernel).collect();
    assert_eq!(kernels.len(), STAGES_PER_STEP);
    assert_eq!(
        &kernels[..6],
        &[
            Kernel::AdvectVelocity,
            Kernel::Bounds,
            Kernel::Curl,
            Kernel::Vorticity,
            Kernel::Bounds,
            Kernel::Divergence,
        ]
    );
    assert!(kernels[6..76].iter().all(|&k| k == Kernel::Jacobi));
    assert_eq!(
        &kernels[76..],
        &[Kernel::Gradient, Kernel::Bounds, Kernel::AdvectDensity]
    );

    // Every dispatch sits between its own bind and unbind
    for triple in backend.events().chunks(3) {
        assert!(matches!(triple[0], StageEvent::Bind(_)));
        assert!(matches!(triple[1], StageEvent::Dispatch(_)));
        assert_eq!(triple[2], StageEvent::Unbind);
    }
}

#[test]
fn test_startup_order() {
    let mut backend = CpuBackend::with_event_log();
    CloudScene::new(&mut backend, &small_config()).unwrap();
    let kernels: Vec<Kernel> = backend.dispatches().map(|d| d.kernel).collect();
    assert_eq!(
        kernels,
        vec![
            Kernel::TerrainHeight,
            Kernel::TerrainSdf,
            Kernel::SdfClear,
            Kernel::SdfCombine,
            Kernel::SdfGradient,
            Kernel::NoiseVolume,
        ]
    );
}

#[test]
fn test_empty_scene_fallback() {
    let mut backend = CpuBackend::new();
    let mut generator = SceneSdfGenerator::new(&mut backend, [4, 4, 4]).unwrap();
    let sdf = generator.compute(&mut backend).unwrap();
    assert!(sdf.distance.iter().all(|&d| d == SDF_EMPTY_DISTANCE));
}

#[test]
fn test_terrain_scene_has_inside_and_outside() {
    let mut backend = CpuBackend::new();
    let scene = CloudScene::new(&mut backend, &small_config()).unwrap();
    let sdf = scene.cpu_sdf();
    assert_eq!(sdf.resolution, [8, 8, 8]);
    assert!(sdf.distance.iter().any(|&d| d < 0.0));
    assert!(sdf.distance.iter().any(|&d| d > 0.0));
    assert!(sdf.distance.iter().all(|&d| d < SDF_EMPTY_DISTANCE));
}

#[test]
fn test_collision_against_terrain() {
    let mut backend = CpuBackend::new();
    let scene = CloudScene::new(&mut backend, &small_config()).unwrap();

    let previous = Vec3::new(0.0, 6.0, 0.0);
    // Outside the simulation cube
    assert_eq!(scene.resolve_camera(previous, Vec3::new(0.0, 30.0, 0.0)), previous);

    let resolved = scene.resolve_camera(previous, Vec3::new(0.5, 6.0, 0.5));
    assert!(resolved.is_finite());

    let camera = set_player_controls(&MotorState::default(), true);
    let walk = MoveInput {
        forward: true,
        ..Default::default()
    };
    let moved = scene.update_camera(&camera, &walk, (0.0, 0.0), 0.1);
    assert!(moved.position.is_finite());
}

#[test]
fn test_update_displacement_regenerates_without_new_objects() {
    let mut backend = CpuBackend::with_event_log();
    let mut scene = CloudScene::new(&mut backend, &small_config()).unwrap();
    let before = scene.cpu_sdf().clone();
    backend.clear_events();

    let mut params = *scene.fractal_params();
    params.amplitude = 2.0;
    scene.update_displacement(&mut backend, params).unwrap();

    assert_eq!(scene.scene_sdf().scene_objects().len(), 1);
    let combines = backend
        .dispatches()
        .filter(|d| d.kernel == Kernel::SdfCombine)
        .count();
    assert_eq!(combines, 1);
    assert_eq!(scene.fractal_params().amplitude, 2.0);
    assert_ne!(scene.cpu_sdf(), &before);
}
