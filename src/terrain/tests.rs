use glam::Vec3;

use super::*;
use crate::compute::{ComputeBackend, CpuBackend, Kernel};
use crate::fractal::{FractalNoiseParams, GradientNoise};

const EPSILON: f32 = 1e-4;

fn small_dims() -> DisplacementDims {
    DisplacementDims {
        height: [9, 9, 1],
        sdf: [6, 6, 6],
    }
}

fn computed(backend: &mut CpuBackend) -> DisplacementGenerator {
    let mut generator = DisplacementGenerator::new(
        backend,
        small_dims(),
        GradientNoise::seeded(7),
        FractalNoiseParams::default(),
    )
    .unwrap();
    generator.compute(backend).unwrap();
    generator
}

#[test]
fn test_uniform_block_layout() {
    assert_eq!(std::mem::size_of::<TerrainSdfUniforms>(), 48);
}

#[test]
fn test_compute_dispatches_height_then_sdf() {
    let mut backend = CpuBackend::with_event_log();
    let generator = computed(&mut backend);

    let kernels: Vec<Kernel> = backend.dispatches().map(|d| d.kernel).collect();
    assert_eq!(kernels, vec![Kernel::TerrainHeight, Kernel::TerrainSdf]);

    let sdf_pass = backend.dispatches().nth(1).unwrap();
    assert_eq!(sdf_pass.reads, vec![generator.height_field()]);
    assert_eq!(sdf_pass.writes, vec![generator.sdf_field()]);
    assert_eq!(sdf_pass.grid, [6, 6, 6]);
}

#[test]
fn test_height_matches_host_fbm() {
    let mut backend = CpuBackend::new();
    let generator = computed(&mut backend);
    let height = backend.read_field(generator.height_field()).unwrap();

    let params = *generator.params();
    let noise = generator.noise().clone();
    let step = 1.0 / 8.0;
    for (x, y) in [(0u32, 0u32), (3, 5), (8, 8)] {
        let expected = params.fbm(
            &noise,
            Vec3::new(x as f32 * step, 0.0, y as f32 * step) + params.offset,
        );
        let actual = height[(y * 9 + x) as usize];
        assert!(
            (actual - expected).abs() < EPSILON,
            "height at ({}, {}): {} vs {}",
            x,
            y,
            actual,
            expected
        );
    }
}

#[test]
fn test_height_bounded_by_estimate() {
    let mut backend = CpuBackend::new();
    let generator = computed(&mut backend);
    let bound = generator.estimate_max();
    let height = backend.read_field(generator.height_field()).unwrap();
    assert!(height.iter().all(|h| h.abs() <= bound * 1.2));
}

#[test]
fn test_normals_are_unit_and_point_up() {
    let mut backend = CpuBackend::new();
    let generator = computed(&mut backend);
    let normals = backend.read_field(generator.normal_field()).unwrap();

    for n in normals.chunks_exact(4) {
        let v = Vec3::new(n[0], n[1], n[2]);
        assert!((v.length() - 1.0).abs() < EPSILON);
        assert!(v.y > 0.0);
        assert_eq!(n[3], 0.0);
    }
}

#[test]
fn test_sdf_increases_with_height() {
    let mut backend = CpuBackend::new();
    let generator = computed(&mut backend);
    let sdf = backend.read_field(generator.sdf_field()).unwrap();
    let bound = generator.estimate_max();

    for z in 0..6usize {
        for x in 0..6usize {
            let column: Vec<f32> = (0..6usize).map(|y| sdf[(z * 6 + y) * 6 + x]).collect();
            assert!(column.windows(2).all(|w| w[1] > w[0]));
            // Bottom is at or below the surface, top at or above it
            assert!(column[0] <= 0.0 + bound * 0.2);
            assert!(column[5] >= 0.0 - bound * 0.2);
        }
    }
}

#[test]
fn test_flat_terrain_sdf_is_local_height() {
    let mut backend = CpuBackend::new();
    let mut generator = DisplacementGenerator::new(
        &mut backend,
        small_dims(),
        GradientNoise::identity(),
        FractalNoiseParams::default(),
    )
    .unwrap();
    generator.set_amplitude(0.0);
    generator.compute(&mut backend).unwrap();

    // Zero amplitude: flat terrain and a zero-height slab
    let sdf = backend.read_field(generator.sdf_field()).unwrap();
    assert!(sdf.iter().all(|d| d.abs() < EPSILON));
}

#[test]
fn test_setters_round_trip() {
    let mut backend = CpuBackend::new();
    let mut generator = DisplacementGenerator::new(
        &mut backend,
        small_dims(),
        GradientNoise::identity(),
        FractalNoiseParams::default(),
    )
    .unwrap();

    generator.set_frequency(1.5);
    generator.set_amplitude(2.0);
    generator.set_lacunarity(3.0);
    generator.set_gain(0.25);
    generator.set_offset(Vec3::new(1.0, 2.0, 3.0));
    generator.set_octaves(3);

    assert_eq!(generator.frequency(), 1.5);
    assert_eq!(generator.amplitude(), 2.0);
    assert_eq!(generator.lacunarity(), 3.0);
    assert_eq!(generator.gain(), 0.25);
    assert_eq!(generator.offset(), Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(generator.octaves(), 3);
    assert!((generator.estimate_max() - (2.0 + 0.5 + 0.125)).abs() < EPSILON);
}
