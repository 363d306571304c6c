use glam::Mat4;

use super::*;
use crate::sdf::{SceneSdfUniforms, SDF_EMPTY_DISTANCE};

fn clear_uniforms(dims: [u32; 3]) -> SceneSdfUniforms {
    SceneSdfUniforms::new(Mat4::IDENTITY, dims)
}

#[test]
fn test_field_desc_sizes() {
    let scalar = FieldDesc::scalar("a", [2, 3, 4]);
    let vector = FieldDesc::vector("b", [2, 3, 4]);
    assert_eq!(scalar.len(), 24);
    assert_eq!(vector.len(), 96);
    assert_eq!(vector.size_bytes(), 384);
    assert!(FieldDesc::scalar("c", [0, 3, 4]).is_empty());
}

#[test]
fn test_calculate_workgroups() {
    assert_eq!(calculate_workgroups([4, 4, 4]), (1, 1, 1));
    assert_eq!(calculate_workgroups([66, 66, 66]), (17, 17, 17));
    assert_eq!(calculate_workgroups([136, 136, 1]), (34, 34, 1));
}

#[test]
fn test_arena_label_index() {
    let mut backend = CpuBackend::new();
    let a = backend.create_field(FieldDesc::scalar("fluid.density.0", [2, 2, 2])).unwrap();
    let b = backend.create_field(FieldDesc::scalar("fluid.density.1", [2, 2, 2])).unwrap();
    assert_eq!(backend.field_by_label("fluid.density.0"), Some(a));
    assert_eq!(backend.field_by_label("fluid.density.1"), Some(b));
    assert_eq!(backend.field_by_label("missing"), None);
}

#[test]
fn test_write_size_checked() {
    let mut backend = CpuBackend::new();
    let id = backend.create_field(FieldDesc::scalar("a", [2, 2, 2])).unwrap();
    assert!(backend.write_field(id, &[1.0; 8]).is_ok());
    assert!(matches!(
        backend.write_field(id, &[1.0; 7]),
        Err(EngineError::SizeMismatch { .. })
    ));
}

#[test]
fn test_copy_and_fill() {
    let mut backend = CpuBackend::new();
    let a = backend.create_field(FieldDesc::scalar("a", [2, 2, 1])).unwrap();
    let b = backend.create_field(FieldDesc::scalar("b", [2, 2, 1])).unwrap();
    backend.fill_field(a, 3.0).unwrap();
    backend.copy_field(a, b).unwrap();
    assert_eq!(backend.read_field(b).unwrap(), vec![3.0; 4]);
}

#[test]
fn test_run_stage_dispatches_and_unbinds() {
    let mut backend = CpuBackend::with_event_log();
    let id = backend.create_field(FieldDesc::scalar("scene", [3, 3, 3])).unwrap();
    run_stage(&mut backend, Kernel::SdfClear, &clear_uniforms([3, 3, 3]), &[id], [3, 3, 3]).unwrap();

    assert!(backend.read_field(id).unwrap().iter().all(|&d| d == SDF_EMPTY_DISTANCE));
    assert_eq!(
        backend.events(),
        &[
            StageEvent::Bind(Kernel::SdfClear),
            StageEvent::Dispatch(DispatchRecord {
                kernel: Kernel::SdfClear,
                reads: vec![],
                writes: vec![id],
                grid: [3, 3, 3],
            }),
            StageEvent::Unbind,
        ]
    );
}

#[test]
fn test_binding_while_bound_is_rejected() {
    let mut backend = CpuBackend::new();
    backend.bind(Kernel::SdfClear).unwrap();
    let result = backend.bind(Kernel::SdfGradient);
    assert!(matches!(
        result,
        Err(EngineError::StageStillBound {
            bound: Kernel::SdfClear,
            requested: Kernel::SdfGradient
        })
    ));
    backend.unbind();
    assert!(backend.bind(Kernel::SdfGradient).is_ok());
}

#[test]
fn test_dispatch_without_stage_is_rejected() {
    let mut backend = CpuBackend::new();
    assert!(matches!(backend.dispatch([1, 1, 1]), Err(EngineError::NoStageBound)));
    assert!(matches!(backend.set_uniforms(&[0; 4]), Err(EngineError::NoStageBound)));
}

#[test]
fn test_layout_mismatch() {
    let mut backend = CpuBackend::new();
    let id = backend.create_field(FieldDesc::scalar("a", [2, 2, 2])).unwrap();
    let mut stage = ComputeStage::bind(&mut backend, Kernel::SdfGradient).unwrap();
    let result = stage.fields(&[id]);
    assert!(matches!(
        result,
        Err(EngineError::LayoutMismatch {
            expected: 2,
            actual: 1,
            ..
        })
    ));
}

#[test]
fn test_read_write_hazard_is_rejected() {
    let mut backend = CpuBackend::with_event_log();
    let id = backend.create_field(FieldDesc::scalar("scene", [3, 3, 3])).unwrap();
    let result = run_stage(
        &mut backend,
        Kernel::SdfCombine,
        &clear_uniforms([3, 3, 3]),
        &[id, id],
        [3, 3, 3],
    );
    assert!(matches!(result, Err(EngineError::BindingHazard { .. })));
    assert_eq!(backend.dispatches().count(), 0);
    // The guard still unbound the failed stage
    assert_eq!(backend.events().last(), Some(&StageEvent::Unbind));
}

#[test]
fn test_stage_guard_unbinds_on_drop() {
    let mut backend = CpuBackend::with_event_log();
    {
        let stage = ComputeStage::bind(&mut backend, Kernel::Curl).unwrap();
        assert_eq!(stage.kernel(), Kernel::Curl);
    }
    assert_eq!(
        backend.events(),
        &[StageEvent::Bind(Kernel::Curl), StageEvent::Unbind]
    );
    assert!(backend.bind(Kernel::Divergence).is_ok());
}

#[test]
fn test_unknown_field_rejected() {
    let mut other = CpuBackend::new();
    let foreign = other.create_field(FieldDesc::scalar("a", [1, 1, 1])).unwrap();
    let mut backend = CpuBackend::new();
    let result = run_stage(&mut backend, Kernel::SdfClear, &clear_uniforms([1, 1, 1]), &[foreign], [1, 1, 1]);
    assert!(matches!(result, Err(EngineError::ResourceNotFound { .. })));
}

#[test]
fn test_short_uniform_block_rejected() {
    let mut backend = CpuBackend::new();
    let id = backend.create_field(FieldDesc::scalar("scene", [2, 2, 2])).unwrap();
    let result = run_stage(&mut backend, Kernel::SdfClear, &[0u32; 4], &[id], [2, 2, 2]);
    assert!(matches!(result, Err(EngineError::SizeMismatch { .. })));
}

#[test]
fn test_kernel_registry_is_consistent() {
    for kernel in Kernel::ALL {
        let layout = kernel.layout();
        assert!(!layout.is_empty());
        assert!(layout.iter().any(|access| access.writes()), "{:?}", kernel);
        assert!(kernel.wgsl_source().contains(kernel.entry_point()), "{:?}", kernel);
        let source = wgpu_backend::kernel_module_source(kernel);
        assert!(source.starts_with(COMMON_WGSL));
        assert_eq!(source.contains("fn sim_n"), kernel.uses_fluid_prelude());
    }
    assert_eq!(Kernel::max_storage_bindings(), 9);
}
