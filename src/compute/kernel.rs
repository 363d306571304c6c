/// Compute kernel registry
///
/// Every compute program the engine runs, with its binding layout. Slot
/// `n` of a layout is WGSL binding `n + 1`; binding 0 is always the
/// kernel's uniform block.

/// How a kernel touches one bound field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl Access {
    pub fn writes(self) -> bool {
        !matches!(self, Access::Read)
    }
}

use Access::{Read as R, ReadWrite as RW, Write as W};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    // Fluid solver
    AdvectVelocity,
    Bounds,
    Curl,
    Vorticity,
    Divergence,
    Jacobi,
    Gradient,
    AdvectDensity,
    Diffuse,
    // Procedural generation
    NoiseVolume,
    TerrainHeight,
    TerrainSdf,
    // Scene SDF
    SdfClear,
    SdfCombine,
    SdfGradient,
}

impl Kernel {
    pub const ALL: [Kernel; 15] = [
        Kernel::AdvectVelocity,
        Kernel::Bounds,
        Kernel::Curl,
        Kernel::Vorticity,
        Kernel::Divergence,
        Kernel::Jacobi,
        Kernel::Gradient,
        Kernel::AdvectDensity,
        Kernel::Diffuse,
        Kernel::NoiseVolume,
        Kernel::TerrainHeight,
        Kernel::TerrainSdf,
        Kernel::SdfClear,
        Kernel::SdfCombine,
        Kernel::SdfGradient,
    ];

    /// Field slots in binding order
    pub fn layout(self) -> &'static [Access] {
        match self {
            // vel x/y/z, density, sdf, noise -> vel x/y/z
            Kernel::AdvectVelocity => &[R, R, R, R, R, R, W, W, W],
            // vel x/y/z in place, sdf
            Kernel::Bounds => &[RW, RW, RW, R],
            // vel x/y/z -> curl
            Kernel::Curl => &[R, R, R, W],
            // vel x/y/z, curl -> vel x/y/z
            Kernel::Vorticity => &[R, R, R, R, W, W, W],
            // vel x/y/z -> divergence
            Kernel::Divergence => &[R, R, R, W],
            // pressure, divergence, sdf -> pressure
            Kernel::Jacobi => &[R, R, R, W],
            // pressure, vel x/y/z, sdf -> vel x/y/z
            Kernel::Gradient => &[R, R, R, R, R, W, W, W],
            // vel x/y/z, density, sdf, surface height, noise -> density
            Kernel::AdvectDensity => &[R, R, R, R, R, R, R, W],
            // initial density, current iterate -> next iterate
            Kernel::Diffuse => &[R, R, W],
            // permutation table -> noise volume
            Kernel::NoiseVolume => &[R, W],
            // permutation table -> height, normal
            Kernel::TerrainHeight => &[R, W, W],
            // height -> terrain sdf
            Kernel::TerrainSdf => &[R, W],
            Kernel::SdfClear => &[W],
            // object sdf, scene sdf (min-union in place)
            Kernel::SdfCombine => &[R, RW],
            // scene sdf -> gradient
            Kernel::SdfGradient => &[R, W],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Kernel::AdvectVelocity => "Fluid Velocity Advection",
            Kernel::Bounds => "Fluid Boundary",
            Kernel::Curl => "Fluid Curl",
            Kernel::Vorticity => "Fluid Vorticity Confinement",
            Kernel::Divergence => "Fluid Divergence",
            Kernel::Jacobi => "Pressure Jacobi",
            Kernel::Gradient => "Pressure Gradient",
            Kernel::AdvectDensity => "Fluid Density Advection",
            Kernel::Diffuse => "Fluid Density Diffusion",
            Kernel::NoiseVolume => "Noise Volume",
            Kernel::TerrainHeight => "Terrain Displacement",
            Kernel::TerrainSdf => "Terrain SDF",
            Kernel::SdfClear => "Scene SDF Clear",
            Kernel::SdfCombine => "Scene SDF Combine",
            Kernel::SdfGradient => "Scene SDF Gradient",
        }
    }

    pub fn entry_point(self) -> &'static str {
        match self {
            Kernel::AdvectVelocity => "advect_velocity_main",
            Kernel::Bounds => "bounds_main",
            Kernel::Curl => "curl_main",
            Kernel::Vorticity => "vorticity_main",
            Kernel::Divergence => "divergence_main",
            Kernel::Jacobi => "jacobi_main",
            Kernel::Gradient => "gradient_main",
            Kernel::AdvectDensity => "advect_density_main",
            Kernel::Diffuse => "diffuse_main",
            Kernel::NoiseVolume => "noise_volume_main",
            Kernel::TerrainHeight => "terrain_height_main",
            Kernel::TerrainSdf => "terrain_sdf_main",
            Kernel::SdfClear => "sdf_clear_main",
            Kernel::SdfCombine => "sdf_combine_main",
            Kernel::SdfGradient => "sdf_gradient_main",
        }
    }

    /// WGSL body, appended to the shared prelude when the module is built
    pub fn wgsl_source(self) -> &'static str {
        match self {
            Kernel::AdvectVelocity => include_str!("../fluid/shaders/advect_velocity.wgsl"),
            Kernel::Bounds => include_str!("../fluid/shaders/bounds.wgsl"),
            Kernel::Curl => include_str!("../fluid/shaders/curl.wgsl"),
            Kernel::Vorticity => include_str!("../fluid/shaders/vorticity.wgsl"),
            Kernel::Divergence => include_str!("../fluid/shaders/divergence.wgsl"),
            Kernel::Jacobi => include_str!("../fluid/shaders/pressure_jacobi.wgsl"),
            Kernel::Gradient => include_str!("../fluid/shaders/pressure_gradient.wgsl"),
            Kernel::AdvectDensity => include_str!("../fluid/shaders/advect_density.wgsl"),
            Kernel::Diffuse => include_str!("../fluid/shaders/diffuse.wgsl"),
            Kernel::NoiseVolume => include_str!("../fractal/shaders/noise_volume.wgsl"),
            Kernel::TerrainHeight => include_str!("../terrain/shaders/terrain_height.wgsl"),
            Kernel::TerrainSdf => include_str!("../terrain/shaders/terrain_sdf.wgsl"),
            Kernel::SdfClear => include_str!("../sdf/shaders/sdf_clear.wgsl"),
            Kernel::SdfCombine => include_str!("../sdf/shaders/sdf_combine.wgsl"),
            Kernel::SdfGradient => include_str!("../sdf/shaders/sdf_gradient.wgsl"),
        }
    }

    /// Whether the kernel needs the gradient-noise helpers in its prelude
    pub fn uses_gradient_noise(self) -> bool {
        matches!(self, Kernel::NoiseVolume | Kernel::TerrainHeight)
    }

    /// Whether the kernel is a fluid solver stage
    pub fn uses_fluid_prelude(self) -> bool {
        matches!(
            self,
            Kernel::AdvectVelocity
                | Kernel::Bounds
                | Kernel::Curl
                | Kernel::Vorticity
                | Kernel::Divergence
                | Kernel::Jacobi
                | Kernel::Gradient
                | Kernel::AdvectDensity
                | Kernel::Diffuse
        )
    }

    /// Largest number of storage bindings any kernel needs
    pub fn max_storage_bindings() -> u32 {
        Kernel::ALL
            .iter()
            .map(|kernel| kernel.layout().len() as u32)
            .max()
            .unwrap_or(0)
    }
}
