//! Engine configuration
//!
//! Loaded from TOML; every field falls back to the demo's defaults when
//! missing, so an empty file is a valid configuration.

use std::path::Path;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::collision::CollisionParams;
use crate::error::{EngineError, EngineResult};
use crate::fluid::{FluidParams, NOISE_DIMENSION};
use crate::fractal::{FractalNoiseParams, GradientNoise};
use crate::terrain::DisplacementDims;
use crate::volume::{VolumeParams, DETAIL_DIMENSION};

/// Scale followed by translation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub scale: Vec3,
    pub translation: Vec3,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            scale: Vec3::splat(16.0),
            translation: Vec3::splat(-8.0),
        }
    }
}

impl TransformConfig {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation) * Mat4::from_scale(self.scale)
    }
}

/// Placement of the terrain's sub-SDF in the scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainObjectConfig {
    /// Local-to-world distance factor
    pub uniform_scale: f32,
    pub transform: TransformConfig,
}

impl Default for TerrainObjectConfig {
    fn default() -> Self {
        Self {
            uniform_scale: 16.0,
            transform: TransformConfig {
                scale: Vec3::splat(16.0),
                translation: Vec3::new(-8.0, -12.0, -8.0),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Logical fluid extent, without ghost cells
    pub simulation_dims: [u32; 3],
    /// Scene SDF extent, without ghost cells
    pub sdf_dims: [u32; 3],
    /// Edge lengths of the tiling noise volume
    pub noise_dims: [u32; 3],
    /// Edge lengths of the Worley detail field
    pub detail_dims: [u32; 3],
    /// Permutation shuffle seed; the identity table when absent
    pub seed: Option<u64>,
    pub displacement: DisplacementDims,
    /// Lattice-to-world transform of the fluid and scene SDF
    pub simulation: TransformConfig,
    pub terrain_object: TerrainObjectConfig,
    pub fractal: FractalNoiseParams,
    pub fluid: FluidParams,
    pub collision: CollisionParams,
    pub volume: VolumeParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            simulation_dims: [64; 3],
            sdf_dims: [64; 3],
            noise_dims: [NOISE_DIMENSION; 3],
            detail_dims: [DETAIL_DIMENSION; 3],
            seed: None,
            displacement: DisplacementDims::default(),
            simulation: TransformConfig::default(),
            terrain_object: TerrainObjectConfig::default(),
            fractal: FractalNoiseParams::default(),
            fluid: FluidParams::default(),
            collision: CollisionParams::default(),
            volume: VolumeParams::default(),
        }
    }
}

impl EngineConfig {
    /// Read a TOML file
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| EngineError::IoError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let config = Self::from_toml(&raw)?;
        log::info!("[EngineConfig] Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| EngineError::Config {
            message: e.to_string(),
        })?;
        config.validated()
    }

    pub fn to_toml(&self) -> EngineResult<String> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config {
            message: e.to_string(),
        })
    }

    /// Rejects empty extents and clamps bounded parameters
    pub fn validated(mut self) -> EngineResult<Self> {
        let extents = [
            ("simulation_dims", self.simulation_dims),
            ("sdf_dims", self.sdf_dims),
            ("displacement.height", self.displacement.height),
            ("displacement.sdf", self.displacement.sdf),
            ("noise_dims", self.noise_dims),
            ("detail_dims", self.detail_dims),
        ];
        for (name, dims) in extents {
            if dims.contains(&0) {
                return Err(EngineError::Config {
                    message: format!("{} must be non-zero on every axis, got {:?}", name, dims),
                });
            }
        }
        if self.simulation.matrix().determinant().abs() <= f32::EPSILON {
            return Err(EngineError::Config {
                message: "simulation transform is not invertible".to_string(),
            });
        }
        self.fractal = self.fractal.clamped();
        self.volume = self.volume.clamped();
        Ok(self)
    }

    pub fn gradient_noise(&self) -> GradientNoise {
        match self.seed {
            Some(seed) => GradientNoise::seeded(seed),
            None => GradientNoise::identity(),
        }
    }

    /// Seed of the Worley detail pattern
    pub fn detail_seed(&self) -> u32 {
        self.seed.unwrap_or(0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.simulation_dims, [64, 64, 64]);
        assert_eq!(config.displacement.height, [136, 136, 1]);
        assert_eq!(config.noise_dims, [128, 128, 128]);
        assert!(!config.fluid.diffusion_enabled);
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml(
            "simulation_dims = [16, 16, 16]\nseed = 42\n\n[fractal]\noctaves = 4\n\n[collision]\nsurface_offset = 1.5\n",
        )
        .unwrap();
        assert_eq!(config.simulation_dims, [16, 16, 16]);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.fractal.octaves, 4);
        assert_eq!(config.fractal.frequency, FractalNoiseParams::default().frequency);
        assert_eq!(config.collision.surface_offset, 1.5);
        assert_eq!(config.collision.max_incline_degrees, 75.0);
    }

    #[test]
    fn test_default_transforms() {
        let config = EngineConfig::default();
        let simulation = config.simulation.matrix();
        assert_eq!(simulation.transform_point3(Vec3::ZERO), Vec3::splat(-8.0));
        assert_eq!(simulation.transform_point3(Vec3::ONE), Vec3::splat(8.0));

        let terrain = config.terrain_object.transform.matrix();
        assert_eq!(terrain.transform_point3(Vec3::ZERO), Vec3::new(-8.0, -12.0, -8.0));
        assert_eq!(config.terrain_object.uniform_scale, 16.0);
    }

    #[test]
    fn test_zero_extent_rejected() {
        let result = EngineConfig::from_toml("sdf_dims = [64, 0, 64]");
        assert!(matches!(result, Err(EngineError::Config { .. })));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(EngineConfig::from_toml("simulation_dims = \"big\"").is_err());
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let mut config = EngineConfig::default();
        config.seed = Some(7);
        config.fluid.buoyancy = 2.5;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_toml().unwrap().as_bytes()).unwrap();

        let loaded = EngineConfig::load(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = EngineConfig::load("/nonexistent/engine.toml");
        assert!(matches!(result, Err(EngineError::IoError { .. })));
    }
}
