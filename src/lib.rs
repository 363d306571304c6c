//! Cloud Engine
//!
//! GPU-resident simulation core of an interactive terrain and cloud demo:
//! a staggered-grid smoke solver, a scene signed distance field with CPU
//! readback for camera collision, and fractal-noise terrain displacement.
//! Everything runs through a [`compute::ComputeBackend`], either wgpu or
//! the rayon reference backend.

pub mod collision;
pub mod compute;
pub mod config;
pub mod error;
pub mod field;
pub mod fluid;
pub mod fractal;
pub mod scene;
pub mod sdf;
pub mod terrain;
pub mod volume;

pub use collision::{CollisionParams, MotorState, MoveInput, SdfCollider};
pub use compute::{ComputeBackend, CpuBackend, FieldDesc, FieldId, Kernel, WgpuBackend};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use field::{DensityRing, PingPong, StaggeredDims};
pub use fluid::{FluidParams, FluidSolver};
pub use fractal::{FractalNoiseParams, GradientNoise};
pub use scene::CloudScene;
pub use sdf::{CpuSdf, SceneObject, SceneSdfGenerator, SDF_EMPTY_DISTANCE};
pub use terrain::{DisplacementDims, DisplacementGenerator};
pub use volume::{CloudDetail, VolumeParams};
