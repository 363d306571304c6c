/// Scene Signed Distance Field
///
/// Combines per-object distance fields into one scene SDF under a fixed
/// simulation transform, derives its gradient, and reads both back for
/// CPU-side collision queries.
///
/// Key points:
/// - Distances are negative inside solids
/// - The field is always regenerated as a whole, never patched
/// - A scene without objects reads as empty space everywhere

pub mod error;
pub mod kernels;
pub mod scene_sdf;
pub mod sdf_data;

pub use scene_sdf::SceneSdfGenerator;
pub use sdf_data::{CpuSdf, SceneObject, SceneSdfUniforms};

/// Distance reported everywhere when the scene has no objects
pub const SDF_EMPTY_DISTANCE: f32 = 1.0e6;
