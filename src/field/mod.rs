/// Grid Field Storage
///
/// Layout rules shared by every 3D field in the engine, plus the
/// double/triple buffering used by the solver. Fields are flat arrays with
/// x fastest, then y, then z.

pub mod grid;
pub mod ping_pong;

pub use grid::{
    cell_count, linear_index, sample_wrapped, trilinear, trilinear_vec3, trilinear_with,
    with_ghost_layer, StaggeredDims,
};
pub use ping_pong::{DensityRing, PingPong};

/// Components stored per sample of a scalar field
pub const SCALAR_COMPONENTS: u32 = 1;

/// Components stored per sample of a vector field (xyz + padding)
pub const VECTOR_COMPONENTS: u32 = 4;
