/// Collision and Locomotion
///
/// CPU-side queries against the downloaded scene SDF. The mirror is static
/// between regenerations, so queries never touch the GPU.

pub mod collider;
pub mod locomotion;
pub mod sampling;

pub use collider::{CollisionParams, SdfCollider};
pub use locomotion::{MotorState, MoveInput, FREE_FLY_SPEED, LOOK_SPEED, PLAYER_SPEED, START_POSITION};
pub use sampling::{sample_distance, sample_gradient};
