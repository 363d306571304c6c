/// First-Person Motor
///
/// Plain motor data with free functions, no hidden state. Keyboard flags
/// and a yaw angle produce a proposed position which, with player controls
/// on, is resolved against the scene SDF.

use glam::Vec3;

use super::SdfCollider;

/// Walking speed with player controls, world units per second
pub const PLAYER_SPEED: f32 = 2.5;

/// Free-fly speed, world units per second
pub const FREE_FLY_SPEED: f32 = 8.0;

/// Degrees of rotation per unit of mouse delta
pub const LOOK_SPEED: f32 = 0.2;

/// Camera start position
pub const START_POSITION: Vec3 = Vec3::new(0.0, 5.0, -15.0);

const MAX_PITCH_DEGREES: f32 = 89.0;

/// Direction flags sampled from the keyboard this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorState {
    pub position: Vec3,
    /// Heading in degrees; 0 looks down +z
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
    pub player_controls: bool,
}

impl Default for MotorState {
    fn default() -> Self {
        init_motor(START_POSITION)
    }
}

pub fn init_motor(position: Vec3) -> MotorState {
    MotorState {
        position,
        yaw_degrees: 0.0,
        pitch_degrees: 0.0,
        player_controls: false,
    }
}

pub fn motor_speed(state: &MotorState) -> f32 {
    if state.player_controls {
        PLAYER_SPEED
    } else {
        FREE_FLY_SPEED
    }
}

pub fn set_player_controls(state: &MotorState, enabled: bool) -> MotorState {
    MotorState {
        player_controls: enabled,
        ..*state
    }
}

/// Horizontal heading for a yaw angle
pub fn calculate_forward_vector(yaw_degrees: f32) -> Vec3 {
    let (sin, cos) = yaw_degrees.to_radians().sin_cos();
    Vec3::new(sin, 0.0, cos)
}

pub fn calculate_right_vector(yaw_degrees: f32) -> Vec3 {
    let (sin, cos) = yaw_degrees.to_radians().sin_cos();
    Vec3::new(cos, 0.0, -sin)
}

/// Displacement for one frame; opposite flags cancel
pub fn movement_delta(yaw_degrees: f32, input: &MoveInput, step: f32) -> Vec3 {
    let forward = calculate_forward_vector(yaw_degrees);
    let right = calculate_right_vector(yaw_degrees);
    let axis = |positive: bool, negative: bool| positive as i32 as f32 - negative as i32 as f32;

    (forward * axis(input.forward, input.backward)
        + right * axis(input.right, input.left)
        + Vec3::Y * axis(input.up, input.down))
        * step
}

pub fn propose_position(state: &MotorState, input: &MoveInput, delta_time: f32) -> Vec3 {
    state.position + movement_delta(state.yaw_degrees, input, delta_time * motor_speed(state))
}

/// Apply a mouse delta; pitch is clamped short of vertical
pub fn rotate(state: &MotorState, mouse_dx: f32, mouse_dy: f32) -> MotorState {
    MotorState {
        yaw_degrees: state.yaw_degrees + mouse_dx * LOOK_SPEED,
        pitch_degrees: (state.pitch_degrees + mouse_dy * LOOK_SPEED)
            .clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES),
        ..*state
    }
}

/// One frame of movement. The collider only applies with player controls on.
pub fn update_motor(
    state: &MotorState,
    input: &MoveInput,
    mouse_delta: (f32, f32),
    delta_time: f32,
    collider: Option<&SdfCollider>,
) -> MotorState {
    let proposed = propose_position(state, input, delta_time);
    let position = match collider {
        Some(collider) if state.player_controls => collider.resolve(state.position, proposed),
        _ => proposed,
    };
    let moved = MotorState {
        position,
        ..*state
    };
    rotate(&moved, mouse_delta.0, mouse_delta.1)
}
