use serde::{Deserialize, Serialize};

/// Lower bound of both coefficients
pub const MIN_COEFFICIENT: f32 = 0.05;
/// Upper bound of both coefficients
pub const MAX_COEFFICIENT: f32 = 2.0;

/// Light transport coefficients of the cloud volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeParams {
    absorption: f32,
    scatter: f32,
}

impl Default for VolumeParams {
    fn default() -> Self {
        Self {
            absorption: 0.7,
            scatter: MAX_COEFFICIENT,
        }
    }
}

impl VolumeParams {
    pub fn new(absorption: f32, scatter: f32) -> Self {
        let mut params = Self::default();
        params.set_absorption(absorption);
        params.set_scatter(scatter);
        params
    }

    pub fn absorption(&self) -> f32 {
        self.absorption
    }

    pub fn scatter(&self) -> f32 {
        self.scatter
    }

    pub fn set_absorption(&mut self, absorption: f32) {
        self.absorption = absorption.clamp(MIN_COEFFICIENT, MAX_COEFFICIENT);
    }

    pub fn set_scatter(&mut self, scatter: f32) {
        self.scatter = scatter.clamp(MIN_COEFFICIENT, MAX_COEFFICIENT);
    }

    /// Re-apply the bounds, for values that bypassed the setters (deserialization)
    pub fn clamped(self) -> Self {
        Self::new(self.absorption, self.scatter)
    }

    /// Fraction of light surviving `distance` world units of unit density
    pub fn transmittance(&self, density: f32, distance: f32) -> f32 {
        (-(self.absorption + self.scatter) * density.max(0.0) * distance).exp()
    }
}
