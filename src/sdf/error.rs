//! Scene SDF errors
//!
//! Readback failures surface as GPU operation errors naming the field,
//! missing scene objects as resource lookups.

use glam::Mat4;

use crate::error::{EngineError, EngineResult};

pub type SdfResult<T> = EngineResult<T>;

/// Attaches the SDF operation that failed
pub trait SdfErrorContext<T> {
    fn sdf_context(self, operation: &str) -> SdfResult<T>;
}

impl<T> SdfErrorContext<T> for Option<T> {
    fn sdf_context(self, operation: &str) -> SdfResult<T> {
        self.ok_or_else(|| EngineError::ResourceNotFound {
            resource_type: "scene object".to_string(),
            id: operation.to_string(),
        })
    }
}

impl<T> SdfErrorContext<T> for EngineResult<T> {
    fn sdf_context(self, operation: &str) -> SdfResult<T> {
        self.map_err(|e| match e {
            EngineError::GpuOperationFailed { error, .. } => EngineError::GpuOperationFailed {
                operation: operation.to_string(),
                error,
            },
            other => EngineError::SystemError {
                component: "sdf".to_string(),
                error: format!("{}: {}", operation, other),
            },
        })
    }
}

/// Rejects transforms that cannot map world positions back into a lattice
pub fn ensure_invertible(what: &str, transform: &Mat4) -> SdfResult<()> {
    if transform.determinant().abs() <= f32::EPSILON {
        return Err(EngineError::Config {
            message: format!("{} is not invertible: {:?}", what, transform),
        });
    }
    Ok(())
}

/// Readback length check against the lattice size
pub fn ensure_len(what: &str, expected: usize, actual: usize) -> SdfResult<()> {
    if expected != actual {
        return Err(EngineError::SizeMismatch {
            what: what.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}
