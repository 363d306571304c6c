//! Compute backend errors
//!
//! GPU-side failures carry the operation and, where there is one, the
//! field or kernel involved.

use crate::compute::Kernel;
use crate::error::{EngineError, EngineResult};

pub type ComputeResult<T> = EngineResult<T>;

/// Turns a missing adapter, pipeline or buffer into a lookup error
pub trait ComputeErrorContext<T> {
    fn compute_context(self, what: &str) -> ComputeResult<T>;
}

impl<T> ComputeErrorContext<T> for Option<T> {
    fn compute_context(self, what: &str) -> ComputeResult<T> {
        self.ok_or_else(|| EngineError::ResourceNotFound {
            resource_type: "gpu".to_string(),
            id: what.to_string(),
        })
    }
}

pub fn gpu_operation_error(operation: &str, error: impl std::fmt::Display) -> EngineError {
    EngineError::GpuOperationFailed {
        operation: operation.to_string(),
        error: error.to_string(),
    }
}

/// Shader or pipeline validation failed while building `kernel`
pub fn pipeline_error(kernel: Kernel, error: impl std::fmt::Display) -> EngineError {
    gpu_operation_error(&format!("create pipeline '{}'", kernel.label()), error)
}

/// Mapping the staging copy of `field` failed
pub fn readback_error(field: &str, error: impl std::fmt::Display) -> EngineError {
    gpu_operation_error(&format!("read back '{}'", field), error)
}
