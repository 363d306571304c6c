//! Engine-wide error type
//!
//! Every subsystem returns `EngineResult`. Subsystems add their own result
//! alias and a context trait in their `error.rs` so call sites can attach the
//! component name without hand-building variants.

use thiserror::Error;

use crate::compute::Kernel;

/// Engine result type
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("GPU operation '{operation}' failed: {error}")]
    GpuOperationFailed { operation: String, error: String },

    #[error("{resource_type} resource not found: {id}")]
    ResourceNotFound { resource_type: String, id: String },

    #[error("field '{field}' is bound to a read slot and a write slot of {kernel:?}")]
    BindingHazard { kernel: Kernel, field: String },

    #[error("cannot bind {requested:?}: {bound:?} is still bound")]
    StageStillBound { bound: Kernel, requested: Kernel },

    #[error("no compute stage is bound")]
    NoStageBound,

    #[error("{kernel:?} expects {expected} fields, got {actual}")]
    LayoutMismatch {
        kernel: Kernel,
        expected: usize,
        actual: usize,
    },

    #[error("size mismatch for {what}: expected {expected}, got {actual}")]
    SizeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("I/O error at {path}: {error}")]
    IoError { path: String, error: String },

    #[error("{component} error: {error}")]
    SystemError { component: String, error: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}
