//! Frame graph error types.

use thiserror::Error;

use crate::handle::ResourceHandle;

/// Errors that can occur while building, compiling or executing a frame graph.
#[derive(Error, Debug)]
pub enum FrameGraphError {
    /// The handle is the invalid sentinel or points past the registry.
    #[error("Invalid resource handle {0:?}")]
    InvalidHandle(ResourceHandle),

    /// The handle was minted in an earlier frame.
    #[error("Stale resource handle {handle:?} (graph is at generation {current})")]
    StaleHandle {
        handle: ResourceHandle,
        current: u32,
    },

    /// A typed view was requested with the wrong resource type.
    #[error("Resource `{resource}` holds `{actual}`, requested `{expected}`")]
    TypeMismatch {
        resource: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A pass declared a handle that is not registered in this frame.
    #[error("Pass `{pass}` references undeclared resource {handle:?}")]
    UndeclaredResource {
        pass: String,
        handle: ResourceHandle,
    },

    /// A live pass uses a transient resource whose creating pass was culled.
    #[error("Resource `{resource}` is used but its creating pass `{creator}` was culled")]
    CulledCreator { resource: String, creator: String },

    /// Acquire was requested for a resource that is already materialized.
    #[error("Resource `{0}` acquired twice")]
    DoubleAcquire(String),

    /// Release was requested for a resource that is not materialized.
    #[error("Resource `{0}` released without being acquired")]
    ReleaseWithoutAcquire(String),

    /// A transient resource was touched outside its lifetime interval.
    #[error("Resource `{0}` is not materialized")]
    NotMaterialized(String),

    /// The backing object failed one of its lifecycle operations.
    #[error("Lifecycle operation on resource `{resource}` failed: {source}")]
    Lifecycle {
        resource: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Execute was called before a successful compile.
    #[error("Frame graph must be compiled before execution")]
    NotCompiled,

    /// The frame was already executed and must be reset first.
    #[error("Frame graph was already executed, reset it before reuse")]
    AlreadyExecuted,

    /// Writing the diagnostic report failed.
    #[error("Failed to write frame graph report: {0}")]
    Io(#[from] std::io::Error),
}

pub type FrameGraphResult<T> = Result<T, FrameGraphError>;
