use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The platform allocator could not provide a scratch buffer.
    #[error("Cannot allocate a scratch buffer of {bytes} bytes")]
    Allocation { bytes: usize },

    /// Array shape or length mismatch.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The caller broke the calling protocol (programming error).
    #[error("Contract violation: {0}")]
    ContractViolation(&'static str),

    /// A native call reported failure.
    #[error("Native call failed: {0}")]
    Native(&'static str),

    /// No backend was configured and the `native` feature is disabled.
    #[error("No native backend available (enable the `native` feature or set one explicitly)")]
    NoBackend,
}

pub type Result<T> = std::result::Result<T, Error>;
