use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    /// A session is running with a different filter or record mode.
    #[error("tracing already enabled with a different configuration")]
    AlreadyEnabled,

    #[error("invalid category filter {0:?}")]
    InvalidFilter(String),

    /// The flush sink failed; buffered events are kept for a retry.
    #[error("flush aborted by sink error")]
    BufferExhausted(#[source] std::io::Error),
}
