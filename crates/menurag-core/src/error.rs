use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Degenerate chunking configuration. Fatal for an index build.
    #[error("Chunking error: {0}")]
    Chunking(String),

    /// Persisted index artifact is incomplete or corrupt. Fatal; the artifact
    /// is never rebuilt behind the caller's back.
    #[error("Index load error: {0}")]
    IndexLoad(String),

    /// An embedding or generation call failed, timed out or returned
    /// content that could not be used. Recoverable at call scope.
    #[error("Service call failed: {0}")]
    ServiceCall(String),

    /// Writing or querying the vector store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the pipeline may swallow this error at the scope of a single
    /// service call.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::ServiceCall(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
