//! Error types for resource cache operations

use thiserror::Error;

/// Resource cache result type
pub type Result<T> = std::result::Result<T, ResourceError>;

/// Resource cache errors
///
/// Every failure in the load pipeline is reported through one of these
/// variants after any partial allocation has been released.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The backing archive could not be opened
    #[error("Failed to open container {path}: {reason}")]
    ContainerOpen { path: String, reason: String },

    /// `open` was called on a container that is already open
    #[error("Container is already open: {0}")]
    ContainerAlreadyOpen(String),

    /// The cache was used before a successful `initialize`
    #[error("Resource cache is not initialized")]
    NotInitialized,

    /// The name is absent from the container (or has no content)
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// No registered loader accepts the name
    #[error("No loader matches resource: {0}")]
    NoLoaderMatched(String),

    /// The budget cannot accommodate the request, even after evicting everything
    #[error("Cannot allocate {requested} bytes (allocated {allocated} of {max_bytes})")]
    AllocationFailure {
        requested: usize,
        allocated: usize,
        max_bytes: usize,
    },

    /// The container advertised a size but the read failed or came up short
    #[error("Failed to read {name} from container: {reason}")]
    ContainerRead { name: String, reason: String },

    /// A decoding loader rejected the raw bytes
    #[error("Loader '{loader}' failed to decode {name}: {reason}")]
    DecodeFailed {
        name: String,
        loader: String,
        reason: String,
    },

    /// A name pattern could not be compiled
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Configuration was rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResourceError {
    pub(crate) fn read_failure(name: &str, reason: impl ToString) -> Self {
        ResourceError::ContainerRead {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<toml::de::Error> for ResourceError {
    fn from(err: toml::de::Error) -> Self {
        ResourceError::InvalidConfig(err.to_string())
    }
}
