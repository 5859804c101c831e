use std::fmt;

/// Result type for sessionpulse-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types surfaced to callers of the trackers
#[derive(Debug)]
pub enum Error {
    /// Session id is not among the active sessions
    SessionNotFound(String),

    /// Session id is already being tracked
    SessionAlreadyActive(String),

    /// Operation id is not in flight
    OperationNotFound(String),

    /// Operation id is already in flight
    OperationAlreadyActive(String),

    /// Configuration error
    Config(String),

    /// IO operation failed
    Io(std::io::Error),
}

impl Error {
    /// Unknown-id errors are caller bugs and must not be retried.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::SessionNotFound(_)
                | Error::SessionAlreadyActive(_)
                | Error::OperationNotFound(_)
                | Error::OperationAlreadyActive(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SessionNotFound(id) => write!(f, "Session not found: {}", id),
            Error::SessionAlreadyActive(id) => write!(f, "Session already active: {}", id),
            Error::OperationNotFound(id) => write!(f, "Operation not found: {}", id),
            Error::OperationAlreadyActive(id) => write!(f, "Operation already active: {}", id),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::SessionNotFound(_)
            | Error::SessionAlreadyActive(_)
            | Error::OperationNotFound(_)
            | Error::OperationAlreadyActive(_)
            | Error::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
