use thiserror::Error;

/// Boxed cause as returned by the transport layer.
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = SftpError> = std::result::Result<T, E>;

/// Tag of an [`SftpError`], for callers that only branch on the failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigurationInvalid,
    SessionError,
    NoFilesFound,
    ListingError,
    TransferError,
}

/// The single failure shape returned by every client operation.
///
/// Remote variants keep the transport error as their `source()` and carry a
/// context message naming the operation and the path involved.
#[derive(Debug, Error)]
pub enum SftpError {
    #[error("invalid connection configuration: {0}")]
    ConfigurationInvalid(String),

    #[error("{context}: unable to open session to {host}")]
    Session {
        context: String,
        host: String,
        #[source]
        source: Cause,
    },

    #[error("{context}: no files found in remote directory {dir}")]
    NoFilesFound { context: String, dir: String },

    #[error("{context}: unable to list remote directory {dir}")]
    Listing {
        context: String,
        dir: String,
        #[source]
        source: Cause,
    },

    #[error("{context}: unable to transfer {path}")]
    Transfer {
        context: String,
        path: String,
        #[source]
        source: Cause,
    },
}

impl SftpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SftpError::ConfigurationInvalid(_) => ErrorKind::ConfigurationInvalid,
            SftpError::Session { .. } => ErrorKind::SessionError,
            SftpError::NoFilesFound { .. } => ErrorKind::NoFilesFound,
            SftpError::Listing { .. } => ErrorKind::ListingError,
            SftpError::Transfer { .. } => ErrorKind::TransferError,
        }
    }

    /// Operation context, or the validation message for configuration errors.
    pub fn context(&self) -> &str {
        match self {
            SftpError::ConfigurationInvalid(msg) => msg,
            SftpError::Session { context, .. }
            | SftpError::NoFilesFound { context, .. }
            | SftpError::Listing { context, .. }
            | SftpError::Transfer { context, .. } => context,
        }
    }
}
