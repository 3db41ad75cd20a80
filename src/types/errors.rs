use std::fmt;

// === StoreError ===

/// Errors raised by the remote store client.
#[derive(Debug)]
pub enum StoreError {
    /// The HTTP request itself failed (connection, TLS, timeout).
    Network(String),
    /// The backend answered with a non-success status.
    Api(String),
    /// The response body could not be decoded into the expected shape.
    Decode(String),
    /// The operation requires an authenticated session and none is active.
    NotAuthenticated,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Network(msg) => write!(f, "Store network error: {}", msg),
            StoreError::Api(msg) => write!(f, "Store API error: {}", msg),
            StoreError::Decode(msg) => write!(f, "Store decode error: {}", msg),
            StoreError::NotAuthenticated => write!(f, "Not authenticated with the store"),
        }
    }
}

impl std::error::Error for StoreError {}

// === MutationError ===

/// Outcome classification for a failed bookmark mutation.
///
/// `PolicyBlocked` means the call completed but affected zero rows: the
/// backend's row-level authorization rejected the write. It is surfaced
/// separately from `TransportFailed` because it points at configuration
/// rather than the network and should not be retried automatically.
#[derive(Debug)]
pub enum MutationError {
    /// Rejected locally before any remote call was made.
    ValidationRejected(String),
    /// The remote call errored.
    TransportFailed(String),
    /// The remote call succeeded but affected zero rows.
    PolicyBlocked,
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationError::ValidationRejected(msg) => {
                write!(f, "Mutation rejected: {}", msg)
            }
            MutationError::TransportFailed(msg) => {
                write!(f, "Mutation transport failure: {}", msg)
            }
            MutationError::PolicyBlocked => {
                write!(f, "Mutation blocked by authorization policy")
            }
        }
    }
}

impl std::error::Error for MutationError {}

impl From<StoreError> for MutationError {
    fn from(err: StoreError) -> Self {
        MutationError::TransportFailed(err.to_string())
    }
}
