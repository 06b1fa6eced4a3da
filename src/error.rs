//! Error taxonomy for the client core.
//!
//! Every layer owns one enum. Components never let these escape to the user: the
//! views and forms convert them into display messages at the call site.

use thiserror::Error;

/// Failures raised while loading `ClientConfig` from the environment.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in this environment")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// ApiError
///
/// Outcome of a failed call to the remote API. `Status` covers every response the
/// server actually produced (including the optional `message` field of its JSON body),
/// `Transport` covers everything where no response arrived at all.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("server rejected the request with status {status}")]
    Status { status: u16, message: Option<String> },

    #[error("request could not be completed: {0}")]
    Transport(String),

    #[error("response body could not be decoded: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status of a server rejection, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The `message` the server put in its error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Failures while turning a bearer token into a session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("token could not be decoded: {0}")]
    InvalidToken(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures of the persistent key/value store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
