use sentinel_core::PolicyRejection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("cannot connect to generation backend: {0}")]
    Connect(String),

    #[error("generation backend timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            BackendError::Connect(err.to_string())
        } else if err.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Http(err)
        }
    }
}

/// Coarse failure class used to pick the diagnostic shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultClass {
    Unreachable,
    Timeout,
    Other,
}

impl FaultClass {
    pub fn as_str(self) -> &'static str {
        match self {
            FaultClass::Unreachable => "unreachable",
            FaultClass::Timeout => "timeout",
            FaultClass::Other => "other",
        }
    }
}

impl BackendError {
    pub fn class(&self) -> FaultClass {
        match self {
            BackendError::Connect(_) => FaultClass::Unreachable,
            BackendError::Timeout => FaultClass::Timeout,
            _ => FaultClass::Other,
        }
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;

/// Why a turn was refused before any backend call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    #[error(transparent)]
    Policy(#[from] PolicyRejection),

    #[error("conversation has no messages")]
    EmptyConversation,
}

impl TurnError {
    pub fn blocked_term(&self) -> Option<&str> {
        match self {
            TurnError::Policy(rejection) => Some(&rejection.term),
            TurnError::EmptyConversation => None,
        }
    }
}
