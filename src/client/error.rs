//! Icinga client errors
//!
//! Every variant of the taxonomy carries its message together with a flag
//! telling whether the message is the library default or was built from the
//! request context. Command wrappers use the flag to decide whether to prefix
//! their own context or print the message verbatim.

use thiserror::Error;

/// Default message for connection failures
pub const DEFAULT_CONNECTION_MESSAGE: &str = "Unable to connect to the Icinga server";
/// Default message for rejected credentials
pub const DEFAULT_AUTHENTICATION_MESSAGE: &str = "Authentication failed";
/// Default message for missing objects
pub const DEFAULT_NOT_FOUND_MESSAGE: &str = "Unable to find the object";

/// Errors that can occur when talking to the Icinga API
#[derive(Debug, Error)]
pub enum IcingaError {
    #[error("{message}")]
    Connection {
        message: String,
        custom: bool,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("{message}")]
    Authentication { message: String, custom: bool },

    #[error("{message}")]
    NotFound { message: String, custom: bool },

    #[error("{message}")]
    ServiceFailed { message: String, custom: bool },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Result type for Icinga API operations
pub type IcingaResult<T> = Result<T, IcingaError>;

impl IcingaError {
    /// Connection failure with the default message
    pub fn connection(source: reqwest::Error) -> Self {
        IcingaError::Connection {
            message: DEFAULT_CONNECTION_MESSAGE.to_string(),
            custom: false,
            source: Some(source),
        }
    }

    /// Rejected credentials with the default message
    pub fn authentication() -> Self {
        IcingaError::Authentication {
            message: DEFAULT_AUTHENTICATION_MESSAGE.to_string(),
            custom: false,
        }
    }

    /// Missing object with the default message
    pub fn not_found() -> Self {
        IcingaError::NotFound {
            message: DEFAULT_NOT_FOUND_MESSAGE.to_string(),
            custom: false,
        }
    }

    /// Missing object with a context-specific message
    pub fn not_found_with(message: impl Into<String>) -> Self {
        IcingaError::NotFound {
            message: message.into(),
            custom: true,
        }
    }

    /// Unhealthy service with a context-specific message
    pub fn service_failed_with(message: impl Into<String>) -> Self {
        IcingaError::ServiceFailed {
            message: message.into(),
            custom: true,
        }
    }

    /// Whether the message was built from the request context rather than
    /// being the library default.
    ///
    /// Variants outside the taxonomy always describe their own cause and
    /// count as custom.
    pub fn is_custom(&self) -> bool {
        match self {
            IcingaError::Connection { custom, .. }
            | IcingaError::Authentication { custom, .. }
            | IcingaError::NotFound { custom, .. }
            | IcingaError::ServiceFailed { custom, .. } => *custom,
            IcingaError::InvalidUrl(_)
            | IcingaError::InvalidRequest(_)
            | IcingaError::UnexpectedResponse(_) => true,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, IcingaError::NotFound { .. })
    }

    pub fn is_service_failed(&self) -> bool {
        matches!(self, IcingaError::ServiceFailed { .. })
    }
}

impl From<url::ParseError> for IcingaError {
    fn from(err: url::ParseError) -> Self {
        IcingaError::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for IcingaError {
    fn from(err: serde_json::Error) -> Self {
        IcingaError::UnexpectedResponse(err.to_string())
    }
}
