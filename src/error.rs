//! Error types for the SLO proxy

use std::fmt;

/// Result type alias for proxy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the SLO proxy
#[derive(Debug)]
pub enum Error {
    /// IO errors
    Io(std::io::Error),
    /// Configuration errors (override document, CLI values, telemetry setup)
    Config(String),
    /// Request does not have the shape the proxy serves
    InvalidRequest(String),
    /// Snappy or protobuf decoding failed
    Decode(String),
    /// Snappy or protobuf encoding failed
    Encode(String),
    /// Backend transport or protocol failure
    Backend(String),
    /// Backend answered with a non-2xx status
    BackendStatus { status: u16, body: String },
    /// Backend did not answer within the configured timeout
    Timeout,
    /// Internal error
    Internal(String),
}

impl Error {
    /// Whether the error originated in the remote-read backend.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Error::Backend(_) | Error::BackendStatus { .. } | Error::Timeout
        )
    }

    /// Short class name used as a metric attribute.
    pub fn class(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Config(_) => "config",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Decode(_) => "decode",
            Error::Encode(_) => "encode",
            Error::Backend(_) => "backend",
            Error::BackendStatus { .. } => "backend_status",
            Error::Timeout => "timeout",
            Error::Internal(_) => "internal",
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::InvalidRequest(msg) => write!(f, "{}", msg),
            Error::Decode(msg) => write!(f, "Decode error: {}", msg),
            Error::Encode(msg) => write!(f, "Encode error: {}", msg),
            Error::Backend(msg) => write!(f, "Backend error: {}", msg),
            Error::BackendStatus { status, body } => {
                write!(f, "server returned HTTP status {}: {}", status, body)
            }
            Error::Timeout => write!(f, "Backend request timed out"),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<prost::DecodeError> for Error {
    fn from(e: prost::DecodeError) -> Self {
        Error::Decode(e.to_string())
    }
}

impl From<prost::EncodeError> for Error {
    fn from(e: prost::EncodeError) -> Self {
        Error::Encode(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout
        } else {
            Error::Backend(e.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::Config(format!("invalid URL: {}", e))
    }
}
