use crate::http::{ClientError, HttpCodecError};
use crate::synthesis::SynthesisError;
use thiserror::Error;

/// Error types for the mock origin library
#[derive(Error, Debug)]
pub enum OriginError {
    /// Socket errors (bind, accept, read, write)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Request framing errors
    #[error("HTTP error: {0}")]
    Http(HttpCodecError),

    /// Response synthesis errors
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Client-side errors
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<HttpCodecError> for OriginError {
    fn from(err: HttpCodecError) -> Self {
        match err {
            HttpCodecError::Io(e) => OriginError::Io(e),
            other => OriginError::Http(other),
        }
    }
}

/// Result type for the mock origin library
pub type Result<T> = std::result::Result<T, OriginError>;

pub mod common;
pub mod directive;
pub mod http;
pub mod router;
pub mod security;
pub mod synthesis;

// Re-export main types for convenience
pub use crate::common::OriginServerTrait;
pub use crate::directive::Directive;
pub use crate::http::{HttpConfig, MockOriginServer, OriginClient, ParsedRequest};
pub use crate::router::Router;
