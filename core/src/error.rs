//! Error types for request assembly and execution.
//!
//! # Design
//! Errors are layered the way a request flows: body encoding fails with
//! `EncodingError`, which assembly wraps in `RequestBuildError`; execution
//! surfaces build failures, opaque transport failures, status failures and
//! body read/decode failures through `ApiError`. Nothing is retried or
//! recovered locally.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The payload could not be turned into a request body.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// A structured JSON value failed to marshal when it was set.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A multipart file source could not be opened.
    #[error("failed to open multipart file {}: {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Copying a multipart source into the body failed.
    #[error("failed to read multipart part {key:?}: {source}")]
    ReadPart {
        key: String,
        #[source]
        source: io::Error,
    },

    /// A reader-backed multipart part was already consumed by an earlier
    /// assembly.
    #[error("multipart part {0:?} has already been consumed")]
    SourceConsumed(String),
}

/// The builder state could not be turned into a request.
#[derive(Debug, Error)]
pub enum RequestBuildError {
    #[error("failed to encode request body: {0}")]
    Encoding(#[from] EncodingError),

    #[error("invalid endpoint {endpoint:?}: {source}")]
    InvalidUrl {
        endpoint: String,
        #[source]
        source: InvalidEndpoint,
    },
}

/// Why an endpoint was rejected.
#[derive(Debug, Error)]
pub enum InvalidEndpoint {
    /// Not an absolute URL.
    #[error(transparent)]
    Parse(#[from] url::ParseError),

    /// Not acceptable as an HTTP request URI, e.g. it contains unencoded
    /// spaces.
    #[error(transparent)]
    Uri(#[from] ::http::uri::InvalidUri),
}

/// Opaque failure reported by the transport.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct TransportError(Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }

    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync> {
        self.0
    }
}

/// Errors returned by the terminal execution calls.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Build(#[from] RequestBuildError),

    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a status code of 400 or above.
    #[error("HTTP {status}: {}", String::from_utf8_lossy(.body))]
    Status { status: u16, body: Vec<u8> },

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    ReadBody(#[source] io::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Status code carried by a `Status` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
