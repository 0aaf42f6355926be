use std::path::PathBuf;

use thiserror::Error;

use crate::color::Channel;

/// Failure to turn an image reference into base64 bytes.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read image at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Failure of a single call to the recolor endpoint.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

/// A response body that cannot be shown as an image.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response body is empty")]
    Empty,

    #[error("response body is not a recognized image: {0}")]
    Unrecognized(#[from] image::ImageError),

    #[error("response content type {0:?} is not an image")]
    NotAnImage(String),
}

/// Rejected custom channel text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorInputError {
    #[error("{0} value is empty")]
    Empty(Channel),

    #[error("{0} value {1:?} is not a number")]
    NotANumber(Channel, String),
}
