use std::time::Duration;

use axum::http::StatusCode;
use envelope_storage::{CodecError, StorageError};
use thiserror::Error;

/// Failure of an RPC call or of server bootstrap.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Encode error: {0}")]
    Encode(#[source] CodecError),

    #[error("Decode error: {0}")]
    Decode(#[source] CodecError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[source] StorageError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Deadline of {}ms exceeded", .0.as_millis())]
    DeadlineExceeded(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => ServiceError::NotFound(what),
            other => ServiceError::Store(other),
        }
    }
}

impl ServiceError {
    /// Stable error code reported to RPC callers.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Encode(_) => "encode_error",
            ServiceError::Decode(_) => "decode_error",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Store(_) => "store_error",
            ServiceError::InvalidArgument(_) => "invalid_argument",
            ServiceError::DeadlineExceeded(_) => "deadline_exceeded",
            ServiceError::Config(_) | ServiceError::Io(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Encode(_) | ServiceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Store(err) if err.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::Decode(_) | ServiceError::Config(_) | ServiceError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
