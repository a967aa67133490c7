use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crate::config::ConfigError;
use crate::epoch::EpochError;
use crate::models::regressor::ModelError;
use std::io;
use thiserror::Error;

/// Anything that stops the server before it starts serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
    #[error("failed to determine epoch: {source}")]
    Epoch {
        #[from]
        source: EpochError,
    },
    #[error("failed to load model: {source}")]
    Model {
        #[from]
        source: ModelError,
    },
    #[error("server error: {source}")]
    Server {
        #[from]
        source: io::Error,
    },
}

/// A request that could not be answered. Logged and reported as a bare 500.
#[derive(Debug)]
pub struct InternalError {
    pub message: String,
}

impl InternalError {
    pub fn new(message: String) -> InternalError {
        InternalError { message }
    }
}

impl From<ModelError> for InternalError {
    fn from(error: ModelError) -> Self {
        InternalError::new(error.to_string())
    }
}

impl IntoResponse for InternalError {
    fn into_response(self) -> Response {
        log::error!(
            "Error encountered while processing request: {}",
            self.message
        );
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
