use std::path::PathBuf;

use hyper::StatusCode;

/// Errors that end the plugin server
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unable to listen on {}: {source}", path.display())]
    Listen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Stopped serving on {}: {source}", path.display())]
    Serve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to register signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

/// Errors answered to a single plugin call
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Unable to read request body: {0}")]
    Body(#[from] hyper::Error),
    #[error("Unable to decode JSON payload: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Unable to encode JSON response: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Ipam(#[from] crate::ipam::Error),
    #[error(transparent)]
    Network(#[from] crate::netdriver::Error),
    #[error("No handler for {0}")]
    NotFound(String),
}

impl HandlerError {
    /// Status code the error is answered with
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::Body(_) | HandlerError::Decode(_) => StatusCode::BAD_REQUEST,
            HandlerError::NotFound(_) => StatusCode::NOT_FOUND,
            HandlerError::Encode(_) | HandlerError::Ipam(_) | HandlerError::Network(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
