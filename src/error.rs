use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use thiserror::Error;

/// Reasons a log request could not be turned into a `LogQuery`
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid limit '{value}': {source}")]
    InvalidLimit {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("invalid since '{value}': {source}")]
    InvalidSince {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("unreadable request body: {0}")]
    UnreadableBody(String),
}

/// Failures that end a log request before any of the body is streamed
#[derive(Error, Debug)]
pub enum LogStreamError {
    #[error("streaming responses are not supported by this transport")]
    TransportUnsupported,

    #[error("could not parse the log request: {0}")]
    Parse(#[from] ParseError),

    #[error("function log request failed: {0}")]
    Query(#[source] anyhow::Error),
}

impl LogStreamError {
    pub fn status(&self) -> StatusCode {
        match self {
            LogStreamError::TransportUnsupported => StatusCode::NOT_FOUND,
            LogStreamError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LogStreamError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client; the detailed cause only goes to the log
    fn public_message(&self) -> &'static str {
        match self {
            LogStreamError::TransportUnsupported => {
                "streaming responses are not supported by this transport"
            }
            LogStreamError::Parse(_) => "could not parse the log request",
            LogStreamError::Query(_) => "function log request failed",
        }
    }
}

impl IntoResponse for LogStreamError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.public_message(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
