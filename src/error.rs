use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Recoverable rejections raised by the room board.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("room {0} is already assigned")]
    DuplicateRoom(String),

    // The board itself treats unknown ids as no-ops; only the HTTP layer raises this.
    #[error("{0} not found")]
    NotFound(&'static str),
}

impl BoardError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateRoom(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        tracing::warn!("request rejected: {}", self);
        (self.status(), self.to_string()).into_response()
    }
}
