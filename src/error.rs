use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::model::FieldError;
use crate::views::View;

/// Outcome of a failed persistence operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),
    #[error("book {0} not found")]
    NotFound(i64),
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<libsql::Error> for StoreError {
    fn from(error: libsql::Error) -> Self {
        StoreError::Storage(error.into())
    }
}

#[derive(Debug)]
pub enum HandlerError {
    NotFound,
    Internal(anyhow::Error),
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use HandlerError::*;
        match self {
            NotFound => write!(f, "NotFound"),
            Internal(e) => write!(f, "Internal: {}", crate::unpack_error(&**e)),
        }
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use HandlerError::*;
        match self {
            Internal(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<StoreError> for HandlerError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(_) => HandlerError::NotFound,
            StoreError::Storage(e) => HandlerError::Internal(e),
            StoreError::Validation(errors) => {
                HandlerError::Internal(anyhow::anyhow!("unhandled validation failure: {:?}", errors))
            }
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            HandlerError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, View::Error.render()).into_response()
            }
        }
    }
}
