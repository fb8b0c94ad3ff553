//! Maps the shared [`terraflex_core::Error`] vocabulary onto HTTP
//! status codes and response bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use terraflex_core::Error;

/// The `409` body shape clients of the wire protocol expect: a message
/// plus the lock ID the caller attempted to use.
#[derive(Debug, Serialize)]
pub struct ConflictBody {
    pub detail: String,
    #[serde(rename = "ID")]
    pub id: String,
}

/// A generic error body for anything that isn't a lock conflict.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            Error::NotFound(detail) => (StatusCode::NOT_FOUND, Json(ErrorBody { detail })).into_response(),
            Error::LockConflict { message, id } => {
                (StatusCode::CONFLICT, Json(ConflictBody { detail: message, id })).into_response()
            }
            Error::UnknownStack(name) => (
                StatusCode::NOT_FOUND,
                Json(ErrorBody {
                    detail: format!("unknown stack: {name}"),
                }),
            )
                .into_response(),
            Error::UnsupportedCapability(detail) => {
                (StatusCode::NOT_IMPLEMENTED, Json(ErrorBody { detail })).into_response()
            }
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    detail: other.to_string(),
                }),
            )
                .into_response(),
        }
    }
}
