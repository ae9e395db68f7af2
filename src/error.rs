//! Defines the app level error type and its conversion to JSON responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::expense::{AlreadyProcessed, ValidationErrors};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A request to create an expense did not include a usable
    /// `Idempotency-Key` header.
    ///
    /// The client should resubmit the request with the header set.
    #[error("Idempotency-Key header required")]
    MissingIdempotencyKey,

    /// The fields of an expense failed validation.
    ///
    /// Nothing is written to the database when this error occurs.
    #[error("invalid expense: {0}")]
    Validation(#[from] ValidationErrors),

    /// The idempotency key was inserted by another request between the
    /// existence check and the commit.
    ///
    /// This is not a client error: the request has already been processed
    /// and is reported as such.
    #[error("the idempotency key already exists in the database")]
    DuplicateIdempotencyKey,

    /// The requested resource was not found.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) if desc.ends_with("idempotency_key.key") => Error::DuplicateIdempotencyKey,
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::MissingIdempotencyKey => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Idempotency-Key header required" })),
            )
                .into_response(),
            Error::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            Error::DuplicateIdempotencyKey => AlreadyProcessed.into_response(),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Not found" })),
            )
                .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
