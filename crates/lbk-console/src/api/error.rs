//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use lbk_core::errors::{CatalogError, CirculationError, CoreError};

/// Error surface of the request layer. Business-rule violations map to
/// conflict, absent entities to not-found, caller mistakes to bad-request,
/// and persistence faults to a server error.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Core(CoreError),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Core(err)
    }
}

impl From<CirculationError> for ApiError {
    fn from(err: CirculationError) -> Self {
        ApiError::Core(err.into())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Core(err.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Core(CoreError::MissingParameter(_)) => StatusCode::BAD_REQUEST,
            ApiError::Core(CoreError::Circulation(err)) => match err {
                CirculationError::UnknownBook(_) => StatusCode::NOT_FOUND,
                CirculationError::AlreadyBorrowed(_)
                | CirculationError::NotBorrowed(_)
                | CirculationError::DuplicateIdentifier(_) => StatusCode::CONFLICT,
                CirculationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Core(CoreError::Catalog(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Core(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}
