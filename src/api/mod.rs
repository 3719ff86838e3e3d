//! REST API module.
//!
//! Every mutation handler follows the same pipeline: validate, apply to the
//! store, schedule a save, broadcast, respond. The repository does the middle
//! three under one lock; handlers only shape the response envelope.

mod classes;
mod health;
mod students;

pub use classes::*;
pub use health::*;
pub use students::*;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::store::Applied;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::errors::AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, revision_id: i64) -> ApiResult<T> {
    Err(crate::errors::AppErrorWithRevision {
        error: err,
        revision_id,
    })
}

/// Turn a repository outcome into a response envelope.
pub fn respond<T: Serialize>(result: Result<Applied<T>, AppError>, revision_id: i64) -> ApiResult<T> {
    match result {
        Ok(applied) => success(applied.data, applied.revision),
        Err(e) => error(e, revision_id),
    }
}

/// Unwrap a JSON body, reporting framework rejections as invalid input.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(value)| value).map_err(AppError::from)
}
