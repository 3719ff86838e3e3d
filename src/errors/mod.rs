//! Error handling module for the classroom points server.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const CLASS_NOT_FOUND: &str = "CLASS_NOT_FOUND";
    pub const STUDENT_NOT_FOUND: &str = "STUDENT_NOT_FOUND";
    pub const CLASS_EXISTS: &str = "CLASS_EXISTS";
    pub const INVALID_INPUT: &str = "INVALID_INPUT";
}

/// Coarse classification every failure falls into, on either side of the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidInput,
    /// Event channel or storage not reachable. Only observed by clients; the
    /// server logs and swallows persistence failures.
    Unavailable,
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Classify a wire error code. Unknown codes count as invalid input.
    pub fn from_code(code: &str) -> Self {
        match code {
            codes::CLASS_NOT_FOUND | codes::STUDENT_NOT_FOUND => ErrorKind::NotFound,
            codes::CLASS_EXISTS => ErrorKind::Conflict,
            _ => ErrorKind::InvalidInput,
        }
    }
}

/// Application error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// No class with the given name
    ClassNotFound(String),
    /// No student with the given id in the class
    StudentNotFound { class_name: String, student_id: String },
    /// A class with the given name already exists
    ClassAlreadyExists(String),
    /// Malformed or out-of-policy payload
    InvalidInput(String),
}

impl AppError {
    /// Get the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ClassNotFound(_) | AppError::StudentNotFound { .. } => ErrorKind::NotFound,
            AppError::ClassAlreadyExists(_) => ErrorKind::Conflict,
            AppError::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::ClassNotFound(_) => codes::CLASS_NOT_FOUND,
            AppError::StudentNotFound { .. } => codes::STUDENT_NOT_FOUND,
            AppError::ClassAlreadyExists(_) => codes::CLASS_EXISTS,
            AppError::InvalidInput(_) => codes::INVALID_INPUT,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::ClassNotFound(name) => format!("Class {} not found", name),
            AppError::StudentNotFound {
                class_name,
                student_id,
            } => format!("Student {} not found in class {}", student_id, class_name),
            AppError::ClassAlreadyExists(name) => format!("Class {} already exists", name),
            AppError::InvalidInput(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
    pub revision_id: i64,
}

impl ErrorResponse {
    pub fn new(error: &AppError, revision_id: i64) -> Self {
        let details = match error {
            AppError::StudentNotFound {
                class_name,
                student_id,
            } => Some(serde_json::json!({ "className": class_name, "studentId": student_id })),
            AppError::ClassNotFound(name) | AppError::ClassAlreadyExists(name) => {
                Some(serde_json::json!({ "className": name }))
            }
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
            revision_id,
        }
    }
}

/// Wrapper type for errors that carry revision_id context.
#[derive(Debug)]
pub struct AppErrorWithRevision {
    pub error: AppError,
    pub revision_id: i64,
}

impl IntoResponse for AppErrorWithRevision {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let body = ErrorResponse::new(&self.error, self.revision_id);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_cover_taxonomy() {
        assert_eq!(
            AppError::ClassNotFound("Bio".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::StudentNotFound {
                class_name: "Bio".into(),
                student_id: "x".into()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::ClassAlreadyExists("Bio".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AppError::InvalidInput("bad".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            AppError::InvalidInput("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::ClassAlreadyExists("Bio".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_kind_from_wire_code() {
        for error in [
            AppError::ClassNotFound("Bio".into()),
            AppError::ClassAlreadyExists("Bio".into()),
            AppError::InvalidInput("bad".into()),
        ] {
            assert_eq!(ErrorKind::from_code(error.error_code()), error.kind());
        }
        assert_eq!(ErrorKind::from_code("SOMETHING_NEW"), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = ErrorResponse::new(&AppError::ClassAlreadyExists("Bio 101".into()), 4);
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "CLASS_EXISTS");
        assert_eq!(value["error"]["details"]["className"], "Bio 101");
        assert_eq!(value["revisionId"], 4);
    }
}
