//! HTTP client for the mutation and read endpoints.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::{ErrorDetails, ErrorKind};
use crate::models::{
    BulkAdjustResponse, ClassHistoryResponse, ClassRecord, ClassStudentsResponse,
    DeleteStudentResponse, PointsResponse, Student, StudentUpdates, UpdatePointsRequest,
};

/// Requests are reported failed after this long.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client-side failure. Connectivity problems are kept apart from rejections.
#[derive(Debug)]
pub enum ClientError {
    /// Server unreachable or the request timed out
    Unavailable(String),
    /// Server answered with an error envelope
    Rejected {
        status: u16,
        code: String,
        message: String,
    },
    /// Server answered with something that is not an envelope
    Protocol(String),
}

impl ClientError {
    /// Failure class as the UI reports it. A response that is not an envelope
    /// means no usable server is on the other end.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Unavailable(_) | ClientError::Protocol(_) => ErrorKind::Unavailable,
            ClientError::Rejected { code, .. } => ErrorKind::from_code(code),
        }
    }

    /// True for connectivity loss, false for an operation-level failure.
    pub fn is_connectivity(&self) -> bool {
        self.kind() == ErrorKind::Unavailable
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Rejected { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Unavailable(msg) => write!(f, "server unavailable: {}", msg),
            ClientError::Rejected {
                status,
                code,
                message,
            } => write!(f, "{} ({}): {}", code, status, message),
            ClientError::Protocol(msg) => write!(f, "unexpected response: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            ClientError::Unavailable(err.to_string())
        } else {
            ClientError::Protocol(err.to_string())
        }
    }
}

/// Accepted response data with the revision the server reported.
#[derive(Debug, Clone)]
pub struct Accepted<T> {
    pub data: T,
    pub revision: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    error: Option<ErrorDetails>,
    #[serde(default)]
    revision_id: i64,
}

/// REST client bound to one server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Protocol(format!("invalid base URL: {}", e)))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    /// `<base>/api/<segments...>` with each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Protocol("base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<serde_json::Value>,
    ) -> Result<Accepted<T>, ClientError> {
        let mut request = self.http.request(method, self.url(segments)?);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| ClientError::Protocol(e.to_string()))?;

        if !envelope.success {
            let details = envelope.error.unwrap_or(ErrorDetails {
                code: "UNKNOWN".to_string(),
                message: "request failed".to_string(),
                details: None,
            });
            return Err(ClientError::Rejected {
                status,
                code: details.code,
                message: details.message,
            });
        }

        let data = serde_json::from_value(envelope.data)
            .map_err(|e| ClientError::Protocol(e.to_string()))?;
        Ok(Accepted {
            data,
            revision: envelope.revision_id,
        })
    }

    // ==================== READS ====================

    pub async fn list_classes(&self) -> Result<Accepted<BTreeMap<String, ClassRecord>>, ClientError> {
        self.call(Method::GET, &["classes"], None).await
    }

    pub async fn list_students(
        &self,
        class_name: &str,
    ) -> Result<Accepted<ClassStudentsResponse>, ClientError> {
        self.call(Method::GET, &["classes", class_name, "students"], None)
            .await
    }

    pub async fn class_history(
        &self,
        class_name: &str,
    ) -> Result<Accepted<ClassHistoryResponse>, ClientError> {
        self.call(Method::GET, &["classes", class_name, "history"], None)
            .await
    }

    // ==================== WRITES ====================

    pub async fn create_class(&self, class_name: &str) -> Result<Accepted<ClassRecord>, ClientError> {
        self.call(
            Method::POST,
            &["classes"],
            Some(json!({ "className": class_name })),
        )
        .await
    }

    pub async fn delete_class(&self, class_name: &str) -> Result<Accepted<()>, ClientError> {
        self.call(Method::DELETE, &["classes", class_name], None).await
    }

    pub async fn add_student(
        &self,
        class_name: &str,
        name: &str,
        avatar: Option<&str>,
    ) -> Result<Accepted<Student>, ClientError> {
        let student = json!({
            "name": name,
            "avatar": avatar,
            "hasCustomAvatar": avatar.is_some(),
        });
        self.call(
            Method::POST,
            &["classes", class_name, "students"],
            Some(json!({ "student": student })),
        )
        .await
    }

    pub async fn delete_student(
        &self,
        class_name: &str,
        student_id: &str,
    ) -> Result<Accepted<DeleteStudentResponse>, ClientError> {
        self.call(
            Method::DELETE,
            &["classes", class_name, "students", student_id],
            None,
        )
        .await
    }

    pub async fn set_points(
        &self,
        class_name: &str,
        student_id: &str,
        points: i64,
    ) -> Result<Accepted<PointsResponse>, ClientError> {
        self.update_points(
            class_name,
            student_id,
            UpdatePointsRequest {
                points: Some(points),
                change: None,
            },
        )
        .await
    }

    pub async fn adjust_points(
        &self,
        class_name: &str,
        student_id: &str,
        change: i64,
    ) -> Result<Accepted<PointsResponse>, ClientError> {
        self.update_points(
            class_name,
            student_id,
            UpdatePointsRequest {
                points: None,
                change: Some(change),
            },
        )
        .await
    }

    async fn update_points(
        &self,
        class_name: &str,
        student_id: &str,
        request: UpdatePointsRequest,
    ) -> Result<Accepted<PointsResponse>, ClientError> {
        self.call(
            Method::PUT,
            &["classes", class_name, "students", student_id, "points"],
            Some(to_value(&request)?),
        )
        .await
    }

    pub async fn update_student(
        &self,
        class_name: &str,
        student_id: &str,
        updates: &StudentUpdates,
    ) -> Result<Accepted<Student>, ClientError> {
        self.call(
            Method::PUT,
            &["classes", class_name, "students", student_id],
            Some(to_value(updates)?),
        )
        .await
    }

    pub async fn reset_week(&self, class_name: &str) -> Result<Accepted<()>, ClientError> {
        self.call(Method::POST, &["classes", class_name, "reset-week"], None)
            .await
    }

    pub async fn adjust_all(
        &self,
        class_name: &str,
        change: i64,
    ) -> Result<Accepted<BulkAdjustResponse>, ClientError> {
        self.call(
            Method::POST,
            &["classes", class_name, "all-points"],
            Some(json!({ "change": change })),
        )
        .await
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<serde_json::Value, ClientError> {
    serde_json::to_value(value).map_err(|e| ClientError::Protocol(e.to_string()))
}
