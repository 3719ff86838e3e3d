//! Class API endpoints.

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::{body, error, respond, success, ApiResult};
use crate::models::{
    BulkAdjustRequest, BulkAdjustResponse, ClassHistoryResponse, ClassRecord,
    ClassStudentsResponse, CreateClassRequest,
};
use crate::AppState;

/// GET /api/classes - List every class with its full record.
pub async fn list_classes(
    State(state): State<AppState>,
) -> ApiResult<BTreeMap<String, ClassRecord>> {
    let revision_id = state.repo.revision().await;
    success(state.repo.list_classes().await, revision_id)
}

/// POST /api/classes - Create a new class.
pub async fn create_class(
    State(state): State<AppState>,
    payload: Result<Json<CreateClassRequest>, JsonRejection>,
) -> ApiResult<ClassRecord> {
    let revision_id = state.repo.revision().await;

    let request = match body(payload) {
        Ok(request) => request,
        Err(e) => return error(e, revision_id),
    };

    respond(state.repo.create_class(&request).await, revision_id)
}

/// DELETE /api/classes/{className} - Delete a class and its students.
pub async fn delete_class(
    State(state): State<AppState>,
    Path(class_name): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.revision().await;
    respond(state.repo.delete_class(&class_name).await, revision_id)
}

/// GET /api/classes/{className}/students - Name and points for each student.
pub async fn list_students(
    State(state): State<AppState>,
    Path(class_name): Path<String>,
) -> ApiResult<ClassStudentsResponse> {
    let revision_id = state.repo.revision().await;

    match state.repo.class_students(&class_name).await {
        Ok(students) => success(students, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/classes/{className}/history - Archived weekly totals.
pub async fn class_history(
    State(state): State<AppState>,
    Path(class_name): Path<String>,
) -> ApiResult<ClassHistoryResponse> {
    let revision_id = state.repo.revision().await;

    match state.repo.class_history(&class_name).await {
        Ok(history) => success(history, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/classes/{className}/reset-week - Zero every student's points.
pub async fn reset_week(
    State(state): State<AppState>,
    Path(class_name): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.revision().await;
    respond(state.repo.reset_week(&class_name).await, revision_id)
}

/// POST /api/classes/{className}/all-points - Add +1 or -1 to everyone.
pub async fn adjust_all_points(
    State(state): State<AppState>,
    Path(class_name): Path<String>,
    payload: Result<Json<BulkAdjustRequest>, JsonRejection>,
) -> ApiResult<BulkAdjustResponse> {
    let revision_id = state.repo.revision().await;

    let request = match body(payload) {
        Ok(request) => request,
        Err(e) => return error(e, revision_id),
    };

    respond(
        state.repo.adjust_all(&class_name, request.change).await,
        revision_id,
    )
}
