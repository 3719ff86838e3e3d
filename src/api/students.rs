//! Student API endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::{body, error, respond, ApiResult};
use crate::models::{
    AddStudentRequest, DeleteStudentResponse, PointsResponse, Student, StudentUpdates,
    UpdatePointsRequest,
};
use crate::AppState;

/// POST /api/classes/{className}/students - Add a student.
pub async fn add_student(
    State(state): State<AppState>,
    Path(class_name): Path<String>,
    payload: Result<Json<AddStudentRequest>, JsonRejection>,
) -> ApiResult<Student> {
    let revision_id = state.repo.revision().await;

    let request = match body(payload) {
        Ok(request) => request,
        Err(e) => return error(e, revision_id),
    };

    respond(
        state.repo.add_student(&class_name, &request).await,
        revision_id,
    )
}

/// DELETE /api/classes/{className}/students/{studentId} - Remove a student.
pub async fn delete_student(
    State(state): State<AppState>,
    Path((class_name, student_id)): Path<(String, String)>,
) -> ApiResult<DeleteStudentResponse> {
    let revision_id = state.repo.revision().await;
    respond(
        state.repo.delete_student(&class_name, &student_id).await,
        revision_id,
    )
}

/// PUT /api/classes/{className}/students/{studentId}/points - Set or adjust points.
pub async fn update_points(
    State(state): State<AppState>,
    Path((class_name, student_id)): Path<(String, String)>,
    payload: Result<Json<UpdatePointsRequest>, JsonRejection>,
) -> ApiResult<PointsResponse> {
    let revision_id = state.repo.revision().await;

    let request = match body(payload) {
        Ok(request) => request,
        Err(e) => return error(e, revision_id),
    };

    respond(
        state
            .repo
            .update_points(&class_name, &student_id, &request)
            .await,
        revision_id,
    )
}

/// PUT /api/classes/{className}/students/{studentId} - Update profile fields.
pub async fn update_student(
    State(state): State<AppState>,
    Path((class_name, student_id)): Path<(String, String)>,
    payload: Result<Json<StudentUpdates>, JsonRejection>,
) -> ApiResult<Student> {
    let revision_id = state.repo.revision().await;

    let updates = match body(payload) {
        Ok(updates) => updates,
        Err(e) => return error(e, revision_id),
    };

    respond(
        state
            .repo
            .update_student(&class_name, &student_id, &updates)
            .await,
        revision_id,
    )
}
