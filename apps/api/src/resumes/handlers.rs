use autosave::{PersistedResume, ResumeId, SaveResumeRequest};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::resumes::service::{delete_resume, save_resume};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// POST /api/v1/resumes
pub async fn handle_save_resume(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<SaveResumeRequest>,
) -> Result<Json<PersistedResume>, AppError> {
    let saved = save_resume(
        state.resumes.as_ref(),
        state.photos.as_ref(),
        params.user_id,
        req,
    )
    .await?;
    Ok(Json(saved))
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<PersistedResume>>, AppError> {
    Ok(Json(state.resumes.list(params.user_id).await?))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<ResumeId>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<PersistedResume>, AppError> {
    let resume = state
        .resumes
        .find(params.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    Ok(Json(resume))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(id): Path<ResumeId>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    delete_resume(
        state.resumes.as_ref(),
        state.photos.as_ref(),
        params.user_id,
        id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
