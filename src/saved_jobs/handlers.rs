use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::repo::{self, SavedJobRow};
use crate::{
    auth::{dto::MessageResponse, extractors::StudentOnly},
    error::AppError,
    jobs::{self, dto::JobResponse},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/saved-jobs",
        get(list_saved).post(save_job).delete(unsave_job),
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveJobRequest {
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedJobItem {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub saved_at: OffsetDateTime,
    pub job: JobResponse,
}

impl From<SavedJobRow> for SavedJobItem {
    fn from(r: SavedJobRow) -> Self {
        Self {
            id: r.saved_id,
            saved_at: r.saved_at,
            job: r.job.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedResponse {
    pub id: Uuid,
    pub job_id: Uuid,
    pub message: &'static str,
}

fn required_job_id(job_id: Option<Uuid>) -> Result<Uuid, AppError> {
    job_id.ok_or_else(|| AppError::invalid("jobId", "is required"))
}

#[instrument(skip(state, student), fields(student_id = %student.user_id))]
pub async fn list_saved(
    State(state): State<AppState>,
    StudentOnly(student): StudentOnly,
) -> Result<Json<Vec<SavedJobItem>>, AppError> {
    let rows = repo::list_for_student(&state.db, student.user_id).await?;
    Ok(Json(rows.into_iter().map(SavedJobItem::from).collect()))
}

#[instrument(skip(state, student, body), fields(student_id = %student.user_id))]
pub async fn save_job(
    State(state): State<AppState>,
    StudentOnly(student): StudentOnly,
    body: Result<Json<SaveJobRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SavedResponse>), AppError> {
    let Json(body) = body.map_err(|e| AppError::invalid("body", e.body_text()))?;
    let job_id = required_job_id(body.job_id)?;
    if jobs::repo::get(&state.db, job_id).await?.is_none() {
        return Err(AppError::NotFound("Job not found"));
    }
    let id = repo::save(&state.db, job_id, student.user_id).await?;
    info!(%job_id, "job saved");
    Ok((
        StatusCode::CREATED,
        Json(SavedResponse {
            id,
            job_id,
            message: "Job saved successfully",
        }),
    ))
}

#[instrument(skip(state, student), fields(student_id = %student.user_id))]
pub async fn unsave_job(
    State(state): State<AppState>,
    StudentOnly(student): StudentOnly,
    Query(query): Query<SaveJobRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let job_id = required_job_id(query.job_id)?;
    if !repo::unsave(&state.db, job_id, student.user_id).await? {
        return Err(AppError::NotFound("Saved job not found"));
    }
    info!(%job_id, "job unsaved");
    Ok(Json(MessageResponse {
        message: "Job removed from saved list",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[test]
    fn job_id_is_required() {
        assert!(matches!(
            required_job_id(None),
            Err(AppError::Validation(f)) if f.contains("jobId")
        ));
    }

    #[tokio::test]
    async fn saved_jobs_are_for_students_only() {
        let state = AppState::fake();
        let app = routes().with_state(state);
        let res = app
            .oneshot(Request::get("/saved-jobs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
