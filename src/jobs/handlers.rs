use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreateJobRequest, EmployerJobItem, JobResponse},
    repo,
};
use crate::{
    auth::{dto::MessageResponse, extractors::ApprovedEmployer},
    error::AppError,
    state::AppState,
};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/:id", get(get_job))
}

pub fn employer_routes() -> Router<AppState> {
    Router::new()
        .route("/employer/jobs", get(list_employer_jobs).post(create_job))
        .route("/employer/jobs/:job_id", delete(delete_job))
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobResponse>>, AppError> {
    let jobs = repo::list_all(&state.db).await?;
    Ok(Json(jobs.into_iter().map(JobResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobResponse>, AppError> {
    let job = repo::get(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Job not found"))?;
    Ok(Json(job.into()))
}

#[instrument(skip(state, employer), fields(employer_id = %employer.id))]
pub async fn list_employer_jobs(
    State(state): State<AppState>,
    ApprovedEmployer(employer): ApprovedEmployer,
) -> Result<Json<Vec<EmployerJobItem>>, AppError> {
    let rows = repo::list_by_employer(&state.db, employer.id).await?;
    Ok(Json(rows.into_iter().map(EmployerJobItem::from).collect()))
}

#[instrument(skip(state, employer, body), fields(employer_id = %employer.id))]
pub async fn create_job(
    State(state): State<AppState>,
    ApprovedEmployer(employer): ApprovedEmployer,
    body: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<JobResponse>), AppError> {
    let Json(body) = body.map_err(|e| AppError::invalid("body", e.body_text()))?;
    let new_job = body.validate(employer.id)?;
    let job = repo::create(&state.db, &new_job).await?;
    info!(job_id = %job.id, "job created");
    Ok((StatusCode::CREATED, Json(job.into())))
}

#[instrument(skip(state, employer), fields(employer_id = %employer.id))]
pub async fn delete_job(
    State(state): State<AppState>,
    ApprovedEmployer(employer): ApprovedEmployer,
    Path(job_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    if !repo::delete_owned(&state.db, job_id, employer.id).await? {
        warn!(%job_id, "delete of missing or foreign job");
        return Err(AppError::NotFound("Job not found"));
    }
    info!(%job_id, "job deleted");
    Ok(Json(MessageResponse {
        message: "Job deleted successfully",
    }))
}
