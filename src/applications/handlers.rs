use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        ApplicationResponse, ApplyRequest, CreateApplicationRequest, EmployerApplicationItem,
        JobQuery, ReviewRequest, StudentApplicationItem,
    },
    repo,
};
use crate::{
    auth::{
        dto::MessageResponse,
        extractors::{ApprovedEmployer, StudentOnly},
    },
    error::AppError,
    jobs,
    state::AppState,
};

pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/applications", get(list_mine).post(create_application))
        .route("/applications/:id", delete(withdraw))
        .route("/jobs/:id/apply", post(apply_to_job))
}

pub fn employer_routes() -> Router<AppState> {
    Router::new()
        .route("/employer/applications", get(list_for_employer))
        .route("/employer/applications/:id", patch(review))
}

async fn submit(
    state: &AppState,
    job_id: Uuid,
    student_id: Uuid,
    details: ApplyRequest,
) -> Result<ApplicationResponse, AppError> {
    if jobs::repo::get(&state.db, job_id).await?.is_none() {
        return Err(AppError::NotFound("Job not found"));
    }
    let (cv_url, cover_letter) = details.normalized();
    let row = repo::create(
        &state.db,
        job_id,
        student_id,
        cv_url.as_deref(),
        cover_letter.as_deref(),
    )
    .await?;
    info!(application_id = %row.id, %job_id, "application submitted");
    Ok(row.into())
}

#[instrument(skip(state, student), fields(student_id = %student.user_id))]
pub async fn list_mine(
    State(state): State<AppState>,
    StudentOnly(student): StudentOnly,
) -> Result<Json<Vec<StudentApplicationItem>>, AppError> {
    let rows = repo::list_for_student(&state.db, student.user_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, student, body), fields(student_id = %student.user_id))]
pub async fn create_application(
    State(state): State<AppState>,
    StudentOnly(student): StudentOnly,
    body: Result<Json<CreateApplicationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApplicationResponse>), AppError> {
    let Json(body) = body.map_err(|e| AppError::invalid("body", e.body_text()))?;
    let job_id = body.job_id()?;
    let created = submit(&state, job_id, student.user_id, body.details).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Body is optional here; an empty request applies without CV or letter.
#[instrument(skip(state, student, body), fields(student_id = %student.user_id))]
pub async fn apply_to_job(
    State(state): State<AppState>,
    StudentOnly(student): StudentOnly,
    Path(job_id): Path<Uuid>,
    body: Option<Json<ApplyRequest>>,
) -> Result<(StatusCode, Json<ApplicationResponse>), AppError> {
    let details = body.map(|Json(b)| b).unwrap_or_default();
    let created = submit(&state, job_id, student.user_id, details).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state, student), fields(student_id = %student.user_id))]
pub async fn withdraw(
    State(state): State<AppState>,
    StudentOnly(student): StudentOnly,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    if !repo::delete_owned(&state.db, id, student.user_id).await? {
        return Err(AppError::NotFound("Application not found"));
    }
    info!(application_id = %id, "application withdrawn");
    Ok(Json(MessageResponse {
        message: "Application withdrawn successfully",
    }))
}

#[instrument(skip(state, employer), fields(employer_id = %employer.id))]
pub async fn list_for_employer(
    State(state): State<AppState>,
    ApprovedEmployer(employer): ApprovedEmployer,
    Query(query): Query<JobQuery>,
) -> Result<Json<Vec<EmployerApplicationItem>>, AppError> {
    if let Some(job_id) = query.job_id {
        let job = jobs::repo::get(&state.db, job_id)
            .await?
            .ok_or(AppError::NotFound("Job not found"))?;
        if job.employer_id != employer.id {
            warn!(%job_id, "employer asked for applications to a foreign job");
            return Err(AppError::Forbidden(
                "You can only view applications for your own jobs",
            ));
        }
    }
    let rows = repo::list_for_employer(&state.db, employer.id, query.job_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, employer, body), fields(employer_id = %employer.id))]
pub async fn review(
    State(state): State<AppState>,
    ApprovedEmployer(employer): ApprovedEmployer,
    Path(id): Path<Uuid>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<EmployerApplicationItem>, AppError> {
    let Json(body) = body.map_err(|e| AppError::invalid("body", e.body_text()))?;
    let status = body.decision()?;
    let row = repo::review(&state.db, id, employer.id, status)
        .await?
        .ok_or(AppError::NotFound("Application not found"))?;
    info!(application_id = %id, status = status.as_str(), "application reviewed");
    Ok(Json(row.into()))
}
