use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AdminOnly,
    error::AppError,
    jobs,
    state::AppState,
    users::model::{ApprovalStatus, PublicUser, Role},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/pending-users", get(pending_users))
        .route("/admin/approve-user", post(approve_user))
        .route("/admin/dashboard-stats", get(dashboard_stats))
}

#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    pub role: Option<String>,
}

/// Only students and employers wait for review.
fn reviewable_role(raw: Option<&str>) -> Result<Option<Role>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(r) => match r.parse::<Role>() {
            Ok(role @ (Role::Student | Role::Employer)) => Ok(Some(role)),
            _ => Err(AppError::invalid("role", "must be student or employer")),
        },
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub user_id: Uuid,
    pub approved: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApproveResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_students: i64,
    pub partner_employers: i64,
    pub active_jobs: i64,
    pub total_jobs: i64,
}

#[instrument(skip(state, admin), fields(admin_id = %admin.user_id))]
pub async fn pending_users(
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
    Query(query): Query<PendingQuery>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let role = reviewable_role(query.role.as_deref())?;
    let users = state
        .users
        .list_by_status(role, ApprovalStatus::Pending)
        .await?;
    Ok(Json(users.iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.user_id))]
pub async fn approve_user(
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
    body: Result<Json<ApproveRequest>, JsonRejection>,
) -> Result<Json<ApproveResponse>, AppError> {
    let Json(body) = body.map_err(|e| AppError::invalid("body", e.body_text()))?;

    let target = state
        .users
        .find_any_by_id(body.user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    if target.role() == Role::Admin {
        warn!(target_id = %target.id, "attempt to re-gate an admin account");
        return Err(AppError::invalid(
            "userId",
            "admin accounts are not subject to approval",
        ));
    }

    let status = if body.approved {
        ApprovalStatus::Approved
    } else {
        ApprovalStatus::Rejected
    };
    let updated = state
        .users
        .update_approval_status(target.id, target.role(), status)
        .await?
        .ok_or(AppError::UserNotFound)?;

    info!(
        target_id = %updated.id,
        role = %updated.role(),
        status = %status,
        notes = body.notes.as_deref().unwrap_or(""),
        "approval status changed"
    );
    Ok(Json(ApproveResponse {
        message: if body.approved {
            "User approved successfully"
        } else {
            "User rejected"
        },
        user: PublicUser::from(&updated),
    }))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.user_id))]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
) -> Result<Json<DashboardStats>, AppError> {
    let active_students = state
        .users
        .count_by_status(Role::Student, ApprovalStatus::Approved)
        .await?;
    let partner_employers = state
        .users
        .count_by_status(Role::Employer, ApprovalStatus::Approved)
        .await?;
    let (active_jobs, total_jobs) = jobs::repo::counts(&state.db).await?;
    Ok(Json(DashboardStats {
        active_students,
        partner_employers,
        active_jobs,
        total_jobs,
    }))
}
