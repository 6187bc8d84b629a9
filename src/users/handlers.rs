use axum::{routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use super::model::{ApprovalStatus, Profile, User};
use crate::{auth::extractors::CurrentUser, error::AppError, state::AppState};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/profile", get(admin_profile))
        .route("/employer/profile", get(employer_profile))
}

#[derive(Debug, Serialize)]
pub struct AdminProfileResponse {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerProfileResponse {
    pub company_name: String,
    pub location: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_approved: ApprovalStatus,
}

fn admin_view(user: User) -> Result<AdminProfileResponse, AppError> {
    match user.profile {
        Profile::Admin(a) => Ok(AdminProfileResponse {
            name: a.name,
            email: user.email,
            image: user.avatar_url,
        }),
        _ => Err(AppError::Forbidden("Only admins can access this endpoint")),
    }
}

/// Pending employers may read their own profile.
fn employer_view(user: User) -> Result<EmployerProfileResponse, AppError> {
    match user.profile {
        Profile::Employer(e) => Ok(EmployerProfileResponse {
            company_name: e.company_name,
            location: e.location,
            industry: e.industry,
            website: e.website,
            description: e.description,
            image: user.avatar_url,
            is_approved: user.approval,
        }),
        _ => Err(AppError::Forbidden("Only employers can access this endpoint")),
    }
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn admin_profile(
    CurrentUser(user): CurrentUser,
) -> Result<Json<AdminProfileResponse>, AppError> {
    admin_view(user).map(Json)
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn employer_profile(
    CurrentUser(user): CurrentUser,
) -> Result<Json<EmployerProfileResponse>, AppError> {
    employer_view(user).map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::model::fixtures::{admin_profile, employer_profile, user};

    #[test]
    fn employer_view_reports_pending_status() {
        let u = user(employer_profile(), ApprovalStatus::Pending);
        let json = serde_json::to_value(employer_view(u).unwrap()).unwrap();
        assert_eq!(json["isApproved"], "pending");
        assert!(json.get("companyName").is_some());
    }

    #[test]
    fn views_reject_other_roles() {
        let admin = user(admin_profile(), ApprovalStatus::Approved);
        assert!(matches!(employer_view(admin), Err(AppError::Forbidden(_))));

        let employer = user(employer_profile(), ApprovalStatus::Approved);
        assert!(matches!(admin_view(employer), Err(AppError::Forbidden(_))));
    }
}
