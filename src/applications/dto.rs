use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{
    ApplicationRow, ApplicationStatus, EmployerApplicationRow, StudentApplicationRow,
};
use crate::error::{AppError, FieldErrors};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateApplicationRequest {
    pub job_id: Option<Uuid>,
    #[serde(flatten)]
    pub details: ApplyRequest,
}

/// Body of `POST /jobs/:id/apply`; the job comes from the path.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplyRequest {
    pub cv_url: Option<String>,
    pub cover_letter: Option<String>,
}

impl ApplyRequest {
    /// Trimmed optional fields; blank strings count as absent.
    pub fn normalized(self) -> (Option<String>, Option<String>) {
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        (clean(self.cv_url), clean(self.cover_letter))
    }
}

impl CreateApplicationRequest {
    pub fn job_id(&self) -> Result<Uuid, AppError> {
        self.job_id
            .ok_or_else(|| AppError::invalid("jobId", "is required"))
    }
}

/// Employers may only move an application to a final state.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub status: String,
}

impl ReviewRequest {
    pub fn decision(&self) -> Result<ApplicationStatus, AppError> {
        match self.status.as_str() {
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => {
                let mut errors = FieldErrors::new();
                errors.add("status", "must be accepted or rejected");
                Err(AppError::Validation(errors))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobQuery {
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub job_id: Uuid,
    pub student_id: Uuid,
    pub status: String,
    pub cv_url: Option<String>,
    pub cover_letter: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<ApplicationRow> for ApplicationResponse {
    fn from(a: ApplicationRow) -> Self {
        Self {
            id: a.id,
            job_id: a.job_id,
            student_id: a.student_id,
            status: a.status,
            cv_url: a.cv_url,
            cover_letter: a.cover_letter,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub title: String,
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentApplicationItem {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub job: JobSummary,
}

impl From<StudentApplicationRow> for StudentApplicationItem {
    fn from(r: StudentApplicationRow) -> Self {
        Self {
            application: r.application.into(),
            job: JobSummary {
                title: r.job_title,
                company: r.job_company,
                location: Some(r.job_location),
                job_type: Some(r.job_type),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantSummary {
    pub name: String,
    pub email: String,
    pub education: String,
    pub skills: Vec<String>,
    pub experience: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerApplicationItem {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub job: JobSummary,
    pub student: ApplicantSummary,
}

impl From<EmployerApplicationRow> for EmployerApplicationItem {
    fn from(r: EmployerApplicationRow) -> Self {
        Self {
            application: r.application.into(),
            job: JobSummary {
                title: r.job_title,
                company: r.job_company,
                location: None,
                job_type: None,
            },
            student: ApplicantSummary {
                name: format!("{} {}", r.first_name, r.last_name),
                email: r.email,
                education: r.education,
                skills: r.skills,
                experience: r.experience,
            },
        }
    }
}
