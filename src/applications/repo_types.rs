use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// Application record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub student_id: Uuid,
    pub status: String,
    pub cv_url: Option<String>,
    pub cover_letter: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Application joined with the job it targets, for the student's own list.
#[derive(Debug, Clone, FromRow)]
pub struct StudentApplicationRow {
    #[sqlx(flatten)]
    pub application: ApplicationRow,
    pub job_title: String,
    pub job_company: String,
    pub job_location: String,
    pub job_type: String,
}

/// Application joined with job and applicant details, for the employer.
#[derive(Debug, Clone, FromRow)]
pub struct EmployerApplicationRow {
    #[sqlx(flatten)]
    pub application: ApplicationRow,
    pub job_title: String,
    pub job_company: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub education: String,
    pub skills: Vec<String>,
    pub experience: Option<String>,
}
