use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, Duration,
    OffsetDateTime,
};
use uuid::Uuid;

use super::repo_types::{JobRow, JobType, JobWithCountRow, NewJob};
use crate::error::{AppError, FieldErrors};

/// Reported deadline for jobs posted without one.
pub const DEFAULT_DEADLINE_DAYS: i64 = 15;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub title: String,
    pub description: String,
    pub company: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub deadline: OffsetDateTime,
    pub salary: Option<String>,
    pub requirements: Vec<String>,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<JobRow> for JobResponse {
    fn from(j: JobRow) -> Self {
        Self {
            deadline: j
                .deadline
                .unwrap_or(j.created_at + Duration::days(DEFAULT_DEADLINE_DAYS)),
            id: j.id,
            employer_id: j.employer_id,
            title: j.title,
            description: j.description,
            company: j.company,
            location: j.location,
            job_type: j.job_type,
            salary: j.salary,
            requirements: j.requirements,
            status: j.status,
            created_at: j.created_at,
            updated_at: j.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerJobItem {
    #[serde(flatten)]
    pub job: JobResponse,
    pub applicants: i64,
}

impl From<JobWithCountRow> for EmployerJobItem {
    fn from(r: JobWithCountRow) -> Self {
        Self {
            job: r.job.into(),
            applicants: r.applicants,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    pub company: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub salary: Option<String>,
    pub requirements: Vec<String>,
    pub deadline: Option<String>,
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
fn parse_deadline(s: &str) -> Option<OffsetDateTime> {
    if let Ok(ts) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(ts);
    }
    Date::parse(s, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|d| d.midnight().assume_utc())
}

impl CreateJobRequest {
    pub fn validate(self, employer_id: Uuid) -> Result<NewJob, AppError> {
        let mut errors = FieldErrors::new();
        let mut at_least = |field: &str, value: &str, min: usize| {
            if value.trim().chars().count() < min {
                errors.add(field, format!("must be at least {min} characters"));
            }
        };
        at_least("title", &self.title, 3);
        at_least("description", &self.description, 10);
        at_least("company", &self.company, 2);
        at_least("location", &self.location, 2);

        let job_type = self.job_type.parse::<JobType>().ok();
        if job_type.is_none() {
            errors.add("type", "must be one of full-time, part-time, internship");
        }

        let deadline = match self.deadline.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let parsed = parse_deadline(raw);
                if parsed.is_none() {
                    errors.add("deadline", "must be a date (YYYY-MM-DD) or RFC 3339 timestamp");
                }
                parsed
            }
        };
        errors.into_result()?;

        Ok(NewJob {
            employer_id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            company: self.company.trim().to_string(),
            location: self.location.trim().to_string(),
            job_type: job_type.unwrap_or(JobType::FullTime),
            deadline,
            salary: self
                .salary
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            requirements: self
                .requirements
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn request() -> CreateJobRequest {
        CreateJobRequest {
            title: "Backend intern".into(),
            description: "Help us build the API layer.".into(),
            company: "Acme".into(),
            location: "Remote".into(),
            job_type: "internship".into(),
            salary: Some(" ".into()),
            requirements: vec!["Rust".into(), "".into()],
            deadline: Some("2026-12-01".into()),
        }
    }

    #[test]
    fn valid_request_becomes_new_job() {
        let employer = Uuid::new_v4();
        let job = request().validate(employer).unwrap();
        assert_eq!(job.employer_id, employer);
        assert_eq!(job.job_type, JobType::Internship);
        assert_eq!(job.salary, None);
        assert_eq!(job.requirements, vec!["Rust".to_string()]);
        assert_eq!(job.deadline, Some(datetime!(2026-12-01 0:00 UTC)));
    }

    #[test]
    fn invalid_fields_are_collected() {
        let req = CreateJobRequest {
            title: "Go".into(),
            job_type: "gig".into(),
            deadline: Some("next week".into()),
            ..request()
        };
        match req.validate(Uuid::new_v4()).unwrap_err() {
            AppError::Validation(f) => {
                assert!(f.contains("title"));
                assert!(f.contains("type"));
                assert!(f.contains("deadline"));
                assert!(!f.contains("company"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_deadline_defaults_to_fifteen_days_after_posting() {
        let created = datetime!(2026-01-01 12:00 UTC);
        let row = JobRow {
            id: Uuid::new_v4(),
            employer_id: Uuid::new_v4(),
            title: "t".into(),
            description: "d".into(),
            company: "c".into(),
            location: "l".into(),
            job_type: "full-time".into(),
            deadline: None,
            salary: None,
            requirements: vec![],
            status: "active".into(),
            created_at: created,
            updated_at: created,
        };
        let json = serde_json::to_value(JobResponse::from(row)).unwrap();
        assert_eq!(json["deadline"], "2026-01-16T12:00:00Z");
        assert_eq!(json["type"], "full-time");
        assert_eq!(json["employerId"].as_str().unwrap().len(), 36);
    }
}
