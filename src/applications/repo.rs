use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{
    ApplicationRow, ApplicationStatus, EmployerApplicationRow, StudentApplicationRow,
};
use crate::error::AppError;

const APPLICATION_COLUMNS: &str = r#"
    a.id, a.job_id, a.student_id, a.status, a.cv_url, a.cover_letter, a.created_at, a.updated_at
"#;

/// Insert a pending application. One per (job, student).
pub async fn create(
    db: &PgPool,
    job_id: Uuid,
    student_id: Uuid,
    cv_url: Option<&str>,
    cover_letter: Option<&str>,
) -> Result<ApplicationRow, AppError> {
    let sql = format!(
        r#"
        INSERT INTO applications AS a (job_id, student_id, status, cv_url, cover_letter)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {APPLICATION_COLUMNS}
        "#
    );
    sqlx::query_as::<_, ApplicationRow>(&sql)
        .bind(job_id)
        .bind(student_id)
        .bind(ApplicationStatus::Pending.as_str())
        .bind(cv_url)
        .bind(cover_letter)
        .fetch_one(db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref d) if d.is_unique_violation() => {
                AppError::Conflict("You have already applied for this job")
            }
            sqlx::Error::Database(ref d) if d.is_foreign_key_violation() => {
                AppError::NotFound("Job not found")
            }
            other => AppError::Database(other),
        })
}

/// A student's applications with job summaries, newest first.
pub async fn list_for_student(
    db: &PgPool,
    student_id: Uuid,
) -> Result<Vec<StudentApplicationRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {APPLICATION_COLUMNS},
               j.title AS job_title, j.company AS job_company,
               j.location AS job_location, j.job_type
          FROM applications a
          JOIN jobs j ON j.id = a.job_id
         WHERE a.student_id = $1
         ORDER BY a.created_at DESC
        "#
    );
    sqlx::query_as::<_, StudentApplicationRow>(&sql)
        .bind(student_id)
        .fetch_all(db)
        .await
}

/// Withdraw an application; only its own student may do so.
pub async fn delete_owned(db: &PgPool, id: Uuid, student_id: Uuid) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(r#"DELETE FROM applications WHERE id = $1 AND student_id = $2"#)
        .bind(id)
        .bind(student_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

const EMPLOYER_VIEW: &str = r#"
      FROM applications a
      JOIN jobs j ON j.id = a.job_id
      JOIN users u ON u.id = a.student_id
      JOIN student_profiles s ON s.user_id = a.student_id
"#;

fn employer_select() -> String {
    format!(
        r#"
        SELECT {APPLICATION_COLUMNS},
               j.title AS job_title, j.company AS job_company,
               u.email, s.first_name, s.last_name, s.education, s.skills, s.experience
        {EMPLOYER_VIEW}
        "#
    )
}

/// Applications to the employer's jobs, optionally narrowed to one job.
pub async fn list_for_employer(
    db: &PgPool,
    employer_id: Uuid,
    job_id: Option<Uuid>,
) -> Result<Vec<EmployerApplicationRow>, sqlx::Error> {
    let sql = format!(
        "{} WHERE j.employer_id = $1 AND ($2::uuid IS NULL OR a.job_id = $2) ORDER BY a.created_at DESC",
        employer_select()
    );
    sqlx::query_as::<_, EmployerApplicationRow>(&sql)
        .bind(employer_id)
        .bind(job_id)
        .fetch_all(db)
        .await
}

/// Set the review outcome if the application belongs to one of the employer's jobs.
pub async fn review(
    db: &PgPool,
    id: Uuid,
    employer_id: Uuid,
    status: ApplicationStatus,
) -> Result<Option<EmployerApplicationRow>, sqlx::Error> {
    let updated = sqlx::query(
        r#"
        UPDATE applications a
           SET status = $1, updated_at = now()
          FROM jobs j
         WHERE a.id = $2 AND j.id = a.job_id AND j.employer_id = $3
        "#,
    )
    .bind(status.as_str())
    .bind(id)
    .bind(employer_id)
    .execute(db)
    .await?;
    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    let sql = format!("{} WHERE a.id = $1", employer_select());
    sqlx::query_as::<_, EmployerApplicationRow>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        jobs::repo::seed_job,
        users::{
            model::fixtures::{employer_profile, student_profile},
            pg::seed_user,
        },
    };

    #[sqlx::test(migrations = "./migrations")]
    async fn second_application_is_a_conflict(pool: PgPool) {
        let employer = seed_user(&pool, "e@example.com", employer_profile()).await;
        let student = seed_user(&pool, "s@example.com", student_profile()).await;
        let job = seed_job(&pool, employer.id, "Intern").await;

        let first = create(&pool, job.id, student.id, Some("https://cv.example/ada"), None)
            .await
            .unwrap();
        assert_eq!(first.status, "pending");

        let err = create(&pool, job.id, student.id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn applying_to_a_missing_job_is_not_found(pool: PgPool) {
        let student = seed_user(&pool, "s@example.com", student_profile()).await;
        let err = create(&pool, Uuid::new_v4(), student.id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn review_is_limited_to_the_job_owner(pool: PgPool) {
        let owner = seed_user(&pool, "owner@example.com", employer_profile()).await;
        let other = seed_user(&pool, "other@example.com", employer_profile()).await;
        let student = seed_user(&pool, "s@example.com", student_profile()).await;
        let job = seed_job(&pool, owner.id, "Intern").await;
        let app = create(&pool, job.id, student.id, None, Some("Hello"))
            .await
            .unwrap();

        assert!(review(&pool, app.id, other.id, ApplicationStatus::Accepted)
            .await
            .unwrap()
            .is_none());
        assert!(list_for_employer(&pool, other.id, Some(job.id))
            .await
            .unwrap()
            .is_empty());

        let reviewed = review(&pool, app.id, owner.id, ApplicationStatus::Accepted)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reviewed.application.status, "accepted");
        assert_eq!(reviewed.first_name, "Ada");
        assert_eq!(reviewed.email, "s@example.com");

        let listed = list_for_employer(&pool, owner.id, None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].job_title, "Intern");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn students_withdraw_only_their_own(pool: PgPool) {
        let employer = seed_user(&pool, "e@example.com", employer_profile()).await;
        let ada = seed_user(&pool, "ada@example.com", student_profile()).await;
        let bob = seed_user(&pool, "bob@example.com", student_profile()).await;
        let job = seed_job(&pool, employer.id, "Intern").await;
        let app = create(&pool, job.id, ada.id, None, None).await.unwrap();

        assert!(!delete_owned(&pool, app.id, bob.id).await.unwrap());
        assert_eq!(list_for_student(&pool, ada.id).await.unwrap().len(), 1);

        assert!(delete_owned(&pool, app.id, ada.id).await.unwrap());
        assert!(list_for_student(&pool, ada.id).await.unwrap().is_empty());
    }
}
