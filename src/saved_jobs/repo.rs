use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    error::AppError,
    jobs::{repo::JOB_COLUMNS, repo_types::JobRow},
};

#[derive(Debug, Clone, FromRow)]
pub struct SavedJobRow {
    pub saved_id: Uuid,
    pub saved_at: OffsetDateTime,
    #[sqlx(flatten)]
    pub job: JobRow,
}

/// Bookmarks for a student, most recently saved first.
pub async fn list_for_student(
    db: &PgPool,
    student_id: Uuid,
) -> Result<Vec<SavedJobRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT s.id AS saved_id, s.created_at AS saved_at, {JOB_COLUMNS}
          FROM saved_jobs s
          JOIN jobs j ON j.id = s.job_id
         WHERE s.student_id = $1
         ORDER BY s.created_at DESC
        "#
    );
    sqlx::query_as::<_, SavedJobRow>(&sql)
        .bind(student_id)
        .fetch_all(db)
        .await
}

pub async fn save(db: &PgPool, job_id: Uuid, student_id: Uuid) -> Result<Uuid, AppError> {
    sqlx::query_scalar::<_, Uuid>(
        r#"INSERT INTO saved_jobs (job_id, student_id) VALUES ($1, $2) RETURNING id"#,
    )
    .bind(job_id)
    .bind(student_id)
    .fetch_one(db)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref d) if d.is_unique_violation() => {
            AppError::Conflict("Job already saved")
        }
        sqlx::Error::Database(ref d) if d.is_foreign_key_violation() => {
            AppError::NotFound("Job not found")
        }
        other => AppError::Database(other),
    })
}

pub async fn unsave(db: &PgPool, job_id: Uuid, student_id: Uuid) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(r#"DELETE FROM saved_jobs WHERE job_id = $1 AND student_id = $2"#)
        .bind(job_id)
        .bind(student_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
