use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{JobRow, JobWithCountRow, NewJob};

pub(crate) const JOB_COLUMNS: &str = r#"
    j.id, j.employer_id, j.title, j.description, j.company, j.location, j.job_type,
    j.deadline, j.salary, j.requirements, j.status, j.created_at, j.updated_at
"#;

/// All jobs, newest first.
pub async fn list_all(db: &PgPool) -> Result<Vec<JobRow>, sqlx::Error> {
    let sql = format!("SELECT {JOB_COLUMNS} FROM jobs j ORDER BY j.created_at DESC");
    sqlx::query_as::<_, JobRow>(&sql).fetch_all(db).await
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
    let sql = format!("SELECT {JOB_COLUMNS} FROM jobs j WHERE j.id = $1");
    sqlx::query_as::<_, JobRow>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Jobs owned by an employer with their applicant counts.
pub async fn list_by_employer(
    db: &PgPool,
    employer_id: Uuid,
) -> Result<Vec<JobWithCountRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {JOB_COLUMNS},
               (SELECT COUNT(*) FROM applications a WHERE a.job_id = j.id) AS applicants
          FROM jobs j
         WHERE j.employer_id = $1
         ORDER BY j.created_at DESC
        "#
    );
    sqlx::query_as::<_, JobWithCountRow>(&sql)
        .bind(employer_id)
        .fetch_all(db)
        .await
}

pub async fn create(db: &PgPool, new: &NewJob) -> Result<JobRow, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO jobs AS j
            (employer_id, title, description, company, location, job_type, deadline, salary, requirements)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {JOB_COLUMNS}
        "#
    );
    sqlx::query_as::<_, JobRow>(&sql)
        .bind(new.employer_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.company)
        .bind(&new.location)
        .bind(new.job_type.as_str())
        .bind(new.deadline)
        .bind(&new.salary)
        .bind(&new.requirements)
        .fetch_one(db)
        .await
}

/// Deletes the job only if `employer_id` owns it. Returns whether a row went away.
pub async fn delete_owned(db: &PgPool, id: Uuid, employer_id: Uuid) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(r#"DELETE FROM jobs WHERE id = $1 AND employer_id = $2"#)
        .bind(id)
        .bind(employer_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// `(active, total)` job counts.
pub async fn counts(db: &PgPool) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT COUNT(*) FILTER (WHERE status = 'active'), COUNT(*)
          FROM jobs
        "#,
    )
    .fetch_one(db)
    .await
}

/// Inserts an active internship owned by `employer_id`.
#[cfg(test)]
pub(crate) async fn seed_job(db: &PgPool, employer_id: Uuid, title: &str) -> JobRow {
    use super::repo_types::JobType;

    create(
        db,
        &NewJob {
            employer_id,
            title: title.into(),
            description: "Work on real problems.".into(),
            company: "Acme".into(),
            location: "Remote".into(),
            job_type: JobType::Internship,
            deadline: None,
            salary: None,
            requirements: vec!["Rust".into()],
        },
    )
    .await
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        applications,
        users::{
            model::fixtures::{employer_profile, student_profile},
            pg::seed_user,
        },
    };

    #[sqlx::test(migrations = "./migrations")]
    async fn create_defaults_to_active(pool: PgPool) {
        let employer = seed_user(&pool, "e@example.com", employer_profile()).await;
        let job = seed_job(&pool, employer.id, "Backend intern").await;
        assert_eq!(job.status, "active");
        assert_eq!(job.job_type, "internship");
        assert_eq!(job.requirements, vec!["Rust".to_string()]);

        let fetched = get(&pool, job.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Backend intern");
        assert_eq!(counts(&pool).await.unwrap(), (1, 1));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn only_the_owner_can_delete(pool: PgPool) {
        let owner = seed_user(&pool, "owner@example.com", employer_profile()).await;
        let other = seed_user(&pool, "other@example.com", employer_profile()).await;
        let job = seed_job(&pool, owner.id, "Data intern").await;

        assert!(!delete_owned(&pool, job.id, other.id).await.unwrap());
        assert!(get(&pool, job.id).await.unwrap().is_some());

        assert!(delete_owned(&pool, job.id, owner.id).await.unwrap());
        assert!(get(&pool, job.id).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn employer_listing_counts_applicants(pool: PgPool) {
        let employer = seed_user(&pool, "e@example.com", employer_profile()).await;
        let busy = seed_job(&pool, employer.id, "Busy job").await;
        let quiet = seed_job(&pool, employer.id, "Quiet job").await;
        for email in ["a@example.com", "b@example.com"] {
            let student = seed_user(&pool, email, student_profile()).await;
            applications::repo::create(&pool, busy.id, student.id, None, None)
                .await
                .unwrap();
        }

        let rows = list_by_employer(&pool, employer.id).await.unwrap();
        let count_for = |id: Uuid| {
            rows.iter()
                .find(|r| r.job.id == id)
                .map(|r| r.applicants)
                .unwrap()
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(count_for(busy.id), 2);
        assert_eq!(count_for(quiet.id), 0);
    }
}
