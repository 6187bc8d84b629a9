use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    model::{
        AdminProfile, ApprovalStatus, EmployerProfile, NewUser, Profile, Role, StudentProfile,
        User,
    },
    store::UserStore,
};
use crate::error::AppError;

const SELECT_USER: &str = r#"
    SELECT u.id, u.email, u.password_hash, u.role, u.approval_status, u.avatar_url,
           u.created_at, u.updated_at,
           s.first_name, s.last_name, s.education, s.skills, s.experience, s.phone_number,
           s.location AS student_location,
           e.company_name, e.location AS employer_location, e.industry, e.website, e.description,
           a.name AS admin_name
      FROM users u
      LEFT JOIN student_profiles s ON s.user_id = u.id
      LEFT JOIN employer_profiles e ON e.user_id = u.id
      LEFT JOIN admin_profiles a ON a.user_id = u.id
"#;

/// Flat join of `users` with whichever profile table matches its role.
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    role: String,
    approval_status: String,
    avatar_url: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    first_name: Option<String>,
    last_name: Option<String>,
    education: Option<String>,
    skills: Option<Vec<String>>,
    experience: Option<String>,
    phone_number: Option<String>,
    student_location: Option<String>,
    company_name: Option<String>,
    employer_location: Option<String>,
    industry: Option<String>,
    website: Option<String>,
    description: Option<String>,
    admin_name: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> anyhow::Result<Self> {
        let role: Role = r.role.parse()?;
        let missing = || anyhow::anyhow!("{} {} has no profile row", role, r.id);
        let profile = match role {
            Role::Student => Profile::Student(StudentProfile {
                first_name: r.first_name.ok_or_else(missing)?,
                last_name: r.last_name.unwrap_or_default(),
                education: r.education.unwrap_or_default(),
                skills: r.skills.unwrap_or_default(),
                experience: r.experience,
                phone_number: r.phone_number,
                location: r.student_location.unwrap_or_default(),
            }),
            Role::Employer => Profile::Employer(EmployerProfile {
                company_name: r.company_name.ok_or_else(missing)?,
                location: r.employer_location.unwrap_or_default(),
                industry: r.industry,
                website: r.website,
                description: r.description,
            }),
            Role::Admin => Profile::Admin(AdminProfile {
                name: r.admin_name.ok_or_else(missing)?,
            }),
        };
        Ok(User {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            approval: r.approval_status.parse()?,
            avatar_url: r.avatar_url,
            created_at: r.created_at,
            updated_at: r.updated_at,
            profile,
        })
    }
}

/// Postgres-backed credential store.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn fetch_by_email(
        &self,
        email: &str,
        role: Option<Role>,
    ) -> Result<Option<User>, AppError> {
        let sql = format!(
            "{SELECT_USER} WHERE u.email = $1 AND ($2::text IS NULL OR u.role = $2)"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .bind(role.map(|r| r.as_str()))
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn fetch_by_id(&self, id: Uuid, role: Option<Role>) -> Result<Option<User>, AppError> {
        let sql = format!(
            "{SELECT_USER} WHERE u.id = $1 AND ($2::text IS NULL OR u.role = $2)"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(role.map(|r| r.as_str()))
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::try_from).transpose()?)
    }
}

async fn insert_profile_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    profile: &Profile,
) -> anyhow::Result<()> {
    match profile {
        Profile::Student(s) => {
            sqlx::query(
                r#"
                INSERT INTO student_profiles
                    (user_id, first_name, last_name, education, skills, experience, phone_number, location)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(user_id)
            .bind(&s.first_name)
            .bind(&s.last_name)
            .bind(&s.education)
            .bind(&s.skills)
            .bind(&s.experience)
            .bind(&s.phone_number)
            .bind(&s.location)
            .execute(&mut **tx)
            .await
            .context("insert student profile")?;
        }
        Profile::Employer(e) => {
            sqlx::query(
                r#"
                INSERT INTO employer_profiles
                    (user_id, company_name, location, industry, website, description)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(user_id)
            .bind(&e.company_name)
            .bind(&e.location)
            .bind(&e.industry)
            .bind(&e.website)
            .bind(&e.description)
            .execute(&mut **tx)
            .await
            .context("insert employer profile")?;
        }
        Profile::Admin(a) => {
            sqlx::query(r#"INSERT INTO admin_profiles (user_id, name) VALUES ($1, $2)"#)
                .bind(user_id)
                .bind(&a.name)
                .execute(&mut **tx)
                .await
                .context("insert admin profile")?;
        }
    }
    Ok(())
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str, role: Role) -> Result<Option<User>, AppError> {
        self.fetch_by_email(email, Some(role)).await
    }

    async fn find_by_id(&self, id: Uuid, role: Role) -> Result<Option<User>, AppError> {
        self.fetch_by_id(id, Some(role)).await
    }

    async fn find_any_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.fetch_by_email(email, None).await
    }

    async fn find_any_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.fetch_by_id(id, None).await
    }

    async fn create_user(&self, new: NewUser) -> Result<User, AppError> {
        let role = new.role();
        let mut tx = self.db.begin().await?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, password_hash, role, approval_status, avatar_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(role.as_str())
        .bind(role.initial_approval().as_str())
        .bind(&new.avatar_url)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::DuplicateEmail,
            other => AppError::Database(other),
        })?;

        insert_profile_tx(&mut tx, id, &new.profile).await?;
        tx.commit().await?;

        self.fetch_by_id(id, Some(role))
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user {id} vanished after insert")))
    }

    async fn update_approval_status(
        &self,
        id: Uuid,
        role: Role,
        status: ApprovalStatus,
    ) -> Result<Option<User>, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE users
               SET approval_status = $1, updated_at = now()
             WHERE id = $2 AND role = $3
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .bind(role.as_str())
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_by_id(id, Some(role)).await
    }

    async fn list_by_status(
        &self,
        role: Option<Role>,
        status: ApprovalStatus,
    ) -> Result<Vec<User>, AppError> {
        let sql = format!(
            r#"{SELECT_USER}
             WHERE u.approval_status = $1
               AND (($2::text IS NULL AND u.role IN ('student', 'employer')) OR u.role = $2)
             ORDER BY u.created_at DESC"#
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(status.as_str())
            .bind(role.map(|r| r.as_str()))
            .fetch_all(&self.db)
            .await?;
        rows.into_iter()
            .map(|r| User::try_from(r).map_err(AppError::from))
            .collect()
    }

    async fn count_by_status(&self, role: Role, status: ApprovalStatus) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM users WHERE role = $1 AND approval_status = $2"#,
        )
        .bind(role.as_str())
        .bind(status.as_str())
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }
}

/// Persists a user through the store, for tests that need real rows.
#[cfg(test)]
pub(crate) async fn seed_user(db: &PgPool, email: &str, profile: Profile) -> User {
    PgUserStore::new(db.clone())
        .create_user(NewUser {
            email: email.into(),
            password_hash: "hash".into(),
            avatar_url: None,
            profile,
        })
        .await
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::model::fixtures::{admin_profile, employer_profile, student_profile};

    #[sqlx::test(migrations = "./migrations")]
    async fn create_user_writes_user_and_profile(pool: PgPool) {
        let store = PgUserStore::new(pool);
        let created = seed_user(&store.db, "s@example.com", student_profile()).await;
        assert_eq!(created.role(), Role::Student);
        assert!(created.is_approved());

        let found = store
            .find_any_by_email("s@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.profile, student_profile());

        assert!(store
            .find_by_email("s@example.com", Role::Employer)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_by_email("s@example.com", Role::Student)
            .await
            .unwrap()
            .is_some());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_email_across_roles_rolls_back(pool: PgPool) {
        let store = PgUserStore::new(pool.clone());
        seed_user(&pool, "dup@example.com", employer_profile()).await;

        let err = store
            .create_user(NewUser {
                email: "dup@example.com".into(),
                password_hash: "hash".into(),
                avatar_url: None,
                profile: student_profile(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));

        let students: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM student_profiles")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(students, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn approval_changes_listing_and_counts(pool: PgPool) {
        let store = PgUserStore::new(pool.clone());
        let employer = seed_user(&pool, "e@example.com", employer_profile()).await;
        seed_user(&pool, "root@example.com", admin_profile()).await;

        let pending = store
            .list_by_status(None, ApprovalStatus::Pending)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, employer.id);

        let updated = store
            .update_approval_status(employer.id, Role::Employer, ApprovalStatus::Approved)
            .await
            .unwrap()
            .unwrap();
        assert!(updated.is_approved());
        assert_eq!(
            store
                .count_by_status(Role::Employer, ApprovalStatus::Approved)
                .await
                .unwrap(),
            1
        );

        // Wrong partition leaves the record alone.
        assert!(store
            .update_approval_status(employer.id, Role::Student, ApprovalStatus::Rejected)
            .await
            .unwrap()
            .is_none());
    }
}
