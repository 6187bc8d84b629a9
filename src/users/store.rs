use async_trait::async_trait;
use uuid::Uuid;

use super::model::{ApprovalStatus, NewUser, Role, User};
use crate::error::AppError;

/// Credential store over the three user partitions.
///
/// Every lookup is keyed by role or covers the whole user space in a single
/// call; callers never probe partitions one after another.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Partition-scoped lookup. Signup and login go through
    /// [`UserStore::find_any_by_email`] because emails are unique across
    /// partitions; this stays for callers that already know the role.
    async fn find_by_email(&self, email: &str, role: Role) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid, role: Role) -> Result<Option<User>, AppError>;

    /// Lookup across all partitions; emails are unique over the whole space.
    async fn find_any_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_any_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Fails with `AppError::DuplicateEmail` if the email exists in any partition.
    async fn create_user(&self, new: NewUser) -> Result<User, AppError>;

    async fn update_approval_status(
        &self,
        id: Uuid,
        role: Role,
        status: ApprovalStatus,
    ) -> Result<Option<User>, AppError>;

    /// Users with `status`, newest first; `role = None` covers students and employers.
    async fn list_by_status(
        &self,
        role: Option<Role>,
        status: ApprovalStatus,
    ) -> Result<Vec<User>, AppError>;

    async fn count_by_status(&self, role: Role, status: ApprovalStatus) -> Result<i64, AppError>;
}
