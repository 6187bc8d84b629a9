use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    model::{ApprovalStatus, NewUser, Role, User},
    store::UserStore,
};
use crate::error::AppError;

/// In-process credential store used by router tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str, role: Role) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email == email && u.role() == role)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid, role: Role) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.get(&id).filter(|u| u.role() == role).cloned())
    }

    async fn find_any_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_any_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create_user(&self, new: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new.email) {
            return Err(AppError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            approval: new.role().initial_approval(),
            email: new.email,
            password_hash: new.password_hash,
            avatar_url: new.avatar_url,
            created_at: now,
            updated_at: now,
            profile: new.profile,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_approval_status(
        &self,
        id: Uuid,
        role: Role,
        status: ApprovalStatus,
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).filter(|u| u.role() == role).map(|u| {
            u.approval = status;
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        }))
    }

    async fn list_by_status(
        &self,
        role: Option<Role>,
        status: ApprovalStatus,
    ) -> Result<Vec<User>, AppError> {
        let users = self.users.read().await;
        let mut out: Vec<User> = users
            .values()
            .filter(|u| u.approval == status)
            .filter(|u| match role {
                Some(r) => u.role() == r,
                None => u.role() != Role::Admin,
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn count_by_status(&self, role: Role, status: ApprovalStatus) -> Result<i64, AppError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| u.role() == role && u.approval == status)
            .count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::model::fixtures::{employer_profile, student_profile};

    fn new_user(email: &str, profile: crate::users::model::Profile) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "hash".into(),
            avatar_url: None,
            profile,
        }
    }

    #[tokio::test]
    async fn email_is_unique_across_partitions() {
        let store = MemoryUserStore::new();
        store
            .create_user(new_user("dup@example.com", student_profile()))
            .await
            .unwrap();
        let err = store
            .create_user(new_user("dup@example.com", employer_profile()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[tokio::test]
    async fn lookups_are_scoped_by_role() {
        let store = MemoryUserStore::new();
        let user = store
            .create_user(new_user("e@example.com", employer_profile()))
            .await
            .unwrap();

        assert!(store.find_by_id(user.id, Role::Employer).await.unwrap().is_some());
        assert!(store.find_by_id(user.id, Role::Student).await.unwrap().is_none());
        assert!(store
            .find_by_email("e@example.com", Role::Admin)
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            store
                .find_any_by_email("e@example.com")
                .await
                .unwrap()
                .map(|u| u.id),
            Some(user.id)
        );
    }

    #[tokio::test]
    async fn approval_update_requires_matching_role() {
        let store = MemoryUserStore::new();
        let user = store
            .create_user(new_user("e@example.com", employer_profile()))
            .await
            .unwrap();
        assert_eq!(user.approval, ApprovalStatus::Pending);
        assert_eq!(
            store
                .count_by_status(Role::Employer, ApprovalStatus::Pending)
                .await
                .unwrap(),
            1
        );

        let none = store
            .update_approval_status(user.id, Role::Student, ApprovalStatus::Approved)
            .await
            .unwrap();
        assert!(none.is_none());

        let updated = store
            .update_approval_status(user.id, Role::Employer, ApprovalStatus::Approved)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.approval, ApprovalStatus::Approved);
        assert!(store
            .list_by_status(None, ApprovalStatus::Pending)
            .await
            .unwrap()
            .is_empty());
    }
}
