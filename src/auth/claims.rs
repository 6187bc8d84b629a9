use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::model::{ApprovalStatus, Role, User};

/// JWT payload. `role` and `isApproved` are a snapshot taken at issuance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub role: Role,
    pub is_approved: ApprovalStatus,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            role: self.role,
            is_approved: self.is_approved,
        }
    }
}

/// Who the caller is, as far as the token says.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
    pub is_approved: ApprovalStatus,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role(),
            is_approved: user.approval,
        }
    }
}
