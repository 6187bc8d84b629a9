use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// The three user partitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Employer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Employer => "employer",
            Role::Admin => "admin",
        }
    }

    /// Approval status a freshly signed-up account starts with.
    pub fn initial_approval(&self) -> ApprovalStatus {
        match self {
            Role::Employer => ApprovalStatus::Pending,
            Role::Student | Role::Admin => ApprovalStatus::Approved,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "employer" => Ok(Role::Employer),
            "admin" => Ok(Role::Admin),
            other => anyhow::bail!("unknown role {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => anyhow::bail!("unknown approval status {other:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentProfile {
    pub first_name: String,
    pub last_name: String,
    pub education: String,
    pub skills: Vec<String>,
    pub experience: Option<String>,
    pub phone_number: Option<String>,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployerProfile {
    pub company_name: String,
    pub location: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminProfile {
    pub name: String,
}

/// Role-specific part of a user record; the variant *is* the role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    Student(StudentProfile),
    Employer(EmployerProfile),
    Admin(AdminProfile),
}

impl Profile {
    pub fn role(&self) -> Role {
        match self {
            Profile::Student(_) => Role::Student,
            Profile::Employer(_) => Role::Employer,
            Profile::Admin(_) => Role::Admin,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Profile::Student(s) => format!("{} {}", s.first_name, s.last_name),
            Profile::Employer(e) => e.company_name.clone(),
            Profile::Admin(a) => a.name.clone(),
        }
    }
}

/// User record as held by the credential store. Never serialised directly.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub approval: ApprovalStatus,
    pub avatar_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub profile: Profile,
}

impl User {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    /// Admins carry no approval gate.
    pub fn is_approved(&self) -> bool {
        self.role() == Role::Admin || self.approval == ApprovalStatus::Approved
    }
}

/// Input for `UserStore::create_user`; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub profile: Profile,
}

impl NewUser {
    pub fn role(&self) -> Role {
        self.profile.role()
    }
}

/// Role-shaped public view of a user; the password hash has no way in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub is_approved: ApprovalStatus,
    pub name: String,
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(flatten)]
    pub details: PublicDetails,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PublicDetails {
    #[serde(rename_all = "camelCase")]
    Student {
        first_name: String,
        last_name: String,
        education: String,
        skills: Vec<String>,
        experience: Option<String>,
        phone_number: Option<String>,
        location: String,
    },
    #[serde(rename_all = "camelCase")]
    Employer {
        company_name: String,
        location: String,
        industry: Option<String>,
        website: Option<String>,
        description: Option<String>,
    },
    Admin {},
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        let details = match &user.profile {
            Profile::Student(s) => PublicDetails::Student {
                first_name: s.first_name.clone(),
                last_name: s.last_name.clone(),
                education: s.education.clone(),
                skills: s.skills.clone(),
                experience: s.experience.clone(),
                phone_number: s.phone_number.clone(),
                location: s.location.clone(),
            },
            Profile::Employer(e) => PublicDetails::Employer {
                company_name: e.company_name.clone(),
                location: e.location.clone(),
                industry: e.industry.clone(),
                website: e.website.clone(),
                description: e.description.clone(),
            },
            Profile::Admin(_) => PublicDetails::Admin {},
        };
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role(),
            is_approved: user.approval,
            name: user.profile.display_name(),
            image: user.avatar_url.clone(),
            created_at: user.created_at,
            details,
        }
    }
}
