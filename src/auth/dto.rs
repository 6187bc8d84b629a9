use serde::{Deserialize, Serialize};

use crate::users::model::PublicUser;

/// Signup fields for each role, read leniently from the raw body so that a
/// wrong-typed value is reported under its own field name.
#[derive(Debug, Default)]
pub struct StudentSignup {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub education: String,
    pub skills: Vec<String>,
    pub experience: Option<String>,
    pub phone_number: Option<String>,
    pub location: String,
    pub image: Option<String>,
}

#[derive(Debug, Default)]
pub struct EmployerSignup {
    pub email: String,
    pub password: String,
    pub company_name: String,
    pub location: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub description: String,
    pub image: Option<String>,
}

#[derive(Debug, Default)]
pub struct AdminSignup {
    pub email: String,
    pub password: String,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after signup or login. The token itself travels only
/// in the http-only cookie.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Option<PublicUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
