//! API-side access control. Unlike the page gate these reject with JSON
//! 401/403 bodies instead of redirects.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::{
    claims::Identity,
    session::{resolve_current_user, token_from_headers},
};
use crate::{
    error::AppError,
    state::AppState,
    users::model::{Role, User},
};

/// Token-only identity; role and approval are the issuance-time snapshot.
#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
        let claims = state.keys.verify(&token).map_err(|e| {
            warn!(error = %e, path = %parts.uri.path(), "rejected token");
            e
        })?;
        Ok(claims.identity())
    }
}

/// Caller re-read from the credential store.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
        let user = resolve_current_user(state.users.as_ref(), &state.keys, &token).await?;
        Ok(CurrentUser(user))
    }
}

pub struct AdminOnly(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        if identity.role != Role::Admin {
            return Err(AppError::Forbidden("Only admins can access this endpoint"));
        }
        Ok(AdminOnly(identity))
    }
}

pub struct StudentOnly(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for StudentOnly {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        if identity.role != Role::Student {
            return Err(AppError::Forbidden("Only students can access this endpoint"));
        }
        Ok(StudentOnly(identity))
    }
}

/// Employer whose *current* stored status is approved, so an approval or
/// rejection takes effect on the API without waiting for a new token.
pub struct ApprovedEmployer(pub User);

#[async_trait]
impl FromRequestParts<AppState> for ApprovedEmployer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.role() != Role::Employer {
            return Err(AppError::Forbidden("Only employers can access this endpoint"));
        }
        if !user.is_approved() {
            return Err(AppError::Forbidden("Employer account is not approved"));
        }
        Ok(ApprovedEmployer(user))
    }
}
