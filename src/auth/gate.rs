//! Route-prefix access gate for browser page navigations.
//!
//! Every rejection is a redirect: to the sign-in page, or to the
//! pending-approval page for an employer whose token says it is not yet
//! approved. The gate trusts the token snapshot and never hits the store.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use super::{claims::Identity, jwt::JwtKeys, session::token_from_headers};
use crate::users::model::{ApprovalStatus, Role};

pub const SIGN_IN_PATH: &str = "/auth/signin";
pub const PENDING_PATH: &str = "/auth/pending";

/// Protected page area a path falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Admin,
    Employer,
    Student,
    /// Any signed-in role.
    Member,
}

impl Area {
    fn required_role(&self) -> Option<Role> {
        match self {
            Area::Admin => Some(Role::Admin),
            Area::Employer => Some(Role::Employer),
            Area::Student => Some(Role::Student),
            Area::Member => None,
        }
    }
}

const PROTECTED: &[(&str, Area)] = &[
    ("/admin", Area::Admin),
    ("/employer", Area::Employer),
    ("/student", Area::Student),
    ("/jobs", Area::Member),
    ("/profile", Area::Member),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    SignIn,
    Pending,
}

/// `/admin` and `/admin/...` match; `/administrator` does not.
fn under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

pub fn protected_area(path: &str) -> Option<Area> {
    PROTECTED
        .iter()
        .find(|(prefix, _)| under(path, prefix))
        .map(|(_, area)| *area)
}

/// `identity` is `None` when the token was absent, invalid or expired.
pub fn decide(area: Area, identity: Option<&Identity>) -> GateDecision {
    let Some(identity) = identity else {
        return GateDecision::SignIn;
    };
    if let Some(role) = area.required_role() {
        if identity.role != role {
            return GateDecision::SignIn;
        }
    }
    // Only the employer area checks approval. Students start approved and
    // admins have no approval lifecycle.
    if area == Area::Employer && identity.is_approved != ApprovalStatus::Approved {
        return GateDecision::Pending;
    }
    GateDecision::Allow
}

pub async fn page_gate(State(keys): State<JwtKeys>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    let Some(area) = protected_area(&path) else {
        return next.run(req).await;
    };

    let identity = match token_from_headers(req.headers()) {
        None => {
            debug!(%path, "no session token");
            None
        }
        Some(token) => match keys.verify(&token) {
            Ok(claims) => Some(claims.identity()),
            Err(e) => {
                debug!(%path, error = %e, "session token rejected");
                None
            }
        },
    };

    match decide(area, identity.as_ref()) {
        GateDecision::Allow => next.run(req).await,
        GateDecision::SignIn => {
            debug!(%path, ?area, "redirecting to sign-in");
            Redirect::temporary(SIGN_IN_PATH).into_response()
        }
        GateDecision::Pending => {
            debug!(%path, "employer not approved; redirecting to pending page");
            Redirect::temporary(PENDING_PATH).into_response()
        }
    }
}
