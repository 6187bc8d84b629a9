use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, info, instrument, warn};

use crate::{
    auth::{
        claims::Identity,
        dto::{AccountResponse, AuthResponse, LoginRequest, MessageResponse, SessionResponse},
        extractors::CurrentUser,
        password::{hash_password, verify_decoy, verify_password},
        session::{expired_session_cookie, session_cookie, token_from_headers},
        validation::{validate_login, validate_signup},
    },
    error::AppError,
    state::AppState,
    users::model::{NewUser, PublicUser},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/signout", post(signout))
        .route("/auth/session", get(session))
        .route("/auth/account", get(account))
}

fn bad_body(rejection: JsonRejection) -> AppError {
    AppError::invalid("body", rejection.body_text())
}

#[instrument(skip(state, jar, body))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let Json(body) = body.map_err(bad_body)?;
    let data = validate_signup(body).map_err(|e| {
        if let AppError::Validation(errors) = &e {
            warn!(fields = ?errors.fields().collect::<Vec<_>>(), "signup payload rejected");
        }
        e
    })?;

    if !state.keys.is_configured() {
        return Err(AppError::Configuration("JWT_SECRET is not set"));
    }

    if state.users.find_any_by_email(&data.email).await?.is_some() {
        warn!(email = %data.email, "email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let password_hash = hash_password(&data.password)?;
    let user = state
        .users
        .create_user(NewUser {
            email: data.email,
            password_hash,
            avatar_url: data.avatar_url,
            profile: data.profile,
        })
        .await?;

    let token = state.keys.issue_session(Identity::from(&user))?;

    info!(user_id = %user.id, role = %user.role(), approval = %user.approval, "user signed up");
    Ok((
        StatusCode::CREATED,
        jar.add(session_cookie(token, state.keys.ttl, state.config.production)),
        Json(AuthResponse {
            user: PublicUser::from(&user),
            message: "Signup successful",
        }),
    ))
}

#[instrument(skip(state, jar, body))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let Json(payload) = body.map_err(bad_body)?;
    let payload = validate_login(payload)?;

    // Unknown email and wrong password are reported identically.
    let user = match state.users.find_any_by_email(&payload.email).await? {
        Some(u) => u,
        None => {
            verify_decoy(&payload.password);
            warn!(email = %payload.email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.keys.issue_session(Identity::from(&user))?;

    info!(user_id = %user.id, role = %user.role(), "user logged in");
    Ok((
        jar.add(session_cookie(token, state.keys.ttl, state.config.production)),
        Json(AuthResponse {
            user: PublicUser::from(&user),
            message: "Login successful",
        }),
    ))
}

#[instrument(skip(jar))]
pub async fn signout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(expired_session_cookie()),
        Json(MessageResponse {
            message: "Logged out successfully",
        }),
    )
}

/// Never fails: anything short of a valid token for an existing user is an
/// empty session.
#[instrument(skip(state, headers))]
pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> Json<SessionResponse> {
    let empty = SessionResponse {
        user: None,
        expires: None,
    };
    let Some(token) = token_from_headers(&headers) else {
        return Json(empty);
    };
    let claims = match state.keys.verify(&token) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "session token rejected");
            return Json(empty);
        }
    };
    match state.users.find_by_id(claims.user_id, claims.role).await {
        Ok(Some(user)) => Json(SessionResponse {
            user: Some(PublicUser::from(&user)),
            expires: Some(claims.exp),
        }),
        Ok(None) => Json(empty),
        Err(e) => {
            warn!(error = %e, "session lookup failed");
            Json(empty)
        }
    }
}

#[instrument(skip_all)]
pub async fn account(CurrentUser(user): CurrentUser) -> Json<AccountResponse> {
    Json(AccountResponse {
        user: PublicUser::from(&user),
    })
}
