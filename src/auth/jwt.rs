use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error};

use super::claims::{Claims, Identity};
use crate::{config::JwtConfig, error::AppError, state::AppState};

/// Longest lifetime a token may carry, whatever the configuration says.
pub const MAX_TTL: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Holds JWT signing and verification keys with config data.
///
/// Built once at startup. A missing secret does not stop the server; it
/// makes every issuance fail with a configuration error and every
/// verification fail as an invalid token.
#[derive(Clone)]
pub struct JwtKeys {
    keys: Option<(EncodingKey, DecodingKey)>,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        let keys = cfg.secret.as_ref().map(|secret| {
            (
                EncodingKey::from_secret(secret.as_bytes()),
                DecodingKey::from_secret(secret.as_bytes()),
            )
        });
        if keys.is_none() {
            error!("JWT_SECRET is not set; sign-in will fail until it is configured");
        }
        Self {
            keys,
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(
                u64::try_from(cfg.ttl_minutes)
                    .unwrap_or(0)
                    .saturating_mul(60),
            )
            .min(MAX_TTL),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    /// Token with the configured session lifetime.
    pub fn issue_session(&self, identity: Identity) -> Result<String, AppError> {
        self.issue(identity, self.ttl)
    }

    pub fn issue(&self, identity: Identity, ttl: Duration) -> Result<String, AppError> {
        self.issue_at(identity, ttl, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(
        &self,
        identity: Identity,
        ttl: Duration,
        now: OffsetDateTime,
    ) -> Result<String, AppError> {
        let (encoding, _) = self
            .keys
            .as_ref()
            .ok_or(AppError::Configuration("JWT_SECRET is not set"))?;
        let exp = now + TimeDuration::seconds(ttl.min(MAX_TTL).as_secs() as i64);
        let claims = Claims {
            user_id: identity.user_id,
            role: identity.role,
            is_approved: identity.is_approved,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, encoding)
            .map_err(|e| AppError::Internal(e.into()))?;
        debug!(user_id = %identity.user_id, role = %identity.role, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let (_, decoding) = self.keys.as_ref().ok_or(AppError::InvalidToken)?;
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::ExpiredToken,
            _ => AppError::InvalidToken,
        })?;
        debug!(user_id = %data.claims.user_id, role = %data.claims.role, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
pub(crate) fn test_keys(secret: &str) -> JwtKeys {
    JwtKeys::from_config(&JwtConfig {
        secret: Some(secret.into()),
        issuer: "test-issuer".into(),
        audience: "test-aud".into(),
        ttl_minutes: 60 * 24,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::model::{ApprovalStatus, Role};
    use uuid::Uuid;

    fn identity(role: Role, is_approved: ApprovalStatus) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            role,
            is_approved,
        }
    }

    #[test]
    fn issued_token_verifies_to_the_same_identity() {
        let keys = test_keys("dev-secret");
        let who = identity(Role::Employer, ApprovalStatus::Pending);
        let token = keys.issue_session(who).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.identity(), who);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn expired_token_is_rejected_without_grace() {
        let keys = test_keys("dev-secret");
        let issued = OffsetDateTime::now_utc() - TimeDuration::hours(2);
        let token = keys
            .issue_at(
                identity(Role::Student, ApprovalStatus::Approved),
                Duration::from_secs(60 * 60),
                issued,
            )
            .unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::ExpiredToken)));

        let just_past = OffsetDateTime::now_utc() - TimeDuration::seconds(2);
        let token = keys
            .issue_at(
                identity(Role::Student, ApprovalStatus::Approved),
                Duration::from_secs(1),
                just_past,
            )
            .unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::ExpiredToken)));
    }

    #[test]
    fn wrong_secret_or_garbage_is_invalid() {
        let token = test_keys("one")
            .issue_session(identity(Role::Admin, ApprovalStatus::Approved))
            .unwrap();
        assert!(matches!(
            test_keys("two").verify(&token),
            Err(AppError::InvalidToken)
        ));
        assert!(matches!(
            test_keys("one").verify("not.a.jwt"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good = test_keys("same-secret");
        let mut other = test_keys("same-secret");
        other.issuer = "someone-else".into();
        let token = good
            .issue_session(identity(Role::Student, ApprovalStatus::Approved))
            .unwrap();
        assert!(matches!(other.verify(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn missing_secret_is_a_configuration_error() {
        let keys = JwtKeys::from_config(&JwtConfig {
            secret: None,
            issuer: "i".into(),
            audience: "a".into(),
            ttl_minutes: 5,
        });
        assert!(!keys.is_configured());
        let err = keys
            .issue_session(identity(Role::Student, ApprovalStatus::Approved))
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(matches!(keys.verify("x.y.z"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn oversized_ttl_is_capped() {
        let keys = JwtKeys::from_config(&JwtConfig {
            secret: Some("s".into()),
            issuer: "i".into(),
            audience: "a".into(),
            ttl_minutes: i64::MAX,
        });
        assert_eq!(keys.ttl, MAX_TTL);

        let claims = keys
            .verify(
                &keys
                    .issue(identity(Role::Student, ApprovalStatus::Approved), Duration::MAX)
                    .unwrap(),
            )
            .unwrap();
        assert_eq!((claims.exp - claims.iat) as u64, MAX_TTL.as_secs());
    }
}
