//! Stateless signed tokens and role-based access checks.
//!
//! A token is `base64url(claims) "." base64url(hmac_sha256(secret, payload))`.
//! Claims carry the subject, its role and an expiry in unix seconds.
//!
//! `admin` and `editor` hold the same permissions on report routes; the
//! roles are kept apart so tokens record who was granted what.

use crate::error::ApiError;
use crate::server::AppState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Editor,
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Some(Role::Viewer),
            "editor" => Some(Role::Editor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }

    pub fn allows(self, permission: Permission) -> bool {
        match permission {
            Permission::Read => true,
            Permission::Write => matches!(self, Role::Editor | Role::Admin),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Read,
    Write,
}

/// Account allowed to request a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token expiry out of range")]
    ExpiryOutOfRange,
    #[error("invalid username or password")]
    BadCredentials,
}

/// Token issued to a caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// Identity attached to a request once its token is verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub subject: String,
    pub role: Role,
}

impl AuthContext {
    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        if self.role.allows(permission) {
            Ok(())
        } else {
            tracing::warn!(subject = %self.subject, role = self.role.as_str(), "permission denied");
            Err(ApiError::Forbidden(format!(
                "role {} may not perform this operation",
                self.role.as_str()
            )))
        }
    }
}

pub struct TokenAuthority {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl TokenAuthority {
    pub fn new(secret: impl Into<Vec<u8>>, ttl_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
        }
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256, AuthError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| AuthError::BadSignature)?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    pub fn issue(&self, subject: &str, role: Role) -> Result<IssuedToken, AuthError> {
        self.issue_at(subject, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let exp = now
            .timestamp()
            .checked_add(self.ttl_secs)
            .ok_or(AuthError::ExpiryOutOfRange)?;
        let claims = Claims {
            sub: subject.to_string(),
            role,
            exp,
        };
        let json = serde_json::to_vec(&claims).map_err(|_| AuthError::Malformed)?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or(AuthError::ExpiryOutOfRange)?;
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&payload)?.finalize().into_bytes());
        Ok(IssuedToken {
            token: format!("{}.{}", payload, signature),
            role,
            expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::BadSignature)?;
        self.mac(payload)?
            .verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;
        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| AuthError::Malformed)?;
        if claims.exp <= now.timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}

/// Check credentials against the configured accounts.
pub fn authenticate<'a>(
    users: &'a [UserAccount],
    username: &str,
    password: &str,
) -> Result<&'a UserAccount, AuthError> {
    // Digests have a fixed length, so the comparison does not depend on password length.
    let offered = Sha256::digest(password.as_bytes());
    users
        .iter()
        .find(|u| {
            let stored = Sha256::digest(u.password.as_bytes());
            u.username == username && bool::from(stored.as_slice().ct_eq(offered.as_slice()))
        })
        .ok_or(AuthError::BadCredentials)
}

fn bearer(req: &Request) -> Result<&str, AuthError> {
    let value = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::Missing)?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::Missing)
}

/// Middleware: verify the bearer token and insert an [`AuthContext`] extension.
pub async fn require_token(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = bearer(&req).and_then(|t| state.tokens.verify(t)).map_err(|e| {
        tracing::warn!(uri = %req.uri(), error = %e, "request rejected");
        ApiError::from(e)
    })?;
    req.extensions_mut().insert(AuthContext {
        subject: claims.sub,
        role: claims.role,
    });
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority() -> TokenAuthority {
        TokenAuthority::new("test-secret", 60)
    }

    #[test]
    fn issued_token_verifies() {
        let a = authority();
        let issued = a.issue("alice", Role::Editor).unwrap();
        let claims = a.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::Editor);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let a = authority();
        let issued = a.issue("alice", Role::Viewer).unwrap();
        let (_, sig) = issued.token.split_once('.').unwrap();
        let forged_claims = Claims {
            sub: "alice".to_string(),
            role: Role::Admin,
            exp: issued.expires_at.timestamp(),
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{}.{}", forged_payload, sig);
        assert_eq!(a.verify(&forged).unwrap_err(), AuthError::BadSignature);
    }

    #[test]
    fn other_secret_is_rejected() {
        let issued = authority().issue("alice", Role::Admin).unwrap();
        let other = TokenAuthority::new("another-secret", 60);
        assert_eq!(other.verify(&issued.token).unwrap_err(), AuthError::BadSignature);
    }

    #[test]
    fn expired_token_is_rejected() {
        let a = authority();
        let past = Utc::now() - chrono::TimeDelta::seconds(120);
        let issued = a.issue_at("alice", Role::Admin, past).unwrap();
        assert_eq!(a.verify(&issued.token).unwrap_err(), AuthError::Expired);
    }

    #[test]
    fn signature_is_keyed_hmac() {
        let a = authority();
        let issued = a.issue("alice", Role::Viewer).unwrap();
        let (payload, sig) = issued.token.split_once('.').unwrap();
        let mut mac = HmacSha256::new_from_slice(b"test-secret").unwrap();
        mac.update(payload.as_bytes());
        assert_eq!(sig, URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()));

        // A plain secret-prefixed digest is not accepted as a signature.
        let mut hasher = Sha256::new();
        hasher.update(b"test-secret.");
        hasher.update(payload.as_bytes());
        let prefixed = format!("{}.{}", payload, URL_SAFE_NO_PAD.encode(hasher.finalize()));
        assert_eq!(a.verify(&prefixed).unwrap_err(), AuthError::BadSignature);
    }

    #[test]
    fn undecodable_signature_is_rejected() {
        let issued = authority().issue("alice", Role::Viewer).unwrap();
        let (payload, _) = issued.token.split_once('.').unwrap();
        let forged = format!("{}.not*base64", payload);
        assert_eq!(authority().verify(&forged).unwrap_err(), AuthError::BadSignature);
    }

    #[test]
    fn oversized_ttl_is_an_error() {
        let a = TokenAuthority::new("s", i64::MAX);
        assert_eq!(
            a.issue("alice", Role::Admin).unwrap_err(),
            AuthError::ExpiryOutOfRange
        );
        // In range for i64 but beyond what chrono can represent.
        let a = TokenAuthority::new("s", i64::MAX / 2);
        assert_eq!(
            a.issue("alice", Role::Admin).unwrap_err(),
            AuthError::ExpiryOutOfRange
        );
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(authority().verify("nodot").unwrap_err(), AuthError::Malformed);
    }

    #[test]
    fn roles_gate_writes() {
        assert!(Role::Viewer.allows(Permission::Read));
        assert!(!Role::Viewer.allows(Permission::Write));
        assert!(Role::Editor.allows(Permission::Write));
        assert!(Role::Admin.allows(Permission::Write));
        assert_eq!(Role::parse(" Admin "), Some(Role::Admin));
    }

    #[test]
    fn admin_matches_editor_on_report_routes() {
        for permission in [Permission::Read, Permission::Write] {
            assert_eq!(
                Role::Admin.allows(permission),
                Role::Editor.allows(permission)
            );
        }
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn authenticate_checks_password() {
        let users = vec![UserAccount {
            username: "alice".to_string(),
            password: "pw".to_string(),
            role: Role::Editor,
        }];
        assert_eq!(authenticate(&users, "alice", "pw").unwrap().role, Role::Editor);
        assert_eq!(
            authenticate(&users, "alice", "nope").unwrap_err(),
            AuthError::BadCredentials
        );
        assert_eq!(
            authenticate(&users, "alice", "pw-and-more").unwrap_err(),
            AuthError::BadCredentials
        );
        assert_eq!(authenticate(&users, "alice", "").unwrap_err(), AuthError::BadCredentials);
        assert_eq!(
            authenticate(&users, "bob", "pw").unwrap_err(),
            AuthError::BadCredentials
        );
    }
}
