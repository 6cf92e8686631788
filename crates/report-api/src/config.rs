//! Process configuration read from the environment.

use crate::auth::{Role, UserAccount};
use std::path::PathBuf;

const DEFAULT_LISTEN: &str = "0.0.0.0:8001";
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
/// Longest token lifetime accepted from the environment (30 days).
pub const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_USERS: &str = "admin:admin:admin,editor:editor:editor,viewer:viewer:viewer";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen: String,
    pub token_secret: String,
    pub token_ttl_secs: i64,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub users: Vec<UserAccount>,
}

impl ApiConfig {
    /// Read `REPORTS_*` variables; missing or unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        let listen = std::env::var("REPORTS_LISTEN").unwrap_or_else(|_| DEFAULT_LISTEN.to_string());
        let token_secret = std::env::var("REPORTS_TOKEN_SECRET").unwrap_or_else(|_| {
            tracing::warn!("REPORTS_TOKEN_SECRET not set; using an insecure development secret");
            "dev-secret-change-me".to_string()
        });
        let token_ttl_secs = parse_ttl(std::env::var("REPORTS_TOKEN_TTL_SECS").ok().as_deref());
        let upload_dir = std::env::var("REPORTS_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR));
        let max_upload_bytes = std::env::var("REPORTS_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        let users = parse_users(
            &std::env::var("REPORTS_USERS").unwrap_or_else(|_| DEFAULT_USERS.to_string()),
        );
        Self {
            listen,
            token_secret,
            token_ttl_secs,
            upload_dir,
            max_upload_bytes,
            users,
        }
    }
}

/// Token lifetime in seconds; values outside `1..=MAX_TOKEN_TTL_SECS` fall back to the default.
pub fn parse_ttl(raw: Option<&str>) -> i64 {
    match raw.and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(v) if (1..=MAX_TOKEN_TTL_SECS).contains(&v) => v,
        Some(v) => {
            tracing::warn!(ttl_secs = v, "REPORTS_TOKEN_TTL_SECS out of range; using default");
            DEFAULT_TOKEN_TTL_SECS
        }
        None => DEFAULT_TOKEN_TTL_SECS,
    }
}

/// Parse `name:password:role` triples separated by commas. Malformed items are skipped.
pub fn parse_users(raw: &str) -> Vec<UserAccount> {
    raw.split(',')
        .filter_map(|item| {
            let mut parts = item.trim().splitn(3, ':');
            let username = parts.next()?.trim();
            let password = parts.next()?;
            let role = Role::parse(parts.next()?)?;
            if username.is_empty() {
                return None;
            }
            Some(UserAccount {
                username: username.to_string(),
                password: password.to_string(),
                role,
            })
        })
        .collect()
}
