use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use homecare_core::config::MAX_SESSION_TTL_MINS;
use homecare_users::User;
use tracing::debug;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ServiceError;
use crate::service::Caller;

struct SessionEntry {
    caller: Caller,
    expires_at: DateTime<Utc>,
}

/// Bearer tokens issued at login. In-process only: a restart logs
/// everyone out.
pub struct SessionRegistry {
    sessions: DashMap<String, SessionEntry>,
    ttl: Duration,
}

/// What a client receives after a successful login.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionRegistry {
    /// `ttl_mins` is clamped to `0..=MAX_SESSION_TTL_MINS`.
    pub fn new(ttl_mins: i64) -> Self {
        let ttl_mins = ttl_mins.clamp(0, MAX_SESSION_TTL_MINS);
        Self {
            sessions: DashMap::new(),
            ttl: Duration::try_minutes(ttl_mins).unwrap_or_else(Duration::zero),
        }
    }

    pub fn issue(&self, user: &User) -> IssuedSession {
        self.purge_expired();
        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + self.ttl;
        self.sessions.insert(
            token.clone(),
            SessionEntry {
                caller: Caller {
                    username: user.username.clone(),
                    role: user.role,
                },
                expires_at,
            },
        );
        debug!(username = %user.username, active = self.sessions.len(), "session issued");
        IssuedSession { token, expires_at }
    }

    /// The caller behind `token`, or `None` when unknown or expired.
    pub fn resolve(&self, token: &str) -> Option<Caller> {
        let now = Utc::now();
        let caller = {
            let entry = self.sessions.get(token)?;
            (entry.expires_at > now).then(|| entry.caller.clone())
        };
        if caller.is_none() {
            self.sessions.remove(token);
        }
        caller
    }

    /// Returns whether the token was live.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Drop every session held by `username`; returns how many were live.
    pub fn revoke_user(&self, username: &str) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| entry.caller.username != username);
        before.saturating_sub(self.sessions.len())
    }

    pub fn purge_expired(&self) {
        let now = Utc::now();
        self.sessions.retain(|_, entry| entry.expires_at > now);
    }

    pub fn active(&self) -> usize {
        self.sessions.len()
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(&parts.headers).ok_or_else(|| {
            ServiceError::Unauthorized(
                "set 'Authorization: Bearer <token>' from POST /login".to_string(),
            )
        })?;
        state
            .sessions
            .resolve(token)
            .ok_or_else(|| ServiceError::Unauthorized("session unknown or expired".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homecare_core::Role;

    fn user() -> User {
        User {
            username: "dr.q".into(),
            role: Role::Doctor,
            created_at: String::new(),
        }
    }

    #[test]
    fn issued_token_resolves_until_revoked() {
        let registry = SessionRegistry::new(60);
        let session = registry.issue(&user());
        let caller = registry.resolve(&session.token).unwrap();
        assert_eq!(caller.role, Role::Doctor);

        assert!(registry.revoke(&session.token));
        assert!(registry.resolve(&session.token).is_none());
        assert!(!registry.revoke(&session.token));
    }

    #[test]
    fn expired_sessions_do_not_resolve() {
        let registry = SessionRegistry::new(0);
        let session = registry.issue(&user());
        assert!(registry.resolve(&session.token).is_none());
        assert_eq!(registry.active(), 0);
    }

    #[test]
    fn revoke_user_drops_only_that_users_sessions() {
        let registry = SessionRegistry::new(60);
        let first = registry.issue(&user());
        let second = registry.issue(&user());
        let other = registry.issue(&User {
            username: "nurse.b".into(),
            role: Role::Staff,
            created_at: String::new(),
        });

        assert_eq!(registry.revoke_user("dr.q"), 2);
        assert!(registry.resolve(&first.token).is_none());
        assert!(registry.resolve(&second.token).is_none());
        assert!(registry.resolve(&other.token).is_some());
        assert_eq!(registry.revoke_user("dr.q"), 0);
    }

    #[test]
    fn oversized_ttl_is_clamped() {
        let registry = SessionRegistry::new(i64::MAX / 2);
        let session = registry.issue(&user());
        assert!(session.expires_at <= Utc::now() + Duration::minutes(MAX_SESSION_TTL_MINS));
        assert!(registry.resolve(&session.token).is_some());
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);
        headers.insert("authorization", "Basic abc".parse().unwrap());
        assert_eq!(extract_bearer(&headers), None);
        headers.insert("authorization", "Bearer tok-1".parse().unwrap());
        assert_eq!(extract_bearer(&headers), Some("tok-1"));
    }
}
