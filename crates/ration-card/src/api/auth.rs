use std::collections::HashMap;
use std::sync::RwLock;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::error::ApiError;
use super::router::ApiState;
use crate::access::Principal;

/// Resolves bearer tokens issued by the identity subsystem.
pub trait SessionVerifier: Send + Sync {
    fn resolve(&self, token: &str) -> Result<Principal, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid or expired session")]
    UnknownSession,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Fixed token table, loaded at startup.
#[derive(Debug, Default)]
pub struct StaticSessions {
    sessions: RwLock<HashMap<String, Principal>>,
}

impl StaticSessions {
    pub fn with_sessions(sessions: impl IntoIterator<Item = (String, Principal)>) -> Self {
        Self {
            sessions: RwLock::new(sessions.into_iter().collect()),
        }
    }

    pub fn grant(&self, token: impl Into<String>, principal: Principal) -> Result<(), AuthError> {
        self.sessions
            .write()
            .map_err(|_| AuthError::Unavailable("session table lock poisoned".to_string()))?
            .insert(token.into(), principal);
        Ok(())
    }
}

impl SessionVerifier for StaticSessions {
    fn resolve(&self, token: &str) -> Result<Principal, AuthError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| AuthError::Unavailable("session table lock poisoned".to_string()))?;
        sessions.get(token).cloned().ok_or(AuthError::UnknownSession)
    }
}

/// Token of an `Authorization` value; the scheme name is case-insensitive.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim_start().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Extractor yielding the verified caller of a request.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

#[axum::async_trait]
impl FromRequestParts<ApiState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AuthError::MissingToken)?;

        let principal = state.sessions.resolve(token)?;
        Ok(Self(principal))
    }
}
