use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::Role;
use crate::services::lifecycle_service::Actor;

const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: String,
}

#[derive(Clone)]
pub struct AuthConfig {
    secret: Arc<str>,
}

impl AuthConfig {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Signs an HS256 token for `user_id` valid for `ttl`.
    pub fn issue_token(&self, user_id: Uuid, role: Role, ttl: Duration) -> Result<String> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (Utc::now() + ttl).timestamp().max(0) as usize,
            role: role.as_str().to_string(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| Error::Internal(format!("failed to sign token: {}", e)))
    }

    fn verify(&self, token: &str) -> Result<AuthUser> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| Error::Unauthorized("invalid_token".into()))?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| Error::Unauthorized("invalid_token".into()))?;
        let role = data
            .claims
            .role
            .parse::<Role>()
            .map_err(|_| Error::Unauthorized("invalid_token".into()))?;
        Ok(AuthUser { user_id, role })
    }
}

/// Caller identity taken from a Bearer header or the `token` cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl From<AuthUser> for Actor {
    fn from(user: AuthUser) -> Self {
        Actor::new(user.user_id, user.role)
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header
        .to_str()
        .map_err(|_| Error::Unauthorized("bad_authorization".into()))?;
    value
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or_else(|| Error::Unauthorized("unsupported_scheme".into()))
}

fn cookie_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let config = AuthConfig::from_ref(state);
        let token = match bearer_token(parts)? {
            Some(token) => token,
            None => cookie_token(parts)
                .ok_or_else(|| Error::Unauthorized("missing_authorization".into()))?,
        };
        config.verify(token)
    }
}
