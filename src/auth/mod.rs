/*!
 * # Authentication
 *
 * HS256 bearer tokens issued on register/login, and the middleware that
 * guards protected routes. Tokens carry the account email as subject, the
 * account id, its role names and any custom claims attached to those roles.
 */

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ServiceError;

pub mod password;

pub use password::{hash_password, verify_password, PasswordPolicy, PasswordPolicyError};

/// Custom claim copied from a role into issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomClaim {
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
}

/// JWT payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // account email
    pub jti: String,  // unique token id
    pub email: String,
    pub id: Uuid,
    pub role: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<CustomClaim>,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates access tokens.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    expiration: Duration,
}

impl TokenService {
    pub fn new(secret: impl Into<String>, expiration_secs: usize) -> Self {
        Self {
            secret: secret.into(),
            expiration: Duration::seconds(expiration_secs as i64),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.jwt_secret.clone(), config.jwt_expiration)
    }

    /// Signs a token for the account. Roles and custom claims are each
    /// included once, in first-seen order.
    pub fn generate(
        &self,
        account_id: Uuid,
        email: &str,
        roles: &[String],
        custom: &[CustomClaim],
    ) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: email.to_string(),
            jti: Uuid::new_v4().to_string(),
            email: email.to_string(),
            id: account_id,
            role: unique(roles),
            claims: unique(custom),
            iat: now.timestamp(),
            exp: (now + self.expiration).timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        debug!(account_id = %account_id, "Issued access token");
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> Result<Claims, ServiceError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }
}

fn unique<T: Clone + Eq + std::hash::Hash>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Rejects requests without a valid bearer token; on success the decoded
/// [`Claims`] are placed in the request extensions.
pub async fn auth_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        warn!(path = %request.uri().path(), "Missing bearer token");
        return ServiceError::Unauthorized("Missing bearer token".to_string()).into_response();
    };

    match tokens.validate(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            warn!(error = %e, "Rejected bearer token");
            e.into_response()
        }
    }
}
