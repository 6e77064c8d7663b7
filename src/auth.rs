// src/auth.rs
use actix_web::HttpRequest;
use actix_web::http::header;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("Access token required")]
    Missing,
    #[error("Token expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
}

/// HS256 verifier plus the optional admin role allow-list.
#[derive(Clone)]
pub struct JwtAuth {
    secret: String,
    admin_roles: Vec<String>,
}

impl JwtAuth {
    pub fn new(secret: impl Into<String>, admin_roles: Vec<String>) -> Self {
        Self {
            secret: secret.into(),
            admin_roles,
        }
    }

    pub fn generate_jwt(
        &self,
        subject: &str,
        role: &str,
        ttl: chrono::Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: subject.to_string(),
            role: role.to_string(),
            exp: (Utc::now() + ttl).timestamp().max(0) as usize,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    pub fn authenticate(&self, token: &str) -> Result<Claims, AuthFailure> {
        if token.trim().is_empty() {
            return Err(AuthFailure::Missing);
        }

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthFailure::Expired,
            _ => {
                log::debug!("JWT verification failed: {:?}", e);
                AuthFailure::Invalid
            }
        })
    }

    /// Authenticates the caller of an admin endpoint.
    ///
    /// The token comes from `Authorization: Bearer ...`, or from the
    /// `access_token` cookie when no header is sent. When an allow-list of
    /// roles is configured the caller's role must be on it.
    pub fn verify_jwt(&self, req: &HttpRequest) -> Result<Claims, ApiError> {
        let token = bearer_token(req)
            .or_else(|| req.cookie("access_token").map(|c| c.value().to_string()))
            .ok_or_else(|| {
                log::debug!("no access token on request to {}", req.path());
                AuthFailure::Missing
            })?;

        let claims = self.authenticate(&token)?;

        if !self.admin_roles.is_empty() && !self.admin_roles.iter().any(|r| r == &claims.role) {
            log::warn!(
                "role '{}' of '{}' denied on {}",
                claims.role,
                claims.sub,
                req.path()
            );
            return Err(ApiError::Forbidden);
        }

        Ok(claims)
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    Some(token.to_string())
}
