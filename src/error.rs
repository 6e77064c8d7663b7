// src/error.rs
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthFailure;
use crate::models::feedback::FieldError;
use crate::store::StoreError;

/// Every failure an endpoint can surface. Responses always carry
/// `"error": true` and a message; store diagnostics stay in the logs.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    Auth(#[from] AuthFailure),

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{context}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    /// Wraps a store fault, logging the underlying cause.
    pub fn store(context: &'static str, source: StoreError) -> Self {
        log::error!("{}: {}", context, source);
        ApiError::Store { context, source }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(details) => json!({
                "error": true,
                "message": self.to_string(),
                "details": details,
            }),
            _ => json!({
                "error": true,
                "message": self.to_string(),
            }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
