// src/controllers/analytics_controller.rs
use actix_web::{HttpRequest, HttpResponse, get, web};
use serde_json::json;

use crate::auth::JwtAuth;
use crate::engine;
use crate::error::ApiError;
use crate::store::FeedbackStore;

// Dashboard report. A store fault is a 500; no partial or empty report is served.
#[get("/api/analytics")]
pub async fn get_analytics(
    req: HttpRequest,
    store: web::Data<dyn FeedbackStore>,
    auth: web::Data<JwtAuth>,
) -> Result<HttpResponse, ApiError> {
    auth.verify_jwt(&req)?;

    let report = engine::summarize(store.get_ref())
        .await
        .map_err(|e| ApiError::store("Failed to retrieve analytics data", e))?;

    Ok(HttpResponse::Ok().json(json!({
        "error": false,
        "data": report,
    })))
}

#[get("/api/analytics/summary")]
pub async fn get_stats_summary(
    req: HttpRequest,
    store: web::Data<dyn FeedbackStore>,
    auth: web::Data<JwtAuth>,
) -> Result<HttpResponse, ApiError> {
    auth.verify_jwt(&req)?;

    let stats = store
        .stats_summary()
        .await
        .map_err(|e| ApiError::store("Failed to retrieve summary statistics", e))?;

    Ok(HttpResponse::Ok().json(json!({
        "error": false,
        "data": stats,
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_stats_summary).service(get_analytics);
}
