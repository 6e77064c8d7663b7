// src/controllers/feedback_controller.rs
use actix_web::{HttpRequest, HttpResponse, delete, get, post, web};
use serde_json::json;

use crate::auth::JwtAuth;
use crate::engine::{self, FeedbackPage};
use crate::error::ApiError;
use crate::models::feedback::FeedbackRequest;
use crate::models::filter::{FeedbackQuery, FilterCriteria};
use crate::store::FeedbackStore;

const NOT_FOUND: &str = "Feedback not found";

/// Ids that cannot name a stored record are reported the same as missing ones.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::NotFound(NOT_FOUND))
}

// Public submission
#[post("/api/feedback")]
pub async fn submit_feedback(
    store: web::Data<dyn FeedbackStore>,
    data: web::Json<FeedbackRequest>,
) -> Result<HttpResponse, ApiError> {
    let feedback = data.into_inner().into_new_feedback().map_err(|details| {
        log::debug!("feedback submission rejected: {} field(s)", details.len());
        ApiError::Validation(details)
    })?;

    let record = store
        .insert(feedback)
        .await
        .map_err(|e| ApiError::store("Failed to submit feedback", e))?;

    log::info!("feedback {} stored for product '{}'", record.id, record.product);

    Ok(HttpResponse::Created().json(json!({
        "error": false,
        "message": "Feedback submitted successfully",
        "data": record.view(),
    })))
}

// Admin listing with search and filters. A store fault is served as an
// empty page, never as a 500.
#[get("/api/feedback")]
pub async fn list_feedback(
    req: HttpRequest,
    store: web::Data<dyn FeedbackStore>,
    auth: web::Data<JwtAuth>,
    query: web::Query<FeedbackQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.verify_jwt(&req)?;

    let criteria = FilterCriteria::from_query(&query).map_err(ApiError::Validation)?;

    let page = match engine::query(store.get_ref(), &criteria).await {
        Ok(page) => page,
        Err(e) => {
            log::error!("Get feedback error, serving empty page: {}", e);
            FeedbackPage::empty(criteria.skip, criteria.limit)
        }
    };

    Ok(HttpResponse::Ok().json(json!({
        "error": false,
        "data": page.view(),
    })))
}

#[get("/api/feedback/{id}")]
pub async fn get_feedback(
    req: HttpRequest,
    store: web::Data<dyn FeedbackStore>,
    auth: web::Data<JwtAuth>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    auth.verify_jwt(&req)?;
    let id = parse_id(&path)?;

    let record = store
        .find_by_id(id)
        .await
        .map_err(|e| ApiError::store("Failed to retrieve feedback", e))?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    Ok(HttpResponse::Ok().json(json!({
        "error": false,
        "data": record.view(),
    })))
}

#[delete("/api/feedback/{id}")]
pub async fn delete_feedback(
    req: HttpRequest,
    store: web::Data<dyn FeedbackStore>,
    auth: web::Data<JwtAuth>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth.verify_jwt(&req)?;
    let id = parse_id(&path)?;

    let found = store
        .delete_by_id(id)
        .await
        .map_err(|e| ApiError::store("Failed to delete feedback", e))?;

    if !found {
        return Err(ApiError::NotFound(NOT_FOUND));
    }

    log::info!("feedback {} deleted by {}", id, claims.sub);

    Ok(HttpResponse::Ok().json(json!({
        "error": false,
        "message": "Feedback deleted successfully",
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(submit_feedback)
        .service(list_feedback)
        .service(get_feedback)
        .service(delete_feedback);
}
