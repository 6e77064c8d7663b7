pub mod analytics_controller;
pub mod feedback_controller;

use actix_web::web::{self, JsonConfig};

use crate::error::ApiError;
use crate::models::feedback::FieldError;

/// JSON extractor settings; malformed bodies get the standard error envelope.
pub fn json_config(limit: usize) -> JsonConfig {
    JsonConfig::default()
        .limit(limit)
        .content_type_required(false)
        .error_handler(|err, _req| {
            log::debug!("JSON payload error: {}", err);
            ApiError::Validation(vec![FieldError {
                field: "body".to_string(),
                message: err.to_string(),
            }])
            .into()
        })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(feedback_controller::configure)
        .configure(analytics_controller::configure);
}
