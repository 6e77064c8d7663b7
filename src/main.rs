// main.rs
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;

use feedback_service::auth::JwtAuth;
use feedback_service::config::{AppConfig, StoreBackend};
use feedback_service::store::{FeedbackStore, MemoryFeedbackStore, MySqlFeedbackStore};
use feedback_service::{controllers, db};

async fn build_store(config: &AppConfig) -> Result<Arc<dyn FeedbackStore>, sqlx::Error> {
    match (config.store, config.database_url.as_deref()) {
        (StoreBackend::MySql, Some(url)) => {
            let pool = db::establish_connection(url, config.max_connections).await?;
            db::ensure_schema(&pool).await?;
            Ok(Arc::new(MySqlFeedbackStore::new(pool)))
        }
        (StoreBackend::MySql, None) => Err(sqlx::Error::Configuration(
            "DATABASE_URL not found in environment".into(),
        )),
        (StoreBackend::Memory, _) => {
            log::warn!("using in-memory feedback store; records are lost on restart");
            Ok(Arc::new(MemoryFeedbackStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("starting up...");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let store = match build_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to initialise feedback store: {:?}", e);
            std::process::exit(1);
        }
    };

    let store: web::Data<dyn FeedbackStore> = web::Data::from(store);
    let auth = web::Data::new(JwtAuth::new(
        config.jwt_secret.clone(),
        config.admin_roles.clone(),
    ));
    let cors_origin = config.cors_origin.clone();
    let json_limit = config.json_limit;

    log::info!("listening on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(store.clone())
            .app_data(auth.clone())
            .app_data(controllers::json_config(json_limit))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(controllers::configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}
