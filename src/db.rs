use sqlx::{MySql, Pool};

const CREATE_FEEDBACK_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS feedback (
    id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    email VARCHAR(255) NOT NULL,
    product VARCHAR(100) NOT NULL,
    nps INT NOT NULL,
    rating INT NOT NULL,
    feedback_text VARCHAR(1000) NOT NULL,
    sentiment VARCHAR(16) NOT NULL,
    created_at DATETIME(3) NOT NULL,
    updated_at DATETIME(3) NOT NULL,
    INDEX idx_feedback_email (email),
    INDEX idx_feedback_product (product),
    INDEX idx_feedback_created_at (created_at),
    INDEX idx_feedback_sentiment (sentiment),
    INDEX idx_feedback_rating (rating),
    INDEX idx_feedback_nps (nps),
    CONSTRAINT chk_feedback_nps CHECK (nps BETWEEN 0 AND 10),
    CONSTRAINT chk_feedback_rating CHECK (rating BETWEEN 1 AND 5),
    CONSTRAINT chk_feedback_sentiment CHECK (sentiment IN ('positive', 'neutral', 'negative'))
)
"#;

pub async fn establish_connection(
    database_url: &str,
    max_connections: u32,
) -> Result<Pool<MySql>, sqlx::Error> {
    let pool = sqlx::mysql::MySqlPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| {
            log::error!("Failed to create database pool: {:?}", e);
            e
        })?;

    Ok(pool)
}

/// Creates the feedback table and its indexes when missing.
pub async fn ensure_schema(pool: &Pool<MySql>) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_FEEDBACK_TABLE).execute(pool).await?;
    log::info!("feedback schema ready");
    Ok(())
}
