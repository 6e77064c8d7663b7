// src/store/mysql.rs
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};

use super::{FeedbackStore, GroupCount, GroupKey, StoreError};
use crate::models::analytics::StatsSummary;
use crate::models::feedback::{FeedbackRecord, FeedbackRow, NewFeedback, NpsCategory};
use crate::models::filter::FilterCriteria;

const SELECT_COLUMNS: &str = "SELECT id, name, email, product, nps, rating, feedback_text, \
     sentiment, created_at, updated_at FROM feedback";

#[derive(Clone)]
pub struct MySqlFeedbackStore {
    pool: MySqlPool,
}

impl MySqlFeedbackStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Escapes `LIKE` metacharacters and wraps the needle for a contains match.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_clause<'q, 'a>(
    qb: &'q mut QueryBuilder<'a, MySql>,
    first: &mut bool,
) -> &'q mut QueryBuilder<'a, MySql> {
    qb.push(if *first { " WHERE " } else { " AND " });
    *first = false;
    qb
}

/// Appends `WHERE ...` for every present criterion, joined with `AND`.
fn push_where(qb: &mut QueryBuilder<'_, MySql>, criteria: &FilterCriteria) {
    let mut first = true;

    if let Some(q) = &criteria.q {
        let pattern = like_pattern(q);
        push_clause(qb, &mut first)
            .push("(LOWER(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(product) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(feedback_text) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(product) = &criteria.product {
        push_clause(qb, &mut first)
            .push("LOWER(product) LIKE ")
            .push_bind(like_pattern(product));
    }
    if let Some(rating) = criteria.rating {
        push_clause(qb, &mut first).push("rating = ").push_bind(rating);
    }
    if let Some(sentiment) = criteria.sentiment {
        push_clause(qb, &mut first)
            .push("sentiment = ")
            .push_bind(sentiment.as_str());
    }
    if let Some(from) = criteria.from {
        push_clause(qb, &mut first)
            .push("created_at >= ")
            .push_bind(from);
    }
    if let Some(to) = criteria.to {
        push_clause(qb, &mut first).push("created_at <= ").push_bind(to);
    }
}

fn into_record(row: FeedbackRow) -> Result<FeedbackRecord, StoreError> {
    let id = row.id;
    FeedbackRecord::try_from(row).map_err(|e| StoreError::Corrupt {
        id,
        reason: e.to_string(),
    })
}

#[async_trait]
impl FeedbackStore for MySqlFeedbackStore {
    async fn find(&self, criteria: &FilterCriteria) -> Result<Vec<FeedbackRecord>, StoreError> {
        let mut qb: QueryBuilder<MySql> = QueryBuilder::new(SELECT_COLUMNS);
        push_where(&mut qb, criteria);
        qb.push(" ORDER BY created_at DESC, id ASC LIMIT ")
            .push_bind(criteria.limit)
            .push(" OFFSET ")
            .push_bind(criteria.skip);

        let rows = qb
            .build_query_as::<FeedbackRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(into_record).collect()
    }

    async fn count(&self, criteria: &FilterCriteria) -> Result<i64, StoreError> {
        let mut qb: QueryBuilder<MySql> = QueryBuilder::new("SELECT COUNT(*) FROM feedback");
        push_where(&mut qb, criteria);

        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn aggregate(&self, key: GroupKey) -> Result<Vec<GroupCount>, StoreError> {
        let sql = match key {
            GroupKey::Nps => {
                "SELECT CAST(nps AS CHAR) AS bucket, COUNT(*) AS count FROM feedback GROUP BY nps"
                    .to_string()
            }
            GroupKey::Rating => {
                "SELECT CAST(rating AS CHAR) AS bucket, COUNT(*) AS count FROM feedback GROUP BY rating"
                    .to_string()
            }
            GroupKey::Sentiment => {
                "SELECT sentiment AS bucket, COUNT(*) AS count FROM feedback GROUP BY sentiment"
                    .to_string()
            }
            GroupKey::NpsCategory => format!(
                "SELECT {} AS bucket, COUNT(*) AS count FROM feedback GROUP BY bucket",
                NpsCategory::sql_case("nps")
            ),
        };

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                let bucket: String = row.try_get("bucket")?;
                let count: i64 = row.try_get("count")?;
                Ok::<_, StoreError>((bucket, count))
            })
            .collect()
    }

    async fn stats_summary(&self) -> Result<StatsSummary, StoreError> {
        let case = NpsCategory::sql_case("nps");
        let sql = format!(
            r#"
            SELECT
                COUNT(*) AS total_feedback,
                COALESCE(AVG(rating), 0) AS avg_rating,
                COALESCE(AVG(nps), 0) AS avg_nps,
                CAST(COALESCE(SUM(CASE WHEN {case} = 'Promoter' THEN 1 ELSE 0 END), 0) AS SIGNED) AS total_promoters,
                CAST(COALESCE(SUM(CASE WHEN {case} = 'Passive' THEN 1 ELSE 0 END), 0) AS SIGNED) AS total_passives,
                CAST(COALESCE(SUM(CASE WHEN {case} = 'Detractor' THEN 1 ELSE 0 END), 0) AS SIGNED) AS total_detractors,
                CAST(COALESCE(SUM(sentiment = 'positive'), 0) AS SIGNED) AS positive_sentiment,
                CAST(COALESCE(SUM(sentiment = 'neutral'), 0) AS SIGNED) AS neutral_sentiment,
                CAST(COALESCE(SUM(sentiment = 'negative'), 0) AS SIGNED) AS negative_sentiment
            FROM feedback
            "#
        );

        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        Ok(StatsSummary {
            total_feedback: row.try_get("total_feedback")?,
            avg_rating: row.try_get("avg_rating")?,
            avg_nps: row.try_get("avg_nps")?,
            total_promoters: row.try_get("total_promoters")?,
            total_passives: row.try_get("total_passives")?,
            total_detractors: row.try_get("total_detractors")?,
            positive_sentiment: row.try_get("positive_sentiment")?,
            neutral_sentiment: row.try_get("neutral_sentiment")?,
            negative_sentiment: row.try_get("negative_sentiment")?,
        })
    }

    async fn insert(&self, feedback: NewFeedback) -> Result<FeedbackRecord, StoreError> {
        // DATETIME(3) keeps milliseconds; truncate so the returned record
        // matches what a later read sees.
        let now = Utc::now().trunc_subsecs(3);

        let result = sqlx::query(
            r#"
            INSERT INTO feedback
            (name, email, product, nps, rating, feedback_text, sentiment, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&feedback.name)
        .bind(&feedback.email)
        .bind(&feedback.product)
        .bind(feedback.nps)
        .bind(feedback.rating)
        .bind(&feedback.feedback_text)
        .bind(feedback.sentiment.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = i64::try_from(result.last_insert_id()).map_err(|_| StoreError::Corrupt {
            id: -1,
            reason: format!("insert id {} out of range", result.last_insert_id()),
        })?;

        Ok(FeedbackRecord {
            id,
            name: feedback.name,
            email: feedback.email,
            product: feedback.product,
            nps: feedback.nps,
            rating: feedback.rating,
            feedback_text: feedback.feedback_text,
            sentiment: feedback.sentiment,
            created_at: now,
            updated_at: now,
        })
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM feedback WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FeedbackRecord>, StoreError> {
        let row = sqlx::query_as::<_, FeedbackRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(into_record).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feedback::Sentiment;
    use chrono::TimeZone;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Widget"), "%widget%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn where_clause_is_empty_without_criteria() {
        let mut qb: QueryBuilder<MySql> = QueryBuilder::new("SELECT COUNT(*) FROM feedback");
        push_where(&mut qb, &FilterCriteria::default());
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM feedback");
    }

    #[test]
    fn where_clause_joins_present_criteria_with_and() {
        let criteria = FilterCriteria {
            q: Some("fast".into()),
            product: Some("Widget".into()),
            rating: Some(3),
            sentiment: Some(Sentiment::Negative),
            from: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
            ..FilterCriteria::default()
        };
        let mut qb: QueryBuilder<MySql> = QueryBuilder::new("SELECT COUNT(*) FROM feedback");
        push_where(&mut qb, &criteria);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM feedback WHERE \
             (LOWER(name) LIKE ? OR LOWER(product) LIKE ? OR LOWER(feedback_text) LIKE ?) \
             AND LOWER(product) LIKE ? AND rating = ? AND sentiment = ? \
             AND created_at >= ? AND created_at <= ?"
        );
    }
}
