// src/models/analytics.rs
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::feedback::{FeedbackRecord, NpsCategory, Sentiment};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NpsCount {
    pub score: i32,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingCount {
    pub rating: i32,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentCount {
    pub sentiment: Sentiment,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: NpsCategory,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_feedback: i64,
    pub avg_rating: f64,
    pub avg_nps: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub nps_distribution: Vec<NpsCount>,
    pub rating_distribution: Vec<RatingCount>,
    pub sentiment_distribution: Vec<SentimentCount>,
    pub nps_categories: Vec<CategoryCount>,
    pub summary: ReportSummary,
}

/// Single-pass statistics over the whole collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_feedback: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_rating: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_nps: Decimal,
    pub total_promoters: i64,
    pub total_passives: i64,
    pub total_detractors: i64,
    pub positive_sentiment: i64,
    pub neutral_sentiment: i64,
    pub negative_sentiment: i64,
}

impl StatsSummary {
    /// Folds records into a summary using the same category rule as the
    /// grouping passes.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a FeedbackRecord>,
    {
        let mut stats = StatsSummary::default();
        let mut rating_sum: i64 = 0;
        let mut nps_sum: i64 = 0;

        for record in records {
            stats.total_feedback += 1;
            rating_sum += i64::from(record.rating);
            nps_sum += i64::from(record.nps);
            match record.nps_category() {
                NpsCategory::Promoter => stats.total_promoters += 1,
                NpsCategory::Passive => stats.total_passives += 1,
                NpsCategory::Detractor => stats.total_detractors += 1,
            }
            match record.sentiment {
                Sentiment::Positive => stats.positive_sentiment += 1,
                Sentiment::Neutral => stats.neutral_sentiment += 1,
                Sentiment::Negative => stats.negative_sentiment += 1,
            }
        }

        if stats.total_feedback > 0 {
            let total = Decimal::from(stats.total_feedback);
            stats.avg_rating = Decimal::from(rating_sum) / total;
            stats.avg_nps = Decimal::from(nps_sum) / total;
        }
        stats
    }

    pub fn category_count(&self, category: NpsCategory) -> i64 {
        match category {
            NpsCategory::Promoter => self.total_promoters,
            NpsCategory::Passive => self.total_passives,
            NpsCategory::Detractor => self.total_detractors,
        }
    }

    pub fn sentiment_count(&self, sentiment: Sentiment) -> i64 {
        match sentiment {
            Sentiment::Positive => self.positive_sentiment,
            Sentiment::Neutral => self.neutral_sentiment,
            Sentiment::Negative => self.negative_sentiment,
        }
    }
}
