// src/engine/analytics.rs
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::analytics::{
    AnalyticsReport, CategoryCount, NpsCount, RatingCount, ReportSummary, SentimentCount,
    StatsSummary,
};
use crate::models::feedback::{NpsCategory, Sentiment};
use crate::store::{FeedbackStore, GroupCount, GroupKey, StoreError};

pub const NPS_SCORES: std::ops::RangeInclusive<i32> = 0..=10;
pub const RATING_VALUES: std::ops::RangeInclusive<i32> = 1..=5;

/// Count for `key` in a raw grouping, 0 when the bucket is absent.
fn bucket(raw: &[GroupCount], key: &str) -> i64 {
    raw.iter()
        .filter(|(k, _)| k == key)
        .map(|(_, count)| *count)
        .sum()
}

/// Rounds half away from zero to two decimal places.
pub fn round2(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

fn densify_nps(raw: &[GroupCount]) -> Vec<NpsCount> {
    NPS_SCORES
        .map(|score| NpsCount {
            score,
            count: bucket(raw, &score.to_string()),
        })
        .collect()
}

fn densify_ratings(raw: &[GroupCount]) -> Vec<RatingCount> {
    RATING_VALUES
        .map(|rating| RatingCount {
            rating,
            count: bucket(raw, &rating.to_string()),
        })
        .collect()
}

fn densify_sentiments(raw: &[GroupCount]) -> Vec<SentimentCount> {
    Sentiment::ALL
        .iter()
        .map(|&sentiment| SentimentCount {
            sentiment,
            count: bucket(raw, sentiment.as_str()),
        })
        .collect()
}

fn densify_categories(raw: &[GroupCount]) -> Vec<CategoryCount> {
    NpsCategory::ALL
        .iter()
        .map(|&category| CategoryCount {
            category,
            count: bucket(raw, category.as_str()),
        })
        .collect()
}

/// Logs when the summary pass saw a different corpus than the grouping
/// passes, which happens when a write lands mid-report.
fn check_consistency(
    stats: &StatsSummary,
    categories: &[CategoryCount],
    sentiments: &[SentimentCount],
) {
    let category_drift = categories
        .iter()
        .any(|c| stats.category_count(c.category) != c.count);
    let sentiment_drift = sentiments
        .iter()
        .any(|s| stats.sentiment_count(s.sentiment) != s.count);

    if category_drift || sentiment_drift {
        log::warn!(
            "analytics passes disagree (total {}): categories drifted: {}, sentiments drifted: {}",
            stats.total_feedback,
            category_drift,
            sentiment_drift
        );
    }
}

/// Builds the full dashboard report. Any failing pass fails the whole report.
pub async fn summarize(store: &dyn FeedbackStore) -> Result<AnalyticsReport, StoreError> {
    let (nps, ratings, sentiments, categories, stats) = tokio::try_join!(
        store.aggregate(GroupKey::Nps),
        store.aggregate(GroupKey::Rating),
        store.aggregate(GroupKey::Sentiment),
        store.aggregate(GroupKey::NpsCategory),
        store.stats_summary(),
    )?;

    let nps_categories = densify_categories(&categories);
    let sentiment_distribution = densify_sentiments(&sentiments);
    check_consistency(&stats, &nps_categories, &sentiment_distribution);

    Ok(AnalyticsReport {
        nps_distribution: densify_nps(&nps),
        rating_distribution: densify_ratings(&ratings),
        sentiment_distribution,
        nps_categories,
        summary: ReportSummary {
            total_feedback: stats.total_feedback,
            avg_rating: round2(stats.avg_rating),
            avg_nps: round2(stats.avg_nps),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feedback::NewFeedback;
    use crate::store::MemoryFeedbackStore;
    use std::str::FromStr;

    fn feedback(nps: i32, rating: i32, sentiment: Sentiment) -> NewFeedback {
        NewFeedback {
            name: "Reviewer".into(),
            email: "reviewer@example.com".into(),
            product: "Console".into(),
            nps,
            rating,
            feedback_text: "Detailed product feedback".into(),
            sentiment,
        }
    }

    #[tokio::test]
    async fn two_record_scenario() {
        let store = MemoryFeedbackStore::new();
        store.insert(feedback(9, 5, Sentiment::Positive)).await.unwrap();
        store.insert(feedback(6, 2, Sentiment::Negative)).await.unwrap();

        let report = summarize(&store).await.unwrap();
        assert_eq!(report.summary.total_feedback, 2);
        assert_eq!(report.summary.avg_rating, 3.5);
        assert_eq!(report.summary.avg_nps, 7.5);
        assert_eq!(
            report.nps_categories,
            vec![
                CategoryCount { category: NpsCategory::Detractor, count: 1 },
                CategoryCount { category: NpsCategory::Passive, count: 0 },
                CategoryCount { category: NpsCategory::Promoter, count: 1 },
            ]
        );
        assert_eq!(
            report.sentiment_distribution,
            vec![
                SentimentCount { sentiment: Sentiment::Positive, count: 1 },
                SentimentCount { sentiment: Sentiment::Neutral, count: 0 },
                SentimentCount { sentiment: Sentiment::Negative, count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn empty_collection_reports_zeros_in_every_bucket() {
        let store = MemoryFeedbackStore::new();
        let report = summarize(&store).await.unwrap();

        assert_eq!(report.summary.total_feedback, 0);
        assert_eq!(report.summary.avg_rating, 0.0);
        assert_eq!(report.summary.avg_nps, 0.0);
        assert_eq!(report.nps_distribution.len(), 11);
        assert_eq!(report.rating_distribution.len(), 5);
        assert_eq!(report.sentiment_distribution.len(), 3);
        assert_eq!(report.nps_categories.len(), 3);
        assert!(report.nps_distribution.iter().all(|b| b.count == 0));
        assert!(report.rating_distribution.iter().all(|b| b.count == 0));
    }

    #[tokio::test]
    async fn distributions_are_complete_ordered_and_sum_to_total() {
        let store = MemoryFeedbackStore::new();
        let sentiments = Sentiment::ALL;
        for i in 0..37 {
            let nps = (i * 7) % 11;
            let rating = 1 + (i * 3) % 5;
            store
                .insert(feedback(nps, rating, sentiments[(i % 3) as usize]))
                .await
                .unwrap();
        }

        let report = summarize(&store).await.unwrap();
        let total = report.summary.total_feedback;
        assert_eq!(total, 37);

        let scores: Vec<i32> = report.nps_distribution.iter().map(|b| b.score).collect();
        assert_eq!(scores, (0..=10).collect::<Vec<_>>());
        let ratings: Vec<i32> = report.rating_distribution.iter().map(|b| b.rating).collect();
        assert_eq!(ratings, vec![1, 2, 3, 4, 5]);

        assert_eq!(report.nps_distribution.iter().map(|b| b.count).sum::<i64>(), total);
        assert_eq!(report.rating_distribution.iter().map(|b| b.count).sum::<i64>(), total);
        assert_eq!(report.sentiment_distribution.iter().map(|b| b.count).sum::<i64>(), total);
        assert_eq!(report.nps_categories.iter().map(|b| b.count).sum::<i64>(), total);
    }

    #[tokio::test]
    async fn category_pass_agrees_with_record_classification() {
        let store = MemoryFeedbackStore::new();
        for nps in 0..=10 {
            store.insert(feedback(nps, 3, Sentiment::Neutral)).await.unwrap();
        }
        let report = summarize(&store).await.unwrap();

        for category in NpsCategory::ALL {
            let by_record = (0..=10)
                .filter(|&n| NpsCategory::from_nps(n) == category)
                .count() as i64;
            let by_pass = report
                .nps_categories
                .iter()
                .find(|c| c.category == category)
                .map(|c| c.count);
            assert_eq!(by_pass, Some(by_record), "{:?}", category);
        }

        let stats = store.stats_summary().await.unwrap();
        assert_eq!(stats.total_detractors, 7);
        assert_eq!(stats.total_passives, 2);
        assert_eq!(stats.total_promoters, 2);
    }

    #[tokio::test]
    async fn summarize_is_idempotent_without_writes() {
        let store = MemoryFeedbackStore::new();
        store.insert(feedback(10, 4, Sentiment::Positive)).await.unwrap();
        store.insert(feedback(7, 3, Sentiment::Neutral)).await.unwrap();
        store.insert(feedback(2, 1, Sentiment::Negative)).await.unwrap();

        let first = summarize(&store).await.unwrap();
        let second = summarize(&store).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn averages_round_to_two_places() {
        assert_eq!(round2(Decimal::from_str("3.3333").unwrap()), 3.33);
        assert_eq!(round2(Decimal::from_str("6.665").unwrap()), 6.67);
        assert_eq!(round2(Decimal::ZERO), 0.0);
    }

    #[test]
    fn unknown_raw_keys_are_ignored_by_densify() {
        let raw = vec![("11".to_string(), 4), ("10".to_string(), 2)];
        let dense = densify_nps(&raw);
        assert_eq!(dense.len(), 11);
        assert_eq!(dense[10].count, 2);
        assert_eq!(dense.iter().map(|b| b.count).sum::<i64>(), 2);
    }
}
