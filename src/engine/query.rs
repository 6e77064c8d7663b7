// src/engine/query.rs
use serde::Serialize;

use crate::models::feedback::{FeedbackRecord, FeedbackView};
use crate::models::filter::FilterCriteria;
use crate::store::{FeedbackStore, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackPage {
    pub items: Vec<FeedbackRecord>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackPageView<'a> {
    pub items: Vec<FeedbackView<'a>>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
    pub has_more: bool,
}

impl FeedbackPage {
    /// Page returned in place of a failed listing.
    pub fn empty(skip: i64, limit: i64) -> Self {
        FeedbackPage {
            items: Vec::new(),
            total: 0,
            skip,
            limit,
            has_more: false,
        }
    }

    pub fn view(&self) -> FeedbackPageView<'_> {
        FeedbackPageView {
            items: self.items.iter().map(FeedbackRecord::view).collect(),
            total: self.total,
            skip: self.skip,
            limit: self.limit,
            has_more: self.has_more,
        }
    }
}

/// Runs one page of a filtered listing. The page fetch and the total count
/// are issued together.
pub async fn query(
    store: &dyn FeedbackStore,
    criteria: &FilterCriteria,
) -> Result<FeedbackPage, StoreError> {
    let (items, total) = tokio::try_join!(store.find(criteria), store.count(criteria))?;
    let has_more = total > criteria.skip + items.len() as i64;

    Ok(FeedbackPage {
        items,
        total,
        skip: criteria.skip,
        limit: criteria.limit,
        has_more,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feedback::{NewFeedback, Sentiment};
    use crate::store::MemoryFeedbackStore;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::HashSet;

    fn feedback(product: &str, rating: i32) -> NewFeedback {
        NewFeedback {
            name: "Customer".into(),
            email: "customer@example.com".into(),
            product: product.into(),
            nps: 8,
            rating,
            feedback_text: "Some perfectly fine feedback".into(),
            sentiment: Sentiment::Positive,
        }
    }

    async fn seeded(products_and_ratings: &[(&str, i32)]) -> MemoryFeedbackStore {
        let store = MemoryFeedbackStore::new();
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        for (i, (product, rating)) in products_and_ratings.iter().enumerate() {
            // every third record shares a timestamp with its predecessor
            let offset = (i as i64) - (i as i64 / 3);
            store
                .insert_at(feedback(product, *rating), base + Duration::minutes(offset))
                .await;
        }
        store
    }

    #[tokio::test]
    async fn first_page_of_three_matches_has_more() {
        let store = seeded(&[("A", 5), ("B", 5), ("C", 5), ("D", 2)]).await;
        let criteria = FilterCriteria {
            rating: Some(5),
            skip: 0,
            limit: 1,
            ..FilterCriteria::default()
        };
        let page = query(&store, &criteria).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 3);
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn last_page_has_no_more() {
        let store = seeded(&[("A", 5), ("B", 5), ("C", 5)]).await;
        let criteria = FilterCriteria {
            skip: 2,
            limit: 5,
            ..FilterCriteria::default()
        };
        let page = query(&store, &criteria).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 3);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn skip_past_end_returns_empty_page_with_total() {
        let store = seeded(&[("A", 5), ("B", 5)]).await;
        let criteria = FilterCriteria {
            skip: 10,
            ..FilterCriteria::default()
        };
        let page = query(&store, &criteria).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 2);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn paging_visits_every_match_once_newest_first() {
        let fixtures: Vec<(String, i32)> = (0..23).map(|i| (format!("P{}", i), 1 + i % 5)).collect();
        let refs: Vec<(&str, i32)> = fixtures.iter().map(|(p, r)| (p.as_str(), *r)).collect();
        let store = seeded(&refs).await;

        let mut seen = Vec::new();
        let mut criteria = FilterCriteria {
            limit: 4,
            ..FilterCriteria::default()
        };
        loop {
            let page = query(&store, &criteria).await.unwrap();
            assert_eq!(page.total, 23);
            seen.extend(page.items);
            if !page.has_more {
                break;
            }
            criteria.skip += criteria.limit;
        }

        assert_eq!(seen.len(), 23);
        let unique: HashSet<i64> = seen.iter().map(|r| r.id).collect();
        assert_eq!(unique.len(), 23);
        assert!(seen
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn product_and_rating_filters_intersect() {
        let store = seeded(&[
            ("Widget", 3),
            ("Widget", 4),
            ("Gadget", 3),
            ("Mega Widget", 3),
        ])
        .await;
        let criteria = FilterCriteria {
            product: Some("widget".into()),
            rating: Some(3),
            ..FilterCriteria::default()
        };
        let page = query(&store, &criteria).await.unwrap();
        let mut products: Vec<&str> = page.items.iter().map(|r| r.product.as_str()).collect();
        products.sort_unstable();
        assert_eq!(products, vec!["Mega Widget", "Widget"]);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn page_view_serializes_camel_case() {
        let page = FeedbackPage::empty(10, 20);
        let json = serde_json::to_value(page.view()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"items": [], "total": 0, "skip": 10, "limit": 20, "hasMore": false})
        );
    }
}
