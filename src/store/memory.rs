//! In-memory feedback store.
//!
//! Keeps every record in a `Vec` behind a `tokio` lock. Selected with
//! `FEEDBACK_STORE=memory` for local development and used by the test suite;
//! nothing survives a restart.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{FeedbackStore, GroupCount, GroupKey, StoreError};
use crate::models::analytics::StatsSummary;
use crate::models::feedback::{FeedbackRecord, NewFeedback};
use crate::models::filter::FilterCriteria;

#[derive(Default)]
struct Inner {
    records: Vec<FeedbackRecord>,
    next_id: i64,
}

#[derive(Clone, Default)]
pub struct MemoryFeedbackStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts with an explicit creation time. Used to seed fixtures with a
    /// known ordering.
    pub async fn insert_at(
        &self,
        feedback: NewFeedback,
        created_at: DateTime<Utc>,
    ) -> FeedbackRecord {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let record = FeedbackRecord {
            id: inner.next_id,
            name: feedback.name,
            email: feedback.email,
            product: feedback.product,
            nps: feedback.nps,
            rating: feedback.rating,
            feedback_text: feedback.feedback_text,
            sentiment: feedback.sentiment,
            created_at,
            updated_at: created_at,
        };
        inner.records.push(record.clone());
        record
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn newest_first(a: &FeedbackRecord, b: &FeedbackRecord) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl FeedbackStore for MemoryFeedbackStore {
    async fn find(&self, criteria: &FilterCriteria) -> Result<Vec<FeedbackRecord>, StoreError> {
        let inner = self.inner.read().await;
        let mut matched: Vec<&FeedbackRecord> = inner
            .records
            .iter()
            .filter(|r| criteria.matches(r))
            .collect();
        matched.sort_by(|a, b| newest_first(a, b));

        Ok(matched
            .into_iter()
            .skip(usize::try_from(criteria.skip).unwrap_or(0))
            .take(usize::try_from(criteria.limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn count(&self, criteria: &FilterCriteria) -> Result<i64, StoreError> {
        let inner = self.inner.read().await;
        let total = inner.records.iter().filter(|r| criteria.matches(r)).count();
        Ok(total as i64)
    }

    async fn aggregate(&self, key: GroupKey) -> Result<Vec<GroupCount>, StoreError> {
        let inner = self.inner.read().await;
        let mut groups: BTreeMap<String, i64> = BTreeMap::new();
        for record in &inner.records {
            let bucket = match key {
                GroupKey::Nps => record.nps.to_string(),
                GroupKey::Rating => record.rating.to_string(),
                GroupKey::Sentiment => record.sentiment.as_str().to_string(),
                GroupKey::NpsCategory => record.nps_category().as_str().to_string(),
            };
            *groups.entry(bucket).or_insert(0) += 1;
        }
        Ok(groups.into_iter().collect())
    }

    async fn stats_summary(&self) -> Result<StatsSummary, StoreError> {
        let inner = self.inner.read().await;
        Ok(StatsSummary::from_records(&inner.records))
    }

    async fn insert(&self, feedback: NewFeedback) -> Result<FeedbackRecord, StoreError> {
        Ok(self.insert_at(feedback, Utc::now()).await)
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.records.len();
        inner.records.retain(|r| r.id != id);
        Ok(inner.records.len() != before)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FeedbackRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.records.iter().find(|r| r.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feedback::Sentiment;
    use chrono::TimeZone;

    fn feedback(product: &str, nps: i32, rating: i32) -> NewFeedback {
        NewFeedback {
            name: "Tester".into(),
            email: "tester@example.com".into(),
            product: product.into(),
            nps,
            rating,
            feedback_text: "Long enough feedback text".into(),
            sentiment: Sentiment::Neutral,
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let store = MemoryFeedbackStore::new();
        let a = store.insert(feedback("A", 5, 3)).await.unwrap();
        let b = store.insert(feedback("B", 5, 3)).await.unwrap();
        assert!(b.id > a.id);
        assert_eq!(a.created_at, a.updated_at);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn find_orders_newest_first_with_id_tiebreak() {
        let store = MemoryFeedbackStore::new();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let old = store.insert_at(feedback("old", 5, 3), t1).await;
        let tie_a = store.insert_at(feedback("tie-a", 5, 3), t2).await;
        let tie_b = store.insert_at(feedback("tie-b", 5, 3), t2).await;

        let found = store.find(&FilterCriteria::default()).await.unwrap();
        let ids: Vec<i64> = found.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![tie_a.id, tie_b.id, old.id]);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_record_was_removed() {
        let store = MemoryFeedbackStore::new();
        let rec = store.insert(feedback("A", 5, 3)).await.unwrap();
        assert!(store.delete_by_id(rec.id).await.unwrap());
        assert!(!store.delete_by_id(rec.id).await.unwrap());
        assert!(store.find_by_id(rec.id).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn aggregate_groups_only_present_keys() {
        let store = MemoryFeedbackStore::new();
        store.insert(feedback("A", 9, 5)).await.unwrap();
        store.insert(feedback("A", 10, 5)).await.unwrap();
        store.insert(feedback("A", 3, 1)).await.unwrap();

        let ratings = store.aggregate(GroupKey::Rating).await.unwrap();
        assert_eq!(ratings, vec![("1".to_string(), 1), ("5".to_string(), 2)]);

        let categories = store.aggregate(GroupKey::NpsCategory).await.unwrap();
        assert_eq!(
            categories,
            vec![("Detractor".to_string(), 1), ("Promoter".to_string(), 2)]
        );
    }
}
