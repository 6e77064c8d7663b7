//! Record store abstraction shared by the query and aggregation engines.
//!
//! - [`MySqlFeedbackStore`]: the production store on a `sqlx` MySQL pool
//! - [`MemoryFeedbackStore`]: an in-process store for development and tests

use async_trait::async_trait;
use thiserror::Error;

use crate::models::analytics::StatsSummary;
use crate::models::feedback::{FeedbackRecord, NewFeedback};
use crate::models::filter::FilterCriteria;

mod memory;
mod mysql;

pub use memory::MemoryFeedbackStore;
pub use mysql::MySqlFeedbackStore;

/// Store-side failures. Never shown to API callers verbatim.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: i64, reason: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Dimension for a grouping pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Nps,
    Rating,
    Sentiment,
    NpsCategory,
}

/// One raw bucket from a grouping pass. Keys are rendered as strings so every
/// dimension shares a shape; buckets with no records are simply absent.
pub type GroupCount = (String, i64);

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Matching records, newest `created_at` first, ties broken by ascending id,
    /// after skipping `criteria.skip` and taking at most `criteria.limit`.
    async fn find(&self, criteria: &FilterCriteria) -> Result<Vec<FeedbackRecord>, StoreError>;

    /// Number of records matching the criteria, ignoring skip/limit.
    async fn count(&self, criteria: &FilterCriteria) -> Result<i64, StoreError>;

    async fn aggregate(&self, key: GroupKey) -> Result<Vec<GroupCount>, StoreError>;

    async fn stats_summary(&self) -> Result<StatsSummary, StoreError>;

    async fn insert(&self, feedback: NewFeedback) -> Result<FeedbackRecord, StoreError>;

    /// Returns `false` when no record had this id.
    async fn delete_by_id(&self, id: i64) -> Result<bool, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<FeedbackRecord>, StoreError>;
}
