//! Read-side engines over a [`FeedbackStore`](crate::store::FeedbackStore).
//!
//! Both are free functions with no state of their own, so concurrent callers
//! need no coordination beyond what the store provides.

pub mod analytics;
pub mod query;

pub use analytics::summarize;
pub use query::{FeedbackPage, query};
