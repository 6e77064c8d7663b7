// src/models/filter.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::models::feedback::{FeedbackRecord, FieldError, Sentiment};

pub const DEFAULT_SKIP: i64 = 0;
pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 100;

/// Raw listing query string. Everything arrives as text so that malformed
/// values can be sanitized instead of rejected by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct FeedbackQuery {
    pub q: Option<String>,
    pub product: Option<String>,
    pub rating: Option<String>,
    pub sentiment: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub skip: Option<String>,
    pub limit: Option<String>,
}

/// Normalized listing filter. `None` imposes no constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub q: Option<String>,
    pub product: Option<String>,
    pub rating: Option<i32>,
    pub sentiment: Option<Sentiment>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub skip: i64,
    pub limit: i64,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        FilterCriteria {
            q: None,
            product: None,
            rating: None,
            sentiment: None,
            from: None,
            to: None,
            skip: DEFAULT_SKIP,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Accepts the ISO 8601 shapes dashboards send: RFC 3339, minute precision
/// with `Z` or an offset, naive date-times read as UTC, and `YYYY-MM-DD` or
/// `YYYY-MM` at UTC midnight.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    let zoned = match value.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{}+00:00", rest),
        None => value.to_string(),
    };
    if let Ok(ts) = DateTime::parse_from_str(&zoned, "%Y-%m-%dT%H:%M%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d"))
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Integer prefix of `value`, so `"3.5"` reads as 3 and `"5abc"` as 5.
fn leading_int(value: &str) -> Option<i64> {
    let sign = usize::from(value.starts_with(['+', '-']));
    let digits = value[sign..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    value[..sign + digits].parse().ok()
}

impl FilterCriteria {
    /// Builds criteria from raw query input.
    ///
    /// Blank values are dropped, a rating is read from its integer prefix
    /// and ignored when it has none, and bad
    /// `skip`/`limit` values fall back to their defaults. Out-of-range ratings,
    /// unknown sentiments and unparseable dates are reported per field.
    pub fn from_query(raw: &FeedbackQuery) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut criteria = FilterCriteria {
            q: non_blank(raw.q.as_deref()).map(str::to_string),
            product: non_blank(raw.product.as_deref()).map(str::to_string),
            ..FilterCriteria::default()
        };

        if let Some(rating) = non_blank(raw.rating.as_deref()) {
            match leading_int(rating) {
                Some(r @ 1..=5) => criteria.rating = Some(r as i32),
                Some(_) => errors.push(FieldError {
                    field: "rating".to_string(),
                    message: "Rating must be between 1-5".to_string(),
                }),
                None => log::debug!("ignoring non-numeric rating filter '{}'", rating),
            }
        }

        if let Some(sentiment) = non_blank(raw.sentiment.as_deref()) {
            match sentiment.parse::<Sentiment>() {
                Ok(s) => criteria.sentiment = Some(s),
                Err(_) => errors.push(FieldError {
                    field: "sentiment".to_string(),
                    message: "Sentiment must be positive, neutral, or negative".to_string(),
                }),
            }
        }

        for (field, value, slot) in [
            ("from", raw.from.as_deref(), &mut criteria.from),
            ("to", raw.to.as_deref(), &mut criteria.to),
        ] {
            if let Some(value) = non_blank(value) {
                match parse_timestamp(value) {
                    Some(ts) => *slot = Some(ts),
                    None => errors.push(FieldError {
                        field: field.to_string(),
                        message: format!("'{}' must be an ISO 8601 date", field),
                    }),
                }
            }
        }

        criteria.skip = Self::sanitize_skip(raw.skip.as_deref());
        criteria.limit = Self::sanitize_limit(raw.limit.as_deref());

        if errors.is_empty() {
            Ok(criteria)
        } else {
            Err(errors)
        }
    }

    pub fn sanitize_skip(raw: Option<&str>) -> i64 {
        match non_blank(raw).map(str::parse::<i64>) {
            Some(Ok(skip)) if skip >= 0 => skip,
            None => DEFAULT_SKIP,
            _ => {
                log::debug!("skip '{}' malformed, using default", raw.unwrap_or_default());
                DEFAULT_SKIP
            }
        }
    }

    pub fn sanitize_limit(raw: Option<&str>) -> i64 {
        match non_blank(raw).map(str::parse::<i64>) {
            Some(Ok(limit)) if (1..=MAX_LIMIT).contains(&limit) => limit,
            None => DEFAULT_LIMIT,
            _ => {
                log::debug!("limit '{}' malformed, using default", raw.unwrap_or_default());
                DEFAULT_LIMIT
            }
        }
    }

    /// Predicate evaluation for stores that filter in process.
    pub fn matches(&self, record: &FeedbackRecord) -> bool {
        if let Some(q) = &self.q {
            let q = q.to_lowercase();
            if !(contains_ci(&record.name, &q)
                || contains_ci(&record.product, &q)
                || contains_ci(&record.feedback_text, &q))
            {
                return false;
            }
        }
        if let Some(product) = &self.product {
            if !contains_ci(&record.product, &product.to_lowercase()) {
                return false;
            }
        }
        if self.rating.is_some_and(|r| r != record.rating) {
            return false;
        }
        if self.sentiment.is_some_and(|s| s != record.sentiment) {
            return false;
        }
        if self.from.is_some_and(|from| record.created_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| record.created_at > to) {
            return false;
        }
        true
    }
}
