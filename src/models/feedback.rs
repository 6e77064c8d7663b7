// src/models/feedback.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use validator::Validate;

pub const PROMOTER_MIN_NPS: i32 = 9;
pub const PASSIVE_MIN_NPS: i32 = 7;
pub const HIGH_MIN_RATING: i32 = 4;
pub const MEDIUM_RATING: i32 = 3;

const NPS_MESSAGE: &str = "NPS score must be a whole number between 0-10";
const RATING_MESSAGE: &str = "Rating must be a whole number between 1-5";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSentiment(pub String);

impl fmt::Display for UnknownSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sentiment '{}'", self.0)
    }
}

impl std::error::Error for UnknownSentiment {}

impl FromStr for Sentiment {
    type Err = UnknownSentiment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            other => Err(UnknownSentiment(other.to_string())),
        }
    }
}

/// NPS bucket: Detractor (0-6), Passive (7-8), Promoter (9-10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpsCategory {
    Detractor,
    Passive,
    Promoter,
}

impl NpsCategory {
    /// Canonical report order.
    pub const ALL: [NpsCategory; 3] = [
        NpsCategory::Detractor,
        NpsCategory::Passive,
        NpsCategory::Promoter,
    ];

    pub fn from_nps(nps: i32) -> Self {
        if nps >= PROMOTER_MIN_NPS {
            NpsCategory::Promoter
        } else if nps >= PASSIVE_MIN_NPS {
            NpsCategory::Passive
        } else {
            NpsCategory::Detractor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NpsCategory::Detractor => "Detractor",
            NpsCategory::Passive => "Passive",
            NpsCategory::Promoter => "Promoter",
        }
    }

    /// SQL rendering of `from_nps` over the given column.
    pub fn sql_case(column: &str) -> String {
        format!(
            "CASE WHEN {col} >= {promoter} THEN '{p}' WHEN {col} >= {passive} THEN '{m}' ELSE '{d}' END",
            col = column,
            promoter = PROMOTER_MIN_NPS,
            passive = PASSIVE_MIN_NPS,
            p = NpsCategory::Promoter.as_str(),
            m = NpsCategory::Passive.as_str(),
            d = NpsCategory::Detractor.as_str(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatingCategory {
    Low,
    Medium,
    High,
}

impl RatingCategory {
    pub fn from_rating(rating: i32) -> Self {
        if rating >= HIGH_MIN_RATING {
            RatingCategory::High
        } else if rating == MEDIUM_RATING {
            RatingCategory::Medium
        } else {
            RatingCategory::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub product: String,
    pub nps: i32,
    pub rating: i32,
    pub feedback_text: String,
    pub sentiment: Sentiment,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn nps_category(&self) -> NpsCategory {
        NpsCategory::from_nps(self.nps)
    }

    pub fn rating_category(&self) -> RatingCategory {
        RatingCategory::from_rating(self.rating)
    }

    pub fn view(&self) -> FeedbackView<'_> {
        FeedbackView {
            record: self,
            nps_category: self.nps_category(),
            rating_category: self.rating_category(),
        }
    }
}

/// Record as sent over the wire, with the derived categories attached.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackView<'a> {
    #[serde(flatten)]
    pub record: &'a FeedbackRecord,
    pub nps_category: NpsCategory,
    pub rating_category: RatingCategory,
}

#[derive(Debug, FromRow)]
pub struct FeedbackRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub product: String,
    pub nps: i32,
    pub rating: i32,
    pub feedback_text: String,
    pub sentiment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<FeedbackRow> for FeedbackRecord {
    type Error = UnknownSentiment;

    fn try_from(row: FeedbackRow) -> Result<Self, Self::Error> {
        Ok(FeedbackRecord {
            id: row.id,
            name: row.name,
            email: row.email,
            product: row.product,
            nps: row.nps,
            rating: row.rating,
            feedback_text: row.feedback_text,
            sentiment: row.sentiment.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A validated submission, ready for the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeedback {
    pub name: String,
    pub email: String,
    pub product: String,
    pub nps: i32,
    pub rating: i32,
    pub feedback_text: String,
    pub sentiment: Sentiment,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name is required and must be between 1-100 characters"
    ))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 100,
        message = "Product name is required and must be between 1-100 characters"
    ))]
    pub product: String,

    /// Number or numeric string; form clients post `"9"`.
    #[serde(default)]
    pub nps: Option<Value>,

    #[serde(default)]
    pub rating: Option<Value>,

    #[serde(default)]
    #[validate(length(
        min = 10,
        max = 1000,
        message = "Feedback text must be between 10-1000 characters"
    ))]
    pub feedback_text: String,

    #[serde(default)]
    pub sentiment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FeedbackRequest {
    /// Trims text fields and lowercases the email before validation.
    pub fn normalized(self) -> Self {
        FeedbackRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            product: self.product.trim().to_string(),
            nps: self.nps,
            rating: self.rating,
            feedback_text: self.feedback_text.trim().to_string(),
            sentiment: self.sentiment.trim().to_string(),
        }
    }

    pub fn into_new_feedback(self) -> Result<NewFeedback, Vec<FieldError>> {
        let req = self.normalized();
        let mut errors: Vec<FieldError> = Vec::new();

        if let Err(validation) = req.validate() {
            for (field, errs) in validation.field_errors() {
                for err in errs.iter() {
                    errors.push(FieldError {
                        field: camel_case(&field),
                        message: err
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid value for {}", field)),
                    });
                }
            }
        }

        let nps = whole_number(req.nps.as_ref(), 0, 10);
        if nps.is_none() {
            errors.push(FieldError {
                field: "nps".to_string(),
                message: NPS_MESSAGE.to_string(),
            });
        }
        let rating = whole_number(req.rating.as_ref(), 1, 5);
        if rating.is_none() {
            errors.push(FieldError {
                field: "rating".to_string(),
                message: RATING_MESSAGE.to_string(),
            });
        }

        let sentiment = req.sentiment.parse::<Sentiment>().ok();
        if sentiment.is_none() {
            errors.push(FieldError {
                field: "sentiment".to_string(),
                message: "Sentiment must be positive, neutral, or negative".to_string(),
            });
        }

        match (errors.is_empty(), nps, rating, sentiment) {
            (true, Some(nps), Some(rating), Some(sentiment)) => Ok(NewFeedback {
                name: req.name,
                email: req.email,
                product: req.product,
                nps,
                rating,
                feedback_text: req.feedback_text,
                sentiment,
            }),
            _ => {
                errors.sort_by(|a, b| a.field.cmp(&b.field));
                Err(errors)
            }
        }
    }
}

/// Reads an integer in `min..=max` from a JSON number or a numeric string.
/// `9.0` counts as whole; `9.5`, `"9.0"` and `"abc"` do not.
fn whole_number(value: Option<&Value>, min: i32, max: i32) -> Option<i32> {
    let n = match value? {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)?,
        },
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    i32::try_from(n).ok().filter(|n| (min..=max).contains(n))
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
