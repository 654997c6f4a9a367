//! Complaint data types

use serde::{Deserialize, Serialize};

/// Fields extracted from one complaint page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintFields {
    pub title: String,
    pub complaint_text: String,
    pub date: String,
}

/// A scraped complaint together with its source URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintResult {
    pub url: String,
    pub title: String,
    pub complaint_text: String,
    pub date: String,
}

impl ComplaintResult {
    pub fn new(url: impl Into<String>, fields: ComplaintFields) -> Self {
        Self {
            url: url.into(),
            title: fields.title,
            complaint_text: fields.complaint_text,
            date: fields.date,
        }
    }
}

/// A URL that was skipped because its scrape failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlFailure {
    pub url: String,
    pub error: String,
}

/// Raw `textContent` of each selector; `None` when nothing matched.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawFields {
    pub title: Option<String>,
    pub body: Option<String>,
    pub date: Option<String>,
}

impl From<RawFields> for ComplaintFields {
    fn from(raw: RawFields) -> Self {
        fn clean(text: Option<String>) -> String {
            text.map(|t| t.trim().to_string()).unwrap_or_default()
        }

        Self {
            title: clean(raw.title),
            complaint_text: clean(raw.body),
            date: clean(raw.date),
        }
    }
}
