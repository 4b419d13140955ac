//! The transaction record carried through grouping as an opaque payload.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One bank transaction. The group engine only ever looks at the
/// description text; everything else rides along for the session layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub date: NaiveDate,
    pub amount: f64,
    pub description: String,
    /// Category label, if this record has already been annotated.
    pub category: Option<String>,
}

impl Record {
    pub fn new(date: NaiveDate, amount: f64, description: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            description: description.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}
