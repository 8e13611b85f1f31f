use serde::{Deserialize, Serialize};

/// Minimum order quantity exactly as it appears in a catalogue cell.
///
/// Cells are kept as text and only coerced when a record is resolved, so a
/// malformed value fails the lookups that read it rather than the whole load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawQuantity(pub String);

impl RawQuantity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Integer text is taken as is; finite decimal text is truncated toward zero.
    pub fn coerce(&self) -> Option<i64> {
        let trimmed = self.0.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return Some(value);
        }

        let value = trimmed.parse::<f64>().ok()?;
        if !value.is_finite() {
            return None;
        }

        let truncated = value.trunc();
        if truncated < i64::MIN as f64 || truncated > i64::MAX as f64 {
            return None;
        }
        Some(truncated as i64)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseRecord {
    pub name: String,
    pub code: String,
    pub min_order_qty: RawQuantity,
    pub payment_terms: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryRecord {
    pub name: String,
    pub code: String,
    pub min_order_qty: RawQuantity,
    pub payment_terms: String,
}

impl IndustryRecord {
    /// Case-sensitive prefix match against a queried base product name.
    pub fn matches_product(&self, product_name: &str) -> bool {
        self.name.starts_with(product_name)
    }
}
