use serde::{Deserialize, Serialize};

/// A resolved recommendation. Field names serialize to the labels shown to users.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    #[serde(rename = "Product")]
    pub product: String,
    #[serde(rename = "Industry")]
    pub industry: String,
    #[serde(rename = "Recommended Product")]
    pub recommended_product: String,
    #[serde(rename = "Recommended Code")]
    pub recommended_code: String,
    #[serde(rename = "MOQ")]
    pub moq: i64,
    #[serde(rename = "Payment Terms")]
    pub payment_terms: String,
}
