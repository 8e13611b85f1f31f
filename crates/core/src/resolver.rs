//! Recommendation matching.
//!
//! A product is first looked up by exact name in the base catalogue. When the
//! requested industry has a sheet, the first row of that sheet whose name starts
//! with the product name replaces the base code, minimum order quantity and
//! payment terms. An unknown industry or an unmatched sheet keeps the base values.

use tracing::debug;

use crate::catalog::Catalog;
use crate::domain::product::RawQuantity;
use crate::domain::recommendation::RecommendationResult;
use crate::errors::ResolveError;

pub trait RecommendationResolver: Send + Sync {
    fn resolve(
        &self,
        product_name: &str,
        industry_label: &str,
    ) -> Result<RecommendationResult, ResolveError>;
}

impl RecommendationResolver for Catalog {
    fn resolve(
        &self,
        product_name: &str,
        industry_label: &str,
    ) -> Result<RecommendationResult, ResolveError> {
        resolve(self, product_name, industry_label)
    }
}

pub fn resolve(
    catalog: &Catalog,
    product_name: &str,
    industry_label: &str,
) -> Result<RecommendationResult, ResolveError> {
    let base = catalog
        .base_record(product_name)
        .ok_or_else(|| ResolveError::NotFound { product: product_name.to_string() })?;

    let mut recommended_product = product_name;
    let mut recommended_code = base.code.as_str();
    let mut moq = &base.min_order_qty;
    let mut payment_terms = base.payment_terms.as_str();

    let industry_row =
        catalog.industry(industry_label).and_then(|table| table.first_match(product_name));
    if let Some(row) = industry_row {
        recommended_product = row.name.as_str();
        recommended_code = row.code.as_str();
        moq = &row.min_order_qty;
        payment_terms = row.payment_terms.as_str();
    }

    debug!(
        event_name = "resolver.match",
        product = product_name,
        industry = industry_label,
        industry_override = industry_row.is_some(),
        recommended_code,
        "recommendation resolved"
    );

    Ok(RecommendationResult {
        product: product_name.to_string(),
        industry: industry_label.to_string(),
        recommended_product: recommended_product.to_string(),
        recommended_code: recommended_code.to_string(),
        moq: coerce_quantity(recommended_product, moq)?,
        payment_terms: payment_terms.to_string(),
    })
}

fn coerce_quantity(record: &str, raw: &RawQuantity) -> Result<i64, ResolveError> {
    raw.coerce().ok_or_else(|| ResolveError::InvalidQuantity {
        record: record.to_string(),
        value: raw.as_str().to_string(),
    })
}
