use dealwise_core::config::LoadOptions;
use serde::Serialize;

use crate::commands::{CommandContext, CommandResult};

#[derive(Debug, Serialize)]
struct CatalogReport<'a> {
    command: &'static str,
    status: &'static str,
    products: Vec<&'a str>,
    industries: Vec<IndustrySummary<'a>>,
}

#[derive(Debug, Serialize)]
struct IndustrySummary<'a> {
    label: &'a str,
    rows: usize,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let context = match CommandContext::load("catalog", options) {
        Ok(context) => context,
        Err(result) => return result,
    };

    let catalog = &context.catalog;
    let industries = catalog
        .industry_labels()
        .into_iter()
        .map(|label| IndustrySummary {
            label,
            rows: catalog.industry(label).map(|table| table.records.len()).unwrap_or(0),
        })
        .collect();

    CommandResult::report(&CatalogReport {
        command: "catalog",
        status: "ok",
        products: catalog.product_names(),
        industries,
    })
}
