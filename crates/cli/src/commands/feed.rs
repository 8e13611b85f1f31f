use dealwise_core::config::{FeedSource, LoadOptions};
use dealwise_core::feed::{UploadFeed, DEFAULT_PREVIEW_ROWS};
use serde::Serialize;
use serde_json::Value;

use crate::commands::{
    build_runtime, fetch_feed, recommendation_report, CommandContext, CommandResult,
    EXIT_PRODUCT_NOT_FOUND,
};

pub const EXIT_INVALID_ARGUMENT: u8 = 1;

#[derive(Debug, Serialize)]
struct FeedPreview {
    command: &'static str,
    status: &'static str,
    correlation_id: String,
    source: FeedSource,
    loaded: bool,
    rows: usize,
    preview: Vec<Value>,
    warnings: Vec<String>,
}

pub fn run(options: &LoadOptions, row: Option<usize>, skip_insights: bool) -> CommandResult {
    let context = match CommandContext::load("feed", options) {
        Ok(context) => context,
        Err(result) => return result,
    };

    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "feed",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_INVALID_ARGUMENT,
            )
        }
    };

    let mut warnings = Vec::new();
    let feed =
        runtime.block_on(fetch_feed(&context.config, &context.correlation_id, &mut warnings));
    drop(runtime);

    match (feed, row) {
        (Some(feed), Some(index)) => run_row(&context, &feed, index, skip_insights, warnings),
        (feed, row) => {
            if let (None, Some(index)) = (&feed, row) {
                warnings.push(format!("no upload feed is loaded; row {index} was not run"));
            }
            preview(&context, feed.as_ref(), warnings)
        }
    }
}

fn run_row(
    context: &CommandContext,
    feed: &UploadFeed,
    index: usize,
    skip_insights: bool,
    warnings: Vec<String>,
) -> CommandResult {
    let row = match feed.row(index) {
        Ok(row) => row.clone(),
        Err(error) => {
            return CommandResult::failure(
                "feed",
                "invalid_argument",
                error.to_string(),
                EXIT_INVALID_ARGUMENT,
            )
        }
    };

    if context.catalog.base_record(&row.product).is_none() {
        return CommandResult::failure(
            "feed",
            "product_not_found",
            format!("Upload feed product not matched in base data (`{}`).", row.product),
            EXIT_PRODUCT_NOT_FOUND,
        );
    }

    let (product, industry) = (row.product.clone(), row.industry.clone());
    recommendation_report("feed", context, &product, &industry, Some(row), skip_insights, warnings)
}

fn preview(
    context: &CommandContext,
    feed: Option<&UploadFeed>,
    warnings: Vec<String>,
) -> CommandResult {
    CommandResult::report(&FeedPreview {
        command: "feed",
        status: "ok",
        correlation_id: context.correlation_id.clone(),
        source: context.config.feed.source,
        loaded: feed.is_some(),
        rows: feed.map(UploadFeed::len).unwrap_or(0),
        preview: feed.map(|feed| feed.preview(DEFAULT_PREVIEW_ROWS)).unwrap_or_default(),
        warnings,
    })
}
