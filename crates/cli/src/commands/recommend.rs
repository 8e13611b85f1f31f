use dealwise_core::config::LoadOptions;

use crate::commands::{recommendation_report, CommandContext, CommandResult};

pub fn run(
    options: &LoadOptions,
    product: &str,
    industry: &str,
    skip_insights: bool,
) -> CommandResult {
    let context = match CommandContext::load("recommend", options) {
        Ok(context) => context,
        Err(result) => return result,
    };

    recommendation_report("recommend", &context, product, industry, None, skip_insights, Vec::new())
}
