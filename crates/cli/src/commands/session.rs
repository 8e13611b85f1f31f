//! Interactive session over the catalogue and upload feed.
//!
//! `Session` holds the selection state and answers one command line at a time;
//! `run` wraps it in a line editor. No command ends the session except `quit`
//! and end of input: every failure is rendered inline.

use dealwise_agent::{DealInsights, InsightsService};
use dealwise_core::catalog::Catalog;
use dealwise_core::config::LoadOptions;
use dealwise_core::domain::recommendation::RecommendationResult;
use dealwise_core::errors::ApplicationError;
use dealwise_core::feed::{UploadFeed, DEFAULT_PREVIEW_ROWS};
use dealwise_core::resolver::RecommendationResolver;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, info};

use crate::commands::{
    build_runtime, fetch_feed, generate_insights, insights_service, new_correlation_id,
    CommandContext, CommandResult,
};

const PROMPT: &str = "dealwise> ";
const EXIT_EDITOR: u8 = 1;

const HELP: &str = "commands:
  products                 list base products
  industries               list industry labels
  product <number|name>    select a product
  industry <number|name>   select an industry (`none` clears it)
  recommend                run the recommendation for the selection
  feed                     preview the upload feed
  row <index>              select an upload feed row (zero-based)
  run-row                  run the recommendation for the selected feed row
  status                   show the current selection
  help                     show this list
  quit                     leave the session";

#[derive(Debug, PartialEq, Eq)]
pub enum SessionReply {
    Continue(String),
    Quit,
}

pub struct Session {
    catalog: Catalog,
    feed: Option<UploadFeed>,
    insights: Option<InsightsService>,
    product: Option<String>,
    industry: String,
    feed_row: Option<usize>,
}

impl Session {
    /// Starts with the first product and first industry selected.
    pub fn new(
        catalog: Catalog,
        feed: Option<UploadFeed>,
        insights: Option<InsightsService>,
    ) -> Self {
        let product = catalog.product_names().first().map(|name| name.to_string());
        let industry =
            catalog.industry_labels().first().map(|label| label.to_string()).unwrap_or_default();
        let feed_row = feed.as_ref().filter(|feed| !feed.is_empty()).map(|_| 0);

        Self { catalog, feed, insights, product, industry, feed_row }
    }

    pub fn product(&self) -> Option<&str> {
        self.product.as_deref()
    }

    pub fn industry(&self) -> &str {
        &self.industry
    }

    pub fn feed_row(&self) -> Option<usize> {
        self.feed_row
    }

    pub fn handle(&mut self, line: &str) -> SessionReply {
        let line = line.trim();
        let (command, argument) = match line.split_once(char::is_whitespace) {
            Some((command, argument)) => (command, argument.trim()),
            None => (line, ""),
        };

        let outcome = match command.to_ascii_lowercase().as_str() {
            "" => Ok(String::new()),
            "quit" | "exit" => return SessionReply::Quit,
            "help" | "?" => Ok(HELP.to_string()),
            "products" => Ok(self.list_products()),
            "industries" => Ok(self.list_industries()),
            "product" => self.select_product(argument),
            "industry" => self.select_industry(argument),
            "recommend" => self.recommend(),
            "feed" => self.preview_feed(),
            "row" => self.select_row(argument),
            "run-row" => self.run_row(),
            "status" => Ok(self.status()),
            other => Err(format!("unknown command `{other}`; type `help` for the list")),
        };

        SessionReply::Continue(outcome.unwrap_or_else(|message| format!("error: {message}")))
    }

    fn list_products(&self) -> String {
        numbered(&self.catalog.product_names(), self.product())
    }

    fn list_industries(&self) -> String {
        numbered(&self.catalog.industry_labels(), Some(self.industry()))
    }

    fn select_product(&mut self, argument: &str) -> Result<String, String> {
        let names = self.catalog.product_names();
        let name = pick(&names, argument, "product")?;
        self.product = Some(name.clone());
        Ok(format!("product: {name}"))
    }

    fn select_industry(&mut self, argument: &str) -> Result<String, String> {
        if argument.eq_ignore_ascii_case("none") {
            self.industry.clear();
            return Ok("industry: (none)".to_string());
        }
        let labels = self.catalog.industry_labels();
        let label = pick(&labels, argument, "industry")?;
        self.industry = label.clone();
        Ok(format!("industry: {label}"))
    }

    fn select_row(&mut self, argument: &str) -> Result<String, String> {
        let feed = self.feed.as_ref().ok_or("no upload feed is loaded")?;
        let index = argument
            .parse::<usize>()
            .map_err(|_| format!("usage: row <index>, got `{argument}`"))?;
        let row = feed.row(index).map_err(|error| error.to_string())?;
        self.feed_row = Some(index);
        Ok(format!("row {index}: {} / {}", row.product, display_industry(&row.industry)))
    }

    fn status(&self) -> String {
        let feed = match (&self.feed, self.feed_row) {
            (Some(feed), Some(index)) => format!("row {index} of {}", feed.len()),
            (Some(feed), None) => format!("{} rows, none selected", feed.len()),
            (None, _) => "not loaded".to_string(),
        };
        format!(
            "product: {}\nindustry: {}\nupload feed: {feed}\ninsights: {}",
            self.product().unwrap_or("(none)"),
            display_industry(self.industry()),
            if self.insights.is_some() { "enabled" } else { "unavailable" }
        )
    }

    fn preview_feed(&self) -> Result<String, String> {
        let feed = self.feed.as_ref().ok_or("no upload feed is loaded")?;
        let mut lines = vec![format!("upload feed: {} rows", feed.len())];
        for row in feed.rows().iter().take(DEFAULT_PREVIEW_ROWS) {
            lines.push(format!(
                "  [{}] {} / {}",
                row.index,
                row.product,
                display_industry(&row.industry)
            ));
        }
        Ok(lines.join("\n"))
    }

    fn recommend(&self) -> Result<String, String> {
        let product = self.product.clone().ok_or("no product selected")?;
        let industry = self.industry.clone();
        self.run_recommendation(&product, &industry)
    }

    fn run_row(&self) -> Result<String, String> {
        let feed = self.feed.as_ref().ok_or("no upload feed is loaded")?;
        let index = self.feed_row.ok_or("no upload feed row selected; use `row <index>`")?;
        let row = feed.row(index).map_err(|error| error.to_string())?;
        if self.catalog.base_record(&row.product).is_none() {
            return Err(format!(
                "Upload feed product not matched in base data (`{}`).",
                row.product
            ));
        }
        self.run_recommendation(&row.product, &row.industry)
    }

    fn run_recommendation(&self, product: &str, industry: &str) -> Result<String, String> {
        let correlation_id = new_correlation_id();
        let recommendation = self.catalog.resolve(product, industry).map_err(|error| {
            let interface = ApplicationError::from(error).into_interface(&correlation_id);
            format!("{} ({})", interface.user_message(), interface.message())
        })?;

        info!(
            event_name = "cli.session.recommend",
            correlation_id = %correlation_id,
            product,
            industry,
            "session recommendation resolved"
        );

        let mut warnings = Vec::new();
        let insights = self.insights.as_ref().and_then(|service| match build_runtime() {
            Ok(runtime) => runtime.block_on(generate_insights(
                service,
                &recommendation,
                &correlation_id,
                &mut warnings,
            )),
            Err(error) => {
                warnings.push(format!("failed to initialize async runtime: {error}"));
                None
            }
        });

        Ok(render_recommendation(&recommendation, insights.as_ref(), &warnings))
    }
}

fn numbered(items: &[&str], selected: Option<&str>) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let marker = if Some(*item) == selected { "*" } else { " " };
            format!("{marker} {}. {item}", index + 1)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Exact names win over numbers, so a product literally named `2` stays selectable.
fn pick(items: &[&str], argument: &str, kind: &str) -> Result<String, String> {
    if argument.is_empty() {
        return Err(format!("usage: {kind} <number|name>"));
    }
    if let Some(item) = items.iter().find(|item| **item == argument) {
        return Ok(item.to_string());
    }
    match argument.parse::<usize>() {
        Ok(number) if (1..=items.len()).contains(&number) => Ok(items[number - 1].to_string()),
        Ok(number) => Err(format!("{kind} number {number} is out of range (1-{})", items.len())),
        Err(_) => Err(format!("unknown {kind} `{argument}`")),
    }
}

fn display_industry(industry: &str) -> &str {
    if industry.is_empty() {
        "(none)"
    } else {
        industry
    }
}

fn render_recommendation(
    recommendation: &RecommendationResult,
    insights: Option<&DealInsights>,
    warnings: &[String],
) -> String {
    let mut lines = vec![
        "Recommended Product Details".to_string(),
        format!("  Product: {}", recommendation.product),
        format!("  Industry: {}", display_industry(&recommendation.industry)),
        format!("  Recommended Product: {}", recommendation.recommended_product),
        format!("  Recommended Code: {}", recommendation.recommended_code),
        format!("  MOQ: {}", recommendation.moq),
        format!("  Payment Terms: {}", recommendation.payment_terms),
    ];

    if let Some(insights) = insights {
        lines.push("Deal Insights".to_string());
        lines.extend(insights.raw.lines().map(|line| format!("  {line}")));
    }
    lines.extend(warnings.iter().map(|warning| format!("warning: {warning}")));
    lines.join("\n")
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let context = match CommandContext::load("session", options) {
        Ok(context) => context,
        Err(result) => return result,
    };

    let mut warnings = Vec::new();
    let feed = match build_runtime() {
        Ok(runtime) => runtime.block_on(fetch_feed(
            &context.config,
            &context.correlation_id,
            &mut warnings,
        )),
        Err(error) => {
            warnings.push(format!("failed to initialize async runtime: {error}"));
            None
        }
    };
    let insights = insights_service(&context.config.llm, &context.correlation_id, &mut warnings);

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(error) => {
            return CommandResult::failure(
                "session",
                "line_editor",
                format!("failed to start line editor: {error}"),
                EXIT_EDITOR,
            )
        }
    };

    if let Some(feed) = &feed {
        println!("upload feed loaded: {} rows", feed.len());
    }
    for warning in &warnings {
        println!("warning: {warning}");
    }
    println!("type `help` for commands");

    let mut session = Session::new(context.catalog, feed, insights);
    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    record_history(editor.add_history_entry(line.as_str()));
                }
                match session.handle(&line) {
                    SessionReply::Continue(output) if output.is_empty() => {}
                    SessionReply::Continue(output) => println!("{output}"),
                    SessionReply::Quit => break,
                }
            }
            Err(ReadlineError::Interrupted) => println!("(use `quit` to leave)"),
            Err(ReadlineError::Eof) => break,
            Err(error) => {
                return CommandResult::failure(
                    "session",
                    "line_editor",
                    format!("line editor failed: {error}"),
                    EXIT_EDITOR,
                )
            }
        }
    }

    CommandResult::success("session", "session ended")
}

/// Reports whether the line reached the history; a failure is logged, never fatal.
fn record_history(outcome: rustyline::Result<bool>) -> bool {
    match outcome {
        Ok(added) => added,
        Err(error) => {
            debug!(
                event_name = "cli.session.history_failed",
                error = %error,
                "line was not added to history"
            );
            false
        }
    }
}
