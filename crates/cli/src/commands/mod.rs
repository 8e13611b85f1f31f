pub mod catalog;
pub mod config;
pub mod doctor;
pub mod feed;
pub mod recommend;
pub mod session;

use dealwise_agent::{DealInsights, InsightsService, LlmError};
use dealwise_core::catalog::{load_catalog, Catalog};
use dealwise_core::config::{AppConfig, LlmConfig, LoadOptions};
use dealwise_core::domain::recommendation::RecommendationResult;
use dealwise_core::errors::{ApplicationError, ResolveError};
use dealwise_core::feed::{FeedRow, UploadFeed};
use dealwise_core::resolver::RecommendationResolver;
use dealwise_storage::{load_upload_feed, StorageError};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_PRODUCT_NOT_FOUND: u8 = 3;
pub const EXIT_CATALOG: u8 = 4;
pub const EXIT_INVALID_CATALOG_DATA: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(&payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(&payload) }
    }

    /// Successful result carrying a command-specific payload.
    pub fn report<T: Serialize>(payload: &T) -> Self {
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    /// A resolver failure keeps the user-facing message and maps to its exit code.
    pub fn resolve_failure(command: &str, error: ResolveError, correlation_id: &str) -> Self {
        let (error_class, exit_code) = match &error {
            ResolveError::NotFound { .. } => ("product_not_found", EXIT_PRODUCT_NOT_FOUND),
            ResolveError::InvalidQuantity { .. } => {
                ("invalid_catalog_data", EXIT_INVALID_CATALOG_DATA)
            }
        };
        Self::application_failure(command, error_class, error.into(), correlation_id, exit_code)
    }

    pub fn application_failure(
        command: &str,
        error_class: &str,
        error: ApplicationError,
        correlation_id: &str,
        exit_code: u8,
    ) -> Self {
        let interface = error.into_interface(correlation_id);
        warn!(
            event_name = "cli.command.failed",
            command,
            error_class,
            correlation_id = interface.correlation_id(),
            error = %interface,
            "command failed"
        );
        Self::failure(
            command,
            error_class,
            format!("{} ({})", interface.user_message(), interface.message()),
            exit_code,
        )
    }
}

fn serialize_payload<T: Serialize>(payload: &T) -> String {
    serde_json::to_string(payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Payload printed by `recommend` and `feed --row`.
#[derive(Debug, Serialize)]
pub struct RecommendationReport {
    pub command: &'static str,
    pub status: &'static str,
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_row: Option<FeedRow>,
    pub recommendation: RecommendationResult,
    pub insights: Option<DealInsights>,
    pub warnings: Vec<String>,
}

/// Configuration and catalogue shared by every command that resolves products.
pub struct CommandContext {
    pub config: AppConfig,
    pub catalog: Catalog,
    pub correlation_id: String,
}

impl CommandContext {
    pub fn load(command: &str, options: &LoadOptions) -> Result<Self, CommandResult> {
        let correlation_id = new_correlation_id();
        let config = AppConfig::load(options.clone()).map_err(|error| {
            CommandResult::application_failure(
                command,
                "config_validation",
                ApplicationError::Configuration(error.to_string()),
                &correlation_id,
                EXIT_CONFIG,
            )
        })?;

        let catalog = load_catalog(&config.catalog).map_err(|error| {
            CommandResult::application_failure(
                command,
                "catalog_load",
                ApplicationError::Catalog(error.to_string()),
                &correlation_id,
                EXIT_CATALOG,
            )
        })?;

        Ok(Self { config, catalog, correlation_id })
    }
}

pub fn new_correlation_id() -> String {
    format!("REQ-{}", Uuid::new_v4().simple())
}

pub fn build_runtime() -> Result<tokio::runtime::Runtime, std::io::Error> {
    tokio::runtime::Builder::new_current_thread().enable_all().build()
}

/// Loads the configured upload feed. Failures become warnings and yield `None`.
pub async fn fetch_feed(
    config: &AppConfig,
    correlation_id: &str,
    warnings: &mut Vec<String>,
) -> Option<UploadFeed> {
    match load_upload_feed(&config.feed).await {
        Ok(feed) => feed,
        Err(error) => {
            warnings.push(feed_warning(&error));
            warn!(
                event_name = "cli.feed.unavailable",
                correlation_id,
                error = %error,
                "continuing without the upload feed"
            );
            None
        }
    }
}

pub fn feed_warning(error: &StorageError) -> String {
    match error {
        StorageError::MissingCredential(detail) => {
            format!("upload feed credentials not found: {detail}")
        }
        other => format!("error loading upload feed: {other}"),
    }
}

/// Builds the insights service, or records why it is unavailable.
pub fn insights_service(
    config: &LlmConfig,
    correlation_id: &str,
    warnings: &mut Vec<String>,
) -> Option<InsightsService> {
    match InsightsService::from_config(config) {
        Ok(service) => Some(service),
        Err(error) => {
            warnings.push(insights_warning(error, correlation_id));
            None
        }
    }
}

pub async fn generate_insights(
    service: &InsightsService,
    recommendation: &RecommendationResult,
    correlation_id: &str,
    warnings: &mut Vec<String>,
) -> Option<DealInsights> {
    match service.generate(recommendation, correlation_id).await {
        Ok(insights) => Some(insights),
        Err(error) => {
            warnings.push(insights_warning(error, correlation_id));
            None
        }
    }
}

pub fn insights_warning(error: LlmError, correlation_id: &str) -> String {
    warn!(
        event_name = "cli.insights.unavailable",
        correlation_id,
        error = %error,
        "deal insights unavailable"
    );
    let interface = ApplicationError::from(error).into_interface(correlation_id);
    format!("{} ({})", interface.user_message(), interface.message())
}

/// Resolves one recommendation and, unless skipped, asks for deal insights.
pub fn recommendation_report(
    command: &'static str,
    context: &CommandContext,
    product: &str,
    industry: &str,
    feed_row: Option<FeedRow>,
    skip_insights: bool,
    mut warnings: Vec<String>,
) -> CommandResult {
    let correlation_id = context.correlation_id.as_str();
    let recommendation = match context.catalog.resolve(product, industry) {
        Ok(recommendation) => recommendation,
        Err(error) => return CommandResult::resolve_failure(command, error, correlation_id),
    };

    let insights = if skip_insights {
        None
    } else {
        match insights_service(&context.config.llm, correlation_id, &mut warnings) {
            Some(service) => match build_runtime() {
                Ok(runtime) => runtime.block_on(generate_insights(
                    &service,
                    &recommendation,
                    correlation_id,
                    &mut warnings,
                )),
                Err(error) => {
                    warnings.push(format!("failed to initialize async runtime: {error}"));
                    None
                }
            },
            None => None,
        }
    };

    CommandResult::report(&RecommendationReport {
        command,
        status: "ok",
        correlation_id: correlation_id.to_string(),
        feed_row,
        recommendation,
        insights,
        warnings,
    })
}
