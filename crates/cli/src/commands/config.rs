use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dealwise_core::config::{AppConfig, LlmProvider, LoadOptions};
use dealwise_core::errors::ApplicationError;
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

use crate::commands::{new_correlation_id, CommandResult, EXIT_CONFIG};

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::application_failure(
                "config",
                "config_validation",
                ApplicationError::Configuration(error.to_string()),
                &new_correlation_id(),
                EXIT_CONFIG,
            )
        }
    };

    let config_file_path = detect_config_path(options.config_path.as_deref());
    let sources = SourceLookup {
        doc: load_config_file_doc(config_file_path.as_deref()),
        path: config_file_path,
    };
    let overrides = &options.overrides;

    let industries = config
        .catalog
        .industries
        .iter()
        .map(|entry| format!("{}={}", entry.label, entry.file))
        .collect::<Vec<_>>()
        .join(",");

    let mut lines = vec![
        "effective config (source precedence: flag > env > file > default):".to_string(),
        render_line(
            "catalog.dir",
            &config.catalog.dir.display().to_string(),
            sources.source(
                "catalog.dir",
                &["DEALWISE_CATALOG_DIR"],
                overrides.catalog_dir.is_some(),
            ),
        ),
        render_line(
            "catalog.base_file",
            &config.catalog.base_file,
            sources.source("catalog.base_file", &["DEALWISE_CATALOG_BASE_FILE"], false),
        ),
        render_line(
            "catalog.industries",
            &industries,
            sources.source("catalog.industries", &["DEALWISE_CATALOG_INDUSTRIES"], false),
        ),
        render_line(
            "feed.source",
            &format!("{:?}", config.feed.source),
            sources.source(
                "feed.source",
                &["DEALWISE_FEED_SOURCE"],
                overrides.feed_source.is_some(),
            ),
        ),
        render_line(
            "feed.path",
            &config.feed.path.display().to_string(),
            sources.source("feed.path", &["DEALWISE_FEED_PATH"], overrides.feed_path.is_some()),
        ),
        render_line(
            "feed.bucket",
            config.feed.bucket.as_deref().unwrap_or("<unset>"),
            sources.source("feed.bucket", &["DEALWISE_FEED_BUCKET"], false),
        ),
        render_line(
            "feed.key",
            &config.feed.key,
            sources.source("feed.key", &["DEALWISE_FEED_KEY"], false),
        ),
        render_line(
            "feed.region",
            config.feed.region.as_deref().unwrap_or("<unset>"),
            sources.source("feed.region", &["DEALWISE_FEED_REGION"], false),
        ),
        render_line(
            "feed.endpoint_url",
            config.feed.endpoint_url.as_deref().unwrap_or("<unset>"),
            sources.source("feed.endpoint_url", &["DEALWISE_FEED_ENDPOINT_URL"], false),
        ),
        render_line(
            "feed.access_key_id",
            &redact_optional(config.feed.access_key_id.as_ref()),
            sources.source("feed.access_key_id", &["DEALWISE_FEED_ACCESS_KEY_ID"], false),
        ),
        render_line(
            "feed.secret_access_key",
            &redact_optional(config.feed.secret_access_key.as_ref()),
            sources.source("feed.secret_access_key", &["DEALWISE_FEED_SECRET_ACCESS_KEY"], false),
        ),
        render_line(
            "llm.provider",
            config.llm.provider.as_str(),
            sources.source(
                "llm.provider",
                &["DEALWISE_LLM_PROVIDER"],
                overrides.llm_provider.is_some(),
            ),
        ),
        render_line(
            "llm.model",
            &config.llm.model,
            sources.source("llm.model", &["DEALWISE_LLM_MODEL"], overrides.llm_model.is_some()),
        ),
        render_line(
            "llm.base_url",
            config.llm.base_url.as_deref().unwrap_or("<unset>"),
            sources.source("llm.base_url", &["DEALWISE_LLM_BASE_URL"], false),
        ),
    ];

    // Provider keys such as OPENAI_API_KEY only apply when nothing else set one.
    let fallback_env = match config.llm.provider {
        LlmProvider::OpenAi => Some("OPENAI_API_KEY"),
        LlmProvider::Anthropic => Some("ANTHROPIC_API_KEY"),
        LlmProvider::Ollama => None,
    };
    let mut api_key_source = sources.source(
        "llm.api_key",
        &["DEALWISE_LLM_API_KEY"],
        overrides.llm_api_key.is_some(),
    );
    if let Some(fallback) = fallback_env.filter(|key| env::var_os(key).is_some()) {
        if api_key_source == "default" {
            api_key_source = format!("env ({fallback})");
        }
    }
    lines.push(render_line(
        "llm.api_key",
        &redact_optional(config.llm.api_key.as_ref()),
        api_key_source,
    ));
    lines.push(render_line(
        "llm.timeout_secs",
        &config.llm.timeout_secs.to_string(),
        sources.source("llm.timeout_secs", &["DEALWISE_LLM_TIMEOUT_SECS"], false),
    ));
    lines.push(render_line(
        "llm.max_tokens",
        &config.llm.max_tokens.to_string(),
        sources.source("llm.max_tokens", &["DEALWISE_LLM_MAX_TOKENS"], false),
    ));
    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        sources.source(
            "logging.level",
            &["DEALWISE_LOGGING_LEVEL", "DEALWISE_LOG_LEVEL"],
            overrides.log_level.is_some(),
        ),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        sources.source(
            "logging.format",
            &["DEALWISE_LOGGING_FORMAT", "DEALWISE_LOG_FORMAT"],
            false,
        ),
    ));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

struct SourceLookup {
    doc: Option<Value>,
    path: Option<PathBuf>,
}

impl SourceLookup {
    fn source(&self, key_path: &str, env_keys: &[&str], overridden: bool) -> String {
        field_source(key_path, env_keys, overridden, self.doc.as_ref(), self.path.as_deref())
    }
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from("dealwise.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/dealwise.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    overridden: bool,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if overridden {
        return "flag".to_string();
    }

    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_optional(secret: Option<&SecretString>) -> String {
    match secret {
        Some(secret) => redact_secret(secret.expose_secret()),
        None => "<unset>".to_string(),
    }
}

/// Keeps a recognisable key prefix such as `sk-` and hides the rest.
fn redact_secret(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        if !prefix.is_empty() && prefix.len() <= 8 {
            return format!("{prefix}-***");
        }
    }

    "<redacted>".to_string()
}
