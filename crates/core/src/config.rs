use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_INDUSTRIES: &[&str] =
    &["Apparel", "Construction", "Energy", "Hospitality", "Transportation"];
pub const DEFAULT_FEED_KEY: &str = "uploaded_from_salesforce.csv";
pub const DEFAULT_FEED_PATH: &str = "data/uploaded_from_salesforce.csv";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub feed: FeedConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
    model_pinned: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogConfig {
    pub dir: PathBuf,
    pub base_file: String,
    pub industries: Vec<IndustrySource>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustrySource {
    pub label: String,
    pub file: String,
}

impl IndustrySource {
    /// `<label>.csv` next to the base table.
    pub fn conventional(label: &str) -> Self {
        Self { label: label.to_string(), file: format!("{label}.csv") }
    }
}

#[derive(Clone, Debug)]
pub struct FeedConfig {
    pub source: FeedSource,
    pub path: PathBuf,
    pub bucket: Option<String>,
    pub key: String,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<SecretString>,
    pub secret_access_key: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    None,
    Local,
    S3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
    Ollama,
}

impl LlmProvider {
    pub fn requires_api_key(self) -> bool {
        matches!(self, Self::OpenAi | Self::Anthropic)
    }

    /// Model used when no layer names one for this provider.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-3.5-turbo",
            Self::Anthropic => "claude-3-5-haiku-latest",
            Self::Ollama => "llama3.1",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
        }
    }

    fn fallback_key_env(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Ollama => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_dir: Option<PathBuf>,
    pub feed_source: Option<FeedSource>,
    pub feed_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig {
                dir: PathBuf::from("data"),
                base_file: "Base.csv".to_string(),
                industries: DEFAULT_INDUSTRIES
                    .iter()
                    .map(|label| IndustrySource::conventional(label))
                    .collect(),
            },
            feed: FeedConfig {
                source: FeedSource::None,
                path: PathBuf::from(DEFAULT_FEED_PATH),
                bucket: None,
                key: DEFAULT_FEED_KEY.to_string(),
                region: None,
                endpoint_url: None,
                access_key_id: None,
                secret_access_key: None,
            },
            llm: LlmConfig {
                provider: LlmProvider::OpenAi,
                api_key: None,
                base_url: None,
                model: LlmProvider::OpenAi.default_model().to_string(),
                timeout_secs: 30,
                max_tokens: 512,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            model_pinned: false,
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for FeedSource {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "local" | "file" => Ok(Self::Local),
            "s3" => Ok(Self::S3),
            other => Err(ConfigError::Validation(format!(
                "unsupported feed source `{other}` (expected none|local|s3)"
            ))),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|anthropic|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("dealwise.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.apply_provider_default_model();
        config.apply_provider_key_fallback();
        config.validate()?;

        Ok(config)
    }

    /// Whether the configured provider can be called with what is configured.
    pub fn llm_credential_present(&self) -> bool {
        if !self.llm.provider.requires_api_key() {
            return true;
        }
        self.llm
            .api_key
            .as_ref()
            .map(|value| !value.expose_secret().trim().is_empty())
            .unwrap_or(false)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(dir) = catalog.dir {
                self.catalog.dir = dir;
            }
            if let Some(base_file) = catalog.base_file {
                self.catalog.base_file = base_file;
            }
            if let Some(industries) = catalog.industries {
                self.catalog.industries = industries;
            }
        }

        if let Some(feed) = patch.feed {
            if let Some(source) = feed.source {
                self.feed.source = source;
            }
            if let Some(path) = feed.path {
                self.feed.path = path;
            }
            if let Some(bucket) = feed.bucket {
                self.feed.bucket = Some(bucket);
            }
            if let Some(key) = feed.key {
                self.feed.key = key;
            }
            if let Some(region) = feed.region {
                self.feed.region = Some(region);
            }
            if let Some(endpoint_url) = feed.endpoint_url {
                self.feed.endpoint_url = Some(endpoint_url);
            }
            if let Some(access_key_id) = feed.access_key_id {
                self.feed.access_key_id = Some(secret_value(access_key_id));
            }
            if let Some(secret_access_key) = feed.secret_access_key {
                self.feed.secret_access_key = Some(secret_value(secret_access_key));
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.pin_model(model);
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_tokens) = llm.max_tokens {
                self.llm.max_tokens = max_tokens;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("DEALWISE_CATALOG_DIR") {
            self.catalog.dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("DEALWISE_CATALOG_BASE_FILE") {
            self.catalog.base_file = value;
        }
        if let Some(value) = read_env("DEALWISE_CATALOG_INDUSTRIES") {
            self.catalog.industries = parse_industries("DEALWISE_CATALOG_INDUSTRIES", &value)?;
        }

        if let Some(value) = read_env("DEALWISE_FEED_SOURCE") {
            self.feed.source = value.parse()?;
        }
        if let Some(value) = read_env("DEALWISE_FEED_PATH") {
            self.feed.path = PathBuf::from(value);
        }
        if let Some(value) = read_env("DEALWISE_FEED_BUCKET") {
            self.feed.bucket = Some(value);
        }
        if let Some(value) = read_env("DEALWISE_FEED_KEY") {
            self.feed.key = value;
        }
        if let Some(value) = read_env("DEALWISE_FEED_REGION") {
            self.feed.region = Some(value);
        }
        if let Some(value) = read_env("DEALWISE_FEED_ENDPOINT_URL") {
            self.feed.endpoint_url = Some(value);
        }
        if let Some(value) = read_env("DEALWISE_FEED_ACCESS_KEY_ID") {
            self.feed.access_key_id = Some(secret_value(value));
        }
        if let Some(value) = read_env("DEALWISE_FEED_SECRET_ACCESS_KEY") {
            self.feed.secret_access_key = Some(secret_value(value));
        }

        if let Some(value) = read_env("DEALWISE_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("DEALWISE_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DEALWISE_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("DEALWISE_LLM_MODEL") {
            self.pin_model(value);
        }
        if let Some(value) = read_env("DEALWISE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("DEALWISE_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("DEALWISE_LLM_MAX_TOKENS") {
            self.llm.max_tokens = parse_u32("DEALWISE_LLM_MAX_TOKENS", &value)?;
        }

        let log_level =
            read_env("DEALWISE_LOGGING_LEVEL").or_else(|| read_env("DEALWISE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("DEALWISE_LOGGING_FORMAT").or_else(|| read_env("DEALWISE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_dir) = overrides.catalog_dir {
            self.catalog.dir = catalog_dir;
        }
        if let Some(feed_source) = overrides.feed_source {
            self.feed.source = feed_source;
        }
        if let Some(feed_path) = overrides.feed_path {
            self.feed.path = feed_path;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.pin_model(llm_model);
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
    }

    fn pin_model(&mut self, model: String) {
        self.llm.model = model;
        self.model_pinned = true;
    }

    fn apply_provider_default_model(&mut self) {
        if !self.model_pinned {
            self.llm.model = self.llm.provider.default_model().to_string();
        }
    }

    fn apply_provider_key_fallback(&mut self) {
        if self.llm.api_key.is_some() {
            return;
        }
        if let Some(value) = self.llm.provider.fallback_key_env().and_then(read_env) {
            self.llm.api_key = Some(secret_value(value));
        }
    }

    /// Credentials are not validated here: a missing key or bucket degrades the
    /// affected feature at use time instead of refusing to start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_feed(&self.feed)?;
        validate_llm(&self.llm)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("dealwise.toml"), PathBuf::from("config/dealwise.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.base_file.trim().is_empty() {
        return Err(ConfigError::Validation("catalog.base_file must not be empty".to_string()));
    }

    let mut seen: Vec<&str> = Vec::with_capacity(catalog.industries.len());
    for source in &catalog.industries {
        let label = source.label.trim();
        if label.is_empty() || source.file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "catalog.industries entries need both a label and a file".to_string(),
            ));
        }
        if seen.contains(&label) {
            return Err(ConfigError::Validation(format!(
                "catalog.industries lists `{label}` more than once"
            )));
        }
        seen.push(label);
    }

    Ok(())
}

fn validate_feed(feed: &FeedConfig) -> Result<(), ConfigError> {
    if feed.key.trim().is_empty() {
        return Err(ConfigError::Validation("feed.key must not be empty".to_string()));
    }

    if let Some(endpoint_url) = &feed.endpoint_url {
        if !endpoint_url.starts_with("http://") && !endpoint_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "feed.endpoint_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if let Some(base_url) = &llm.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "llm.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// `Apparel,Energy=energy_rates.csv`: bare labels read `<label>.csv`.
fn parse_industries(key: &str, value: &str) -> Result<Vec<IndustrySource>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once('=') {
            Some((label, file)) if !label.trim().is_empty() && !file.trim().is_empty() => {
                Ok(IndustrySource {
                    label: label.trim().to_string(),
                    file: file.trim().to_string(),
                })
            }
            Some(_) => Err(ConfigError::InvalidEnvOverride {
                key: key.to_string(),
                value: value.to_string(),
            }),
            None => Ok(IndustrySource::conventional(item)),
        })
        .collect()
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    feed: Option<FeedPatch>,
    llm: Option<LlmPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    dir: Option<PathBuf>,
    base_file: Option<String>,
    industries: Option<Vec<IndustrySource>>,
}

#[derive(Debug, Default, Deserialize)]
struct FeedPatch {
    source: Option<FeedSource>,
    path: Option<PathBuf>,
    bucket: Option<String>,
    key: Option<String>,
    region: Option<String>,
    endpoint_url: Option<String>,
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
