use anyhow::anyhow;
use dealwise_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use tracing::Level;

/// Installs the global subscriber. Events go to stderr so that command
/// payloads on stdout stay machine-readable.
pub fn init(options: &LoadOptions) -> anyhow::Result<()> {
    let logging = logging_config(options);
    let level = max_level(&logging.level);

    let installed = match logging.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_max_level(level)
            .compact()
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_max_level(level)
            .pretty()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_max_level(level)
            .json()
            .try_init(),
    };

    installed.map_err(|error| anyhow!("failed to initialise logging: {error}"))
}

// A broken config is reported by the command itself; logging falls back to defaults.
fn logging_config(options: &LoadOptions) -> LoggingConfig {
    match AppConfig::load(options.clone()) {
        Ok(config) => config.logging,
        Err(_) => {
            let mut logging = AppConfig::default().logging;
            if let Some(level) = &options.overrides.log_level {
                logging.level = level.clone();
            }
            logging
        }
    }
}

fn max_level(level: &str) -> Level {
    level.trim().parse::<Level>().unwrap_or(Level::INFO)
}
