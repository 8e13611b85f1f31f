pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dealwise_core::config::{ConfigOverrides, LlmProvider, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "dealwise",
    about = "Dealwise product recommendation CLI",
    long_about = "Resolve industry-specific product recommendations from the catalogue, \
                  browse the upload feed, and ask a language model for deal insights.",
    after_help = "Examples:\n  dealwise recommend --product Widget --industry Apparel\n  \
                  dealwise feed --row 0\n  dealwise session\n  dealwise doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a dealwise.toml configuration file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Directory holding Base.csv and the industry tables")]
    catalog_dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Log level (trace|debug|info|warn|error)")]
    log_level: Option<String>,
    #[arg(long, global = true, value_parser = parse_provider, help = "openai|anthropic|ollama")]
    llm_provider: Option<LlmProvider>,
    #[arg(long, global = true, help = "Model name passed to the insights provider")]
    llm_model: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Resolve the recommendation for one product and industry")]
    Recommend {
        #[arg(long, help = "Base product name, matched exactly")]
        product: String,
        #[arg(long, default_value = "", help = "Industry label, e.g. Apparel")]
        industry: String,
        #[arg(long, help = "Do not call the language model for deal insights")]
        skip_insights: bool,
    },
    #[command(about = "List base products and industry labels")]
    Catalog,
    #[command(about = "Preview the upload feed, or run the recommendation for one row")]
    Feed {
        #[arg(long, help = "Zero-based row index to run")]
        row: Option<usize>,
        #[arg(long, help = "Do not call the language model for deal insights")]
        skip_insights: bool,
    },
    #[command(about = "Interactive session: pick products and industries, run recommendations")]
    Session,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Check configuration, catalogue, upload feed and LLM credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                catalog_dir: self.catalog_dir.clone(),
                log_level: self.log_level.clone(),
                llm_provider: self.llm_provider,
                llm_model: self.llm_model.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

fn parse_provider(value: &str) -> Result<LlmProvider, String> {
    value.parse::<LlmProvider>().map_err(|error| error.to_string())
}

pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let options = cli.load_options();
    logging::init(&options)?;

    let result = match cli.command {
        Command::Recommend { product, industry, skip_insights } => {
            commands::recommend::run(&options, &product, &industry, skip_insights)
        }
        Command::Catalog => commands::catalog::run(&options),
        Command::Feed { row, skip_insights } => commands::feed::run(&options, row, skip_insights),
        Command::Session => commands::session::run(&options),
        Command::Config => commands::config::run(&options),
        Command::Doctor { json } => commands::doctor::run(&options, json),
    };

    println!("{}", result.output);
    Ok(ExitCode::from(result.exit_code))
}
