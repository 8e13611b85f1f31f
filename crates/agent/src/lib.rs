//! Deal insights from a language model.
//!
//! The model only comments on a recommendation that the core resolver has
//! already produced. It never chooses the product, quantity or terms.
//!
//! - `llm` holds the `LlmClient` seam and provider selection
//! - `openai` and `anthropic` are the HTTP clients behind it
//! - `prompt` renders the deal context
//! - `insights` parses the labelled reply

pub mod anthropic;
pub mod insights;
pub mod llm;
#[cfg(test)]
mod loopback;
pub mod openai;
pub mod prompt;

pub use insights::{parse_insights, DealInsights, InsightsService};
pub use llm::{build_client, LlmClient, LlmError};
