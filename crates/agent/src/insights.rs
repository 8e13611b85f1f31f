use std::time::Instant;

use dealwise_core::config::LlmConfig;
use dealwise_core::domain::recommendation::RecommendationResult;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::llm::{build_client, LlmClient, LlmError};
use crate::prompt::render_deal_prompt;

pub const DEAL_PROBABILITY_LABEL: &str = "Deal Probability";
pub const PROFITABILITY_LABEL: &str = "Profitability";
pub const NEXT_STEP_LABEL: &str = "Next Step";

/// The model's reply with the three labelled answers pulled out when present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealInsights {
    pub deal_probability: Option<String>,
    pub profitability: Option<String>,
    pub next_step: Option<String>,
    pub raw: String,
}

impl DealInsights {
    pub fn is_complete(&self) -> bool {
        self.deal_probability.is_some() && self.profitability.is_some() && self.next_step.is_some()
    }
}

/// Never fails: labels are matched case-insensitively, first occurrence wins,
/// and list markers or bold markers around a line are ignored.
pub fn parse_insights(text: &str) -> DealInsights {
    let mut insights = DealInsights {
        deal_probability: None,
        profitability: None,
        next_step: None,
        raw: text.to_string(),
    };

    for line in text.lines() {
        let line = line.trim().trim_start_matches(&['-', '*', ' '][..]).trim();
        let slots = [
            (DEAL_PROBABILITY_LABEL, &mut insights.deal_probability),
            (PROFITABILITY_LABEL, &mut insights.profitability),
            (NEXT_STEP_LABEL, &mut insights.next_step),
        ];
        for (label, slot) in slots {
            if slot.is_some() {
                continue;
            }
            if let Some(value) = labelled_value(line, label) {
                *slot = Some(value);
                break;
            }
        }
    }

    insights
}

fn labelled_value(line: &str, label: &str) -> Option<String> {
    let head = line.get(..label.len())?;
    if !head.eq_ignore_ascii_case(label) {
        return None;
    }
    let rest = line[label.len()..].trim_start_matches('*').trim_start();
    let value = rest.strip_prefix(':')?.trim().trim_matches('*').trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub struct InsightsService {
    client: Box<dyn LlmClient>,
}

impl InsightsService {
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        build_client(config).map(Self::new)
    }

    pub async fn generate(
        &self,
        recommendation: &RecommendationResult,
        correlation_id: &str,
    ) -> Result<DealInsights, LlmError> {
        let started = Instant::now();
        let prompt = render_deal_prompt(recommendation);
        let reply = self.client.complete(&prompt).await?;
        let insights = parse_insights(&reply);

        info!(
            event_name = "insights.generate.completed",
            correlation_id,
            product = %recommendation.product,
            industry = %recommendation.industry,
            complete = insights.is_complete(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "deal insights generated"
        );
        Ok(insights)
    }
}
