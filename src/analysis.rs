//! Turns one proposal into a pros/cons analysis via the configured LLM.

use thiserror::Error;
use tracing::{debug, info};

use crate::llm::client::LlmClient;
use crate::llm::prompts;
use crate::source::Proposal;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("inference call failed: {0:#}")]
    Inference(#[from] anyhow::Error),
    #[error("inference service returned an empty analysis")]
    EmptyResponse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub proposal_id: String,
    pub text: String,
}

pub struct Analyzer {
    client: Box<dyn LlmClient>,
    custom_instructions: Option<String>,
}

impl Analyzer {
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self {
            client,
            custom_instructions: None,
        }
    }

    pub fn with_custom_instructions(mut self, custom: Option<String>) -> Self {
        self.custom_instructions = custom.filter(|c| !c.trim().is_empty());
        self
    }

    /// One inference call per proposal; no retries.
    pub async fn analyze(&self, proposal: &Proposal) -> Result<AnalysisResult, AnalysisError> {
        let short_title: String = proposal.title.chars().take(50).collect();
        info!(id = %proposal.id, "analyzing: {}", short_title);

        let prompt =
            prompts::proposal_analysis_prompt(proposal, self.custom_instructions.as_deref());
        debug!(prompt_chars = prompt.chars().count(), "prompt built");

        let raw = self.client.complete(&prompt).await?;
        let text = raw.trim();
        if text.is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }

        Ok(AnalysisResult {
            proposal_id: proposal.id.clone(),
            text: text.to_string(),
        })
    }
}
