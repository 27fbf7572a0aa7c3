use anyhow::{bail, Result};

use super::client::{LlmClient, MockLlmClient};
use super::client_impl::{AnthropicClient, OpenAIClient};
use crate::config::Config;

/// Create an LLM client based on configuration
pub fn create_client(config: &Config, dry_run: bool) -> Result<Box<dyn LlmClient>> {
    if dry_run {
        return Ok(Box::new(MockLlmClient::new()));
    }

    let api_key = config.get_api_key()?;
    let llm = &config.llm;

    match llm.provider.as_str() {
        "anthropic" => {
            let client = match llm.base_url {
                Some(ref base_url) => AnthropicClient::with_base_url(
                    api_key,
                    llm.model.clone(),
                    base_url.clone(),
                    llm.max_tokens,
                    llm.timeout_secs,
                )?,
                None => AnthropicClient::new(
                    api_key,
                    llm.model.clone(),
                    llm.max_tokens,
                    llm.timeout_secs,
                )?,
            };
            Ok(Box::new(client))
        }

        "openai" => Ok(Box::new(OpenAIClient::new(
            api_key,
            llm.model.clone(),
            llm.max_tokens,
            llm.timeout_secs,
        )?)),

        "openai-compatible" => {
            let base_url = llm
                .base_url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434/v1".to_string());

            Ok(Box::new(OpenAIClient::with_base_url(
                api_key,
                llm.model.clone(),
                base_url,
                llm.max_tokens,
                llm.timeout_secs,
            )?))
        }

        unknown => bail!("Unknown LLM provider: {}", unknown),
    }
}
