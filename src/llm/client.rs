use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Offline client for `--dry-run`: returns a canned analysis that follows
/// the prompt's section layout.
pub struct MockLlmClient;

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let title = prompt
            .lines()
            .find_map(|l| l.strip_prefix("PROPOSAL TITLE: "))
            .unwrap_or("Untitled proposal");

        Ok(format!(
            r#"=== PART 1: EXECUTIVE SUMMARY ===

ONE-LINE SUMMARY: Dry-run analysis of "{title}".

WHAT'S PROPOSED: This is placeholder output produced without calling an inference service.

KEY NUMBERS: none extracted in dry-run mode.

=== PART 2: COMMUNITY IMPACT ANALYSIS ===

## PROS - Benefits for the Community
- For token holders: placeholder
- For the DAO treasury/governance: placeholder
- For developers/builders: placeholder
- For the broader ecosystem: placeholder

## CONS - Risks & Concerns for the Community
- Financial risks: placeholder
- Governance risks: placeholder
- Execution risks: placeholder
- Community risks: placeholder

=== PART 3: CRITICAL ANALYSIS ===

## WHAT'S UNCLEAR OR PROBLEMATIC
- placeholder

## KEY INSIGHTS
- placeholder

## THE BOTTOM LINE
Run without --dry-run for a real analysis."#
        ))
    }
}
