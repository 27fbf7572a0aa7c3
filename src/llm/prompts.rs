// Analysis prompt for governance proposals

use crate::source::Proposal;
use crate::util::truncate_chars;

/// Proposal bodies are cut to this many characters before prompting
pub const MAX_BODY_CHARS: usize = 4000;

/// Deterministic truncation; no summarization happens first.
pub fn truncate_body(body: &str) -> &str {
    truncate_chars(body, MAX_BODY_CHARS)
}

fn format_choices(choices: &[String]) -> String {
    let quoted: Vec<String> = choices.iter().map(|c| format!("\"{}\"", c)).collect();
    format!("[{}]", quoted.join(", "))
}

pub fn proposal_analysis_prompt(proposal: &Proposal, custom_instructions: Option<&str>) -> String {
    let choices = format_choices(&proposal.choices);

    let mut prompt = format!(
        r#"You are a DAO governance expert analyzing proposals for community members who need to make informed voting decisions.

PROPOSAL TITLE: {title}

FULL PROPOSAL TEXT:
{body}

VOTING OPTIONS: {choices}

Create a comprehensive analysis with BOTH quick reference AND detailed pros/cons:

=== PART 1: EXECUTIVE SUMMARY ===

ONE-LINE SUMMARY (max 15 words)

WHAT'S PROPOSED (2-3 sentences explaining the main action)

KEY NUMBERS (budget, timeline, affected parties, or metrics if mentioned)

VOTING OPTIONS: {choices}

=== PART 2: COMMUNITY IMPACT ANALYSIS ===

## PROS - Benefits for the Community

List 4-6 specific advantages this proposal brings:
- For token holders
- For the DAO treasury/governance
- For developers/builders
- For the broader ecosystem
- For long-term sustainability
- For user experience/adoption

Be specific. Explain HOW each benefit materializes, not just what it is.

## CONS - Risks & Concerns for the Community

List 4-6 specific risks or downsides:
- Financial risks (cost, opportunity cost, misallocation)
- Governance risks (precedents, centralization, power dynamics)
- Execution risks (complexity, dependencies, timeline)
- Community risks (controversy, division, unintended consequences)
- Strategic risks (long-term positioning, competitive disadvantage)

Be honest and critical. Point out real concerns that voters should consider.

=== PART 3: CRITICAL ANALYSIS ===

## WHAT'S UNCLEAR OR PROBLEMATIC

Identify 3-4 issues that need attention:
- Missing information that should be present
- Vague language that could be exploited
- Contradictions or inconsistencies
- Unrealistic assumptions
- Governance loopholes

## KEY INSIGHTS

Provide 3-4 deep insights:
- What's the real motivation behind this?
- What precedent does this set?
- Who benefits most? Who might lose?
- What's being overlooked?
- What would an expert think?

## THE BOTTOM LINE

In 2-3 sentences: What should delegates consider most carefully when voting?

Write clearly, think critically, and help voters understand both sides of the decision."#,
        title = proposal.title,
        body = truncate_body(&proposal.body),
        choices = choices,
    );

    if let Some(custom) = custom_instructions {
        prompt.push_str(&format!("\n\n## Additional Instructions\n\n{}\n", custom));
    }

    prompt
}
