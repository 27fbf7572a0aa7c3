//! govdigest - LLM pros & cons digests of DAO governance proposals
//!
//! Fetches proposals for one governance space from a Snapshot-style GraphQL
//! hub, asks an LLM (Anthropic, OpenAI, or any OpenAI-compatible endpoint)
//! for a structured pros/cons analysis of each, and writes one text report
//! per proposal plus a `00_INDEX.txt` manifest.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod util;
