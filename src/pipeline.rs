//! Batch orchestration: fetch, analyze each proposal, write reports, index.
//!
//! Failures are contained per proposal. A failed fetch degrades to an empty
//! batch, a failed analysis or report write counts as one failure, and the
//! index is written over whatever did get saved.

use anyhow::{Context, Result};
use std::fmt;
use std::num::IntErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::analysis::Analyzer;
use crate::report::{self, SavedArtifact};
use crate::source::{self, Permalinks, Proposal, ProposalSource, StatusFilter};

/// Count used when a custom count can't be parsed
pub const DEFAULT_CUSTOM_COUNT: u32 = 10;

/// What the user asked to analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Newest active proposal, or the newest closed one if none are active
    Latest,
    AllActive,
    RecentClosed,
    RecentAny,
    Custom(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPlan {
    pub primary: (StatusFilter, u32),
    pub fallback: Option<(StatusFilter, u32)>,
}

/// Parse a free-form count: clamped to 1..=100, 10 when not a number.
/// Integers too large for `i64` still clamp by sign.
pub fn parse_count(input: &str) -> u32 {
    match input.trim().parse::<i64>() {
        Ok(n) => n.clamp(1, source::MAX_LIMIT as i64) as u32,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => source::MAX_LIMIT,
            IntErrorKind::NegOverflow => 1,
            _ => DEFAULT_CUSTOM_COUNT,
        },
    }
}

impl Selection {
    /// Map a numbered menu choice (1-5). Unrecognized choices mean `Latest`.
    pub fn from_menu_choice(choice: &str, custom_count: Option<&str>) -> Self {
        match choice.trim() {
            "1" => Selection::Latest,
            "2" => Selection::AllActive,
            "3" => Selection::RecentClosed,
            "4" => Selection::RecentAny,
            "5" => Selection::Custom(custom_count.map_or(DEFAULT_CUSTOM_COUNT, parse_count)),
            other => {
                warn!("Invalid choice {:?}, fetching latest proposal", other);
                Selection::Latest
            }
        }
    }

    pub fn plan(&self) -> FetchPlan {
        let (primary, fallback) = match *self {
            Selection::Latest => (
                (StatusFilter::Active, 1),
                Some((StatusFilter::Closed, 1)),
            ),
            Selection::AllActive => ((StatusFilter::Active, source::MAX_LIMIT), None),
            Selection::RecentClosed => ((StatusFilter::Closed, 5), None),
            Selection::RecentAny => ((StatusFilter::All, 10), None),
            Selection::Custom(n) => ((StatusFilter::All, source::clamp_limit(n)), None),
        };
        FetchPlan { primary, fallback }
    }
}

/// Where a run is. `Aborted` is entered by the caller when `run` errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SelectingMode,
    Fetching,
    AnalyzingBatch,
    Reporting,
    Done,
    Aborted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SelectingMode => "selecting-mode",
            Stage::Fetching => "fetching",
            Stage::AnalyzingBatch => "analyzing-batch",
            Stage::Reporting => "reporting",
            Stage::Done => "done",
            Stage::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    pub total: usize,
    pub saved: Vec<SavedArtifact>,
    pub index_path: Option<PathBuf>,
    /// Set when the batch is empty because the hub call failed
    pub fetch_error: Option<String>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.saved.len()
    }

    pub fn failed(&self) -> usize {
        self.total - self.saved.len()
    }
}

pub struct Pipeline {
    source: Box<dyn ProposalSource>,
    analyzer: Analyzer,
    output_dir: PathBuf,
    links: Permalinks,
    delay: Duration,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn ProposalSource>,
        analyzer: Analyzer,
        output_dir: PathBuf,
        links: Permalinks,
    ) -> Self {
        Self {
            source,
            analyzer,
            output_dir,
            links,
            delay: Duration::from_secs(1),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn enter(stage: Stage) {
        debug!(%stage, "pipeline stage");
    }

    /// Run one batch. Only directory creation failure is returned as an error.
    pub async fn run(&self, selection: Selection) -> Result<RunSummary> {
        Self::enter(Stage::SelectingMode);
        let plan = selection.plan();
        debug!(?selection, ?plan, "selection resolved");

        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "failed to create output directory {}",
                self.output_dir.display()
            )
        })?;
        info!("Save directory: {}", self.output_dir.display());

        Self::enter(Stage::Fetching);
        let (mut proposals, mut fetch_error) = self.fetch(plan.primary).await;
        if proposals.is_empty() {
            if let Some(fallback) = plan.fallback {
                info!(
                    "No {} proposals, trying {}",
                    plan.primary.0, fallback.0
                );
                (proposals, fetch_error) = self.fetch(fallback).await;
            }
        }

        let mut summary = RunSummary {
            output_dir: self.output_dir.clone(),
            total: proposals.len(),
            saved: Vec::new(),
            index_path: None,
            fetch_error,
        };

        if proposals.is_empty() {
            info!("No proposals found");
            Self::enter(Stage::Done);
            return Ok(summary);
        }

        Self::enter(Stage::AnalyzingBatch);
        summary.saved = self.analyze_batch(&proposals).await;

        Self::enter(Stage::Reporting);
        if !summary.saved.is_empty() {
            let saved: Vec<Proposal> = summary.saved.iter().map(|a| a.proposal.clone()).collect();
            match report::write_index(&saved, &self.output_dir, &self.links) {
                Ok(path) => summary.index_path = Some(path),
                Err(e) => error!("Error creating index: {}", e),
            }
        }

        info!(
            total = summary.total,
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "batch complete"
        );
        Self::enter(Stage::Done);
        Ok(summary)
    }

    async fn fetch(&self, (filter, limit): (StatusFilter, u32)) -> (Vec<Proposal>, Option<String>) {
        match self.source.fetch(filter, limit).await {
            Ok(proposals) => (proposals, None),
            Err(e) => {
                warn!("Fetching {} proposals failed: {}", filter, e);
                (Vec::new(), Some(e.to_string()))
            }
        }
    }

    async fn analyze_batch(&self, proposals: &[Proposal]) -> Vec<SavedArtifact> {
        let total = proposals.len();
        let mut saved = Vec::new();

        for (i, proposal) in proposals.iter().enumerate() {
            info!(
                "[{}/{}] Processing: {} ({}) {}",
                i + 1,
                total,
                proposal.title.chars().take(60).collect::<String>(),
                proposal.state,
                self.links.proposal(&proposal.id)
            );

            match self.analyzer.analyze(proposal).await {
                Ok(analysis) => {
                    match report::write_report(
                        proposal,
                        &analysis.text,
                        &self.output_dir,
                        i,
                        &self.links,
                    ) {
                        Ok(artifact) => {
                            info!("Saved to: {}", artifact.path.display());
                            saved.push(artifact);
                        }
                        Err(e) => error!("Error saving {}: {}", proposal.id, e),
                    }
                }
                Err(e) => warn!("Analysis failed for {}: {}", proposal.id, e),
            }

            if i + 1 < total && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        saved
    }
}
