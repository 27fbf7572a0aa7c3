//! Text artifacts: one report per analyzed proposal plus a run index.

use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::source::{Permalinks, Proposal};

pub const INDEX_FILE_NAME: &str = "00_INDEX.txt";
pub const MAX_TITLE_CHARS: usize = 50;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A report that made it to disk.
#[derive(Debug, Clone)]
pub struct SavedArtifact {
    pub path: PathBuf,
    pub proposal: Proposal,
    pub generated_at: DateTime<Local>,
}

fn banner() -> String {
    "=".repeat(60)
}

/// Keep alphanumerics, spaces, hyphens and underscores; trim; cap at 50 chars.
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim().chars().take(MAX_TITLE_CHARS).collect()
}

/// `proposal_{NN}_{title}.txt`, NN being the 1-based position in the batch.
pub fn report_file_name(title: &str, index: usize) -> String {
    format!("proposal_{:02}_{}.txt", index + 1, sanitize_title(title))
}

pub fn render_report(
    proposal: &Proposal,
    analysis: &str,
    links: &Permalinks,
    generated_at: &DateTime<Local>,
) -> String {
    let banner = banner();
    let mut out = String::new();
    let _ = writeln!(out, "{}", banner);
    let _ = writeln!(out, "PROPOSAL: {}", proposal.title);
    let _ = writeln!(out, "{}", banner);
    let _ = writeln!(out);
    let _ = writeln!(out, "STATUS: {}", proposal.state.as_str().to_uppercase());
    let _ = writeln!(out, "LINK: {}", links.proposal(&proposal.id));
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", banner);
    let _ = writeln!(out, "AI ANALYSIS WITH PROS & CONS");
    let _ = writeln!(out, "{}", banner);
    let _ = writeln!(out);
    out.push_str(analysis);
    let _ = writeln!(out);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", banner);
    let _ = writeln!(out, "Generated: {}", generated_at.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out, "{}", banner);
    out
}

pub fn render_index(
    proposals: &[Proposal],
    links: &Permalinks,
    generated_at: &DateTime<Local>,
) -> String {
    let banner = banner();
    let mut out = String::new();
    let _ = writeln!(out, "{}", banner);
    let _ = writeln!(out, "{} PROPOSALS - PROS & CONS ANALYSIS", links.label());
    let _ = writeln!(out, "{}", banner);
    let _ = writeln!(out);
    let _ = writeln!(out, "Generated: {}", generated_at.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out, "Total Proposals Analyzed: {}", proposals.len());
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", banner);
    let _ = writeln!(out);

    for (i, proposal) in proposals.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:02}. [{}] {}",
            i + 1,
            proposal.state.as_str().to_uppercase(),
            proposal.title
        );
        let _ = writeln!(out, "    Link: {}", links.proposal(&proposal.id));
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "{}", banner);
    let _ = writeln!(out, "Each file contains detailed pros/cons analysis");
    let _ = writeln!(out, "{}", banner);
    out
}

fn write_file(path: &Path, content: &str) -> Result<(), WriteError> {
    fs::write(path, content).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Persist one proposal's analysis under `dir`. Existing files with the
/// same name are replaced.
pub fn write_report(
    proposal: &Proposal,
    analysis: &str,
    dir: &Path,
    index: usize,
    links: &Permalinks,
) -> Result<SavedArtifact, WriteError> {
    let path = dir.join(report_file_name(&proposal.title, index));
    let generated_at = Local::now();
    write_file(&path, &render_report(proposal, analysis, links, &generated_at))?;
    debug!(path = %path.display(), "report written");

    Ok(SavedArtifact {
        path,
        proposal: proposal.clone(),
        generated_at,
    })
}

/// Write the manifest of saved proposals, in processing order.
pub fn write_index(
    proposals: &[Proposal],
    dir: &Path,
    links: &Permalinks,
) -> Result<PathBuf, WriteError> {
    let path = dir.join(INDEX_FILE_NAME);
    write_file(&path, &render_index(proposals, links, &Local::now()))?;
    info!(path = %path.display(), entries = proposals.len(), "index written");
    Ok(path)
}
