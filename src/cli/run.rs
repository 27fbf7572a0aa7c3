use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::analysis::Analyzer;
use crate::cli::menu;
use crate::config::Config;
use crate::llm::factory;
use crate::pipeline::{self, Pipeline, RunSummary, Selection};
use crate::source::{self, Permalinks, SnapshotSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Latest active proposal (falls back to latest closed)
    Latest,
    /// All active proposals
    Active,
    /// Last 5 closed proposals
    Closed,
    /// Last 10 proposals of any status
    Recent,
    /// Custom number of proposals (see --count)
    Custom,
}

impl Mode {
    pub fn selection(self, count: Option<u32>) -> Selection {
        match self {
            Mode::Latest => Selection::Latest,
            Mode::Active => Selection::AllActive,
            Mode::Closed => Selection::RecentClosed,
            Mode::Recent => Selection::RecentAny,
            Mode::Custom => Selection::Custom(
                count.map_or(pipeline::DEFAULT_CUSTOM_COUNT, source::clamp_limit),
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// What to analyze. Shows the interactive menu when omitted.
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Number of proposals for --mode custom (1-100). Implies custom mode.
    #[arg(long)]
    pub count: Option<u32>,

    /// Path to config file (defaults to ./govdigest.toml or ~/.config/govdigest/config.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// Directory for reports and the index
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Override LLM provider (anthropic, openai, openai-compatible)
    #[arg(long)]
    pub provider: Option<String>,

    /// Override LLM model
    #[arg(long)]
    pub model: Option<String>,

    /// Override governance space (e.g. "uniswapgovernance.eth")
    #[arg(long)]
    pub space: Option<String>,

    /// Pause between proposals in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Open the output folder when done
    #[arg(long)]
    pub open: bool,

    /// Use mock LLM client (no API key, no inference calls)
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref provider) = self.provider {
            info!("CLI override: provider = {}", provider);
            config.llm.provider = provider.clone();
        }
        if let Some(ref model) = self.model {
            info!("CLI override: model = {}", model);
            config.llm.model = model.clone();
        }
        if let Some(ref space) = self.space {
            info!("CLI override: space = {}", space);
            config.source.space = space.clone();
        }
        if let Some(ref dir) = self.output_dir {
            info!("CLI override: output_dir = {}", dir.display());
            config.output.dir = dir.clone();
        }
        if let Some(delay) = self.delay_ms {
            info!("CLI override: request_delay_ms = {}", delay);
            config.pipeline.request_delay_ms = delay;
        }
    }

    fn preset_selection(&self) -> Option<Selection> {
        match (self.mode, self.count) {
            (Some(mode), count) => {
                if count.is_some() && mode != Mode::Custom {
                    warn!("--count only applies to --mode custom; ignoring it");
                }
                Some(mode.selection(count))
            }
            (None, Some(n)) => Some(Mode::Custom.selection(Some(n))),
            (None, None) => None,
        }
    }
}

/// Load config, resolve the selection (flags or menu), run one batch and
/// print the summary. An aborted run still prints zero counts.
pub async fn run<R: BufRead, W: Write>(
    args: RunArgs,
    input: &mut R,
    out: &mut W,
) -> Result<RunSummary> {
    let result = execute(args, input, out).await;
    if let Err(ref e) = result {
        menu::print_aborted_summary(out, e)?;
    }
    result
}

async fn execute<R: BufRead, W: Write>(
    args: RunArgs,
    input: &mut R,
    out: &mut W,
) -> Result<RunSummary> {
    let mut config = Config::load_with_path(args.config.clone())?;
    args.apply_overrides(&mut config);

    menu::print_header(out)?;

    let selection = match args.preset_selection() {
        Some(selection) => selection,
        None => menu::prompt_selection(input, out).context("failed to read menu choice")?,
    };
    info!(?selection, "selection");

    let source = SnapshotSource::from_config(&config.source)
        .context("failed to build voting platform client")?;
    let client = factory::create_client(&config, args.dry_run)?;
    if args.dry_run {
        info!("Using mock LLM client");
    } else {
        info!(
            "Using {} LLM provider ({})",
            config.llm.provider, config.llm.model
        );
    }

    let analyzer =
        Analyzer::new(client).with_custom_instructions(config.prompts.analysis_custom.clone());
    let pipeline = Pipeline::new(
        Box::new(source),
        analyzer,
        config.output.dir.clone(),
        Permalinks::from_config(&config.source),
    )
    .with_delay(Duration::from_millis(config.pipeline.request_delay_ms));

    let summary = pipeline.run(selection).await?;
    menu::print_summary(out, &summary)?;

    if args.open && summary.succeeded() > 0 {
        info!("Opening folder {}", pipeline.output_dir().display());
        if let Err(e) = open::that(pipeline.output_dir()) {
            warn!(
                "Couldn't open folder automatically ({}); open manually: {}",
                e,
                pipeline.output_dir().display()
            );
        }
    }

    Ok(summary)
}
