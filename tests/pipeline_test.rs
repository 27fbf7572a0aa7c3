// Batch behavior of the pipeline with in-memory source and LLM fakes
use anyhow::{bail, Result};
use async_trait::async_trait;
use govdigest::analysis::Analyzer;
use govdigest::llm::client::LlmClient;
use govdigest::pipeline::{Pipeline, Selection};
use govdigest::report::INDEX_FILE_NAME;
use govdigest::source::{
    FetchError, Permalinks, Proposal, ProposalSource, ProposalState, StatusFilter,
};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

type Calls = Arc<Mutex<Vec<(StatusFilter, u32)>>>;

/// Serves canned batches per status filter and records each call.
struct FakeSource {
    batches: HashMap<&'static str, Vec<Proposal>>,
    fail: bool,
    calls: Calls,
}

impl FakeSource {
    fn new() -> Self {
        Self {
            batches: HashMap::new(),
            fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with(mut self, filter: StatusFilter, proposals: Vec<Proposal>) -> Self {
        self.batches.insert(filter.as_str(), proposals);
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl ProposalSource for FakeSource {
    async fn fetch(&self, filter: StatusFilter, limit: u32) -> Result<Vec<Proposal>, FetchError> {
        self.calls.lock().unwrap().push((filter, limit));
        if self.fail {
            return Err(FetchError::MissingData("hub unavailable".to_string()));
        }
        let mut batch = self.batches.get(filter.as_str()).cloned().unwrap_or_default();
        batch.truncate(limit as usize);
        Ok(batch)
    }
}

/// Fails for any prompt whose title is in `fail_titles`.
struct FakeLlm {
    fail_titles: Vec<String>,
}

#[async_trait]
impl LlmClient for FakeLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let title = prompt
            .lines()
            .find_map(|l| l.strip_prefix("PROPOSAL TITLE: "))
            .unwrap_or_default()
            .to_string();
        if self.fail_titles.contains(&title) {
            bail!("Anthropic API error 500: boom");
        }
        Ok(format!("## PROS\n- {} helps\n\n## CONS\n- {} costs", title, title))
    }
}

fn proposal(id: &str, title: &str, state: ProposalState) -> Proposal {
    Proposal {
        id: id.to_string(),
        title: title.to_string(),
        body: format!("Body of {}", title),
        choices: vec!["For".to_string(), "Against".to_string()],
        start: 1_700_000_000,
        end: 1_700_600_000,
        state,
        scores_total: 1234.5,
    }
}

fn pipeline(source: FakeSource, fail_titles: &[&str], dir: &Path) -> Pipeline {
    let llm = FakeLlm {
        fail_titles: fail_titles.iter().map(|t| t.to_string()).collect(),
    };
    Pipeline::new(
        Box::new(source),
        Analyzer::new(Box::new(llm)),
        dir.to_path_buf(),
        Permalinks::new("https://snapshot.org", "arbitrumfoundation.eth"),
    )
    .with_delay(Duration::ZERO)
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_two_of_five_failures_leave_three_reports_in_order() {
    let dir = TempDir::new().unwrap();
    let proposals: Vec<Proposal> = ["Alpha", "Bravo", "Charlie", "Delta", "Echo"]
        .iter()
        .enumerate()
        .map(|(i, t)| proposal(&format!("0x{}", i), t, ProposalState::Closed))
        .collect();
    let source = FakeSource::new().with(StatusFilter::All, proposals);

    let summary = pipeline(source, &["Bravo", "Delta"], dir.path())
        .run(Selection::RecentAny)
        .await
        .unwrap();

    assert_eq!(summary.total, 5);
    assert_eq!(summary.succeeded(), 3);
    assert_eq!(summary.failed(), 2);
    assert!(summary.fetch_error.is_none());

    // Sequence numbers follow fetch position, so gaps mark the failures
    assert_eq!(
        file_names(dir.path()),
        vec![
            INDEX_FILE_NAME,
            "proposal_01_Alpha.txt",
            "proposal_03_Charlie.txt",
            "proposal_05_Echo.txt",
        ]
    );

    let index = fs::read_to_string(summary.index_path.unwrap()).unwrap();
    assert!(index.contains("Total Proposals Analyzed: 3"));
    let entries: Vec<&str> = index
        .lines()
        .filter(|l| l.starts_with("0") && l.contains(". ["))
        .collect();
    assert_eq!(
        entries,
        vec![
            "01. [CLOSED] Alpha",
            "02. [CLOSED] Charlie",
            "03. [CLOSED] Echo"
        ]
    );
    assert!(!index.contains("Bravo"));
    assert!(!index.contains("Delta"));
}

#[tokio::test]
async fn test_report_contents() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new().with(
        StatusFilter::Active,
        vec![proposal("0xabc", "Gaming Catalyst", ProposalState::Active)],
    );

    let summary = pipeline(source, &[], dir.path())
        .run(Selection::Latest)
        .await
        .unwrap();
    assert_eq!(summary.saved.len(), 1);

    let artifact = &summary.saved[0];
    assert_eq!(artifact.proposal.id, "0xabc");
    let content = fs::read_to_string(&artifact.path).unwrap();
    assert!(content.contains("PROPOSAL: Gaming Catalyst"));
    assert!(content.contains("STATUS: ACTIVE"));
    assert!(content.contains("LINK: https://snapshot.org/#/arbitrumfoundation.eth/proposal/0xabc"));
    assert!(content.contains("## PROS\n- Gaming Catalyst helps"));
    assert!(content.contains(&format!(
        "Generated: {}",
        artifact.generated_at.format("%Y-%m-%d %H:%M:%S")
    )));
}

#[tokio::test]
async fn test_empty_fetch_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("digests");
    let source = FakeSource::new();

    let summary = pipeline(source, &[], &out)
        .run(Selection::RecentAny)
        .await
        .unwrap();

    assert_eq!(summary.total, 0);
    assert_eq!(summary.succeeded(), 0);
    assert_eq!(summary.failed(), 0);
    assert!(summary.index_path.is_none());
    assert!(summary.fetch_error.is_none());
    // Directory is created up front but stays empty
    assert!(out.is_dir());
    assert!(file_names(&out).is_empty());
}

#[tokio::test]
async fn test_fetch_error_degrades_to_empty_batch() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new().failing();

    let summary = pipeline(source, &[], dir.path())
        .run(Selection::RecentClosed)
        .await
        .unwrap();

    assert_eq!(summary.total, 0);
    assert!(summary
        .fetch_error
        .as_deref()
        .unwrap()
        .contains("hub unavailable"));
    assert!(file_names(dir.path()).is_empty());
}

#[tokio::test]
async fn test_latest_falls_back_to_closed() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new().with(
        StatusFilter::Closed,
        vec![
            proposal("0xc1", "Closed One", ProposalState::Closed),
            proposal("0xc2", "Closed Two", ProposalState::Closed),
        ],
    );
    let calls = source.calls.clone();

    let summary = pipeline(source, &[], dir.path())
        .run(Selection::Latest)
        .await
        .unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        vec![(StatusFilter::Active, 1), (StatusFilter::Closed, 1)]
    );
    assert_eq!(summary.total, 1);
    assert_eq!(summary.saved[0].proposal.id, "0xc1");
}

#[tokio::test]
async fn test_latest_does_not_fall_back_when_active_exists() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new()
        .with(
            StatusFilter::Active,
            vec![proposal("0xa", "Live", ProposalState::Active)],
        )
        .with(
            StatusFilter::Closed,
            vec![proposal("0xc", "Old", ProposalState::Closed)],
        );
    let calls = source.calls.clone();

    pipeline(source, &[], dir.path())
        .run(Selection::Latest)
        .await
        .unwrap();
    assert_eq!(*calls.lock().unwrap(), vec![(StatusFilter::Active, 1)]);
}

#[tokio::test]
async fn test_selection_limits_reach_source() {
    let cases = [
        (Selection::AllActive, (StatusFilter::Active, 100)),
        (Selection::RecentClosed, (StatusFilter::Closed, 5)),
        (Selection::RecentAny, (StatusFilter::All, 10)),
        (Selection::Custom(42), (StatusFilter::All, 42)),
    ];
    for (selection, expected) in cases {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::new();
        let calls = source.calls.clone();
        pipeline(source, &[], dir.path()).run(selection).await.unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![expected], "{:?}", selection);
    }
}

#[tokio::test]
async fn test_identical_empty_titles_get_distinct_files() {
    let dir = TempDir::new().unwrap();
    let proposals = (0..3)
        .map(|i| proposal(&format!("0x{}", i), "", ProposalState::Active))
        .collect();
    let source = FakeSource::new().with(StatusFilter::Active, proposals);

    let summary = pipeline(source, &[], dir.path())
        .run(Selection::AllActive)
        .await
        .unwrap();
    assert_eq!(summary.succeeded(), 3);
    assert_eq!(
        file_names(dir.path()),
        vec![
            INDEX_FILE_NAME,
            "proposal_01_.txt",
            "proposal_02_.txt",
            "proposal_03_.txt"
        ]
    );
}

#[tokio::test]
async fn test_write_failure_is_contained() {
    let dir = TempDir::new().unwrap();
    // A directory squatting on the first report's name makes that write fail
    fs::create_dir(dir.path().join("proposal_01_Blocked.txt")).unwrap();
    let source = FakeSource::new().with(
        StatusFilter::All,
        vec![
            proposal("0x1", "Blocked", ProposalState::Closed),
            proposal("0x2", "Fine", ProposalState::Closed),
        ],
    );

    let summary = pipeline(source, &[], dir.path())
        .run(Selection::RecentAny)
        .await
        .unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.failed(), 1);
    let index = fs::read_to_string(summary.index_path.unwrap()).unwrap();
    assert!(index.contains("01. [CLOSED] Fine"));
    assert!(!index.contains("Blocked"));
}

#[tokio::test]
async fn test_all_analyses_failing_skips_index() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new().with(
        StatusFilter::All,
        vec![proposal("0x1", "Nope", ProposalState::Closed)],
    );

    let summary = pipeline(source, &["Nope"], dir.path())
        .run(Selection::RecentAny)
        .await
        .unwrap();
    assert_eq!(summary.failed(), 1);
    assert!(summary.index_path.is_none());
    assert!(!dir.path().join(INDEX_FILE_NAME).exists());
}

#[tokio::test]
async fn test_output_dir_that_is_a_file_aborts() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "x").unwrap();

    let result = pipeline(FakeSource::new(), &[], &blocker)
        .run(Selection::RecentAny)
        .await;
    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("failed to create output directory"));
}

#[tokio::test(start_paused = true)]
async fn test_delay_only_between_items() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new().with(
        StatusFilter::All,
        vec![
            proposal("0x1", "One", ProposalState::Closed),
            proposal("0x2", "Two", ProposalState::Closed),
            proposal("0x3", "Three", ProposalState::Closed),
        ],
    );
    let llm = FakeLlm {
        fail_titles: Vec::new(),
    };
    let pipeline = Pipeline::new(
        Box::new(source),
        Analyzer::new(Box::new(llm)),
        dir.path().to_path_buf(),
        Permalinks::new("https://snapshot.org", "arbitrumfoundation.eth"),
    )
    .with_delay(Duration::from_millis(200));

    let started = tokio::time::Instant::now();
    let summary = pipeline.run(Selection::RecentAny).await.unwrap();
    assert_eq!(summary.succeeded(), 3);
    // Two pauses for three items, none trailing
    assert_eq!(started.elapsed(), Duration::from_millis(400));
}
