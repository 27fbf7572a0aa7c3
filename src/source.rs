//! Proposal source: queries the voting platform's GraphQL hub.
//!
//! `SnapshotSource` issues a single POST per fetch. Transport and shape
//! failures come back as [`FetchError`]; deciding to degrade them to an empty
//! batch is the caller's job.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::SourceConfig;

/// Hard cap the hub accepts for `first:`
pub const MAX_LIMIT: u32 = 100;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("hub returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("response has no proposals: {0}")]
    MissingData(String),
}

/// Lifecycle state of a proposal as reported by the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProposalState {
    Active,
    Closed,
    Pending,
    Other(String),
}

impl ProposalState {
    pub fn as_str(&self) -> &str {
        match self {
            ProposalState::Active => "active",
            ProposalState::Closed => "closed",
            ProposalState::Pending => "pending",
            ProposalState::Other(s) => s,
        }
    }
}

impl From<String> for ProposalState {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "active" => ProposalState::Active,
            "closed" => ProposalState::Closed,
            "pending" => ProposalState::Pending,
            _ => ProposalState::Other(s),
        }
    }
}

impl From<ProposalState> for String {
    fn from(state: ProposalState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Active,
    Closed,
    All,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::Active => "active",
            StatusFilter::Closed => "closed",
            StatusFilter::All => "all",
        }
    }

    pub fn matches(&self, state: &ProposalState) -> bool {
        match self {
            StatusFilter::Active => *state == ProposalState::Active,
            StatusFilter::Closed => *state == ProposalState::Closed,
            StatusFilter::All => true,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single governance proposal. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub choices: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub start: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end: i64,
    pub state: ProposalState,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scores_total: f64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Builds human-facing links to proposals on the voting platform.
#[derive(Debug, Clone)]
pub struct Permalinks {
    base: String,
    space: String,
    label: Option<String>,
}

impl Permalinks {
    pub fn new(base: impl Into<String>, space: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
            space: space.into(),
            label: None,
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        let mut links = Self::new(config.permalink_base.clone(), config.space.clone());
        links.label = config.label.clone();
        links
    }

    /// `https://<platform>/#/<space>/proposal/<id>`
    pub fn proposal(&self, id: &str) -> String {
        format!("{}/#/{}/proposal/{}", self.base, self.space, id)
    }

    /// Heading for the index file
    pub fn label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.space.clone())
            .to_uppercase()
    }
}

#[async_trait]
pub trait ProposalSource: Send + Sync {
    /// Fetch up to `limit` proposals, newest first, matching `filter`.
    async fn fetch(&self, filter: StatusFilter, limit: u32) -> Result<Vec<Proposal>, FetchError>;
}

#[derive(Debug, Serialize)]
struct GraphQlRequest {
    query: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ProposalsData>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct ProposalsData {
    proposals: Option<Vec<Proposal>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// Clamp a requested count into what the hub will serve.
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_LIMIT)
}

/// Render the proposals query. The state clause is omitted for `All`.
pub fn build_query(space: &str, filter: StatusFilter, limit: u32) -> String {
    // JSON string quoting is valid GraphQL string quoting
    let space_lit = serde_json::to_string(space).unwrap_or_else(|_| format!("\"{}\"", space));
    let where_clause = match filter {
        StatusFilter::All => format!("space: {}", space_lit),
        other => format!("space: {}, state: \"{}\"", space_lit, other.as_str()),
    };

    format!(
        r#"query {{
  proposals(
    first: {limit},
    where: {{ {where_clause} }},
    orderBy: "created",
    orderDirection: desc
  ) {{
    id
    title
    body
    choices
    start
    end
    state
    scores_total
  }}
}}"#,
        limit = clamp_limit(limit),
        where_clause = where_clause,
    )
}

/// Snapshot-hub GraphQL client for one governance space.
pub struct SnapshotSource {
    endpoint: String,
    space: String,
    client: Client,
}

impl SnapshotSource {
    pub fn new(endpoint: String, space: String, timeout_secs: u64) -> Result<Self, FetchError> {
        Ok(Self {
            endpoint,
            space,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()?,
        })
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self, FetchError> {
        Self::new(
            config.endpoint.clone(),
            config.space.clone(),
            config.timeout_secs,
        )
    }
}

#[async_trait]
impl ProposalSource for SnapshotSource {
    async fn fetch(&self, filter: StatusFilter, limit: u32) -> Result<Vec<Proposal>, FetchError> {
        let limit = clamp_limit(limit);
        info!(
            status = %filter,
            limit,
            space = %self.space,
            "fetching proposals"
        );

        let request = GraphQlRequest {
            query: build_query(&self.space, filter, limit),
        };
        debug!("GraphQL query:\n{}", request.query);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let parsed: GraphQlResponse = serde_json::from_str(&text)?;

        if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(FetchError::MissingData(messages.join("; ")));
        }

        let mut proposals = parsed
            .data
            .and_then(|d| d.proposals)
            .ok_or_else(|| FetchError::MissingData("data.proposals absent".to_string()))?;

        // The hub already filters; this keeps the contract even if it doesn't
        proposals.retain(|p| filter.matches(&p.state));
        proposals.truncate(limit as usize);

        info!(count = proposals.len(), "fetched proposals");
        Ok(proposals)
    }
}
