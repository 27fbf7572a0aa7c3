use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable that overrides `output.dir`
pub const OUTPUT_DIR_ENV: &str = "GOVDIGEST_OUTPUT_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>, // For OpenAI-compatible APIs or a proxy

    /// Token budget for a single analysis (default: 3000)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP timeout for one inference call, in seconds (default: 120)
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// GraphQL endpoint of the voting platform hub
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Governance space identifier, e.g. "arbitrumfoundation.eth"
    #[serde(default = "default_space")]
    pub space: String,

    /// Base of the human-facing proposal link
    #[serde(default = "default_permalink_base")]
    pub permalink_base: String,

    /// Heading used in the index file (default: the space, uppercased)
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            space: default_space(),
            permalink_base: default_permalink_base(),
            label: None,
            timeout_secs: default_source_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pause between proposals to stay under the inference rate limit
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptsConfig {
    /// Extra instructions appended to the analysis prompt
    #[serde(default)]
    pub analysis_custom: Option<String>,
}

fn default_max_tokens() -> u32 {
    3000
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_endpoint() -> String {
    "https://hub.snapshot.org/graphql".to_string()
}

fn default_space() -> String {
    "arbitrumfoundation.eth".to_string()
}

fn default_permalink_base() -> String {
    "https://snapshot.org".to_string()
}

fn default_source_timeout() -> u64 {
    30
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dao_summaries")
}

fn default_request_delay_ms() -> u64 {
    1000
}

impl Config {
    /// Load configuration from a specific path, or use default search paths.
    /// The output-dir environment override is applied last.
    pub fn load_with_path(path: Option<String>) -> Result<Self> {
        let mut config = Self::locate(path)?;
        if let Ok(dir) = env::var(OUTPUT_DIR_ENV) {
            if !dir.trim().is_empty() {
                debug!("{} overrides output dir: {}", OUTPUT_DIR_ENV, dir);
                config.output.dir = PathBuf::from(dir);
            }
        }
        Ok(config)
    }

    fn locate(path: Option<String>) -> Result<Self> {
        // An explicit path must load; search paths fall through silently
        if let Some(config_path) = path {
            debug!("Loading config from explicit path: {}", config_path);
            return Self::load_from_path(&config_path)
                .with_context(|| format!("failed to load config from {}", config_path));
        }

        if let Ok(config) = Self::load_from_path("govdigest.toml") {
            debug!("Loaded config from ./govdigest.toml");
            return Ok(config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("govdigest").join("config.toml");
            if let Ok(config) = Self::load_from_path(&config_path) {
                debug!("Loaded config from {:?}", config_path);
                return Ok(config);
            }
        }

        debug!("Using default config");
        Ok(Self::default())
    }

    fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get API key from environment variable specified in config
    pub fn get_api_key(&self) -> Result<String> {
        match &self.llm.api_key_env {
            Some(env_var) => {
                // "none" means no API key needed (local models)
                if env_var.to_lowercase() == "none" {
                    return Ok(String::new());
                }

                // openai-compatible gateways may or may not want a key
                if self.llm.provider == "openai-compatible" {
                    return Ok(env::var(env_var).unwrap_or_default());
                }

                env::var(env_var).map_err(|_| {
                    anyhow::anyhow!("API key not found in environment variable: {}", env_var)
                })
            }
            None => Ok(String::new()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: "anthropic".to_string(),
                model: "claude-sonnet-4-20250514".to_string(),
                api_key_env: Some("ANTHROPIC_API_KEY".to_string()),
                base_url: None,
                max_tokens: default_max_tokens(),
                timeout_secs: default_llm_timeout(),
            },
            source: SourceConfig::default(),
            output: OutputConfig::default(),
            pipeline: PipelineConfig::default(),
            prompts: PromptsConfig::default(),
        }
    }
}
