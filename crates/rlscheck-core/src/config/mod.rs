//! Run configuration and credentials.
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `SUPABASE_URL` | Project base URL |
//! | `SUPABASE_KEY` | Service key (fallback: `SUPABASE_SERVICE_ROLE_KEY`) |
//! | `OPENAI_API_KEY` | LLM key for the `openai` provider |
//! | `ANTHROPIC_API_KEY` | LLM key for the `anthropic` provider (fallback: `CLAUDE_API_KEY`) |

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "rlscheck.yaml";

/// Breadth of the generated suite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coverage {
    #[default]
    Basic,
    Full,
    Edge,
}

impl Coverage {
    pub fn default_test_count(self) -> u32 {
        match self {
            Coverage::Basic => 4,
            Coverage::Full => 8,
            Coverage::Edge => 12,
        }
    }
}

impl std::str::FromStr for Coverage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Coverage::Basic),
            "full" => Ok(Coverage::Full),
            "edge" => Ok(Coverage::Edge),
            other => Err(ConfigError::Invalid {
                field: "coverage",
                reason: format!("expected basic|full|edge, got {other:?}"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "gpt-4o-mini",
            LlmProvider::Anthropic => "claude-3-5-sonnet-latest",
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAI),
            "anthropic" | "claude" => Ok(LlmProvider::Anthropic),
            other => Err(ConfigError::Invalid {
                field: "llm.provider",
                reason: format!("expected openai|anthropic, got {other:?}"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmSettings {
    #[serde(default)]
    pub provider: LlmProvider,
    /// Falls back to the provider's default model.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: f32,
    /// Override for the provider endpoint (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: None,
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            base_url: None,
        }
    }
}

impl LlmSettings {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_test_timeout() -> u64 {
    5000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_tests_dir() -> PathBuf {
    PathBuf::from("generated/tests")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("generated/results")
}

/// Options recognized by a test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TesterConfig {
    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_test_timeout")]
    pub test_timeout: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_true")]
    pub verbose: bool,
    #[serde(default)]
    pub coverage: Coverage,
    #[serde(default)]
    pub test_count: Option<u32>,
    #[serde(default)]
    pub suggest_fixes: bool,
    #[serde(default = "default_tests_dir")]
    pub tests_dir: PathBuf,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default)]
    pub llm: LlmSettings,
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            test_timeout: default_test_timeout(),
            retry_attempts: default_retry_attempts(),
            verbose: true,
            coverage: Coverage::default(),
            test_count: None,
            suggest_fixes: false,
            tests_dir: default_tests_dir(),
            results_dir: default_results_dir(),
            llm: LlmSettings::default(),
        }
    }
}

impl TesterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.test_timeout)
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.test_timeout = ms;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn with_coverage(mut self, coverage: Coverage) -> Self {
        self.coverage = coverage;
        self
    }

    pub fn with_test_count(mut self, count: u32) -> Self {
        self.test_count = Some(count);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_suggest_fixes(mut self, enabled: bool) -> Self {
        self.suggest_fixes = enabled;
        self
    }

    pub fn with_output_dirs(
        mut self,
        tests_dir: impl Into<PathBuf>,
        results_dir: impl Into<PathBuf>,
    ) -> Self {
        self.tests_dir = tests_dir.into();
        self.results_dir = results_dir.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "retryAttempts",
                reason: "must be at least 1".into(),
            });
        }
        if self.test_timeout == 0 {
            return Err(ConfigError::Invalid {
                field: "testTimeout",
                reason: "must be greater than 0 ms".into(),
            });
        }
        if self.test_count == Some(0) {
            return Err(ConfigError::Invalid {
                field: "testCount",
                reason: "must be at least 1 when set".into(),
            });
        }
        Ok(())
    }
}

/// Load a YAML config file. A missing file at the default location yields defaults.
pub fn load_config(path: &Path) -> Result<TesterConfig, ConfigError> {
    let display = path.display().to_string();
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && path == Path::new(DEFAULT_CONFIG_FILE) => {
            return Ok(TesterConfig::default());
        }
        Err(e) => {
            return Err(ConfigError::Read {
                path: display,
                detail: e.to_string(),
            })
        }
    };
    let cfg: TesterConfig = serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse {
        path: display,
        detail: e.to_string(),
    })?;
    cfg.validate()?;
    Ok(cfg)
}

/// Backend and LLM credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub supabase_url: String,
    pub supabase_key: String,
    pub llm_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &"<redacted>")
            .field("llm_api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(
        supabase_url: impl Into<String>,
        supabase_key: impl Into<String>,
        llm_api_key: impl Into<String>,
    ) -> Self {
        Self {
            supabase_url: supabase_url.into(),
            supabase_key: supabase_key.into(),
            llm_api_key: llm_api_key.into(),
        }
    }

    pub fn from_env(provider: LlmProvider) -> Result<Self, ConfigError> {
        Self::from_lookup(provider, |k| std::env::var(k).ok())
    }

    /// Backend credentials only; for commands that never reach the LLM.
    pub fn backend_from_env() -> Result<(String, String), ConfigError> {
        let lookup = |k: &str| std::env::var(k).ok();
        Ok((supabase_url(&lookup)?, supabase_key(&lookup)?))
    }

    pub(crate) fn from_lookup(
        provider: LlmProvider,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let llm_api_key = match provider {
            LlmProvider::OpenAI => non_empty(&lookup, "OPENAI_API_KEY")
                .ok_or(ConfigError::MissingCredential("OPENAI_API_KEY"))?,
            LlmProvider::Anthropic => non_empty(&lookup, "ANTHROPIC_API_KEY")
                .or_else(|| non_empty(&lookup, "CLAUDE_API_KEY"))
                .ok_or(ConfigError::MissingCredential("ANTHROPIC_API_KEY"))?,
        };
        Ok(Self {
            supabase_url: supabase_url(&lookup)?,
            supabase_key: supabase_key(&lookup)?,
            llm_api_key,
        })
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn supabase_url(lookup: &impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
    let url = non_empty(lookup, "SUPABASE_URL").ok_or(ConfigError::MissingCredential("SUPABASE_URL"))?;
    url::Url::parse(&url).map_err(|e| ConfigError::Invalid {
        field: "SUPABASE_URL",
        reason: e.to_string(),
    })?;
    Ok(url)
}

fn supabase_key(lookup: &impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
    non_empty(lookup, "SUPABASE_KEY")
        .or_else(|| non_empty(lookup, "SUPABASE_SERVICE_ROLE_KEY"))
        .ok_or(ConfigError::MissingCredential("SUPABASE_KEY"))
}
