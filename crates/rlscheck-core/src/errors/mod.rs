//! Error types, grouped by the stage that raises them.

use std::path::PathBuf;

/// Top-level failure of a run. Anything returned here aborted the pipeline before or
/// around test execution; per-case faults never surface as `RlsError`.
#[derive(Debug, thiserror::Error)]
pub enum RlsError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Policies could not be listed.
    #[error("failed to get RLS policies for {table}: {source}")]
    PolicyFetch {
        table: String,
        #[source]
        source: BackendError,
    },

    /// The server-side policy listing function is not installed.
    #[error(
        "policy listing function `{function}` is not installed on the backend; \
         run `rlscheck sql` and execute the output in the SQL editor"
    )]
    SetupRequired { function: String },

    #[error("AI test generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("artifact {} could not be read or written: {source}", .path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RlsError {
    /// Exit code for CLI (2 = config, 3 = infra).
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::SetupRequired { .. } => 2,
            Self::PolicyFetch { .. } | Self::Generation(_) | Self::Artifact { .. } => 3,
        }
    }

    /// Pipeline stage name, used in logs and the `--json` error output.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::PolicyFetch { .. } | Self::SetupRequired { .. } => "policy_fetch",
            Self::Generation(_) => "generation",
            Self::Artifact { .. } => "report",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to read config {path}: {detail}")]
    Read { path: String, detail: String },

    #[error("failed to parse config {path}: {detail}")]
    Parse { path: String, detail: String },
}

/// Failures of the LLM-backed generation stage.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("LLM response was empty")]
    EmptyResponse,

    #[error("failed to parse AI response: {0}")]
    Parse(#[from] ParseError),

    #[error("LLM produced no test cases")]
    NoTestCases,
}

/// Reasons free-form model output could not be turned into test cases.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no JSON array found in response")]
    NoArray,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("response is not an array")]
    NotAnArray,
}

/// Errors from the data API client (policy RPC and request transport).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The request never produced an HTTP response.
    #[error("network error: {message}")]
    Network { message: String },

    /// An HTTP response arrived with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Why a single runner attempt produced no response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptError {
    #[error("Test timeout")]
    Timeout,

    #[error("{0}")]
    Transport(String),

    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// The case could not be turned into a request (bad header name, bad path).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AttemptError {
    /// Deterministic faults are not worth another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::UnsupportedMethod(_) | Self::InvalidRequest(_))
    }
}

impl From<BackendError> for AttemptError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::InvalidRequest { message } => Self::InvalidRequest(message),
            other => Self::Transport(other.to_string()),
        }
    }
}
