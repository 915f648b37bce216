//! Row-level-security test generation and execution against a Supabase data API.
//!
//! A run lists the policies of a table, asks an LLM for HTTP-level test cases, executes them
//! sequentially with per-attempt timeouts and bounded retries, and writes a JSON report.
//!
//! # Quick Start
//!
//! ```no_run
//! use rlscheck_core::{Credentials, RlsTester, TesterConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = TesterConfig::default();
//! let creds = Credentials::from_env(config.llm.provider)?;
//! let tester = RlsTester::from_credentials(config, &creds)?;
//! let results = tester.run_rls_tests("posts").await?;
//! println!("{} cases", results.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `SUPABASE_URL` | Project URL |
//! | `SUPABASE_KEY` | API key (fallback `SUPABASE_SERVICE_ROLE_KEY`) |
//! | `OPENAI_API_KEY` | Key for the `openai` provider |
//! | `ANTHROPIC_API_KEY` | Key for the `anthropic` provider (fallback `CLAUDE_API_KEY`) |

pub mod backend;
pub mod config;
pub mod engine;
pub mod errors;
pub mod generator;
pub mod model;
pub mod policy;
pub mod providers;
pub mod report;
pub mod tester;

pub use backend::{ApiError, BackendResponse, DataApi, RestClient};
pub use config::{load_config, Coverage, Credentials, LlmProvider, LlmSettings, TesterConfig};
pub use engine::{RunPolicy, Runner};
pub use errors::{
    AttemptError, BackendError, ConfigError, GenerationError, ParseError, RlsError,
};
pub use generator::{parse_test_cases, CoverageConfig, TestCaseGenerator};
pub use model::{Method, Policy, PolicyCommand, Permissiveness, TestCase, TestResult};
pub use policy::{PolicySource, GET_POLICIES_SQL, POLICY_FUNCTION};
pub use report::{summarize, FailureDetail, TestSummary};
pub use tester::{RlsTester, RunOutcome};
