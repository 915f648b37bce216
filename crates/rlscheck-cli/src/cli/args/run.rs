//! Run command arguments.

use std::path::PathBuf;

use clap::Parser;
use rlscheck_core::{Coverage, LlmProvider};

#[derive(Parser, Clone, Debug)]
pub struct RunArgs {
    /// table whose policies are tested
    pub table: String,

    #[arg(long, default_value = "rlscheck.yaml")]
    pub config: PathBuf,

    /// per-attempt timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// max attempts per case (transport faults only)
    #[arg(long)]
    pub retries: Option<u32>,

    /// prompt breadth: basic|full|edge
    #[arg(long)]
    pub coverage: Option<Coverage>,

    /// number of cases to request (overrides the coverage default)
    #[arg(long)]
    pub test_count: Option<u32>,

    /// no progress lines or console report
    #[arg(long)]
    pub quiet: bool,

    /// ask the LLM for SQL fixes on failures
    #[arg(long)]
    pub suggest_fixes: bool,

    /// LLM provider: openai|anthropic
    #[arg(long)]
    pub provider: Option<LlmProvider>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub tests_dir: Option<PathBuf>,

    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// print the summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}
