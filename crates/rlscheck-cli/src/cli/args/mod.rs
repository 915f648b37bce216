use clap::{Parser, Subcommand};
use rlscheck_core::config::load_config;
use std::path::{Path, PathBuf};

pub mod run;
pub use run::*;

#[derive(Parser)]
#[command(
    name = "rlscheck",
    version,
    about = "Generate and run row-level-security tests against a Supabase project"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

impl Cli {
    /// Log level when `RUST_LOG` is unset: `info` when the run is verbose, `warn` otherwise.
    ///
    /// `--quiet` wins; otherwise `verbose` from the config file decides. A config that fails
    /// to load keeps `info` so the error reported by the command is not the only output.
    pub fn default_log_level(&self) -> &'static str {
        let verbose = match &self.cmd {
            Command::Run(args) => config_verbose(&args.config, args.quiet),
            Command::Exec(args) => config_verbose(&args.config, args.quiet),
            Command::Policies(_) => true,
            Command::Sql | Command::Version => false,
        };
        if verbose {
            "info"
        } else {
            "warn"
        }
    }
}

fn config_verbose(config: &Path, quiet: bool) -> bool {
    !quiet && load_config(config).map(|cfg| cfg.verbose).unwrap_or(true)
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch policies, generate test cases with the LLM, execute them and report
    Run(RunArgs),
    /// Re-execute a saved test-cases-*.json without calling the LLM
    Exec(ExecArgs),
    /// List the active RLS policies of a table
    Policies(PoliciesArgs),
    /// Print the SQL that installs the get_policies function
    Sql,
    Version,
}

#[derive(Parser, Clone, Debug)]
pub struct PoliciesArgs {
    pub table: String,

    /// print policies as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Clone, Debug)]
pub struct ExecArgs {
    /// saved test cases (JSON array)
    pub file: PathBuf,

    /// table name used in the report and fix hints (default: path of the first case)
    #[arg(long)]
    pub table: Option<String>,

    #[arg(long, default_value = "rlscheck.yaml")]
    pub config: PathBuf,

    #[arg(long)]
    pub timeout_ms: Option<u64>,

    #[arg(long)]
    pub retries: Option<u32>,

    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    #[arg(long)]
    pub quiet: bool,

    /// print the summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}
