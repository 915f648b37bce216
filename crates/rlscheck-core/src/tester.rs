//! The end-to-end pipeline: policies, generation, execution, report.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use crate::backend::{DataApi, RestClient};
use crate::config::{Credentials, TesterConfig};
use crate::engine::{RunPolicy, Runner};
use crate::errors::{ConfigError, RlsError};
use crate::generator::{CoverageConfig, TestCaseGenerator};
use crate::model::{TestCase, TestResult};
use crate::policy::PolicySource;
use crate::providers::llm::{self, LlmClient};
use crate::report::{console, json, remediation, summarize, TestSummary};

/// What a completed run leaves behind.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub results: Vec<TestResult>,
    pub summary: TestSummary,
    /// `None` when the cases came from an existing file.
    pub test_cases_path: Option<PathBuf>,
    pub results_path: PathBuf,
}

pub struct RlsTester {
    config: TesterConfig,
    policies: Arc<dyn PolicySource>,
    api: Arc<dyn DataApi>,
    llm: Option<Arc<dyn LlmClient>>,
}

impl RlsTester {
    /// Wire the REST backend and the configured LLM provider.
    pub fn from_credentials(config: TesterConfig, creds: &Credentials) -> Result<Self, RlsError> {
        let rest = Arc::new(rest_client(&creds.supabase_url, &creds.supabase_key)?);
        let llm = llm::from_settings(&config.llm, &creds.llm_api_key);
        Ok(Self::with_parts(config, rest.clone(), rest, Some(llm)))
    }

    /// Backend only; generation is unavailable and fixes come from heuristics alone.
    pub fn backend_only(config: TesterConfig, url: &str, key: &str) -> Result<Self, RlsError> {
        let rest = Arc::new(rest_client(url, key)?);
        Ok(Self::with_parts(config, rest.clone(), rest, None))
    }

    pub fn with_parts(
        config: TesterConfig,
        policies: Arc<dyn PolicySource>,
        api: Arc<dyn DataApi>,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> Self {
        Self {
            config,
            policies,
            api,
            llm,
        }
    }

    pub fn config(&self) -> &TesterConfig {
        &self.config
    }

    /// Run the full pipeline and return the per-case results.
    pub async fn run_rls_tests(&self, table: &str) -> Result<Vec<TestResult>, RlsError> {
        Ok(self.run(table).await?.results)
    }

    /// Full pipeline with artifacts. Any `Err` names the stage that aborted the run.
    pub async fn run(&self, table: &str) -> Result<RunOutcome, RlsError> {
        self.config.validate()?;
        let llm = self.llm.clone().ok_or(ConfigError::Invalid {
            field: "llm",
            reason: "no LLM client configured".into(),
        })?;
        let started = Instant::now();
        let ts = json::artifact_timestamp(Utc::now());

        let policies = self.policies.fetch_policies(table).await?;
        if policies.is_empty() {
            warn!(table = %table, "no RLS policies found; generating tests anyway");
        }

        let coverage = CoverageConfig::new(self.config.coverage, self.config.test_count);
        let cases = TestCaseGenerator::new(llm)
            .generate_cases(table, &policies, coverage)
            .await?;
        info!(table = %table, count = cases.len(), "generated test cases");

        let test_cases_path = json::write_test_cases(&self.config.tests_dir, &ts, &cases)?;
        let mut outcome = self.execute(table, &cases, &ts, started).await?;
        outcome.test_cases_path = Some(test_cases_path);
        Ok(outcome)
    }

    /// Execute already-generated cases (e.g. a saved `test-cases-*.json`) and report.
    pub async fn execute_cases(
        &self,
        table: &str,
        cases: &[TestCase],
    ) -> Result<RunOutcome, RlsError> {
        self.config.validate()?;
        let ts = json::artifact_timestamp(Utc::now());
        self.execute(table, cases, &ts, Instant::now()).await
    }

    async fn execute(
        &self,
        table: &str,
        cases: &[TestCase],
        ts: &str,
        started: Instant,
    ) -> Result<RunOutcome, RlsError> {
        let runner = Runner::new(Arc::clone(&self.api), RunPolicy::from(&self.config));
        let progress = if self.config.verbose {
            console::default_progress_sink(cases.len())
        } else {
            None
        };
        let results = runner.run_all(cases, progress).await;

        let elapsed = started.elapsed().as_millis() as u64;
        let mut summary = summarize(&results, ts, elapsed).with_table(table);
        let llm = if self.config.suggest_fixes {
            self.llm.as_deref()
        } else {
            None
        };
        remediation::suggest_fixes(&mut summary.failures, table, llm).await;

        let results_path = json::write_summary(&self.config.results_dir, ts, &summary)?;
        info!(
            table = %table,
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            "run complete"
        );
        if self.config.verbose {
            console::print_summary(&summary);
        }

        Ok(RunOutcome {
            results,
            summary,
            test_cases_path: None,
            results_path,
        })
    }
}

fn rest_client(url: &str, key: &str) -> Result<RestClient, RlsError> {
    RestClient::new(url, key).map_err(|e| {
        RlsError::Config(ConfigError::Invalid {
            field: "SUPABASE_URL",
            reason: e.to_string(),
        })
    })
}
