use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::verdict::interpret;
use crate::backend::{BackendResponse, DataApi};
use crate::config::TesterConfig;
use crate::errors::AttemptError;
use crate::model::{Method, TestCase, TestResult};
use crate::report::progress::{ProgressEvent, ProgressSink};

/// Retry and timeout bounds for each case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPolicy {
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_millis(5000),
        }
    }
}

impl From<&TesterConfig> for RunPolicy {
    fn from(cfg: &TesterConfig) -> Self {
        Self {
            max_attempts: cfg.retry_attempts,
            timeout: cfg.timeout(),
        }
    }
}

/// Executes test cases against the data API, one at a time.
#[derive(Clone)]
pub struct Runner {
    pub api: Arc<dyn DataApi>,
    pub policy: RunPolicy,
}

impl Runner {
    pub fn new(api: Arc<dyn DataApi>, policy: RunPolicy) -> Self {
        Self { api, policy }
    }

    /// Run every case strictly in input order; a failing case never stops the run.
    ///
    /// Cases may depend on rows written by earlier ones, so there is no parallelism here.
    pub async fn run_all(
        &self,
        tests: &[TestCase],
        progress: Option<ProgressSink>,
    ) -> Vec<TestResult> {
        let total = tests.len();
        let mut results = Vec::with_capacity(total);

        for (i, tc) in tests.iter().enumerate() {
            let result = self.run_with_retry(tc).await;
            info!(
                index = i + 1,
                total,
                method = %tc.method,
                path = %tc.path,
                expected = result.expected,
                actual = result.actual,
                success = result.success,
                "test case finished"
            );
            results.push(result);
            if let Some(ref sink) = progress {
                sink(ProgressEvent {
                    done: results.len(),
                    total,
                });
            }
        }

        results
    }

    /// Run one case with bounded, immediate retries on transport faults.
    ///
    /// The first attempt that produces any response wins, including backend-reported
    /// errors. Deterministic faults end the loop after one attempt.
    pub async fn run_with_retry(&self, tc: &TestCase) -> TestResult {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = AttemptError::Transport("no attempts".into());
        let mut attempts = 0;

        while attempts < max_attempts {
            attempts += 1;
            match self.run_attempt(tc).await {
                Ok(response) => return interpret(tc, response, attempts),
                Err(e) => {
                    let retryable = e.is_retryable();
                    if retryable && attempts < max_attempts {
                        warn!(
                            attempt = attempts,
                            max_attempts,
                            error = %e,
                            "attempt failed, retrying"
                        );
                    } else {
                        debug!(attempt = attempts, error = %e, "attempt failed");
                    }
                    last_error = e;
                    if !retryable {
                        break;
                    }
                }
            }
        }

        TestResult::no_response(tc, last_error.to_string(), attempts)
    }

    /// One attempt: the call races a timer. When the timer wins the spawned call is
    /// detached, not cancelled; it may still reach the backend and its result is dropped.
    async fn run_attempt(&self, tc: &TestCase) -> Result<BackendResponse, AttemptError> {
        if let Method::Unsupported(m) = &tc.method {
            return Err(AttemptError::UnsupportedMethod(m.clone()));
        }

        let api = Arc::clone(&self.api);
        let request = tc.clone();
        let handle = tokio::spawn(async move { api.execute(&request).await });

        match timeout(self.policy.timeout, handle).await {
            Err(_elapsed) => Err(AttemptError::Timeout),
            Ok(Err(join_err)) => Err(AttemptError::Transport(format!(
                "request task failed: {join_err}"
            ))),
            Ok(Ok(result)) => result.map_err(AttemptError::from),
        }
    }
}
