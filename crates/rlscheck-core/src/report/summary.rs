//! Aggregate view over one run's results; written as `test-results-<ts>.json`.

use serde::{Deserialize, Serialize};

use crate::model::TestResult;

/// One failing case plus an optional remediation hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureDetail {
    pub result: TestResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// passed / total * 100; 0 for an empty run.
    pub coverage: f64,
    pub time_in_ms: u64,
    pub failures: Vec<FailureDetail>,
    pub details: Vec<TestResult>,
}

impl TestSummary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }
}

/// Pure over already-collected results; the caller owns the clock.
pub fn summarize(results: &[TestResult], timestamp: impl Into<String>, time_in_ms: u64) -> TestSummary {
    let total = results.len();
    let passed = results.iter().filter(|r| r.success).count();
    let failed = total - passed;
    let coverage = if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    };

    let failures = results
        .iter()
        .filter(|r| !r.success)
        .map(|r| FailureDetail {
            result: r.clone(),
            suggestion: None,
        })
        .collect();

    TestSummary {
        timestamp: timestamp.into(),
        table: None,
        total,
        passed,
        failed,
        coverage,
        time_in_ms,
        failures,
        details: results.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Method, TestCase};

    fn result(success: bool) -> TestResult {
        let tc = TestCase::new(Method::Select, "posts", 200);
        TestResult {
            test: tc,
            success,
            actual: if success { 200 } else { 403 },
            expected: 200,
            error: None,
            attempts: 1,
        }
    }

    #[test]
    fn arithmetic() {
        let results = vec![result(true), result(false), result(true), result(true)];
        let s = summarize(&results, "ts", 42);
        assert_eq!((s.total, s.passed, s.failed), (4, 3, 1));
        assert_eq!(s.passed + s.failed, s.total);
        assert!((s.coverage - 75.0).abs() < f64::EPSILON);
        assert_eq!(s.failures.len(), 1);
        assert_eq!(s.details.len(), 4);
        assert_eq!(s.time_in_ms, 42);
        assert!(!s.all_passed());
    }

    #[test]
    fn empty_run_has_zero_coverage() {
        let s = summarize(&[], "ts", 0);
        assert_eq!((s.total, s.passed, s.failed), (0, 0, 0));
        assert_eq!(s.coverage, 0.0);
        assert!(s.all_passed());
    }

    #[test]
    fn serializes_camel_case() {
        let mut s = summarize(&[result(false)], "2024-01-01T00-00-00-000Z", 7).with_table("posts");
        s.failures[0].suggestion = Some("ALTER TABLE posts ENABLE ROW LEVEL SECURITY;".into());
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["timeInMs"], 7);
        assert_eq!(v["table"], "posts");
        assert_eq!(v["failures"][0]["result"]["actual"], 403);
        assert!(v["failures"][0]["suggestion"]
            .as_str()
            .unwrap()
            .starts_with("ALTER TABLE"));
    }
}
