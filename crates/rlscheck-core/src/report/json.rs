//! Timestamped JSON artifacts: `test-cases-<ts>.json` and `test-results-<ts>.json`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use crate::errors::RlsError;
use crate::model::TestCase;
use crate::report::summary::TestSummary;

/// ISO-8601 UTC with `:` and `.` replaced so it is safe in file names.
pub fn artifact_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

pub fn write_test_cases(dir: &Path, ts: &str, cases: &[TestCase]) -> Result<PathBuf, RlsError> {
    let path = dir.join(format!("test-cases-{ts}.json"));
    write_pretty(&path, &cases)?;
    info!(path = %path.display(), count = cases.len(), "saved test cases");
    Ok(path)
}

pub fn write_summary(dir: &Path, ts: &str, summary: &TestSummary) -> Result<PathBuf, RlsError> {
    let path = dir.join(format!("test-results-{ts}.json"));
    write_pretty(&path, summary)?;
    info!(path = %path.display(), "saved test results");
    Ok(path)
}

/// Load a previously saved `test-cases-*.json`.
pub fn read_test_cases(path: &Path) -> Result<Vec<TestCase>, RlsError> {
    let raw = std::fs::read_to_string(path).map_err(|source| RlsError::Artifact {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|e| RlsError::Artifact {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), RlsError> {
    let artifact_err = |source| RlsError::Artifact {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(artifact_err)?;
    }
    let body = serde_json::to_string_pretty(value).map_err(|e| {
        artifact_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;
    std::fs::write(path, body).map_err(artifact_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Method;
    use crate::report::summary::summarize;
    use chrono::TimeZone;

    #[test]
    fn timestamp_is_filename_safe() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 45).unwrap();
        assert_eq!(artifact_timestamp(now), "2024-03-05T12-30-45-000Z");
    }

    #[test]
    fn writes_into_missing_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let tests_dir = tmp.path().join("generated/tests");
        let results_dir = tmp.path().join("generated/results");
        let cases = vec![TestCase::new(Method::Select, "posts", 200)];

        let p = write_test_cases(&tests_dir, "ts", &cases).unwrap();
        assert!(p.ends_with("generated/tests/test-cases-ts.json"));
        assert_eq!(read_test_cases(&p).unwrap(), cases);

        let s = summarize(&[], "ts", 0);
        let p = write_summary(&results_dir, "ts", &s).unwrap();
        let back: TestSummary =
            serde_json::from_str(&std::fs::read_to_string(p).unwrap()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn unreadable_case_file_is_artifact_error() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("broken.json");
        std::fs::write(&p, "not json").unwrap();
        let err = read_test_cases(&p).unwrap_err();
        assert!(matches!(err, RlsError::Artifact { .. }));
    }
}
