//! Response interpretation: completed backend call → `TestResult`.

use crate::backend::BackendResponse;
use crate::model::{TestCase, TestResult, NO_RESPONSE_STATUS};

/// Map a completed call to a verdict.
///
/// Every completed call is judged on `actual == expected`, including backend-reported
/// errors: an expected denial (403 vs 403) passes, and the backend message is kept either way.
pub fn interpret(test: &TestCase, response: BackendResponse, attempts: u32) -> TestResult {
    let actual = response.status.unwrap_or(NO_RESPONSE_STATUS);

    TestResult {
        test: test.clone(),
        success: actual == test.expected_status,
        actual,
        expected: test.expected_status,
        error: response.error.map(|e| e.message),
        attempts,
    }
}
