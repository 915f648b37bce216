//! Remediation hints for failed cases: static heuristics first, then optionally the LLM.

use tracing::{debug, warn};

use crate::model::TestResult;
use crate::providers::llm::LlmClient;
use crate::report::summary::FailureDetail;

/// Cheap, offline hint derived from the backend error text.
pub fn sql_suggestion(error: &str, table: &str) -> Option<String> {
    let lower = error.to_ascii_lowercase();
    if lower.contains("permission denied") {
        return Some(format!("ALTER TABLE {table} ENABLE ROW LEVEL SECURITY;"));
    }
    if lower.contains("row-level security policy") {
        return Some(format!(
            "CREATE POLICY \"allow_owner_rows\" ON {table}\n  FOR ALL\n  USING (auth.uid() = user_id)\n  WITH CHECK (auth.uid() = user_id);"
        ));
    }
    None
}

/// Fill `suggestion` on every failure. With `llm` set, failures the heuristics miss get one
/// model request each; a failed request leaves the suggestion empty.
pub async fn suggest_fixes(
    failures: &mut [FailureDetail],
    table: &str,
    llm: Option<&dyn LlmClient>,
) {
    for failure in failures.iter_mut() {
        if let Some(err) = failure.result.error.as_deref() {
            failure.suggestion = sql_suggestion(err, table);
        }
        if failure.suggestion.is_some() {
            continue;
        }
        let Some(llm) = llm else { continue };

        let prompt = fix_prompt(&failure.result, table);
        match llm.complete(&prompt).await {
            Ok(resp) => {
                let sql = strip_fences(&resp.text);
                if sql.is_empty() {
                    debug!(path = %failure.result.test.path, "model returned no fix");
                } else {
                    failure.suggestion = Some(sql);
                }
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), path = %failure.result.test.path, "fix suggestion failed");
            }
        }
    }
}

fn fix_prompt(result: &TestResult, table: &str) -> String {
    let case = serde_json::to_string_pretty(&result.test).unwrap_or_default();
    format!(
        "A row-level security test against the Supabase table \"{table}\" failed.\n\
         Test case:\n{case}\n\
         Expected status {expected}, got {actual}.\n\
         Error: {error}\n\n\
         Reply with only the PostgreSQL statements that would make the table's RLS policies \
         produce the expected status. No prose.",
        expected = result.expected,
        actual = result.actual,
        error = result.error.as_deref().unwrap_or("none"),
    )
}

/// Drop a surrounding ```sql fence if the model added one.
fn strip_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Method, TestCase};
    use crate::providers::llm::LlmResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FixedLlm {
        reply: Option<&'static str>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmClient for FixedLlm {
        async fn complete(&self, _prompt: &str) -> anyhow::Result<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(text) => Ok(LlmResponse {
                    text: text.to_string(),
                    provider: "fake".into(),
                    model: "fake".into(),
                }),
                None => anyhow::bail!("quota exceeded"),
            }
        }

        fn provider_name(&self) -> &'static str {
            "fake"
        }
    }

    fn failure(error: &str) -> FailureDetail {
        FailureDetail {
            result: TestResult {
                test: TestCase::new(Method::Delete, "posts", 204),
                success: false,
                actual: 403,
                expected: 204,
                error: Some(error.to_string()),
                attempts: 1,
            },
            suggestion: None,
        }
    }

    #[test]
    fn heuristics() {
        assert_eq!(
            sql_suggestion("permission denied for table posts", "posts").as_deref(),
            Some("ALTER TABLE posts ENABLE ROW LEVEL SECURITY;")
        );
        assert!(sql_suggestion("new row violates row-level security policy", "posts")
            .unwrap()
            .starts_with("CREATE POLICY"));
        assert_eq!(sql_suggestion("timeout", "posts"), None);
    }

    #[test]
    fn strips_code_fences() {
        assert_eq!(strip_fences("```sql\nSELECT 1;\n```"), "SELECT 1;");
        assert_eq!(strip_fences("  SELECT 1;  "), "SELECT 1;");
    }

    #[tokio::test]
    async fn heuristic_hint_skips_model() {
        let llm = FixedLlm { reply: Some("SELECT 1;"), calls: AtomicU32::new(0) };
        let mut failures = vec![failure("permission denied for table posts")];
        suggest_fixes(&mut failures, "posts", Some(&llm as &dyn LlmClient)).await;
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
        assert!(failures[0].suggestion.as_deref().unwrap().starts_with("ALTER TABLE"));
    }

    #[tokio::test]
    async fn model_failure_leaves_suggestion_empty() {
        let llm = FixedLlm { reply: None, calls: AtomicU32::new(0) };
        let mut failures = vec![failure("Test timeout"), failure("Test timeout")];
        suggest_fixes(&mut failures, "posts", Some(&llm as &dyn LlmClient)).await;
        assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
        assert!(failures.iter().all(|f| f.suggestion.is_none()));
    }

    #[tokio::test]
    async fn model_hint_is_attached() {
        let llm = FixedLlm {
            reply: Some("```sql\nCREATE POLICY p ON posts FOR DELETE USING (true);\n```"),
            calls: AtomicU32::new(0),
        };
        let mut failures = vec![failure("Test timeout")];
        suggest_fixes(&mut failures, "posts", Some(&llm as &dyn LlmClient)).await;
        assert_eq!(
            failures[0].suggestion.as_deref(),
            Some("CREATE POLICY p ON posts FOR DELETE USING (true);")
        );
    }
}
