//! Test case generation: one LLM call, then the tolerant parser.

pub mod parser;

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Coverage;
use crate::errors::GenerationError;
use crate::model::{Policy, TestCase};
use crate::providers::llm::LlmClient;

pub use parser::parse_test_cases;

/// What to ask the model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageConfig {
    pub level: Coverage,
    pub count: u32,
}

impl CoverageConfig {
    pub fn new(level: Coverage, count: Option<u32>) -> Self {
        Self {
            level,
            count: count.unwrap_or_else(|| level.default_test_count()),
        }
    }
}

pub struct TestCaseGenerator {
    llm: Arc<dyn LlmClient>,
}

impl TestCaseGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Raw model output for the given policies.
    pub async fn generate(
        &self,
        table: &str,
        policies: &[Policy],
        coverage: CoverageConfig,
    ) -> Result<String, GenerationError> {
        let prompt = build_prompt(table, policies, coverage);
        info!(
            table = %table,
            provider = self.llm.provider_name(),
            coverage = ?coverage.level,
            count = coverage.count,
            "generating test cases"
        );
        let resp = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|e| GenerationError::Llm(format!("{e:#}")))?;
        if resp.text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        debug!(chars = resp.text.len(), model = %resp.model, "received model output");
        Ok(resp.text)
    }

    /// Generate and parse. Cases without a path target `table`.
    pub async fn generate_cases(
        &self,
        table: &str,
        policies: &[Policy],
        coverage: CoverageConfig,
    ) -> Result<Vec<TestCase>, GenerationError> {
        let raw = self.generate(table, policies, coverage).await?;
        let mut cases = parse_test_cases(&raw)?;
        if cases.is_empty() {
            return Err(GenerationError::NoTestCases);
        }
        for case in &mut cases {
            if case.path.is_empty() {
                case.path = table.to_string();
            }
        }
        Ok(cases)
    }
}

fn breadth_instructions(level: Coverage) -> &'static str {
    match level {
        Coverage::Basic => {
            "Cover the main allow and deny path of each policy: one authorized and one \
             unauthorized request per governed operation."
        }
        Coverage::Full => {
            "Cover every policy and every operation (select, insert, update, delete, upsert), \
             both as the owning user and as a different or anonymous user, including attempts \
             to change ownership columns."
        }
        Coverage::Edge => {
            "Cover every policy and operation, then add boundary cases: missing or malformed \
             JWTs, null and empty ownership columns, filters that match no rows, bulk inserts \
             mixing allowed and denied rows, upserts colliding with rows owned by other users, \
             and interactions between permissive and restrictive policies."
        }
    }
}

pub(crate) fn build_prompt(table: &str, policies: &[Policy], coverage: CoverageConfig) -> String {
    let policies_json =
        serde_json::to_string_pretty(policies).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"Generate {count} test cases for these Supabase row-level-security policies on table "{table}":
{policies_json}

{breadth}

Return a JSON array where each element has this structure:
{{
  "name": "short_snake_case_identifier",
  "description": "what the case verifies",
  "method": "select" | "insert" | "update" | "delete" | "upsert",
  "path": "{table}",
  "body": {{ "column": "value" }},
  "queryParams": {{ "column": "value" }},
  "headers": {{ "Authorization": "Bearer <jwt>" }},
  "expectedStatus": number
}}

Rules:
- queryParams are equality filters and apply to select, update and delete.
- Use 2xx statuses for requests the policies allow and 401/403 for requests they deny.
- Use consistent UUIDs across related cases.
- Omit body, queryParams and headers when unused.

Return only the JSON array, without explanatory text or markdown formatting."#,
        count = coverage.count,
        table = table,
        policies_json = policies_json,
        breadth = breadth_instructions(coverage.level),
    )
}
