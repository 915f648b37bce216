//! Data model shared by the generator, runner and reporter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Status recorded when no response was ever obtained from the backend.
pub const NO_RESPONSE_STATUS: u16 = 500;

/// Command a policy governs, as reported by `pg_policies`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyCommand {
    Select,
    Insert,
    Update,
    Delete,
    #[serde(alias = "*")]
    All,
}

/// Whether a policy is ORed (permissive) or ANDed (restrictive) with its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Permissiveness {
    Permissive,
    Restrictive,
}

/// One row-level-security rule on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub table_name: String,
    pub policy_name: String,
    /// Backend-specific `USING`/`WITH CHECK` expression; never interpreted here.
    #[serde(default)]
    pub definition: String,
    pub command: PolicyCommand,
    pub permissive: Permissiveness,
}

/// Data API operation a test case performs.
///
/// Unknown method strings survive deserialization as `Unsupported` so the runner can report
/// them per case instead of failing the whole parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Method {
    Select,
    Insert,
    Update,
    Delete,
    Upsert,
    Unsupported(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Select => "select",
            Method::Insert => "insert",
            Method::Update => "update",
            Method::Delete => "delete",
            Method::Upsert => "upsert",
            Method::Unsupported(raw) => raw,
        }
    }

    /// Whether `queryParams` narrow the rows this method touches.
    pub fn uses_filters(&self) -> bool {
        matches!(self, Method::Select | Method::Update | Method::Delete)
    }
}

impl From<String> for Method {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "select" => Method::Select,
            "insert" => Method::Insert,
            "update" => Method::Update,
            "delete" => Method::Delete,
            "upsert" => Method::Upsert,
            _ => Method::Unsupported(raw),
        }
    }
}

impl From<Method> for String {
    fn from(m: Method) -> Self {
        m.as_str().to_string()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declarative description of one request against the data API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub method: Method,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_params: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    pub expected_status: u16,
    pub description: String,
}

impl TestCase {
    pub fn new(method: Method, path: impl Into<String>, expected_status: u16) -> Self {
        Self {
            method,
            path: path.into(),
            name: None,
            body: None,
            query_params: None,
            headers: None,
            expected_status,
            description: String::new(),
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params
            .get_or_insert_with(BTreeMap::new)
            .insert(column.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Short label for console output.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.description)
    }
}

/// Outcome of running one test case (after retries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test: TestCase,
    pub success: bool,
    pub actual: u16,
    pub expected: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub attempts: u32,
}

impl TestResult {
    /// Terminal failure when no attempt produced a response.
    pub fn no_response(test: &TestCase, error: impl Into<String>, attempts: u32) -> Self {
        Self {
            test: test.clone(),
            success: false,
            actual: NO_RESPONSE_STATUS,
            expected: test.expected_status,
            error: Some(error.into()),
            attempts,
        }
    }
}
