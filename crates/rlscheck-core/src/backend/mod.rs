//! Data API access: the request seam used by the runner and the REST implementation.

use crate::errors::BackendError;
use crate::model::TestCase;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod http;
mod rest;

pub use rest::RestClient;

/// Application-level error reported by the backend (PostgREST error body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            details: None,
            hint: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// A completed call: the backend answered, possibly with an error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BackendResponse {
    pub status: Option<u16>,
    pub data: Option<serde_json::Value>,
    pub error: Option<ApiError>,
}

impl BackendResponse {
    pub fn ok(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn denied(status: Option<u16>, error: ApiError) -> Self {
        Self {
            status,
            data: None,
            error: Some(error),
        }
    }
}

/// Executes one test case as a single remote call.
///
/// `Err` means no response was obtained (transport fault); backend-reported failures are
/// `Ok` with `error` set.
#[async_trait]
pub trait DataApi: Send + Sync {
    async fn execute(&self, test: &TestCase) -> Result<BackendResponse, BackendError>;
}
