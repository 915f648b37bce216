//! REST client for a PostgREST data API (`/rest/v1`).
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Method as HttpMethod;
use tracing::debug;
use url::Url;

use super::http::{into_backend_response, into_rpc_result};
use super::{BackendResponse, DataApi};
use crate::errors::BackendError;
use crate::model::{Method, TestCase};

const USER_AGENT_VALUE: &str = concat!("rlscheck/", env!("CARGO_PKG_VERSION"));

/// Upper bound for a single HTTP exchange. Runner timeouts are much shorter; this only
/// caps how long a detached, timed-out call can linger.
const TRANSPORT_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared handle to the data API; cheap to clone.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl RestClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, BackendError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(TRANSPORT_TIMEOUT)
            .default_headers(default_headers)
            .build()
            .map_err(|e| BackendError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| BackendError::InvalidRequest {
            message: format!("invalid backend URL {base_url:?}: {e}"),
        })?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// `POST /rest/v1/rpc/<function>` with JSON arguments.
    pub async fn rpc(
        &self,
        function: &str,
        args: &serde_json::Value,
    ) -> Result<serde_json::Value, BackendError> {
        let url = self.endpoint(&format!("rest/v1/rpc/{function}"))?;
        debug!(url = %url, "calling RPC");

        let response = self
            .client
            .post(url)
            .headers(self.auth_headers()?)
            .json(args)
            .send()
            .await?;

        into_rpc_result(response).await
    }

    /// Build the request a test case maps to, without sending it.
    pub fn build_request(&self, test: &TestCase) -> Result<reqwest::Request, BackendError> {
        let (http_method, prefer) = match &test.method {
            Method::Select => (HttpMethod::GET, None),
            Method::Insert => (HttpMethod::POST, Some("return=minimal")),
            Method::Update => (HttpMethod::PATCH, Some("return=minimal")),
            Method::Delete => (HttpMethod::DELETE, Some("return=minimal")),
            Method::Upsert => (
                HttpMethod::POST,
                Some("resolution=merge-duplicates,return=minimal"),
            ),
            Method::Unsupported(m) => {
                return Err(BackendError::InvalidRequest {
                    message: format!("Unsupported method: {m}"),
                })
            }
        };

        let mut url = self.table_url(&test.path)?;
        {
            let mut query = url.query_pairs_mut();
            if test.method == Method::Select {
                query.append_pair("select", "*");
            }
            if test.method.uses_filters() {
                for (column, value) in test.query_params.iter().flatten() {
                    query.append_pair(column, &format!("eq.{value}"));
                }
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let mut headers = self.auth_headers()?;
        if let Some(prefer) = prefer {
            headers.insert("prefer", HeaderValue::from_static(prefer));
        }
        for (name, value) in test.headers.iter().flatten() {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                BackendError::InvalidRequest {
                    message: format!("invalid header name {name:?}: {e}"),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| BackendError::InvalidRequest {
                message: format!("invalid value for header {name}: {e}"),
            })?;
            headers.insert(name, value);
        }

        let mut builder = self.client.request(http_method, url).headers(headers);
        if matches!(test.method, Method::Insert | Method::Update | Method::Upsert) {
            let body = test.body.clone().unwrap_or_else(|| serde_json::json!({}));
            builder = builder.json(&body);
        }

        builder.build().map_err(|e| BackendError::InvalidRequest {
            message: e.to_string(),
        })
    }

    fn auth_headers(&self) -> Result<HeaderMap, BackendError> {
        let invalid = |e: reqwest::header::InvalidHeaderValue| BackendError::InvalidRequest {
            message: format!("invalid API key: {e}"),
        };
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(&self.api_key).map_err(invalid)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(invalid)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Accepts `posts`, `/posts` or `rest/v1/posts`.
    fn table_url(&self, path: &str) -> Result<Url, BackendError> {
        let table = path
            .trim()
            .trim_start_matches('/')
            .trim_start_matches("rest/v1/")
            .trim_end_matches('/');
        if table.is_empty() || table.contains('?') {
            return Err(BackendError::InvalidRequest {
                message: format!("invalid resource path {path:?}"),
            });
        }
        self.endpoint(&format!("rest/v1/{table}"))
    }

    fn endpoint(&self, relative: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(relative)
            .map_err(|e| BackendError::InvalidRequest {
                message: format!("invalid endpoint {relative:?}: {e}"),
            })
    }
}

#[async_trait]
impl DataApi for RestClient {
    async fn execute(&self, test: &TestCase) -> Result<BackendResponse, BackendError> {
        let request = self.build_request(test)?;
        debug!(method = %request.method(), url = %request.url(), "executing test request");
        let response = self.client.execute(request).await?;
        into_backend_response(response).await
    }
}
