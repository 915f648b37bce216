//! HTTP layer: status mapping and error body decoding.
//!
//! This is the ONLY place for status code handling. rest.rs never interprets status codes.

use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use super::{ApiError, BackendResponse};
use crate::errors::BackendError;

/// Turn an HTTP response into a completed call. Non-2xx statuses become backend-reported
/// errors; only a failure to read the body is a transport fault.
pub(crate) async fn into_backend_response(
    response: reqwest::Response,
) -> Result<BackendResponse, BackendError> {
    let status = response.status();
    let text = response.text().await.map_err(|e| BackendError::Network {
        message: format!("failed to read response body: {}", e),
    })?;
    let body = parse_body(&text);

    debug!(status = status.as_u16(), "data API responded");

    if status.is_success() {
        return Ok(BackendResponse {
            status: Some(status.as_u16()),
            data: body,
            error: None,
        });
    }

    Ok(BackendResponse::denied(
        Some(status.as_u16()),
        api_error_from_body(status, body.as_ref()),
    ))
}

/// Decode a JSON RPC result, mapping non-2xx statuses to `BackendError::Status`.
pub(crate) async fn into_rpc_result(response: reqwest::Response) -> Result<Value, BackendError> {
    let status = response.status();
    let text = response.text().await.map_err(|e| BackendError::Network {
        message: format!("failed to read response body: {}", e),
    })?;
    let body = parse_body(&text);

    if status.is_success() {
        return Ok(body.unwrap_or(Value::Null));
    }

    let err = api_error_from_body(status, body.as_ref());
    Err(BackendError::Status {
        status: status.as_u16(),
        code: err.code,
        message: err.message,
    })
}

fn parse_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}

/// PostgREST error bodies look like `{"code","message","details","hint"}`; GoTrue and the
/// gateway use `msg`/`error`. Anything else falls back to the raw text or reason phrase.
pub(crate) fn api_error_from_body(status: StatusCode, body: Option<&Value>) -> ApiError {
    let field = |key: &str| {
        body.and_then(|b| b.get(key))
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
    };

    let message = field("message")
        .or_else(|| field("msg"))
        .or_else(|| field("error_description"))
        .or_else(|| field("error"))
        .or_else(|| match body {
            Some(Value::String(s)) => Some(s.chars().take(200).collect()),
            _ => None,
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(String::from)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
        });

    ApiError {
        message,
        code: field("code"),
        details: field("details"),
        hint: field("hint"),
    }
}
