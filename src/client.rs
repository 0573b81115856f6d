//! HTTP client adapter for TheSportsDB v1 API.
//!
//! Every call produces exactly one `ApiResponse`: either the decoded payload
//! or an `ApiError` describing a transport failure (`Network`) or a non-2xx
//! reply (`HTTP`). Failures are values, never `Err`, so tool handlers can
//! always render something back to the host. There are no retries.

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::config::SportsDbConfig;
use crate::error::SportsDbError;

/// Query parameters in the order they are appended to the URL.
pub type QueryParams = Vec<(String, String)>;

/// Which side of the wire a failure happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// The API answered with a non-2xx status.
    #[serde(rename = "HTTP")]
    Http,
    /// No HTTP response was received (DNS, connect, timeout, body read).
    Network,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Http => f.write_str("HTTP"),
            ErrorKind::Network => f.write_str("Network"),
        }
    }
}

/// Error record for a failed call.
///
/// Serializes as `{"error": "HTTP" | "Network", "status"?, "url"?, "message"?, "body"?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    #[serde(rename = "error")]
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Parsed JSON when the error response declared JSON, else a string of raw text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ApiError {
    /// A transport failure: no HTTP response was received.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Network,
            status: None,
            url: None,
            message: Some(message.into()),
            body: None,
        }
    }

    /// A non-2xx reply from `url` (the final URL after redirects).
    pub fn http(status: u16, url: impl Into<String>, body: Value) -> Self {
        Self {
            kind: ErrorKind::Http,
            status: Some(status),
            url: Some(url.into()),
            message: None,
            body: Some(body),
        }
    }
}

/// Normalized outcome of a single GET.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApiResponse {
    Success(Value),
    Failure(ApiError),
}

impl ApiResponse {
    pub fn is_failure(&self) -> bool {
        matches!(self, ApiResponse::Failure(_))
    }

    /// Convert into a plain JSON value: the payload, or the serialized error record.
    pub fn into_value(self) -> Value {
        match self {
            ApiResponse::Success(value) => value,
            ApiResponse::Failure(err) => serde_json::to_value(&err).unwrap_or_else(|e| {
                json!({ "error": err.kind.to_string(), "message": e.to_string() })
            }),
        }
    }
}

/// Thin async client for `GET {base_url}/{api_key}/{endpoint}?{query}`.
///
/// Built once from an immutable `SportsDbConfig`; the underlying
/// `reqwest::Client` pools connections across calls.
#[derive(Debug, Clone)]
pub struct SportsDbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    default_timeout: Duration,
}

impl SportsDbClient {
    /// Validate the config and build a client with the fixed request headers.
    pub fn new(config: &SportsDbConfig) -> crate::Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| SportsDbError::Config(format!("invalid user_agent: {}", e)))?;
        headers.insert(USER_AGENT, agent);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            default_timeout: config.timeout(),
        })
    }

    /// Full URL for an endpoint, without the query string.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            self.api_key,
            endpoint.trim_start_matches('/')
        )
    }

    /// GET with the configured default timeout.
    pub async fn get(&self, endpoint: &str, params: &[(String, String)]) -> ApiResponse {
        self.get_with_timeout(endpoint, params, self.default_timeout).await
    }

    /// GET with an explicit per-call timeout.
    pub async fn get_with_timeout(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        timeout: Duration,
    ) -> ApiResponse {
        let url = self.endpoint_url(endpoint);
        let start = Instant::now();

        let response = match self
            .http
            .get(&url)
            .query(params)
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let message = error_chain(&e);
                tracing::warn!(endpoint = %endpoint, error = %message, "TheSportsDB request failed");
                return ApiResponse::Failure(ApiError::network(message));
            }
        };

        let status = response.status();
        let final_url = response.url().to_string();
        let is_json = is_json_content_type(response.headers());

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                let message = error_chain(&e);
                tracing::warn!(endpoint = %endpoint, error = %message, "failed to read TheSportsDB response body");
                return ApiResponse::Failure(ApiError::network(message));
            }
        };

        tracing::debug!(
            endpoint = %endpoint,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "TheSportsDB response"
        );

        if status.is_success() {
            let payload = if is_json {
                match serde_json::from_str::<Value>(&text) {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::debug!(endpoint = %endpoint, error = %e, "JSON content-type with unparseable body");
                        json!({ "text": text })
                    }
                }
            } else {
                json!({ "text": text })
            };
            ApiResponse::Success(payload)
        } else {
            tracing::warn!(endpoint = %endpoint, status = status.as_u16(), "TheSportsDB returned an error status");
            let body = if is_json {
                serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text))
            } else {
                Value::String(text)
            };
            ApiResponse::Failure(ApiError::http(status.as_u16(), final_url, body))
        }
    }
}

/// Flatten a JSON object into query parameters.
///
/// Strings are passed verbatim, numbers and booleans as their JSON text,
/// `null` as an empty value, arrays as one repeated key per element, and
/// nested objects as compact JSON.
pub fn query_from_json(object: &Map<String, Value>) -> QueryParams {
    let mut params = QueryParams::new();
    for (key, value) in object {
        match value {
            Value::Array(items) => {
                for item in items {
                    params.push((key.clone(), scalar_to_query(item)));
                }
            }
            other => params.push((key.clone(), scalar_to_query(other))),
        }
    }
    params
}

fn scalar_to_query(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
}

/// `Display` of an error and all of its sources, joined with ": ".
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
