//! HTTP helpers for Lambda functions.

use lambda_http::http::header::{AUTHORIZATION, CONTENT_TYPE};
use lambda_http::http::Method;
use lambda_http::{Body, Request, RequestExt, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

use crate::{Error, Result};

/// Standard API response envelope: `{"ok": true, "data": ...}` or `{"ok": false, "error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(data)?))
        .map_err(|e| Error::Internal(format!("Failed to build response: {}", e)))
}

/// Wrap `data` in a successful envelope.
pub fn ok<T: Serialize>(status: u16, data: T) -> Result<Response<Body>> {
    json_response(status, &ApiResponse::success(data))
}

/// Create an error response with the given status code and message.
pub fn error_response(status: u16, message: impl Into<String>) -> Result<Response<Body>> {
    json_response(status, &ApiResponse::<()>::error(message))
}

/// Turn a handler result into the Lambda response, logging failures once.
pub fn respond(result: Result<Response<Body>>) -> std::result::Result<Response<Body>, lambda_http::Error> {
    let err = match result {
        Ok(response) => return Ok(response),
        Err(err) => err,
    };

    let status = err.status_code();
    if status >= 500 {
        error!(status, error = %err, "Request failed");
    } else {
        warn!(status, error = %err, "Request rejected");
    }

    error_response(status, err.to_string()).map_err(|e| e.to_string().into())
}

/// Parse the request body as JSON.
pub fn parse_json_body<T: DeserializeOwned>(body: &Body) -> Result<T> {
    let bytes: &[u8] = body.as_ref();
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::Validation("Missing request body".to_string()));
    }

    serde_json::from_slice(bytes)
        .map_err(|e| Error::Validation(format!("Invalid request body: {}", e)))
}

/// Extract the bearer token from the `Authorization` header.
pub fn bearer_token(event: &Request) -> Result<&str> {
    let header = event
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("Missing bearer token".to_string()))?
        .to_str()
        .map_err(|_| Error::Unauthorized("Malformed authorization header".to_string()))?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| Error::Unauthorized("Missing bearer token".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(Error::Unauthorized("Missing bearer token".to_string()));
    }

    Ok(token.trim())
}

/// Path segments of the request, without the `/api` stage prefix.
pub fn route_segments(event: &Request) -> Vec<&str> {
    let raw_path = event.uri().path();
    let path = raw_path.strip_prefix("/api").unwrap_or(raw_path);
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// First value of a query string parameter.
pub fn query_param(event: &Request, name: &str) -> Option<String> {
    event.query_string_parameters().first(name).map(str::to_string)
}

pub fn method_not_allowed(event: &Request) -> Error {
    Error::MethodNotAllowed(event.method().to_string())
}

/// Reject the request with 405 unless its method is one of `allowed`.
pub fn require_method(event: &Request, allowed: &[Method]) -> Result<()> {
    if allowed.contains(event.method()) {
        Ok(())
    } else {
        Err(method_not_allowed(event))
    }
}
