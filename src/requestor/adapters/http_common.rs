use reqwest::{RequestBuilder, header};
use serde_json::Value;

use crate::requestor::{
    error::{RequestError, RequestErrorKind},
    types::{AdapterContext, UsageStats},
};

pub fn map_http_error(status: u16, url: &str, body: &str) -> RequestError {
    let normalized_body = body.chars().take(240).collect::<String>();

    let mut err = if status == 401 {
        RequestError::new(RequestErrorKind::Authentication, "authentication failed")
    } else if status == 403 {
        RequestError::new(RequestErrorKind::Authorization, "authorization failed")
    } else if status == 408 || status == 429 {
        RequestError::new(
            RequestErrorKind::RateLimited,
            format!("endpoint returned status {}", status),
        )
    } else if (400..500).contains(&status) {
        RequestError::new(
            RequestErrorKind::InvalidRequest,
            format!("endpoint returned status {}", status),
        )
    } else {
        RequestError::new(
            RequestErrorKind::Network,
            format!("endpoint returned status {}", status),
        )
    };

    err = err
        .with_endpoint(url.to_string())
        .with_provider_http_status(status);

    if !normalized_body.is_empty() {
        err.message = format!("{}: {}", err.message, normalized_body);
    }

    err
}

pub fn map_send_error(err: reqwest::Error, url: &str) -> RequestError {
    let kind = if err.is_timeout() {
        RequestErrorKind::Timeout
    } else {
        RequestErrorKind::Network
    };
    RequestError::new(kind, format!("request failed: {}", err)).with_endpoint(url.to_string())
}

pub fn authorized_post(client: &reqwest::Client, url: &str, ctx: &AdapterContext) -> RequestBuilder {
    let mut builder = client
        .post(url)
        .timeout(ctx.timeout)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-request-id", ctx.request_id.clone());

    if let Some(auth_header) = &ctx.credential.auth_header {
        builder = builder.header(header::AUTHORIZATION, auth_header);
    }
    builder
}

/// Sends the request and decodes a JSON body, mapping every failure mode
/// onto a `RequestError`.
pub async fn send_json(builder: RequestBuilder, url: &str) -> Result<Value, RequestError> {
    let response = builder
        .send()
        .await
        .map_err(|err| map_send_error(err, url))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(map_http_error(status, url, &body));
    }

    response.json::<Value>().await.map_err(|err| {
        RequestError::new(
            RequestErrorKind::MalformedResponse,
            format!("response body decode failed: {}", err),
        )
        .with_endpoint(url.to_string())
    })
}

pub fn parse_usage(usage: &Value) -> UsageStats {
    UsageStats {
        input_tokens: usage
            .get("prompt_tokens")
            .and_then(Value::as_u64)
            .or_else(|| usage.get("input_tokens").and_then(Value::as_u64)),
        output_tokens: usage
            .get("completion_tokens")
            .and_then(Value::as_u64)
            .or_else(|| usage.get("output_tokens").and_then(Value::as_u64)),
        total_tokens: usage.get("total_tokens").and_then(Value::as_u64),
    }
}

pub fn endpoint_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with(path) {
        base.to_string()
    } else {
        format!("{}{}", base, path)
    }
}
