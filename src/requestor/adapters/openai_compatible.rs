use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::requestor::{
    adapters::{CompletionAdapter, http_common},
    error::{RequestError, invalid_request, malformed_response},
    types::{AdapterContext, Completion, EndpointKind},
};

#[derive(Clone)]
pub struct OpenAiCompatibleAdapter {
    client: Client,
}

impl Default for OpenAiCompatibleAdapter {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .pool_idle_timeout(Duration::from_secs(30))
                .build()
                .expect("reqwest client must build"),
        }
    }
}

#[async_trait]
impl CompletionAdapter for OpenAiCompatibleAdapter {
    fn kind(&self) -> EndpointKind {
        EndpointKind::Hosted
    }

    async fn complete(
        &self,
        ctx: AdapterContext,
        prompt: String,
    ) -> Result<Completion, RequestError> {
        if ctx.endpoint.url.trim().is_empty() {
            return Err(invalid_request("hosted endpoint requires a url"));
        }

        let url = http_common::endpoint_url(&ctx.endpoint.url, "/chat/completions");
        let body = json!({
            "model": ctx.endpoint.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": ctx.params.temperature,
            "max_tokens": ctx.params.max_tokens,
            "stream": false,
        });

        let started_at = Instant::now();
        tracing::debug!(
            target: "requestor.openai_compatible",
            request_id = %ctx.request_id,
            model = %ctx.endpoint.model,
            url = %url,
            "openai_compatible_dispatch_start"
        );

        let builder = http_common::authorized_post(&self.client, &url, &ctx).json(&body);
        let payload = http_common::send_json(builder, &url).await?;

        tracing::debug!(
            target: "requestor.openai_compatible",
            request_id = %ctx.request_id,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "openai_compatible_dispatch_done"
        );

        parse_chat_payload(&payload).map_err(|err| err.with_endpoint(url))
    }
}

fn parse_chat_payload(payload: &Value) -> Result<Completion, RequestError> {
    let choice = payload
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .ok_or_else(|| malformed_response("openai-compatible response missing choices"))?;

    let text = choice
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| malformed_response("openai-compatible response missing message content"))?
        .to_string();

    Ok(Completion {
        text,
        usage: payload.get("usage").map(http_common::parse_usage),
    })
}
