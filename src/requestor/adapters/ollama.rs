use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::requestor::{
    adapters::{CompletionAdapter, http_common},
    error::{RequestError, invalid_request, malformed_response},
    types::{AdapterContext, Completion, EndpointKind, UsageStats},
};

#[derive(Clone)]
pub struct OllamaAdapter {
    client: Client,
}

impl Default for OllamaAdapter {
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
impl CompletionAdapter for OllamaAdapter {
    fn kind(&self) -> EndpointKind {
        EndpointKind::Local
    }

    async fn complete(
        &self,
        ctx: AdapterContext,
        prompt: String,
    ) -> Result<Completion, RequestError> {
        if ctx.endpoint.url.trim().is_empty() {
            return Err(invalid_request("local endpoint requires a url"));
        }

        let url = http_common::endpoint_url(&ctx.endpoint.url, "/api/generate");
        let body = json!({
            "model": ctx.endpoint.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": ctx.params.temperature,
                "num_predict": ctx.params.max_tokens,
            },
        });

        let started_at = Instant::now();
        tracing::debug!(
            target: "requestor.ollama",
            request_id = %ctx.request_id,
            model = %ctx.endpoint.model,
            url = %url,
            "ollama_dispatch_start"
        );

        let builder = http_common::authorized_post(&self.client, &url, &ctx).json(&body);
        let payload = http_common::send_json(builder, &url).await?;

        tracing::debug!(
            target: "requestor.ollama",
            request_id = %ctx.request_id,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "ollama_dispatch_done"
        );

        parse_generate_payload(&payload).map_err(|err| err.with_endpoint(url))
    }
}

fn parse_generate_payload(payload: &Value) -> Result<Completion, RequestError> {
    if let Some(error) = payload.get("error").and_then(Value::as_str) {
        return Err(malformed_response(format!("ollama reported error: {}", error)));
    }

    let text = payload
        .get("response")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed_response("ollama response missing `response` field"))?
        .to_string();

    let input_tokens = payload.get("prompt_eval_count").and_then(Value::as_u64);
    let output_tokens = payload.get("eval_count").and_then(Value::as_u64);
    let usage = (input_tokens.is_some() || output_tokens.is_some()).then(|| UsageStats {
        input_tokens,
        output_tokens,
        total_tokens: input_tokens.zip(output_tokens).map(|(i, o)| i + o),
    });

    Ok(Completion { text, usage })
}
