use std::{sync::Arc, time::Duration};

use futures_util::future::join_all;
use tracing::Instrument;

use crate::requestor::{
    adapters::{CompletionAdapter, build_adapter},
    credentials::CredentialProvider,
    error::{RequestError, invalid_request},
    gate::ConcurrencyGate,
    types::{
        AdapterContext, Completion, ConceptRequest, EndpointConfig, GenerationParams,
        RequestorConfig, ResolvedCredential,
    },
};

/// The result of one request; failures stay attached to the request that
/// caused them so the class can be flagged downstream.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub request: ConceptRequest,
    pub result: Result<Completion, RequestError>,
}

pub struct ConceptRequestor {
    endpoint: EndpointConfig,
    credential: ResolvedCredential,
    adapter: Arc<dyn CompletionAdapter>,
    gate: ConcurrencyGate,
    params: GenerationParams,
    timeout: Duration,
    sequential: bool,
}

impl ConceptRequestor {
    /// Resolves the endpoint credential once and builds the adapter for the
    /// endpoint kind.
    pub async fn connect(
        endpoint: EndpointConfig,
        config: &RequestorConfig,
        credential_provider: &dyn CredentialProvider,
    ) -> Result<Self, RequestError> {
        if endpoint.model.trim().is_empty() {
            return Err(invalid_request("endpoint.model cannot be empty"));
        }

        let credential = credential_provider
            .resolve(&endpoint.credential, &endpoint)
            .await?;
        let adapter = build_adapter(endpoint.kind);

        Ok(Self {
            endpoint,
            credential,
            adapter,
            gate: ConcurrencyGate::new(config.effective_concurrency(), config.rate_per_second),
            params: config.params(),
            timeout: Duration::from_millis(config.request_timeout_ms.max(1)),
            sequential: config.sequential,
        })
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn CompletionAdapter>) -> Self {
        self.adapter = adapter;
        self
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    pub fn concurrency_limit(&self) -> usize {
        self.gate.limit()
    }

    pub async fn request_one(&self, request: &ConceptRequest) -> Result<Completion, RequestError> {
        let _lease = self.gate.acquire().await?;

        let ctx = AdapterContext {
            endpoint: self.endpoint.clone(),
            credential: self.credential.clone(),
            params: self.params,
            timeout: self.timeout,
            request_id: request.request_id.clone(),
        };

        let span = tracing::debug_span!(
            target: "requestor",
            "concept_request",
            request_id = %request.request_id,
            class = %request.class_name,
            variant = %request.variant,
            sample = request.sample
        );

        let result = self
            .adapter
            .complete(ctx, request.prompt.clone())
            .instrument(span)
            .await;

        match &result {
            Ok(completion) => tracing::debug!(
                target: "requestor",
                request_id = %request.request_id,
                class = %request.class_name,
                response_bytes = completion.text.len(),
                "concept_request_completed"
            ),
            Err(err) => tracing::warn!(
                target: "requestor",
                request_id = %request.request_id,
                class = %request.class_name,
                variant = %request.variant,
                kind = ?err.kind,
                error = %err,
                "concept_request_failed"
            ),
        }

        result
    }

    /// Issues every request and waits for all of them. Outcomes are returned
    /// in submission order regardless of completion order.
    pub async fn request_all(&self, requests: Vec<ConceptRequest>) -> Vec<RequestOutcome> {
        tracing::info!(
            target: "requestor",
            requests = requests.len(),
            endpoint_kind = ?self.adapter.kind(),
            concurrency_limit = self.gate.limit(),
            sequential = self.sequential,
            "concept_requests_dispatch"
        );

        if self.sequential {
            let mut outcomes = Vec::with_capacity(requests.len());
            for request in requests {
                let result = self.request_one(&request).await;
                outcomes.push(RequestOutcome { request, result });
            }
            return outcomes;
        }

        join_all(requests.into_iter().map(|request| async move {
            let result = self.request_one(&request).await;
            RequestOutcome { request, result }
        }))
        .await
    }
}
