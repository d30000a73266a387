use std::sync::Arc;

use async_trait::async_trait;

use crate::requestor::{
    error::RequestError,
    types::{AdapterContext, Completion, EndpointKind},
};

pub mod http_common;
pub mod ollama;
pub mod openai_compatible;

#[async_trait]
pub trait CompletionAdapter: Send + Sync {
    fn kind(&self) -> EndpointKind;

    async fn complete(&self, ctx: AdapterContext, prompt: String)
    -> Result<Completion, RequestError>;
}

pub fn build_adapter(kind: EndpointKind) -> Arc<dyn CompletionAdapter> {
    match kind {
        EndpointKind::Hosted => Arc::new(openai_compatible::OpenAiCompatibleAdapter::default()),
        EndpointKind::Local => Arc::new(ollama::OllamaAdapter::default()),
    }
}
