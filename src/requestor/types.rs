use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::method::ConceptTag;

pub type RequestId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    /// OpenAI-compatible chat completions API.
    Hosted,
    /// Ollama-style generate API on a local host.
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialRef {
    Env { var: String },
    InlineToken { token: String },
    None,
}

impl Default for CredentialRef {
    fn default() -> Self {
        Self::None
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedCredential {
    pub auth_header: Option<String>,
}

impl ResolvedCredential {
    pub fn none() -> Self {
        Self { auth_header: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub kind: EndpointKind,
    pub url: String,
    pub model: String,
    #[serde(default)]
    pub credential: CredentialRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestorConfig {
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
    #[serde(default)]
    pub sequential: bool,
    #[serde(default)]
    pub rate_per_second: Option<u32>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub samples_per_prompt: Option<u32>,
    #[serde(default)]
    pub instruction: Option<String>,
}

impl Default for RequestorConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: default_concurrency_limit(),
            sequential: false,
            rate_per_second: None,
            request_timeout_ms: default_request_timeout_ms(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            samples_per_prompt: None,
            instruction: None,
        }
    }
}

impl RequestorConfig {
    pub fn effective_concurrency(&self) -> usize {
        if self.sequential {
            1
        } else {
            self.concurrency_limit.max(1)
        }
    }

    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

fn default_concurrency_limit() -> usize {
    4
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    500
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// One prompt for one class. Several requests may share a class and variant
/// when a method samples the same prompt repeatedly.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptRequest {
    pub request_id: RequestId,
    pub class_index: usize,
    pub class_name: String,
    pub variant: String,
    pub tag: ConceptTag,
    pub sample: u32,
    pub prompt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

impl UsageStats {
    /// Adds `other` field by field. A field stays `None` until some
    /// response reports it.
    pub fn accumulate(&mut self, other: &UsageStats) {
        fn add(total: &mut Option<u64>, value: Option<u64>) {
            if let Some(value) = value {
                *total = Some(total.unwrap_or(0).saturating_add(value));
            }
        }
        add(&mut self.input_tokens, other.input_tokens);
        add(&mut self.output_tokens, other.output_tokens);
        add(&mut self.total_tokens, other.total_tokens);
    }

    pub fn is_reported(&self) -> bool {
        self.input_tokens.is_some() || self.output_tokens.is_some() || self.total_tokens.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<UsageStats>,
}

#[derive(Debug, Clone)]
pub struct AdapterContext {
    pub endpoint: EndpointConfig,
    pub credential: ResolvedCredential,
    pub params: GenerationParams,
    pub timeout: Duration,
    pub request_id: RequestId,
}
