use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use uuid::Uuid;

use cbm_concepts::{
    concepts::filter::FilterConfig,
    config::{Config, DatasetConfig, LoggingConfig, OutputConfig},
    method::{ConceptTag, MethodId, SelectionStrategy},
    output::metadata::{EndpointSummary, GenerationInfo},
    requestor::{
        ConceptRequestor, RequestOutcome,
        adapters::CompletionAdapter,
        credentials::EnvCredentialProvider,
        error::{RequestError, RequestErrorKind},
        types::{
            AdapterContext, Completion, ConceptRequest, CredentialRef, EndpointConfig,
            EndpointKind, RequestorConfig, UsageStats,
        },
    },
};

/// Answers label-free prompts for `cat` and `dog` with fixed lists, each
/// reporting 10 input and 5 output tokens; every prompt about `frog` fails
/// at the network level.
pub struct ScriptedAdapter;

#[async_trait]
impl CompletionAdapter for ScriptedAdapter {
    fn kind(&self) -> EndpointKind {
        EndpointKind::Local
    }

    async fn complete(
        &self,
        _ctx: AdapterContext,
        prompt: String,
    ) -> Result<Completion, RequestError> {
        if prompt.contains("frog") {
            return Err(RequestError::new(
                RequestErrorKind::Network,
                "connection refused",
            ));
        }

        let text = scripted_answer(&prompt).unwrap_or("Sure! Here are some ideas:");
        Ok(Completion {
            text: text.to_string(),
            usage: Some(UsageStats {
                input_tokens: Some(10),
                output_tokens: Some(5),
                total_tokens: Some(15),
            }),
        })
    }
}

fn scripted_answer(prompt: &str) -> Option<&'static str> {
    let cat = prompt.contains("cat");
    if prompt.contains("important features") {
        return Some(if cat {
            "Here are the most important features:\n1. Whiskers\n2. Pointed ears\n3. Soft fur\n4. A cat tail"
        } else {
            "- wagging tail\n- floppy ears\n- fur"
        });
    }
    if prompt.contains("commonly seen around") {
        return Some(if cat {
            "- sofa\n- mouse\n- soft fur"
        } else {
            "- leash\n- sofa"
        });
    }
    if prompt.contains("superclasses") {
        return Some(if cat {
            "- animal\n- mammal"
        } else {
            "- animal\n- pet"
        });
    }
    None
}

pub fn temp_root() -> PathBuf {
    std::env::temp_dir().join(format!("cbm-pipeline-test-{}", Uuid::now_v7()))
}

pub fn classes() -> Vec<String> {
    ["cat", "dog", "frog"].into_iter().map(str::to_string).collect()
}

pub fn endpoint() -> EndpointConfig {
    EndpointConfig {
        kind: EndpointKind::Local,
        url: "http://127.0.0.1:9".to_string(),
        model: "fake".to_string(),
        credential: CredentialRef::None,
    }
}

pub fn config(root: PathBuf, method: MethodId) -> Config {
    Config {
        dataset: DatasetConfig {
            name: "toy".to_string(),
            class_file: None,
        },
        method,
        endpoint: endpoint(),
        requestor: RequestorConfig::default(),
        filter: FilterConfig::default(),
        output: OutputConfig { root },
        logging: LoggingConfig::default(),
        prompts: None,
    }
}

pub async fn requestor(config: &Config) -> ConceptRequestor {
    ConceptRequestor::connect(
        config.endpoint.clone(),
        &config.requestor,
        &EnvCredentialProvider,
    )
    .await
    .expect("requestor should connect")
    .with_adapter(Arc::new(ScriptedAdapter))
}

pub fn request(class_index: usize, class_name: &str, tag: ConceptTag) -> ConceptRequest {
    ConceptRequest {
        request_id: format!("req-{class_index}-{}", tag.as_str()),
        class_index,
        class_name: class_name.to_string(),
        variant: tag.as_str().to_string(),
        tag,
        sample: 0,
        prompt: format!("prompt for {class_name}"),
    }
}

pub fn answered(request: ConceptRequest, text: &str) -> RequestOutcome {
    RequestOutcome {
        request,
        result: Ok(Completion {
            text: text.to_string(),
            usage: None,
        }),
    }
}

pub fn failed(request: ConceptRequest, kind: RequestErrorKind) -> RequestOutcome {
    RequestOutcome {
        request,
        result: Err(RequestError::new(kind, "request failed")),
    }
}

pub fn generation_info() -> GenerationInfo {
    GenerationInfo {
        method: MethodId::LabelFreeCbm,
        run_id: "run-test".to_string(),
        endpoint: EndpointSummary {
            kind: EndpointKind::Local,
            url: "http://127.0.0.1:9".to_string(),
            model: "fake".to_string(),
        },
        temperature: 0.7,
        max_tokens: 500,
        samples_per_prompt: 1,
        concurrency_limit: 4,
        selection: SelectionStrategy::FirstSeen,
        max_per_class: 20,
        min_per_class: 1,
        similarity_threshold: 0.9,
        cross_class_dedup: false,
        prompts: Vec::new(),
        generation_time_ms: 0,
        usage: UsageStats::default(),
    }
}
