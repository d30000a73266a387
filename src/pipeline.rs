use std::{path::PathBuf, time::Instant};

use uuid::Uuid;

use crate::{
    concepts::{ConceptAggregator, filter::ConceptFilter},
    config::Config,
    dataset::Dataset,
    method::{MethodId, PromptVariant},
    output::{
        RunLayout, RunMetadata, RunReport, WriteError, layout::current_stamp,
        metadata::{EndpointSummary, GenerationInfo},
        write_run,
    },
    requestor::{
        ConceptRequestor,
        types::{ConceptRequest, UsageStats},
    },
};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// One batch run: every class of one dataset through one method's prompts.
pub struct ConceptPipeline {
    method: MethodId,
    dataset: Dataset,
    variants: Vec<PromptVariant>,
    instruction: Option<String>,
    samples_per_prompt: u32,
    temperature: f32,
    max_tokens: u32,
    output_root: PathBuf,
    requestor: ConceptRequestor,
    aggregator: ConceptAggregator,
}

impl ConceptPipeline {
    pub fn new(config: &Config, dataset: Dataset, requestor: ConceptRequestor) -> Self {
        let profile = config.method.profile();
        let variants = config
            .prompts
            .clone()
            .filter(|prompts| !prompts.is_empty())
            .unwrap_or(profile.variants);
        let instruction = config.requestor.instruction.clone().or(profile.instruction);
        let samples_per_prompt = config
            .requestor
            .samples_per_prompt
            .unwrap_or(profile.samples_per_prompt)
            .max(1);
        let filter = ConceptFilter::new(
            config.filter.clone(),
            &dataset.classes,
            profile.selection,
            profile.max_per_class,
        );

        Self {
            method: config.method,
            dataset,
            variants,
            instruction,
            samples_per_prompt,
            temperature: config.requestor.temperature,
            max_tokens: config.requestor.max_tokens,
            output_root: config.output.root.clone(),
            requestor,
            aggregator: ConceptAggregator::new(filter),
        }
    }

    pub fn variants(&self) -> &[PromptVariant] {
        &self.variants
    }

    /// Class-major, then variant, then sample.
    pub fn build_requests(&self) -> Vec<ConceptRequest> {
        let mut requests = Vec::with_capacity(
            self.dataset.len() * self.variants.len() * self.samples_per_prompt as usize,
        );
        for (class_index, class_name) in self.dataset.classes.iter().enumerate() {
            for variant in &self.variants {
                let prompt = variant.render(class_name, self.instruction.as_deref());
                for sample in 0..self.samples_per_prompt {
                    requests.push(ConceptRequest {
                        request_id: Uuid::now_v7().to_string(),
                        class_index,
                        class_name: class_name.clone(),
                        variant: variant.key.clone(),
                        tag: variant.tag,
                        sample,
                        prompt: prompt.clone(),
                    });
                }
            }
        }
        requests
    }

    pub async fn run(&self, run_id: &str) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        let requests = self.build_requests();
        tracing::info!(
            target: "pipeline",
            run_id = %run_id,
            dataset = %self.dataset.name,
            method = %self.method,
            classes = self.dataset.len(),
            variants = self.variants.len(),
            samples_per_prompt = self.samples_per_prompt,
            requests = requests.len(),
            "pipeline_run_started"
        );

        let outcomes = self.requestor.request_all(requests).await;
        let failed_requests = outcomes.iter().filter(|o| o.result.is_err()).count();
        let mut usage = UsageStats::default();
        for completion in outcomes.iter().filter_map(|o| o.result.as_ref().ok()) {
            if let Some(reported) = &completion.usage {
                usage.accumulate(reported);
            }
        }
        let set = self.aggregator.aggregate(&self.dataset, outcomes);

        let layout = RunLayout::allocate(
            &self.output_root,
            self.method,
            &self.dataset.name,
            &current_stamp(),
        );
        let filter = self.aggregator.filter();
        let endpoint = self.requestor.endpoint();
        let generation = GenerationInfo {
            method: self.method,
            run_id: run_id.to_string(),
            endpoint: EndpointSummary {
                kind: endpoint.kind,
                url: endpoint.url.clone(),
                model: endpoint.model.clone(),
            },
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            samples_per_prompt: self.samples_per_prompt,
            concurrency_limit: self.requestor.concurrency_limit(),
            selection: filter.selection(),
            max_per_class: filter.max_per_class(),
            min_per_class: filter.config().min_per_class,
            similarity_threshold: filter.config().similarity_threshold,
            cross_class_dedup: filter.config().cross_class_dedup,
            prompts: self.variants.clone(),
            generation_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            usage,
        };
        let metadata = RunMetadata::new(&set, layout.stamp(), generation);

        let report = write_run(layout, &set, metadata)?;
        tracing::info!(
            target: "pipeline",
            run_id = %run_id,
            dir = %report.layout.dir().display(),
            stamp = %report.layout.stamp(),
            total_unique_concepts = report.metadata.total_unique_concepts,
            flagged_classes = report.metadata.flagged_classes.len(),
            failed_requests,
            input_tokens = ?report.metadata.generation.usage.input_tokens,
            output_tokens = ?report.metadata.generation.usage.output_tokens,
            write_failures = report.failures.len(),
            complete = report.is_complete(),
            "pipeline_run_finished"
        );
        Ok(report)
    }
}
