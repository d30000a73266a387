use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::{
    concepts::{
        ConceptSet,
        aggregator::{ClassFailure, ClassStatus},
    },
    method::{ConceptTag, MethodId, PromptVariant, SelectionStrategy},
    requestor::types::{EndpointKind, UsageStats},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSummary {
    pub kind: EndpointKind,
    pub url: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationInfo {
    pub method: MethodId,
    pub run_id: String,
    pub endpoint: EndpointSummary,
    pub temperature: f32,
    pub max_tokens: u32,
    pub samples_per_prompt: u32,
    pub concurrency_limit: usize,
    pub selection: SelectionStrategy,
    pub max_per_class: usize,
    pub min_per_class: usize,
    pub similarity_threshold: f64,
    pub cross_class_dedup: bool,
    pub prompts: Vec<PromptVariant>,
    pub generation_time_ms: u64,
    /// Token usage summed over successful responses.
    #[serde(default)]
    pub usage: UsageStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub index: usize,
    pub name: String,
    pub concept_count: usize,
    pub important: usize,
    pub around: usize,
    pub superclass: usize,
    pub status: ClassStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ClassFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub dataset: String,
    pub method: MethodId,
    pub timestamp: String,
    pub total_classes: usize,
    pub total_unique_concepts: usize,
    pub average_concepts_per_class: usize,
    pub flagged_classes: Vec<String>,
    pub classes: Vec<ClassRecord>,
    pub generation: GenerationInfo,
}

impl RunMetadata {
    pub fn new(set: &ConceptSet, stamp: &str, generation: GenerationInfo) -> Self {
        let classes = set
            .classes
            .iter()
            .map(|class| ClassRecord {
                index: class.index,
                name: class.name.clone(),
                concept_count: class.concept_count(),
                important: class.tagged(ConceptTag::Important).len(),
                around: class.tagged(ConceptTag::Around).len(),
                superclass: class.tagged(ConceptTag::Superclass).len(),
                status: class.status,
                failures: class.failures.clone(),
            })
            .collect();

        Self {
            dataset: set.dataset.clone(),
            method: generation.method,
            timestamp: stamp.to_string(),
            total_classes: set.classes.len(),
            total_unique_concepts: set.total_unique(),
            average_concepts_per_class: set.average_per_class(),
            flagged_classes: set.flagged().map(|class| class.name.clone()).collect(),
            classes,
            generation,
        }
    }
}

pub fn render_summary(metadata: &RunMetadata, artifact_files: &[String]) -> String {
    let mut out = String::new();
    let generation = &metadata.generation;

    let _ = writeln!(out, "Concept Generation Summary");
    let _ = writeln!(out, "==========================");
    let _ = writeln!(out, "Dataset: {}", metadata.dataset);
    let _ = writeln!(out, "Method: {}", metadata.method);
    let _ = writeln!(out, "Timestamp: {}", metadata.timestamp);
    let _ = writeln!(out, "Run ID: {}", generation.run_id);
    let _ = writeln!(
        out,
        "Model: {} ({:?} @ {})",
        generation.endpoint.model, generation.endpoint.kind, generation.endpoint.url
    );
    let _ = writeln!(out, "Total Classes: {}", metadata.total_classes);
    let _ = writeln!(
        out,
        "Total Unique Concepts: {}",
        metadata.total_unique_concepts
    );
    let _ = writeln!(
        out,
        "Average Concepts per Class: {}",
        metadata.average_concepts_per_class
    );
    let _ = writeln!(
        out,
        "Generation Time: {:.1}s",
        generation.generation_time_ms as f64 / 1000.0
    );
    if generation.usage.is_reported() {
        let count = |tokens: Option<u64>| tokens.map_or_else(|| "n/a".to_string(), |n| n.to_string());
        let _ = writeln!(
            out,
            "Tokens: input {}, output {}, total {}",
            count(generation.usage.input_tokens),
            count(generation.usage.output_tokens),
            count(generation.usage.total_tokens)
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Per-class Concepts:");
    for class in &metadata.classes {
        let flag = if class.status.is_flagged() {
            format!(" [{}]", class.status.as_str())
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "  {:>3}. {}: {}{}",
            class.index, class.name, class.concept_count, flag
        );
    }

    if !metadata.flagged_classes.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Flagged Classes: {}",
            metadata.flagged_classes.join(", ")
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Files:");
    for file in artifact_files {
        let _ = writeln!(out, "  - {}", file);
    }

    out
}
