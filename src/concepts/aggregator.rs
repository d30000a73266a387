use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    concepts::{
        filter::ConceptFilter,
        parser::{ParseError, parse_concept_list},
    },
    dataset::Dataset,
    method::ConceptTag,
    requestor::{RequestOutcome, error::RequestError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    Complete,
    /// Some requests or parses failed but enough concepts survived.
    Partial,
    /// Every request for the class failed.
    Failed,
    /// Fewer concepts than the configured minimum survived filtering.
    Insufficient,
}

impl ClassStatus {
    pub fn is_flagged(&self) -> bool {
        !matches!(self, ClassStatus::Complete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassStatus::Complete => "complete",
            ClassStatus::Partial => "partial",
            ClassStatus::Failed => "failed",
            ClassStatus::Insufficient => "insufficient",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Request,
    Parse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassFailure {
    pub variant: String,
    pub sample: u32,
    pub stage: FailureStage,
    pub message: String,
}

impl ClassFailure {
    fn request(variant: &str, sample: u32, err: &RequestError) -> Self {
        Self {
            variant: variant.to_string(),
            sample,
            stage: FailureStage::Request,
            message: format!("{:?}: {}", err.kind, err),
        }
    }

    fn parse(variant: &str, sample: u32, err: &ParseError) -> Self {
        Self {
            variant: variant.to_string(),
            sample,
            stage: FailureStage::Parse,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassConcepts {
    pub index: usize,
    pub name: String,
    pub concepts: BTreeMap<ConceptTag, Vec<String>>,
    pub failures: Vec<ClassFailure>,
    pub status: ClassStatus,
}

impl ClassConcepts {
    fn empty(index: usize, name: &str) -> Self {
        Self {
            index,
            name: name.to_string(),
            concepts: ConceptTag::ALL
                .into_iter()
                .map(|tag| (tag, Vec::new()))
                .collect(),
            failures: Vec::new(),
            status: ClassStatus::Complete,
        }
    }

    pub fn tagged(&self, tag: ConceptTag) -> &[String] {
        self.concepts.get(&tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every concept of the class in tag order.
    pub fn all_concepts(&self) -> impl Iterator<Item = &String> {
        self.concepts.values().flatten()
    }

    pub fn concept_count(&self) -> usize {
        self.concepts.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptSet {
    pub dataset: String,
    pub classes: Vec<ClassConcepts>,
}

impl ConceptSet {
    /// Distinct concepts across every class, in class order then tag order.
    pub fn unique_concepts(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.classes
            .iter()
            .flat_map(ClassConcepts::all_concepts)
            .filter(|concept| seen.insert(concept.as_str()))
            .cloned()
            .collect()
    }

    pub fn total_unique(&self) -> usize {
        self.unique_concepts().len()
    }

    /// Total unique concepts divided by class count, rounded down.
    pub fn average_per_class(&self) -> usize {
        if self.classes.is_empty() {
            return 0;
        }
        self.total_unique() / self.classes.len()
    }

    pub fn flagged(&self) -> impl Iterator<Item = &ClassConcepts> {
        self.classes.iter().filter(|class| class.status.is_flagged())
    }

    /// Class name to concepts for one tag, in class order.
    pub fn mapping(&self, tag: ConceptTag) -> Vec<(&str, &[String])> {
        self.classes
            .iter()
            .map(|class| (class.name.as_str(), class.tagged(tag)))
            .collect()
    }
}

pub struct ConceptAggregator {
    filter: ConceptFilter,
}

impl ConceptAggregator {
    pub fn new(filter: ConceptFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &ConceptFilter {
        &self.filter
    }

    pub fn aggregate(&self, dataset: &Dataset, outcomes: Vec<RequestOutcome>) -> ConceptSet {
        let mut classes: Vec<ClassConcepts> = dataset
            .classes
            .iter()
            .enumerate()
            .map(|(index, name)| ClassConcepts::empty(index, name))
            .collect();
        let mut raw: Vec<BTreeMap<ConceptTag, Vec<String>>> = vec![BTreeMap::new(); classes.len()];
        let mut attempts = vec![0usize; classes.len()];
        let mut request_failures = vec![0usize; classes.len()];

        for outcome in outcomes {
            let request = &outcome.request;
            let Some(class) = classes.get_mut(request.class_index) else {
                tracing::warn!(
                    target: "aggregator",
                    class_index = request.class_index,
                    class = %request.class_name,
                    "outcome_for_unknown_class_dropped"
                );
                continue;
            };
            attempts[request.class_index] += 1;

            let completion = match outcome.result {
                Ok(completion) => completion,
                Err(err) => {
                    request_failures[request.class_index] += 1;
                    class
                        .failures
                        .push(ClassFailure::request(&request.variant, request.sample, &err));
                    continue;
                }
            };

            match parse_concept_list(&completion.text) {
                Ok(concepts) => raw[request.class_index]
                    .entry(request.tag)
                    .or_default()
                    .extend(concepts),
                Err(err) => {
                    tracing::warn!(
                        target: "aggregator",
                        class = %request.class_name,
                        variant = %request.variant,
                        error = %err,
                        "concept_response_unparseable"
                    );
                    class
                        .failures
                        .push(ClassFailure::parse(&request.variant, request.sample, &err));
                }
            }
        }

        for (class, raw_by_tag) in classes.iter_mut().zip(raw) {
            // Tags are pooled so the per-class maximum covers the whole class.
            let mut tag_of: HashMap<String, ConceptTag> = HashMap::new();
            let mut pooled = Vec::new();
            for (tag, candidates) in raw_by_tag {
                for concept in self.filter.clean_candidates(&class.name, &candidates) {
                    if !tag_of.contains_key(&concept) {
                        tag_of.insert(concept.clone(), tag);
                        pooled.push(concept);
                    }
                }
            }

            for concept in self.filter.select_class(pooled) {
                if let Some(tag) = tag_of.get(&concept) {
                    class.concepts.entry(*tag).or_default().push(concept);
                }
            }
        }

        if self.filter.config().cross_class_dedup {
            let mut claimed = HashSet::new();
            for class in &mut classes {
                for concepts in class.concepts.values_mut() {
                    concepts.retain(|concept| claimed.insert(concept.clone()));
                }
            }
        }

        let min_per_class = self.filter.config().min_per_class;
        for class in &mut classes {
            let index = class.index;
            class.status = if attempts[index] > 0 && request_failures[index] == attempts[index] {
                ClassStatus::Failed
            } else if class.concept_count() < min_per_class {
                ClassStatus::Insufficient
            } else if !class.failures.is_empty() {
                ClassStatus::Partial
            } else {
                ClassStatus::Complete
            };

            if class.status.is_flagged() {
                tracing::warn!(
                    target: "aggregator",
                    class = %class.name,
                    status = class.status.as_str(),
                    concepts = class.concept_count(),
                    failures = class.failures.len(),
                    "class_flagged"
                );
            }
        }

        ConceptSet {
            dataset: dataset.name.clone(),
            classes,
        }
    }
}
