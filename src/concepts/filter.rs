use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::method::SelectionStrategy;

const VISUAL_INDICATORS: [&str; 7] = [
    "color", "shape", "size", "texture", "pattern", "surface", "material",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_max_words")]
    pub max_words: usize,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_blacklist")]
    pub blacklist: Vec<String>,
    #[serde(default = "default_min_per_class")]
    pub min_per_class: usize,
    /// Overrides the method's per-class maximum.
    #[serde(default)]
    pub max_per_class: Option<usize>,
    /// Overrides the method's selection strategy.
    #[serde(default)]
    pub selection: Option<SelectionStrategy>,
    #[serde(default)]
    pub cross_class_dedup: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            max_length: default_max_length(),
            max_words: default_max_words(),
            similarity_threshold: default_similarity_threshold(),
            blacklist: default_blacklist(),
            min_per_class: default_min_per_class(),
            max_per_class: None,
            selection: None,
            cross_class_dedup: false,
        }
    }
}

fn default_min_length() -> usize {
    2
}

fn default_max_length() -> usize {
    30
}

fn default_max_words() -> usize {
    5
}

fn default_similarity_threshold() -> f64 {
    0.9
}

fn default_min_per_class() -> usize {
    1
}

fn default_blacklist() -> Vec<String> {
    ["thing", "object", "item", "stuff", "something", "anything"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Per-class cleanup and selection, configured once per run.
pub struct ConceptFilter {
    config: FilterConfig,
    blacklist: HashSet<String>,
    class_names: HashSet<String>,
    selection: SelectionStrategy,
    max_per_class: usize,
}

impl ConceptFilter {
    pub fn new(
        config: FilterConfig,
        class_names: &[String],
        selection: SelectionStrategy,
        max_per_class: usize,
    ) -> Self {
        let blacklist = config
            .blacklist
            .iter()
            .map(|word| word.trim().to_lowercase())
            .collect();
        let class_names = class_names
            .iter()
            .map(|name| name.trim().to_lowercase())
            .collect();
        Self {
            selection: config.selection.unwrap_or(selection),
            max_per_class: config.max_per_class.unwrap_or(max_per_class),
            config,
            blacklist,
            class_names,
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn selection(&self) -> SelectionStrategy {
        self.selection
    }

    pub fn max_per_class(&self) -> usize {
        self.max_per_class
    }

    /// Normalizes, validates and deduplicates the candidates one class
    /// produced for one tag. No per-class limit is applied here.
    pub fn clean_candidates(&self, class_name: &str, candidates: &[String]) -> Vec<String> {
        let class_pattern = class_name_pattern(class_name);
        let mut seen = HashSet::new();
        let mut kept: Vec<String> = Vec::new();

        for candidate in candidates {
            let Some(concept) = normalize(candidate, class_pattern.as_ref()) else {
                continue;
            };
            if !seen.insert(concept.clone()) || !self.is_valid(&concept) {
                continue;
            }
            if kept
                .iter()
                .any(|existing| token_similarity(existing, &concept) >= self.config.similarity_threshold)
            {
                continue;
            }
            kept.push(concept);
        }
        kept
    }

    /// Cuts a class's pooled concepts down to the per-class maximum.
    pub fn select_class(&self, concepts: Vec<String>) -> Vec<String> {
        select(concepts, self.selection, self.max_per_class)
    }

    fn is_valid(&self, concept: &str) -> bool {
        let len = concept.chars().count();
        if len < self.config.min_length || len > self.config.max_length {
            return false;
        }
        if concept.split_whitespace().count() > self.config.max_words {
            return false;
        }
        if !concept.chars().any(|c| c.is_ascii_alphabetic()) {
            return false;
        }
        !self.blacklist.contains(concept) && !self.class_names.contains(concept)
    }
}

fn class_name_pattern(class_name: &str) -> Option<Regex> {
    let class_name = class_name.trim().to_lowercase();
    if class_name.is_empty() {
        return None;
    }
    Regex::new(&format!(r"\b{}s?\b", regex::escape(&class_name))).ok()
}

/// Lowercases, drops a leading article and removes the originating class
/// name as a whole word.
pub fn normalize(concept: &str, class_pattern: Option<&Regex>) -> Option<String> {
    let mut text = concept.trim().to_lowercase();
    if let Some(pattern) = class_pattern {
        text = pattern.replace_all(&text, " ").into_owned();
    }

    let mut words: Vec<&str> = text.split_whitespace().collect();
    while let Some(first) = words.first() {
        if matches!(*first, "a" | "an" | "the") {
            words.remove(0);
        } else {
            break;
        }
    }

    let normalized = words.join(" ");
    let normalized = normalized.trim_matches(|c: char| !c.is_alphanumeric());
    (!normalized.is_empty()).then(|| normalized.to_string())
}

/// Jaccard similarity of the word sets of two concepts.
pub fn token_similarity(a: &str, b: &str) -> f64 {
    let left: HashSet<&str> = a.split_whitespace().collect();
    let right: HashSet<&str> = b.split_whitespace().collect();
    if left.is_empty() && right.is_empty() {
        return 1.0;
    }
    let intersection = left.intersection(&right).count() as f64;
    let union = left.union(&right).count() as f64;
    intersection / union
}

pub fn select(concepts: Vec<String>, strategy: SelectionStrategy, k: usize) -> Vec<String> {
    if concepts.len() <= k {
        return match strategy {
            SelectionStrategy::VisualScore => rank_by_visual_score(concepts),
            _ => concepts,
        };
    }

    match strategy {
        SelectionStrategy::FirstSeen => concepts.into_iter().take(k).collect(),
        SelectionStrategy::VisualScore => rank_by_visual_score(concepts)
            .into_iter()
            .take(k)
            .collect(),
        SelectionStrategy::Diverse => select_diverse(concepts, k),
    }
}

pub fn visual_score(concept: &str) -> f64 {
    let words: Vec<&str> = concept.split_whitespace().collect();
    let mut score = match words.len() {
        1..=3 => 3.0,
        4..=5 => 2.0,
        _ => 1.0,
    };

    if VISUAL_INDICATORS
        .iter()
        .any(|indicator| concept.contains(indicator))
    {
        score += 1.0;
    }

    let unique_words: HashSet<&str> = words.into_iter().collect();
    score + unique_words.len() as f64 * 0.1
}

fn rank_by_visual_score(concepts: Vec<String>) -> Vec<String> {
    let mut scored: Vec<(f64, String)> = concepts
        .into_iter()
        .map(|concept| (visual_score(&concept), concept))
        .collect();
    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .total_cmp(score_a)
            .then_with(|| a.len().cmp(&b.len()))
    });
    scored.into_iter().map(|(_, concept)| concept).collect()
}

fn select_diverse(concepts: Vec<String>, k: usize) -> Vec<String> {
    if k == 0 || concepts.is_empty() {
        return Vec::new();
    }

    let mut selected = vec![0usize];
    while selected.len() < k {
        let mut best: Option<(usize, f64)> = None;
        for idx in 0..concepts.len() {
            if selected.contains(&idx) {
                continue;
            }
            let min_distance = selected
                .iter()
                .map(|&chosen| 1.0 - token_similarity(&concepts[idx], &concepts[chosen]))
                .fold(f64::INFINITY, f64::min);
            if best.is_none_or(|(_, distance)| min_distance > distance) {
                best = Some((idx, min_distance));
            }
        }
        match best {
            Some((idx, _)) => selected.push(idx),
            None => break,
        }
    }

    selected
        .into_iter()
        .map(|idx| concepts[idx].clone())
        .collect()
}
