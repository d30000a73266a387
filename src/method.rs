use std::fmt;

use serde::{Deserialize, Serialize};

/// Which concept mapping a prompt feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptTag {
    Important,
    Around,
    Superclass,
}

impl ConceptTag {
    pub const ALL: [ConceptTag; 3] = [
        ConceptTag::Important,
        ConceptTag::Around,
        ConceptTag::Superclass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConceptTag::Important => "important",
            ConceptTag::Around => "around",
            ConceptTag::Superclass => "superclass",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum MethodId {
    LabelFreeCbm,
    VlgCbm,
    Labo,
    Lm4cv,
    CbLlm,
}

impl MethodId {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodId::LabelFreeCbm => "label_free_cbm",
            MethodId::VlgCbm => "vlg_cbm",
            MethodId::Labo => "labo",
            MethodId::Lm4cv => "lm4cv",
            MethodId::CbLlm => "cb_llm",
        }
    }

    pub fn profile(&self) -> MethodProfile {
        match self {
            MethodId::LabelFreeCbm | MethodId::VlgCbm => MethodProfile {
                variants: label_free_variants(),
                selection: SelectionStrategy::FirstSeen,
                max_per_class: 20,
                samples_per_prompt: 1,
                instruction: None,
            },
            MethodId::Labo => MethodProfile {
                variants: vec![
                    PromptVariant::new("main", ConceptTag::Important, "Describe what the {class_name} looks like:"),
                    PromptVariant::new("appearance", ConceptTag::Important, "Describe the appearance of the {class_name}:"),
                    PromptVariant::new("color", ConceptTag::Important, "Describe the color of the {class_name}:"),
                    PromptVariant::new("pattern", ConceptTag::Important, "Describe the pattern of the {class_name}:"),
                    PromptVariant::new("shape", ConceptTag::Important, "Describe the shape of the {class_name}:"),
                ],
                selection: SelectionStrategy::VisualScore,
                max_per_class: 50,
                samples_per_prompt: 10,
                instruction: Some(LABO_INSTRUCTION.to_string()),
            },
            MethodId::Lm4cv => MethodProfile {
                variants: vec![
                    PromptVariant::new("visual", ConceptTag::Important, "What are useful visual features to distinguish {class_name} in a photo?"),
                    PromptVariant::new("attributes", ConceptTag::Important, "List visual attributes (color, texture, shape) that describe {class_name}:"),
                    PromptVariant::new("functional", ConceptTag::Important, "List functional attributes (purpose, behavior, interaction) of {class_name}:"),
                    PromptVariant::new("contextual", ConceptTag::Around, "List contextual attributes (location, time, association) related to {class_name}:"),
                ],
                selection: SelectionStrategy::Diverse,
                max_per_class: 32,
                samples_per_prompt: 1,
                instruction: None,
            },
            MethodId::CbLlm => MethodProfile {
                variants: vec![PromptVariant::new(
                    "features",
                    ConceptTag::Important,
                    "List the most important features of a text that belongs to the {class_name} category:",
                )],
                selection: SelectionStrategy::FirstSeen,
                max_per_class: 20,
                samples_per_prompt: 1,
                instruction: None,
            },
        }
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const LABO_INSTRUCTION: &str = "Provide descriptive concepts about this object. \
Focus on visual characteristics, physical properties, and observable features. \
Only give me words or phrases that describe the object, not actions or behaviors. \
Don't give sentences, just concepts.";

fn label_free_variants() -> Vec<PromptVariant> {
    vec![
        PromptVariant::new(
            "important",
            ConceptTag::Important,
            "List the most important features for recognizing something as a {class_name}:",
        ),
        PromptVariant::new(
            "around",
            ConceptTag::Around,
            "List the things most commonly seen around a {class_name}:",
        ),
        PromptVariant::new(
            "superclass",
            ConceptTag::Superclass,
            "Give superclasses for the word {class_name}:",
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptVariant {
    pub key: String,
    pub tag: ConceptTag,
    pub template: String,
}

impl PromptVariant {
    pub fn new(key: &str, tag: ConceptTag, template: &str) -> Self {
        Self {
            key: key.to_string(),
            tag,
            template: template.to_string(),
        }
    }

    pub fn render(&self, class_name: &str, instruction: Option<&str>) -> String {
        let prompt = self.template.replace("{class_name}", class_name);
        match instruction {
            Some(instruction) if !instruction.trim().is_empty() => {
                format!("{}\n{}", prompt, instruction.trim())
            }
            _ => prompt,
        }
    }
}

/// How a class's filtered candidates are cut down to the per-class maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Keep response order.
    FirstSeen,
    /// Rank short, visually grounded phrases first.
    VisualScore,
    /// Greedily pick the candidate least similar to those already chosen.
    Diverse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodProfile {
    pub variants: Vec<PromptVariant>,
    pub selection: SelectionStrategy,
    pub max_per_class: usize,
    pub samples_per_prompt: u32,
    pub instruction: Option<String>,
}
