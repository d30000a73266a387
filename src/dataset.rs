use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

const CIFAR10_CLASSES: [&str; 10] = [
    "airplane",
    "automobile",
    "bird",
    "cat",
    "deer",
    "dog",
    "frog",
    "horse",
    "ship",
    "truck",
];

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("dataset '{0}' is not built in; provide a class file")]
    UnknownDataset(String),
    #[error("failed to read class file {path}: {source}")]
    ClassFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("dataset '{0}' has no classes")]
    Empty(String),
    #[error("dataset '{dataset}' lists class '{class}' more than once")]
    DuplicateClass { dataset: String, class: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    /// Ordered; the position of a class is its class index.
    pub classes: Vec<String>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, classes: Vec<String>) -> Result<Self, DatasetError> {
        let name = name.into();
        if classes.is_empty() {
            return Err(DatasetError::Empty(name));
        }

        let mut seen = HashSet::new();
        for class in &classes {
            if !seen.insert(class.to_lowercase()) {
                return Err(DatasetError::DuplicateClass {
                    dataset: name,
                    class: class.clone(),
                });
            }
        }

        Ok(Self { name, classes })
    }

    pub fn builtin(name: &str) -> Result<Self, DatasetError> {
        match name {
            "cifar10" => Self::new(
                name,
                CIFAR10_CLASSES.iter().map(|c| c.to_string()).collect(),
            ),
            other => Err(DatasetError::UnknownDataset(other.to_string())),
        }
    }

    /// One class per line; blank lines and `#` comments are skipped.
    pub fn from_class_file(name: &str, path: &Path) -> Result<Self, DatasetError> {
        let content = fs::read_to_string(path).map_err(|source| DatasetError::ClassFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(name, parse_class_lines(&content))
    }

    /// Resolves a class file when one is given, otherwise the built-in catalog.
    pub fn resolve(name: &str, class_file: Option<&Path>) -> Result<Self, DatasetError> {
        match class_file {
            Some(path) => Self::from_class_file(name, path),
            None => Self::builtin(name),
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

fn parse_class_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
