use std::path::{Path, PathBuf};

use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::method::{ConceptTag, MethodId};

const STAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]_[hour][minute][second]");
const OUTPUT_DIR: &str = "image_output";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Filtered,
    Important,
    Around,
    Superclass,
    Metadata,
    Summary,
}

impl Artifact {
    /// Structured artifacts; the summary is written after all of them.
    pub const STRUCTURED: [Artifact; 5] = [
        Artifact::Filtered,
        Artifact::Important,
        Artifact::Around,
        Artifact::Superclass,
        Artifact::Metadata,
    ];

    pub const ALL: [Artifact; 6] = [
        Artifact::Filtered,
        Artifact::Important,
        Artifact::Around,
        Artifact::Superclass,
        Artifact::Metadata,
        Artifact::Summary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Artifact::Filtered => "filtered",
            Artifact::Important => ConceptTag::Important.as_str(),
            Artifact::Around => ConceptTag::Around.as_str(),
            Artifact::Superclass => ConceptTag::Superclass.as_str(),
            Artifact::Metadata => "metadata",
            Artifact::Summary => "summary",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Artifact::Filtered | Artifact::Summary => "txt",
            _ => "json",
        }
    }
}

/// Local time when the offset is known, UTC otherwise.
pub fn current_stamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_stamp(now)
}

pub fn format_stamp(at: OffsetDateTime) -> String {
    at.format(STAMP_FORMAT)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// Where one run's artifacts live: `<root>/image_output/<method>/<dataset>/`,
/// each file named `<dataset>_<artifact>_<stamp>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    dir: PathBuf,
    dataset: String,
    stamp: String,
}

impl RunLayout {
    pub fn new(root: &Path, method: MethodId, dataset: &str, stamp: impl Into<String>) -> Self {
        Self {
            dir: root.join(OUTPUT_DIR).join(method.as_str()).join(dataset),
            dataset: dataset.to_string(),
            stamp: stamp.into(),
        }
    }

    /// Picks the first stamp derived from `base_stamp` for which no artifact
    /// file exists yet, so a run never overwrites an earlier one.
    pub fn allocate(root: &Path, method: MethodId, dataset: &str, base_stamp: &str) -> Self {
        let mut layout = Self::new(root, method, dataset, base_stamp);
        let mut suffix = 0u32;
        while layout.any_artifact_exists() {
            suffix += 1;
            layout.stamp = format!("{}_{}", base_stamp, suffix);
        }
        layout
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    pub fn file_name(&self, artifact: Artifact) -> String {
        format!(
            "{}_{}_{}.{}",
            self.dataset,
            artifact.name(),
            self.stamp,
            artifact.extension()
        )
    }

    pub fn path(&self, artifact: Artifact) -> PathBuf {
        self.dir.join(self.file_name(artifact))
    }

    fn any_artifact_exists(&self) -> bool {
        Artifact::ALL
            .iter()
            .any(|artifact| self.path(*artifact).exists())
    }
}
