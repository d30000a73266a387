use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::{
    concepts::ConceptSet,
    method::ConceptTag,
    output::{
        layout::{Artifact, RunLayout},
        metadata::{RunMetadata, render_summary},
    },
};

#[derive(Debug, thiserror::Error)]
#[error("failed to write {path}: {source}")]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl WriteError {
    fn new(path: &Path, source: io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub layout: RunLayout,
    pub metadata: RunMetadata,
    pub written: Vec<PathBuf>,
    pub failures: Vec<WriteError>,
    /// Present only when every structured artifact was written.
    pub summary: Option<PathBuf>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.summary.is_some()
    }
}

/// Serializes `(class, concepts)` pairs as a JSON object in class order.
struct ClassMapping<'a>(Vec<(&'a str, &'a [String])>);

impl Serialize for ClassMapping<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(class, concepts)| (class, concepts)))
    }
}

/// Writes one run's artifacts. A failed artifact does not remove its
/// siblings; the summary is written last and only after every structured
/// artifact succeeded.
pub fn write_run(
    layout: RunLayout,
    set: &ConceptSet,
    metadata: RunMetadata,
) -> Result<RunReport, WriteError> {
    fs::create_dir_all(layout.dir()).map_err(|err| WriteError::new(layout.dir(), err))?;

    let mut written = Vec::new();
    let mut failures = Vec::new();

    for artifact in Artifact::STRUCTURED {
        let path = layout.path(artifact);
        let result = render_artifact(artifact, set, &metadata)
            .and_then(|content| write_atomic(&path, content.as_bytes()));
        match result {
            Ok(()) => {
                tracing::debug!(target: "output", path = %path.display(), "artifact_written");
                written.push(path);
            }
            Err(err) => {
                tracing::error!(
                    target: "output",
                    path = %path.display(),
                    error = %err,
                    "artifact_write_failed"
                );
                failures.push(WriteError::new(&path, err));
            }
        }
    }

    let summary = if failures.is_empty() {
        let files: Vec<String> = Artifact::ALL
            .iter()
            .map(|artifact| layout.file_name(*artifact))
            .collect();
        let path = layout.path(Artifact::Summary);
        match write_atomic(&path, render_summary(&metadata, &files).as_bytes()) {
            Ok(()) => {
                written.push(path.clone());
                Some(path)
            }
            Err(err) => {
                failures.push(WriteError::new(&path, err));
                None
            }
        }
    } else {
        tracing::warn!(
            target: "output",
            failed = failures.len(),
            "summary_skipped_after_artifact_failures"
        );
        None
    };

    Ok(RunReport {
        layout,
        metadata,
        written,
        failures,
        summary,
    })
}

fn render_artifact(
    artifact: Artifact,
    set: &ConceptSet,
    metadata: &RunMetadata,
) -> io::Result<String> {
    match artifact {
        Artifact::Filtered => {
            let mut text = set.unique_concepts().join("\n");
            if !text.is_empty() {
                text.push('\n');
            }
            Ok(text)
        }
        Artifact::Important => tag_json(set, ConceptTag::Important),
        Artifact::Around => tag_json(set, ConceptTag::Around),
        Artifact::Superclass => tag_json(set, ConceptTag::Superclass),
        Artifact::Metadata => serde_json::to_string_pretty(metadata).map_err(io::Error::other),
        Artifact::Summary => Ok(render_summary(metadata, &[])),
    }
}

fn tag_json(set: &ConceptSet, tag: ConceptTag) -> io::Result<String> {
    serde_json::to_string_pretty(&ClassMapping(set.mapping(tag))).map_err(io::Error::other)
}

/// Writes to a sibling temp file and renames it over `path`.
pub fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = dir.join(format!(".{}.tmp-{}", file_name, Uuid::now_v7()));

    if let Err(err) = fs::write(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    Ok(())
}
