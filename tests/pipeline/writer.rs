use std::fs;

use cbm_concepts::{
    concepts::{ConceptAggregator, filter::{ConceptFilter, FilterConfig}},
    dataset::Dataset,
    method::{ConceptTag, MethodId, SelectionStrategy},
    output::{Artifact, RunLayout, RunMetadata, write_run},
};

use crate::support::{answered, generation_info, request, temp_root};

fn concept_set() -> cbm_concepts::concepts::ConceptSet {
    let dataset = Dataset::new("toy", vec!["cat".to_string(), "dog".to_string()])
        .expect("dataset should build");
    let aggregator = ConceptAggregator::new(ConceptFilter::new(
        FilterConfig::default(),
        &dataset.classes,
        SelectionStrategy::FirstSeen,
        20,
    ));
    aggregator.aggregate(
        &dataset,
        vec![
            answered(request(0, "cat", ConceptTag::Important), "- whiskers"),
            answered(request(1, "dog", ConceptTag::Superclass), "- pet"),
        ],
    )
}

#[test]
fn given_one_artifact_path_blocked_when_writing_then_siblings_survive_and_summary_is_skipped() {
    let root = temp_root();
    let layout = RunLayout::new(&root, MethodId::LabelFreeCbm, "toy", "20261018_120000");
    fs::create_dir_all(layout.path(Artifact::Around)).expect("blocking dir should be created");

    let set = concept_set();
    let metadata = RunMetadata::new(&set, layout.stamp(), generation_info());
    let report = write_run(layout, &set, metadata).expect("run dir exists, so write_run returns");

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, report.layout.path(Artifact::Around));
    assert!(report.summary.is_none());
    assert!(!report.layout.path(Artifact::Summary).exists());
    for artifact in [
        Artifact::Filtered,
        Artifact::Important,
        Artifact::Superclass,
        Artifact::Metadata,
    ] {
        assert!(
            report.layout.path(artifact).is_file(),
            "{} should still be written",
            report.layout.file_name(artifact)
        );
    }
    assert_eq!(report.written.len(), 4);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn given_clean_directory_when_writing_then_summary_lists_every_file() {
    let root = temp_root();
    let layout = RunLayout::new(&root, MethodId::Lm4cv, "toy", "20261018_130000");
    let set = concept_set();
    let metadata = RunMetadata::new(&set, layout.stamp(), generation_info());

    let report = write_run(layout, &set, metadata).expect("write should succeed");
    assert!(report.failures.is_empty());
    let summary_path = report.summary.clone().expect("summary should be written");
    assert_eq!(summary_path, report.layout.path(Artifact::Summary));

    let summary = fs::read_to_string(&summary_path).expect("summary should be readable");
    for artifact in Artifact::ALL {
        assert!(summary.contains(&format!("  - {}", report.layout.file_name(artifact))));
    }
    let filtered = fs::read_to_string(report.layout.path(Artifact::Filtered))
        .expect("filtered list should be readable");
    assert_eq!(filtered, "whiskers\npet\n");

    let leftovers: Vec<_> = fs::read_dir(report.layout.dir())
        .expect("run dir should be listable")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with('.'))
        .collect();
    assert!(leftovers.is_empty(), "temp files must not remain");

    let _ = fs::remove_dir_all(&root);
}
