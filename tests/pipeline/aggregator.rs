use cbm_concepts::{
    concepts::{ClassStatus, ConceptAggregator, filter::{ConceptFilter, FilterConfig}},
    dataset::Dataset,
    method::{ConceptTag, SelectionStrategy},
    requestor::error::RequestErrorKind,
};

use crate::support::{answered, failed, request};

fn aggregator(classes: &[String], config: FilterConfig) -> ConceptAggregator {
    ConceptAggregator::new(ConceptFilter::new(
        config,
        classes,
        SelectionStrategy::FirstSeen,
        20,
    ))
}

fn dataset() -> Dataset {
    Dataset::new(
        "toy",
        vec!["cat".to_string(), "dog".to_string(), "owl".to_string()],
    )
    .expect("dataset should build")
}

#[test]
fn given_parse_failure_next_to_good_answer_when_aggregating_then_class_is_partial() {
    let dataset = dataset();
    let aggregator = aggregator(&dataset.classes, FilterConfig::default());

    let set = aggregator.aggregate(
        &dataset,
        vec![
            answered(request(0, "cat", ConceptTag::Important), "- whiskers\n- fur"),
            answered(request(0, "cat", ConceptTag::Around), "   "),
            answered(request(1, "dog", ConceptTag::Important), "- tail"),
            answered(request(2, "owl", ConceptTag::Important), "- feathers"),
        ],
    );

    assert_eq!(set.classes[0].status, ClassStatus::Partial);
    assert_eq!(set.classes[0].failures.len(), 1);
    assert_eq!(set.classes[0].tagged(ConceptTag::Important), ["whiskers", "fur"]);
    assert_eq!(set.classes[1].status, ClassStatus::Complete);
    assert_eq!(set.flagged().count(), 1);
}

#[test]
fn given_min_per_class_not_met_when_aggregating_then_class_is_insufficient_but_kept() {
    let dataset = dataset();
    let config = FilterConfig {
        min_per_class: 2,
        ..FilterConfig::default()
    };
    let aggregator = aggregator(&dataset.classes, config);

    let set = aggregator.aggregate(
        &dataset,
        vec![
            answered(request(0, "cat", ConceptTag::Important), "- whiskers\n- fur"),
            answered(request(1, "dog", ConceptTag::Important), "- tail\n- the dog"),
            answered(request(2, "owl", ConceptTag::Important), "- feathers\n- beak"),
        ],
    );

    assert_eq!(set.classes.len(), 3);
    assert_eq!(set.classes[1].status, ClassStatus::Insufficient);
    assert_eq!(set.classes[1].concept_count(), 1);
    assert_eq!(set.classes[0].status, ClassStatus::Complete);
}

#[test]
fn given_all_requests_failed_when_aggregating_then_class_is_failed_with_empty_mappings() {
    let dataset = dataset();
    let aggregator = aggregator(&dataset.classes, FilterConfig::default());

    let set = aggregator.aggregate(
        &dataset,
        vec![
            failed(request(0, "cat", ConceptTag::Important), RequestErrorKind::Timeout),
            failed(request(0, "cat", ConceptTag::Around), RequestErrorKind::RateLimited),
            answered(request(1, "dog", ConceptTag::Important), "- tail"),
        ],
    );

    let cat = &set.classes[0];
    assert_eq!(cat.status, ClassStatus::Failed);
    assert_eq!(cat.failures.len(), 2);
    for tag in ConceptTag::ALL {
        assert!(cat.tagged(tag).is_empty());
    }
    let mapping = set.mapping(ConceptTag::Important);
    let names: Vec<&str> = mapping.iter().map(|(name, _)| *name).collect();
    assert_eq!(names, vec!["cat", "dog", "owl"]);
}

#[test]
fn given_concepts_shared_between_classes_when_counting_then_unique_total_counts_each_once() {
    let dataset = dataset();
    let aggregator = aggregator(&dataset.classes, FilterConfig::default());

    let set = aggregator.aggregate(
        &dataset,
        vec![
            answered(request(0, "cat", ConceptTag::Important), "- fur\n- whiskers"),
            answered(request(1, "dog", ConceptTag::Important), "- fur\n- tail"),
            answered(request(2, "owl", ConceptTag::Important), "- feathers"),
        ],
    );

    assert_eq!(set.unique_concepts(), vec!["fur", "whiskers", "tail", "feathers"]);
    assert_eq!(set.total_unique(), 4);
    assert_eq!(set.average_per_class(), 1);
    assert_eq!(set.classes[1].tagged(ConceptTag::Important), ["fur", "tail"]);
}

#[test]
fn given_every_tag_over_the_limit_when_aggregating_then_class_total_is_capped_once() {
    let dataset = dataset();
    let aggregator = aggregator(&dataset.classes, FilterConfig::default());
    let answer = |prefix: &str| {
        (1..=25)
            .map(|n| format!("- {prefix}{n}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let set = aggregator.aggregate(
        &dataset,
        vec![
            answered(request(0, "cat", ConceptTag::Important), &answer("imp")),
            answered(request(0, "cat", ConceptTag::Around), &answer("near")),
            answered(request(0, "cat", ConceptTag::Superclass), &answer("kind")),
        ],
    );

    let cat = &set.classes[0];
    assert_eq!(cat.concept_count(), 20);
    assert_eq!(cat.tagged(ConceptTag::Important).len(), 20);
    assert!(cat.tagged(ConceptTag::Around).is_empty());
    assert!(cat.tagged(ConceptTag::Superclass).is_empty());
    assert_eq!(cat.tagged(ConceptTag::Important)[19], "imp20");
    assert_eq!(set.total_unique(), 20);
}
