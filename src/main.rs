use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Instrument;

use cbm_concepts::{
    cli::Cli,
    config::Config,
    dataset::Dataset,
    logging::{init_tracing, run_span},
    pipeline::ConceptPipeline,
    requestor::{ConceptRequestor, credentials::EnvCredentialProvider},
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    cli.apply_overrides(&mut config);

    let logging_guard = init_tracing(&config.logging).context("failed to initialize logging")?;

    let dataset = Dataset::resolve(&config.dataset.name, config.dataset.class_file.as_deref())
        .context("failed to resolve dataset")?;
    let requestor = ConceptRequestor::connect(
        config.endpoint.clone(),
        &config.requestor,
        &EnvCredentialProvider,
    )
    .await
    .context("failed to set up concept requestor")?;

    let run_id = logging_guard.run_id();
    let span = run_span(run_id, &dataset.name, config.method);
    let pipeline = ConceptPipeline::new(&config, dataset, requestor);
    let report = pipeline
        .run(run_id)
        .instrument(span)
        .await
        .context("concept generation run failed")?;

    println!(
        "{} classes, {} unique concepts, {} per class on average",
        report.metadata.total_classes,
        report.metadata.total_unique_concepts,
        report.metadata.average_concepts_per_class
    );
    if !report.metadata.flagged_classes.is_empty() {
        println!(
            "flagged classes: {}",
            report.metadata.flagged_classes.join(", ")
        );
    }
    for path in &report.written {
        println!("wrote {}", path.display());
    }
    for failure in &report.failures {
        eprintln!("{failure}");
    }

    Ok(if report.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
