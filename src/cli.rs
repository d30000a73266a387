use std::path::PathBuf;

use clap::Parser;

use crate::{config::Config, method::MethodId};

/// Generate concept sets for concept bottleneck models.
#[derive(Debug, Parser)]
#[command(name = "cbm-concepts")]
#[command(version)]
pub struct Cli {
    /// Path to the JSONC config file
    #[arg(short, long, env = "CBM_CONCEPTS_CONFIG", default_value = "./cbm-concepts.jsonc")]
    pub config: PathBuf,

    /// Dataset name (built-in catalog or paired with --classes)
    #[arg(short, long)]
    pub dataset: Option<String>,

    /// Class file, one class per line
    #[arg(long)]
    pub classes: Option<PathBuf>,

    /// Concept generation method
    #[arg(short, long, value_enum)]
    pub method: Option<MethodId>,

    /// Maximum number of requests in flight
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: Option<u16>,

    /// Issue requests one at a time, in order
    #[arg(long)]
    pub sequential: bool,

    /// Directory under which `image_output/` is created
    #[arg(long)]
    pub output_root: Option<PathBuf>,
}

impl Cli {
    /// Flags win over config values.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(dataset) = &self.dataset {
            if *dataset != config.dataset.name {
                config.dataset.class_file = None;
            }
            config.dataset.name = dataset.clone();
        }
        if let Some(classes) = &self.classes {
            config.dataset.class_file = Some(classes.clone());
        }
        if let Some(method) = self.method {
            config.method = method;
        }
        if let Some(concurrency) = self.concurrency {
            config.requestor.concurrency_limit = usize::from(concurrency);
        }
        if self.sequential {
            config.requestor.sequential = true;
        }
        if let Some(root) = &self.output_root {
            config.output.root = root.clone();
        }
    }
}
