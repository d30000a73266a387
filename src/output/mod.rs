pub mod layout;
pub mod metadata;
pub mod writer;

pub use layout::{Artifact, RunLayout};
pub use metadata::{RunMetadata, render_summary};
pub use writer::{RunReport, WriteError, write_run};
