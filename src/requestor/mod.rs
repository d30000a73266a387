pub mod adapters;
pub mod client;
pub mod credentials;
pub mod error;
pub mod gate;
pub mod types;

pub use client::{ConceptRequestor, RequestOutcome};
