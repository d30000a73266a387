pub mod aggregator;
pub mod filter;
pub mod parser;

pub use aggregator::{ClassConcepts, ClassStatus, ConceptAggregator, ConceptSet};
pub use parser::{ParseError, parse_concept_list};
