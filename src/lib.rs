pub mod cli;
pub mod concepts;
pub mod config;
pub mod dataset;
pub mod logging;
pub mod method;
pub mod output;
pub mod pipeline;
pub mod requestor;
