//! Data stages of the performance pipeline: log parsing, discovery, summary
//! building, combining, statistics and folder merging.

pub mod artifact;
pub mod combiner;
pub mod merger;
pub mod parser;
pub mod report;
pub mod scanner;
pub mod summary;

pub use spm_core as core;
