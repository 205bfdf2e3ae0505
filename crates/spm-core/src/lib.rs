//! Core types for the service performance-metric pipeline.
//!
//! Holds the data model, the pure statistics and validation functions, the
//! pipeline configuration and the error type shared by every other crate.

pub mod config;
pub mod error;
pub mod models;
pub mod settings;
pub mod stats;
pub mod validation;

pub use error::{Result, SpmError};
