//! Pipeline orchestration for the performance reports.
//!
//! Drives the data stages over one or more data roots and decides, from the
//! artifacts already on disk, whether a result folder can be reused.

pub mod pipeline;
pub mod state;

pub use spm_core as core;
pub use spm_data as data;
