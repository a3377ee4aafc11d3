//! Core types and leaf normalisers for the channel analyzer.
//!
//! Holds the data model shared by every crate in the workspace, the error
//! taxonomy, the numeric and date normalisers with their locale tables, and
//! the pipeline configuration.

pub mod dates;
pub mod error;
pub mod formatting;
pub mod models;
pub mod numeric;
pub mod settings;
pub mod time_utils;

pub use error::{AnalyzerError, DataCondition, NormalizeError, Result};
