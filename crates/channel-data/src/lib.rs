//! Data layer for the channel analyzer.
//!
//! Reads scraped channel documents, canonicalises their records, computes the
//! batch statistics and assembles the final analysis.

pub mod aggregator;
pub mod analysis;
pub mod canonicalizer;
pub mod reader;

pub use channel_core as core;
