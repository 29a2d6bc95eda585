//! # Shorts Engine
//!
//! Walks the source, plans each clip and hands the plans to a media backend.

pub mod engine;

// Re-exports for convenience
pub use engine::{ProcessOutcome, RunSummary, ShortsEngine};
