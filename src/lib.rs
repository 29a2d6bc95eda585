//! # Apex-Shorts
//!
//! Crop Apex Legends highlight clips into vertical 9:16 shorts, with the
//! health bar moved into the frame and a logo watermark in the corner.
//!
//! Decoding, compositing and encoding are done by `ffmpeg`; this crate
//! decides which files to export, how to trim them, where every layer goes
//! and which command renders the result.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use apex_shorts::{config::Config, video::FfmpegBackend, ShortsEngine};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let mut config = Config::default();
//! config.paths.source = "ingest/".into();
//! config.trim.out_point = 15.0;
//!
//! let mut engine = ShortsEngine::new(config, FfmpegBackend::new());
//! let summary = engine.run().await?;
//! println!("{} shorts exported", summary.exported.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`video`] - Source resolution, probing, geometry, filter graphs and the ffmpeg backend
//! - [`composition`] - The per-file pipeline and run orchestration
//! - [`config`] - Configuration management
//!
//! ## Other Backends
//!
//! The engine only talks to the [`MediaBackend`](video::MediaBackend) trait,
//! so rendering can be swapped out:
//!
//! ```rust,no_run
//! use std::path::Path;
//! use apex_shorts::video::{ClipInfo, MediaBackend, RenderPlan};
//! use apex_shorts::Result;
//!
//! struct LoggingBackend;
//!
//! impl MediaBackend for LoggingBackend {
//!     fn name(&self) -> &str {
//!         "logging"
//!     }
//!
//!     async fn probe(&self, path: &Path) -> Result<ClipInfo> {
//!         apex_shorts::video::probe::probe_clip(path).await
//!     }
//!
//!     async fn measure_peak(&self, _path: &Path) -> Result<Option<f64>> {
//!         Ok(None)
//!     }
//!
//!     async fn render(&self, plan: &RenderPlan) -> Result<()> {
//!         println!("{}", self.describe(plan));
//!         Ok(())
//!     }
//!
//!     fn describe(&self, plan: &RenderPlan) -> String {
//!         format!("{} -> {}", plan.source.display(), plan.output.display())
//!     }
//! }
//! ```

pub mod composition;
pub mod config;
pub mod error;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    composition::{ProcessOutcome, RunSummary, ShortsEngine},
    config::Config,
    error::{Result, ShortsError},
    video::MediaBackend,
};
