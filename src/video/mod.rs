//! # Video Processing Module
//!
//! Source resolution, clip probing, crop/overlay geometry and the ffmpeg backend
//! that renders the final short.

pub mod assets;
pub mod backend;
pub mod ffmpeg;
pub mod filter_graph;
pub mod geometry;
pub mod probe;
pub mod resolver;
pub mod types;

pub use assets::AssetStore;
pub use backend::MediaBackend;
pub use ffmpeg::{FfmpegBackend, FfmpegCommand};
pub use geometry::HealthBarLayout;
pub use types::{
    AudioTreatment, ClipInfo, EncodedVideo, OverlayLayer, Rect, RenderPlan, TrimRange,
    WatermarkLayer,
};
