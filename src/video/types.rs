use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::EncodeConfig;
use crate::error::{JobError, Result};

/// Probed properties of a source clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipInfo {
    /// Duration in seconds
    pub duration: f64,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Frame rate (fps)
    pub fps: f64,

    /// Video codec reported by the container
    pub codec: String,

    /// Whether the clip carries at least one audio stream
    pub has_audio: bool,
}

impl ClipInfo {
    /// Frame size as (width, height)
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Inclusive-exclusive time range cut out of the source, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

impl TrimRange {
    /// Resolve configured in/out points against a clip's duration.
    ///
    /// An out point of 0, or one past the end, means "until the end". The
    /// resulting range must start inside the clip and have a positive length.
    pub fn resolve(in_point: f64, out_point: f64, duration: f64) -> Result<Self> {
        let end = if out_point == 0.0 || out_point > duration {
            duration
        } else {
            out_point
        };

        if in_point >= duration {
            return Err(JobError::InPointBeyondDuration { in_point, duration }.into());
        }

        if end <= in_point {
            return Err(JobError::InvalidTrimRange { in_point, out_point: end }.into());
        }

        Ok(Self { start: in_point, end })
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// What happens to the source audio during export
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioTreatment {
    /// Apply gain so the loudest sample lands on 0 dBFS
    Normalize { gain_db: f64 },

    /// Keep the audio untouched; its peak could not be measured
    Passthrough,

    /// The source has no audio stream, so the export has none either
    Silent,
}

impl AudioTreatment {
    pub fn has_audio(&self) -> bool {
        !matches!(self, Self::Silent)
    }
}

/// The health-bar layer: a masked region of the full frame moved into the vertical crop
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer {
    /// Grayscale alpha mask, scaled to the source frame before use
    pub mask_path: PathBuf,

    /// Region of the source frame kept after masking
    pub region: Rect,

    /// Top-left corner of the region inside the vertical frame
    pub position: (u32, u32),
}

/// The logo layer pinned to the bottom-right corner
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkLayer {
    pub image_path: PathBuf,

    /// Rendered height in pixels; width follows the image aspect ratio
    pub height: u32,

    /// Distance from the right and bottom edges
    pub margin: u32,
}

/// Everything the backend needs to render one short
#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub source: PathBuf,
    pub output: PathBuf,
    pub clip: ClipInfo,
    pub trim: TrimRange,
    pub crop: Rect,
    pub overlay: Option<OverlayLayer>,
    pub watermark: Option<WatermarkLayer>,
    pub audio: AudioTreatment,
    pub encode: EncodeConfig,
}

impl RenderPlan {
    /// Number of visual layers composited, base crop included
    pub fn layer_count(&self) -> usize {
        1 + usize::from(self.overlay.is_some()) + usize::from(self.watermark.is_some())
    }
}

/// Represents an encoded video output
#[derive(Debug, Clone)]
pub struct EncodedVideo {
    pub path: PathBuf,
    pub duration: f64,
    pub resolution: (u32, u32),
    pub file_size: u64,
}
