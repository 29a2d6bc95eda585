use std::path::Path;

use crate::error::Result;
use crate::video::types::{ClipInfo, RenderPlan};

/// The media toolkit the shorts engine delegates decoding, compositing and encoding to.
///
/// The engine only decides *what* to render; implementations decide *how*.
/// [`FfmpegBackend`](crate::video::FfmpegBackend) drives the ffmpeg command
/// line tools, tests substitute an in-memory fake.
#[allow(async_fn_in_trait)]
pub trait MediaBackend {
    /// Returns the name of this backend, used in logs
    fn name(&self) -> &str;

    /// Read frame size, duration and audio presence of a clip
    async fn probe(&self, path: &Path) -> Result<ClipInfo>;

    /// Loudest sample of the clip's audio in dBFS.
    ///
    /// Only called for clips that have an audio stream. `Ok(None)` means the
    /// measurement ran but produced no usable value.
    async fn measure_peak(&self, path: &Path) -> Result<Option<f64>>;

    /// Render the plan and write `plan.output`, replacing any existing file
    async fn render(&self, plan: &RenderPlan) -> Result<()>;

    /// Human-readable form of what `render` would execute, for dry runs
    fn describe(&self, plan: &RenderPlan) -> String;
}
