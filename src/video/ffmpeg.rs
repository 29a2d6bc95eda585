//! FFmpeg command builder, runner and the [`MediaBackend`] built on them.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, ShortsError, VideoError};
use crate::video::backend::MediaBackend;
use crate::video::filter_graph::{AudioMapping, FilterGraph, AUDIO_OUT, VIDEO_OUT};
use crate::video::probe;
use crate::video::types::{ClipInfo, RenderPlan};

/// Whether `tool -version` runs successfully
pub fn tool_available(tool: &str) -> bool {
    StdCommand::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Fail with [`VideoError::ToolMissing`] unless the tool can be run
pub fn ensure_tool(tool: &str) -> Result<()> {
    if tool_available(tool) {
        Ok(())
    } else {
        Err(VideoError::ToolMissing { tool: tool.to_string() }.into())
    }
}

/// Error for a tool process that could not be started
pub fn spawn_error(tool: &str, error: std::io::Error) -> ShortsError {
    if error.kind() == ErrorKind::NotFound {
        VideoError::ToolMissing { tool: tool.to_string() }.into()
    } else {
        VideoError::EncodingFailed {
            reason: format!("{} execution failed: {}", tool, error),
        }
        .into()
    }
}

/// One `-i` input with the options placed in front of it
#[derive(Debug, Clone)]
struct Input {
    args: Vec<String>,
    path: PathBuf,
}

/// Builder for FFmpeg commands with any number of inputs.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<Input>,
    output: PathBuf,
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add an input preceded by its own options
    pub fn input<I, S>(mut self, path: impl AsRef<Path>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push(Input {
            args: args.into_iter().map(Into::into).collect(),
            path: path.as_ref().to_path_buf(),
        });
        self
    }

    /// Add output arguments (after the inputs).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    pub fn map(self, stream: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(stream)
    }

    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    pub fn crf(self, crf: u8) -> Self {
        self.output_arg("-crf").output_arg(crf.to_string())
    }

    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    pub fn pixel_format(self, format: impl Into<String>) -> Self {
        self.output_arg("-pix_fmt").output_arg(format)
    }

    pub fn no_audio(self) -> Self {
        self.output_arg("-an")
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-hide_banner".to_string());
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().to_string());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());

        args
    }

    /// The command as it would be typed in a shell
    pub fn command_line(&self) -> String {
        std::iter::once("ffmpeg".to_string())
            .chain(self.build_args().iter().map(|arg| shell_quote(arg)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the command to completion
    pub async fn run(&self) -> Result<()> {
        let args = self.build_args();
        debug!("Running FFmpeg: {}", self.command_line());

        let output = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| spawn_error("ffmpeg", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::EncodingFailed {
                reason: format!("FFmpeg failed: {}", stderr.trim()),
            }.into());
        }

        Ok(())
    }
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Chroma format used when the vertical frame has an odd side
pub const ODD_SIZE_PIXEL_FORMAT: &str = "yuv444p";

/// Configured pixel format, unless 4:2:0 subsampling cannot fit the frame.
///
/// `round(H * 9 / 16)` is odd for heights such as 360, 720 and 2160, and
/// libx264 refuses 4:2:0 frames with an odd side.
pub fn pixel_format_for(plan: &RenderPlan) -> String {
    let (width, height) = (plan.crop.width, plan.crop.height);
    let subsampled = plan.encode.pixel_format.starts_with("yuv420")
        || plan.encode.pixel_format.starts_with("yuv422");

    if subsampled && (width % 2 != 0 || height % 2 != 0) {
        debug!(
            "{}x{} frame cannot be encoded as {}, using {}",
            width, height, plan.encode.pixel_format, ODD_SIZE_PIXEL_FORMAT
        );
        ODD_SIZE_PIXEL_FORMAT.to_string()
    } else {
        plan.encode.pixel_format.clone()
    }
}

/// Translate a render plan into the ffmpeg invocation that executes it
pub fn build_render_command(plan: &RenderPlan) -> FfmpegCommand {
    let graph = FilterGraph::build(plan);
    let duration = format!("{:.3}", plan.trim.duration());
    let fps = format!("{}", plan.clip.fps);

    let mut cmd = FfmpegCommand::new(&plan.output).input(
        &plan.source,
        ["-ss".to_string(), format!("{:.3}", plan.trim.start), "-t".to_string(), duration.clone()],
    );

    // Stills are held for the whole trimmed duration
    for image in &graph.image_inputs {
        cmd = cmd.input(
            image,
            ["-loop", "1", "-framerate", fps.as_str(), "-t", duration.as_str()],
        );
    }

    cmd = cmd
        .filter_complex(graph.graph.clone())
        .map(format!("[{}]", VIDEO_OUT));

    cmd = match graph.audio {
        AudioMapping::Filtered => cmd.map(format!("[{}]", AUDIO_OUT)),
        AudioMapping::Direct => cmd.map("0:a:0"),
        AudioMapping::Disabled => cmd,
    };

    let encode = &plan.encode;
    cmd = cmd
        .video_codec(encode.video_codec.clone())
        .preset(encode.preset.clone())
        .crf(encode.crf())
        .pixel_format(pixel_format_for(plan));

    cmd = if graph.audio == AudioMapping::Disabled {
        cmd.no_audio()
    } else {
        cmd.audio_codec(encode.audio_codec.clone())
    };

    cmd.output_arg("-movflags").output_arg("+faststart")
}

/// [`MediaBackend`] driving the `ffmpeg` and `ffprobe` executables
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }

    /// Check both executables up front so a batch fails before its first clip
    pub fn check(&self) -> Result<()> {
        ensure_tool("ffmpeg")?;
        ensure_tool("ffprobe")?;
        info!("Found ffmpeg and ffprobe on PATH");
        Ok(())
    }
}

impl MediaBackend for FfmpegBackend {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<ClipInfo> {
        probe::probe_clip(path).await
    }

    async fn measure_peak(&self, path: &Path) -> Result<Option<f64>> {
        probe::measure_peak(path).await
    }

    async fn render(&self, plan: &RenderPlan) -> Result<()> {
        build_render_command(plan).run().await
    }

    fn describe(&self, plan: &RenderPlan) -> String {
        build_render_command(plan).command_line()
    }
}
