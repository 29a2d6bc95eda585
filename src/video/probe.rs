//! Clip inspection through `ffprobe`, plus peak measurement for audio normalisation.

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, VideoError};
use crate::video::ffmpeg::spawn_error;
use crate::video::types::ClipInfo;

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Probe a clip for its frame size, duration and audio presence
pub async fn probe_clip<P: AsRef<Path>>(path: P) -> Result<ClipInfo> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(VideoError::LoadFailed {
            path: path.display().to_string(),
        }.into());
    }

    let output = Command::new("ffprobe")
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| spawn_error("ffprobe", e))?;

    if !output.status.success() {
        return Err(VideoError::ProbeFailed {
            path: path.display().to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }.into());
    }

    let info = parse_probe_output(&output.stdout, path)?;
    debug!(
        "Probed {}: {}x{} @ {:.2}fps, {:.2}s, audio: {}",
        path.display(), info.width, info.height, info.fps, info.duration, info.has_audio
    );
    Ok(info)
}

/// Turn ffprobe's JSON into a [`ClipInfo`]
pub fn parse_probe_output(json: &[u8], path: &Path) -> Result<ClipInfo> {
    let probe_failed = |reason: String| VideoError::ProbeFailed {
        path: path.display().to_string(),
        reason,
    };

    let probe: FfprobeOutput = serde_json::from_slice(json)
        .map_err(|e| probe_failed(format!("unreadable ffprobe output: {}", e)))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| probe_failed("no video stream".to_string()))?;

    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(probe_failed("video stream has no frame size".to_string()).into()),
    };

    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| probe_failed("unknown duration".to_string()))?;

    let fps = video
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(30.0);

    Ok(ClipInfo {
        duration,
        width,
        height,
        fps,
        codec: video.codec_name.clone().unwrap_or_default(),
        has_audio,
    })
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
fn parse_frame_rate(s: &str) -> Option<f64> {
    let rate = if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den <= 0.0 {
            return None;
        }
        num / den
    } else {
        s.parse().ok()?
    };

    (rate > 0.0).then_some(rate)
}

/// Loudest sample of the first audio stream in dBFS, via ffmpeg's `volumedetect`.
///
/// `None` means ffmpeg ran but reported no peak.
pub async fn measure_peak<P: AsRef<Path>>(path: P) -> Result<Option<f64>> {
    let path = path.as_ref();

    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-nostats", "-i"])
        .arg(path)
        .args(["-map", "0:a:0", "-af", "volumedetect", "-vn", "-f", "null", "-"])
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| spawn_error("ffmpeg", e))?;

    if !output.status.success() {
        return Err(VideoError::ProbeFailed {
            path: path.display().to_string(),
            reason: "peak measurement failed".to_string(),
        }.into());
    }

    Ok(parse_max_volume(&String::from_utf8_lossy(&output.stderr)))
}

/// Extract `max_volume` from volumedetect's log lines
pub fn parse_max_volume(log: &str) -> Option<f64> {
    log.lines()
        .filter_map(|line| line.split_once("max_volume:"))
        .filter_map(|(_, rest)| rest.trim().trim_end_matches("dB").trim().parse::<f64>().ok())
        .last()
}
