use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Extensions picked up from the source folder when none are configured
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv"];

/// Main configuration for a shorts export run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where clips come from and where exports and assets live
    pub paths: PathsConfig,

    /// Source selection and overwrite behaviour
    pub job: JobConfig,

    /// In/out points applied to every clip
    pub trim: TrimConfig,

    /// Health-bar overlay settings
    pub overlay: OverlayConfig,

    /// Encoder settings for the exported MP4
    pub encode: EncodeConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.job.validate()?;
        self.trim.validate()?;
        self.encode.validate()?;
        Ok(())
    }
}

/// Filesystem locations used by a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// A single clip or a folder of clips
    pub source: PathBuf,

    /// Folder receiving `<name>_SHORTS.mp4` files, created if missing
    pub destination: PathBuf,

    /// Transparent PNG placed in the bottom-right corner when it exists
    pub watermark: PathBuf,

    /// Folder holding `mask.png` and `mask_stretch.png`
    pub mask_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("./ingest"),
            destination: PathBuf::from("./exports"),
            watermark: PathBuf::from("./watermark.png"),
            mask_dir: PathBuf::from("."),
        }
    }
}

/// Source selection and overwrite policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Re-export clips whose output already exists
    pub overwrite: bool,

    /// File extensions treated as video, without the leading dot
    pub extensions: Vec<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            overwrite: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

impl JobConfig {
    fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "job.extensions".to_string(),
                value: "[]".to_string()
            }.into());
        }

        if let Some(bad) = self.extensions.iter().find(|ext| ext.is_empty() || ext.starts_with('.')) {
            return Err(ConfigError::InvalidValue {
                key: "job.extensions".to_string(),
                value: bad.clone()
            }.into());
        }

        Ok(())
    }
}

/// Trim points in seconds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    /// Start of the exported range
    pub in_point: f64,

    /// End of the exported range; 0 means the full clip
    pub out_point: f64,
}

impl TrimConfig {
    fn validate(&self) -> Result<()> {
        if !self.in_point.is_finite() || self.in_point < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "trim.in_point".to_string(),
                value: self.in_point.to_string()
            }.into());
        }

        if !self.out_point.is_finite() || self.out_point < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "trim.out_point".to_string(),
                value: self.out_point.to_string()
            }.into());
        }

        // Against the clip duration this is checked again per file
        if self.out_point > 0.0 && self.out_point <= self.in_point {
            return Err(ConfigError::InvalidValue {
                key: "trim.range".to_string(),
                value: format!("{}-{}", self.in_point, self.out_point)
            }.into());
        }

        Ok(())
    }
}

/// Health-bar overlay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Re-display the health bar inside the vertical frame
    pub enabled: bool,

    /// Use the layout for 16:10 captures pillarboxed into 16:9
    pub stretch: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stretch: false,
        }
    }
}

/// Encoder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// ffmpeg video encoder name
    pub video_codec: String,

    /// ffmpeg audio encoder name
    pub audio_codec: String,

    /// Quality setting (0-100, higher is better)
    pub quality: u8,

    /// x264 speed preset
    pub preset: String,

    /// Output pixel format
    pub pixel_format: String,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            quality: 55,
            preset: "medium".to_string(),
            pixel_format: "yuv420p".to_string(),
        }
    }
}

impl EncodeConfig {
    /// Map the 0-100 quality scale onto x264's CRF range
    pub fn crf(&self) -> u8 {
        (51 - ((self.quality as f32 / 100.0) * 51.0) as u8).clamp(0, 51)
    }

    fn validate(&self) -> Result<()> {
        if self.quality > 100 {
            return Err(ConfigError::InvalidValue {
                key: "encode.quality".to_string(),
                value: self.quality.to_string()
            }.into());
        }

        for (key, value) in [
            ("encode.video_codec", &self.video_codec),
            ("encode.audio_codec", &self.audio_codec),
            ("encode.preset", &self.preset),
            ("encode.pixel_format", &self.pixel_format),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone()
                }.into());
            }
        }

        Ok(())
    }
}
