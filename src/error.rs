use thiserror::Error;

/// Main error type for the apex-shorts library
#[derive(Error, Debug)]
pub enum ShortsError {
    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Errors raised while probing, planning or rendering a clip
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Failed to load video file: {path}")]
    LoadFailed { path: String },

    #[error("Probe failed for {path}: {reason}")]
    ProbeFailed { path: String, reason: String },

    #[error("Video encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Mask preparation failed: {reason}")]
    MaskFailed { reason: String },

    #[error("Invalid video parameters: {details}")]
    InvalidParameters { details: String },

    #[error("{tool} not found. Please install FFmpeg.")]
    ToolMissing { tool: String },
}

/// Errors tied to the job description rather than the media itself
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Source path not found: {path}")]
    SourceNotFound { path: String },

    #[error("In point {in_point:.3}s is beyond the clip duration of {duration:.3}s")]
    InPointBeyondDuration { in_point: f64, duration: f64 },

    #[error("Invalid trim range: out point {out_point:.3}s is not after in point {in_point:.3}s")]
    InvalidTrimRange { in_point: f64, out_point: f64 },

    #[error("Cannot derive an output name from: {path}")]
    InvalidSourceName { path: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using ShortsError
pub type Result<T> = std::result::Result<T, ShortsError>;

impl ShortsError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Video(VideoError::LoadFailed { path }) => {
                format!("Could not load video file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Video(VideoError::ToolMissing { tool }) => {
                format!("'{}' was not found on PATH. Install FFmpeg: brew install ffmpeg (macOS) or sudo apt install ffmpeg (Ubuntu)", tool)
            }
            Self::Job(JobError::SourceNotFound { path }) => {
                format!("Source '{}' does not exist. Pass a clip or a folder of clips with --source.", path)
            }
            Self::Job(JobError::InPointBeyondDuration { in_point, duration }) => {
                format!("The in point ({:.1}s) starts after the clip ends ({:.1}s). Lower --inpoint.", in_point, duration)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
