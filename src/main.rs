use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use apex_shorts::{config::Config, video::FfmpegBackend, ShortsEngine, ShortsError};

#[derive(Parser)]
#[command(
    name = "apex-shorts",
    version,
    about = "Automate the editing of Apex Legends highlights in 9/16 format",
    long_about = "Apex-Shorts crops every clip in a folder to a vertical 9:16 short, moves the health bar into the frame and stamps a logo watermark in the bottom-right corner."
)]
struct Cli {
    /// Clip or directory to scrape for video files [default: ./ingest]
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Location to save exported videos [default: ./exports]
    #[arg(short, long)]
    destination: Option<PathBuf>,

    /// Set in point (seconds)
    #[arg(short, long = "inpoint")]
    inpoint: Option<f64>,

    /// Set out point (seconds, 0 = full length)
    #[arg(short, long = "outpoint")]
    outpoint: Option<f64>,

    /// Overwrite existing files
    #[arg(short = 'r', long)]
    overwrite: bool,

    /// Filepath for logo/watermark file [default: ./watermark.png]
    #[arg(short, long)]
    watermark: Option<PathBuf>,

    /// Leave the health bar out of the short
    #[arg(short = 'b', long = "hidehealthbar")]
    hide_health_bar: bool,

    /// Use the health-bar layout for stretched 16:10 captures
    #[arg(long)]
    stretch: bool,

    /// Directory containing mask.png / mask_stretch.png [default: .]
    #[arg(short, long)]
    mask_dir: Option<PathBuf>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Plan every clip and print the ffmpeg command without rendering
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Layer command line values over the loaded configuration
    fn apply(&self, config: &mut Config) {
        if let Some(source) = &self.source {
            config.paths.source = source.clone();
        }
        if let Some(destination) = &self.destination {
            config.paths.destination = destination.clone();
        }
        if let Some(watermark) = &self.watermark {
            config.paths.watermark = watermark.clone();
        }
        if let Some(mask_dir) = &self.mask_dir {
            config.paths.mask_dir = mask_dir.clone();
        }
        if let Some(inpoint) = self.inpoint {
            config.trim.in_point = inpoint;
        }
        if let Some(outpoint) = self.outpoint {
            config.trim.out_point = outpoint;
        }
        if self.overwrite {
            config.job.overwrite = true;
        }
        if self.hide_health_bar {
            config.overlay.enabled = false;
        }
        if self.stretch {
            config.overlay.stretch = true;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = match e.downcast_ref::<ShortsError>() {
                Some(shorts_error) => shorts_error.user_message(),
                None => e.to_string(),
            };
            error!("{}", message);
            eprintln!("ERROR: {}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("Starting Apex-Shorts v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    let backend = FfmpegBackend::new();
    if !cli.dry_run {
        backend.check()?;
    }

    let mut engine = ShortsEngine::new(config, backend).with_dry_run(cli.dry_run);
    let summary = engine.run().await?;

    println!(
        "Converted {} of {} files ({} skipped{})",
        summary.exported.len(),
        summary.total(),
        summary.skipped.len(),
        if cli.dry_run {
            format!(", {} planned", summary.planned.len())
        } else {
            String::new()
        }
    );
    Ok(())
}
