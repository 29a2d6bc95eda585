use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::Result,
    video::{
        assets::{watermark_for, AssetStore},
        geometry::{is_reference_frame, vertical_crop, HealthBarLayout, REFERENCE_FRAME},
        resolver::{ensure_destination, output_path_for, resolve_sources},
        AudioTreatment, ClipInfo, EncodedVideo, MediaBackend, OverlayLayer, RenderPlan, TrimRange,
    },
};

/// Turns every clip under the configured source into a vertical short.
///
/// The engine follows a linear pipeline per file:
/// 1. Skip check - existing exports are left alone unless overwriting
/// 2. Probe - frame size, duration, audio presence
/// 3. Audio - decide between peak normalisation, passthrough or no audio
/// 4. Planning - trim, crop, health-bar overlay, watermark
/// 5. Render - hand the plan to the media backend
///
/// Files are processed one after the other; the first error aborts the run.
pub struct ShortsEngine<B: MediaBackend> {
    config: Config,
    backend: B,
    assets: AssetStore,
    dry_run: bool,
}

/// What happened to a single source clip
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    /// The short was rendered and written
    Exported(EncodedVideo),

    /// Dry run: the plan was built and logged, nothing was rendered
    Planned(RenderPlan),

    /// The export already existed and overwriting is off
    Skipped(PathBuf),
}

/// Totals for one run over the source
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub exported: Vec<EncodedVideo>,
    pub planned: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

impl RunSummary {
    /// Number of source clips visited
    pub fn total(&self) -> usize {
        self.exported.len() + self.planned.len() + self.skipped.len()
    }

    fn record(&mut self, outcome: ProcessOutcome) {
        match outcome {
            ProcessOutcome::Exported(video) => self.exported.push(video),
            ProcessOutcome::Planned(plan) => self.planned.push(plan.output),
            ProcessOutcome::Skipped(path) => self.skipped.push(path),
        }
    }
}

impl<B: MediaBackend> ShortsEngine<B> {
    /// Create a new engine with the given configuration and backend
    pub fn new(config: Config, backend: B) -> Self {
        let assets = AssetStore::new(config.paths.mask_dir.clone());
        Self {
            config,
            backend,
            assets,
            dry_run: false,
        }
    }

    /// Plan every clip and log the render command instead of executing it
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process every supported clip under the configured source
    pub async fn run(&mut self) -> Result<RunSummary> {
        let paths = &self.config.paths;
        info!("Source: {:?}", paths.source);
        info!("Destination: {:?}", paths.destination);
        info!("Backend: {}", self.backend.name());

        ensure_destination(&paths.destination)?;
        let sources = resolve_sources(&paths.source, &self.config.job.extensions)?;

        info!("Converting {} files", sources.len());

        let mut summary = RunSummary::default();
        for (index, source) in sources.iter().enumerate() {
            info!("[{}/{}] {}", index + 1, sources.len(), source.display());
            let outcome = self.process(source).await?;
            summary.record(outcome);
        }

        info!(
            "Run complete: {} exported, {} planned, {} skipped",
            summary.exported.len(),
            summary.planned.len(),
            summary.skipped.len()
        );

        Ok(summary)
    }

    /// Export one clip to `<destination>/<stem>_SHORTS.mp4`
    pub async fn process(&mut self, source: &Path) -> Result<ProcessOutcome> {
        let output = output_path_for(source, &self.config.paths.destination)?;

        if output.exists() && !self.config.job.overwrite {
            info!("Skipping {}: {} already exists", source.display(), output.display());
            return Ok(ProcessOutcome::Skipped(output));
        }

        let clip = self.backend.probe(source).await?;
        debug!(
            "Clip metadata: {:.1}s, {:.1} fps, {}x{}",
            clip.duration, clip.fps, clip.width, clip.height
        );

        let audio = self.resolve_audio(source, &clip).await?;
        let plan = self.plan(source, output, clip, audio)?;

        if self.dry_run {
            info!("Would run: {}", self.backend.describe(&plan));
            return Ok(ProcessOutcome::Planned(plan));
        }

        self.backend.render(&plan).await?;

        let file_size = std::fs::metadata(&plan.output)?.len();
        let video = EncodedVideo {
            path: plan.output.clone(),
            duration: plan.trim.duration(),
            resolution: (plan.crop.width, plan.crop.height),
            file_size,
        };

        info!(
            "Exported {} ({}x{}, {:.1}s, {:.1} MB)",
            video.path.display(),
            video.resolution.0,
            video.resolution.1,
            video.duration,
            video.file_size as f64 / 1024.0 / 1024.0
        );

        Ok(ProcessOutcome::Exported(video))
    }

    /// Peak-normalise when possible; missing audio or a failed measurement is not an error
    async fn resolve_audio(&self, source: &Path, clip: &ClipInfo) -> Result<AudioTreatment> {
        if !clip.has_audio {
            warn!("{} has no audio to normalize, exporting without sound", source.display());
            return Ok(AudioTreatment::Silent);
        }

        match self.backend.measure_peak(source).await {
            Ok(Some(peak_db)) => {
                debug!("Peak level {:.2} dB, applying {:.2} dB gain", peak_db, -peak_db);
                Ok(AudioTreatment::Normalize { gain_db: -peak_db })
            }
            Ok(None) => {
                warn!("Could not measure the audio peak of {}, keeping original levels", source.display());
                Ok(AudioTreatment::Passthrough)
            }
            Err(e) => {
                warn!("Audio normalization skipped for {}: {}", source.display(), e);
                Ok(AudioTreatment::Passthrough)
            }
        }
    }

    fn plan(
        &mut self,
        source: &Path,
        output: PathBuf,
        clip: ClipInfo,
        audio: AudioTreatment,
    ) -> Result<RenderPlan> {
        let (width, height) = clip.size();
        let trim = TrimRange::resolve(
            self.config.trim.in_point,
            self.config.trim.out_point,
            clip.duration,
        )?;

        if !is_reference_frame(width, height) {
            warn!(
                "Your video dimensions are {}x{}. For best results, use clips that are {}x{}.",
                width, height, REFERENCE_FRAME.0, REFERENCE_FRAME.1
            );
        }

        let crop = vertical_crop(width, height)?;

        let overlay = if self.config.overlay.enabled {
            let layout = HealthBarLayout::from_stretch(self.config.overlay.stretch);
            let mask_path = self.assets.mask_for(layout, width, height)?;
            Some(OverlayLayer {
                mask_path,
                region: layout.region(width, height)?,
                position: layout.position(height),
            })
        } else {
            None
        };

        let watermark = watermark_for(&self.config.paths.watermark, height)?;

        let plan = RenderPlan {
            source: source.to_path_buf(),
            output,
            clip,
            trim,
            crop,
            overlay,
            watermark,
            audio,
            encode: self.config.encode.clone(),
        };

        debug!(
            "Planned {:.2}s-{:.2}s, crop {}x{}+{}, {} layer(s)",
            plan.trim.start,
            plan.trim.end,
            plan.crop.width,
            plan.crop.height,
            plan.crop.x,
            plan.layer_count()
        );

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{JobError, ShortsError};
    use image::{Rgba, RgbaImage};
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    /// Backend that records plans and writes a marker file instead of encoding
    struct FakeBackend {
        clip: ClipInfo,
        peak: Option<f64>,
        peak_fails: bool,
        rendered: Mutex<Vec<RenderPlan>>,
    }

    impl FakeBackend {
        fn new(clip: ClipInfo) -> Self {
            Self {
                clip,
                peak: Some(-6.0),
                peak_fails: false,
                rendered: Mutex::new(Vec::new()),
            }
        }

        fn plans(&self) -> Vec<RenderPlan> {
            self.rendered.lock().unwrap().clone()
        }
    }

    impl MediaBackend for FakeBackend {
        fn name(&self) -> &str {
            "fake"
        }

        async fn probe(&self, _path: &Path) -> Result<ClipInfo> {
            Ok(self.clip.clone())
        }

        async fn measure_peak(&self, path: &Path) -> Result<Option<f64>> {
            if self.peak_fails {
                return Err(crate::error::VideoError::ProbeFailed {
                    path: path.display().to_string(),
                    reason: "peak measurement failed".to_string(),
                }
                .into());
            }
            Ok(self.peak)
        }

        async fn render(&self, plan: &RenderPlan) -> Result<()> {
            std::fs::write(&plan.output, b"rendered")?;
            self.rendered.lock().unwrap().push(plan.clone());
            Ok(())
        }

        fn describe(&self, plan: &RenderPlan) -> String {
            format!("render {}", plan.output.display())
        }
    }

    fn clip(has_audio: bool) -> ClipInfo {
        ClipInfo {
            duration: 20.0,
            width: 640,
            height: 360,
            fps: 30.0,
            codec: "h264".to_string(),
            has_audio,
        }
    }

    /// Workspace with an ingest folder holding the given files
    fn workspace(files: &[&str]) -> (TempDir, Config) {
        let dir = tempdir().unwrap();
        let ingest = dir.path().join("ingest");
        std::fs::create_dir(&ingest).unwrap();
        for name in files {
            std::fs::write(ingest.join(name), b"source").unwrap();
        }

        let mut config = Config::default();
        config.paths.source = ingest;
        config.paths.destination = dir.path().join("exports");
        config.paths.watermark = dir.path().join("watermark.png");
        config.paths.mask_dir = dir.path().to_path_buf();
        (dir, config)
    }

    fn engine(config: Config, clip: ClipInfo) -> ShortsEngine<FakeBackend> {
        ShortsEngine::new(config, FakeBackend::new(clip))
    }

    #[tokio::test]
    async fn test_one_export_per_matching_clip() {
        let (_dir, config) = workspace(&["a.mp4", "b.mov", "c.mkv", "readme.txt", "cover.png"]);
        let destination = config.paths.destination.clone();
        let mut engine = engine(config, clip(true));

        let summary = engine.run().await.unwrap();

        assert_eq!(summary.exported.len(), 3);
        assert_eq!(summary.total(), 3);
        let mut outputs: Vec<String> = std::fs::read_dir(&destination)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        outputs.sort();
        assert_eq!(outputs, vec!["a_SHORTS.mp4", "b_SHORTS.mp4", "c_SHORTS.mp4"]);
    }

    #[tokio::test]
    async fn test_existing_export_is_skipped() {
        let (_dir, config) = workspace(&["a.mp4"]);
        let existing = config.paths.destination.join("a_SHORTS.mp4");
        std::fs::create_dir_all(&config.paths.destination).unwrap();
        std::fs::write(&existing, b"previous export").unwrap();

        let mut engine = engine(config, clip(true));
        let summary = engine.run().await.unwrap();

        assert_eq!(summary.skipped, vec![existing.clone()]);
        assert!(summary.exported.is_empty());
        assert!(engine.backend.plans().is_empty());
        assert_eq!(std::fs::read(&existing).unwrap(), b"previous export");
    }

    #[tokio::test]
    async fn test_overwrite_replaces_existing_export() {
        let (_dir, mut config) = workspace(&["a.mp4"]);
        config.job.overwrite = true;
        let existing = config.paths.destination.join("a_SHORTS.mp4");
        std::fs::create_dir_all(&config.paths.destination).unwrap();
        std::fs::write(&existing, b"previous export").unwrap();

        let mut engine = engine(config, clip(true));
        let summary = engine.run().await.unwrap();

        assert_eq!(summary.exported.len(), 1);
        assert_eq!(std::fs::read(&existing).unwrap(), b"rendered");
    }

    #[tokio::test]
    async fn test_plan_geometry_and_layers() {
        let (dir, config) = workspace(&["a.mp4"]);
        RgbaImage::from_pixel(64, 32, Rgba([0, 0, 0, 255]))
            .save(dir.path().join("watermark.png"))
            .unwrap();

        let mut engine = engine(config, clip(true));
        engine.run().await.unwrap();

        let plans = engine.backend.plans();
        let plan = &plans[0];
        assert_eq!(plan.crop.width, 203);
        assert_eq!(plan.crop.height, 360);
        assert_eq!(plan.layer_count(), 3);

        let overlay = plan.overlay.as_ref().unwrap();
        assert_eq!(overlay.position, (38, 51));
        assert!(overlay.mask_path.is_file());

        let watermark = plan.watermark.as_ref().unwrap();
        assert_eq!(watermark.height, 36);
        assert_eq!(watermark.margin, 27);
        assert_eq!(plan.audio, AudioTreatment::Normalize { gain_db: 6.0 });
    }

    #[tokio::test]
    async fn test_missing_watermark_drops_layer_only() {
        let (_dir, config) = workspace(&["a.mp4"]);
        let mut engine = engine(config, clip(true));

        let summary = engine.run().await.unwrap();

        assert_eq!(summary.exported.len(), 1);
        let plan = &engine.backend.plans()[0];
        assert!(plan.watermark.is_none());
        assert_eq!(plan.layer_count(), 2);
    }

    #[tokio::test]
    async fn test_hidden_health_bar_and_stretch_layout() {
        let (_dir, mut config) = workspace(&["a.mp4"]);
        config.overlay.enabled = false;
        let mut engine = engine(config.clone(), clip(true));
        engine.run().await.unwrap();
        assert!(engine.backend.plans()[0].overlay.is_none());

        config.overlay.enabled = true;
        config.overlay.stretch = true;
        config.job.overwrite = true;
        let mut engine = ShortsEngine::new(config, FakeBackend::new(clip(true)));
        engine.run().await.unwrap();
        let overlay = engine.backend.plans()[0].overlay.clone().unwrap();
        assert_eq!(overlay.region, HealthBarLayout::Stretch.region(640, 360).unwrap());
    }

    #[tokio::test]
    async fn test_clip_without_audio_still_exports() {
        let (_dir, config) = workspace(&["silent.mkv"]);
        let mut engine = engine(config, clip(false));

        let summary = engine.run().await.unwrap();

        assert_eq!(summary.exported.len(), 1);
        assert_eq!(engine.backend.plans()[0].audio, AudioTreatment::Silent);
    }

    #[tokio::test]
    async fn test_unmeasurable_peak_keeps_audio() {
        let (_dir, config) = workspace(&["a.mp4"]);
        let mut backend = FakeBackend::new(clip(true));
        backend.peak = None;
        let mut engine = ShortsEngine::new(config, backend);

        engine.run().await.unwrap();
        assert_eq!(engine.backend.plans()[0].audio, AudioTreatment::Passthrough);
    }

    #[tokio::test]
    async fn test_failed_peak_measurement_keeps_audio_and_continues() {
        let (_dir, config) = workspace(&["a.mp4", "b.mp4"]);
        let mut backend = FakeBackend::new(clip(true));
        backend.peak_fails = true;
        let mut engine = ShortsEngine::new(config, backend);

        let summary = engine.run().await.unwrap();

        assert_eq!(summary.exported.len(), 2);
        assert!(engine
            .backend
            .plans()
            .iter()
            .all(|plan| plan.audio == AudioTreatment::Passthrough));
    }

    #[tokio::test]
    async fn test_trim_points_resolved_per_clip() {
        let (_dir, mut config) = workspace(&["a.mp4"]);
        config.trim.in_point = 4.0;
        config.trim.out_point = 600.0;
        let mut engine = engine(config, clip(true));

        engine.run().await.unwrap();

        let plan = &engine.backend.plans()[0];
        assert_eq!(plan.trim, TrimRange { start: 4.0, end: 20.0 });
        assert_eq!(engine.config().trim.out_point, 600.0);
    }

    #[tokio::test]
    async fn test_in_point_beyond_clip_aborts_without_output() {
        let (_dir, mut config) = workspace(&["a.mp4"]);
        config.trim.in_point = 25.0;
        let destination = config.paths.destination.clone();
        let mut engine = engine(config, clip(true));

        let result = engine.run().await;

        assert!(matches!(
            result,
            Err(ShortsError::Job(JobError::InPointBeyondDuration { .. }))
        ));
        assert!(!destination.join("a_SHORTS.mp4").exists());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let (_dir, config) = workspace(&["a.mp4", "b.mp4"]);
        let destination = config.paths.destination.clone();
        let mut engine = engine(config, clip(true)).with_dry_run(true);

        let summary = engine.run().await.unwrap();

        assert_eq!(summary.planned.len(), 2);
        assert!(summary.exported.is_empty());
        assert!(engine.backend.plans().is_empty());
        assert!(destination.is_dir());
        assert_eq!(std::fs::read_dir(&destination).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_source_is_reported() {
        let (dir, mut config) = workspace(&[]);
        config.paths.source = dir.path().join("nowhere");
        let mut engine = engine(config, clip(true));

        let result = engine.run().await;
        assert!(matches!(result, Err(ShortsError::Job(JobError::SourceNotFound { .. }))));
    }

    #[tokio::test]
    async fn test_single_file_source() {
        let (_dir, mut config) = workspace(&["a.mp4", "b.mp4"]);
        config.paths.source = config.paths.source.join("b.mp4");
        let mut engine = engine(config, clip(true));

        let summary = engine.run().await.unwrap();

        assert_eq!(summary.exported.len(), 1);
        assert!(summary.exported[0].path.ends_with("b_SHORTS.mp4"));
        assert_eq!(summary.exported[0].resolution, (203, 360));
        assert_eq!(summary.exported[0].file_size, 8);
    }
}
