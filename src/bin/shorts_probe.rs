// Diagnostic binary: checks the ffmpeg toolchain and shows how one clip would be cut

use std::path::PathBuf;

use apex_shorts::video::{
    ffmpeg::tool_available,
    geometry::{vertical_crop, watermark_height, watermark_margin, HealthBarLayout},
    probe::{measure_peak, probe_clip},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("🎬 Apex-Shorts clip probe");

    println!("\n1. Checking toolchain...");
    let mut missing = false;
    for tool in ["ffmpeg", "ffprobe"] {
        if tool_available(tool) {
            println!("   ✅ {} found", tool);
        } else {
            missing = true;
            println!("   ❌ {} not found in PATH", tool);
        }
    }
    if missing {
        println!("   Install FFmpeg: brew install ffmpeg (macOS) or sudo apt install ffmpeg (Ubuntu)");
        return Ok(());
    }

    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        println!("\nUsage: shorts-probe <clip>");
        return Ok(());
    };

    println!("\n2. Probing {}...", path.display());
    let clip = probe_clip(&path).await?;
    println!("   Resolution: {}x{}", clip.width, clip.height);
    println!("   Duration: {:.2}s", clip.duration);
    println!("   Frame rate: {:.2} fps", clip.fps);
    println!("   Codec: {}", clip.codec);

    if clip.has_audio {
        match measure_peak(&path).await? {
            Some(peak) => println!("   Audio peak: {:.1} dB (gain {:+.1} dB)", peak, -peak),
            None => println!("   Audio peak: unknown"),
        }
    } else {
        println!("   Audio: none");
    }

    println!("\n3. Geometry...");
    let crop = vertical_crop(clip.width, clip.height)?;
    println!("   Vertical crop: {}x{} at x={}", crop.width, crop.height, crop.x);

    for layout in [HealthBarLayout::Standard, HealthBarLayout::Stretch] {
        let region = layout.region(clip.width, clip.height)?;
        let (x, y) = layout.position(clip.height);
        println!(
            "   Health bar ({}): {}x{} from ({}, {}) -> ({}, {})",
            layout.name(), region.width, region.height, region.x, region.y, x, y
        );
    }

    println!(
        "   Watermark: {}px high, {}px margin",
        watermark_height(clip.height),
        watermark_margin(clip.height)
    );

    Ok(())
}
