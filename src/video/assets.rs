//! Static image assets composited over the clip: the health-bar mask and the logo.

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use image::{GrayImage, Luma};
use tracing::{debug, info, warn};

use crate::error::{Result, VideoError};
use crate::video::geometry::{watermark_height, watermark_margin, HealthBarLayout};
use crate::video::types::WatermarkLayer;

static STORE_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Resolves mask and watermark images, synthesising masks that are not on disk.
///
/// Generated files live in a per-process scratch folder removed on drop.
pub struct AssetStore {
    mask_dir: PathBuf,
    temp_dir: Option<PathBuf>,
}

impl AssetStore {
    pub fn new<P: Into<PathBuf>>(mask_dir: P) -> Self {
        Self {
            mask_dir: mask_dir.into(),
            temp_dir: None,
        }
    }

    fn ensure_temp_dir(&mut self) -> Result<PathBuf> {
        if let Some(ref temp_dir) = self.temp_dir {
            return Ok(temp_dir.clone());
        }

        let temp_dir = std::env::temp_dir().join(format!(
            "apex_shorts_{}_{}",
            std::process::id(),
            STORE_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        create_dir_all(&temp_dir)?;
        self.temp_dir = Some(temp_dir.clone());
        Ok(temp_dir)
    }

    /// Path of a grayscale alpha mask for the layout.
    ///
    /// White keeps the pixel, black hides it. A bundled mask is used as is
    /// (ffmpeg scales it to the frame); otherwise one is drawn from the layout
    /// region at the exact frame size.
    pub fn mask_for(&mut self, layout: HealthBarLayout, width: u32, height: u32) -> Result<PathBuf> {
        let bundled = self.mask_dir.join(layout.mask_file_name());
        if bundled.is_file() {
            image::image_dimensions(&bundled).map_err(|e| VideoError::MaskFailed {
                reason: format!("{} is not a readable image: {}", bundled.display(), e),
            })?;
            debug!("Using bundled mask {}", bundled.display());
            return Ok(bundled);
        }

        let temp_dir = self.ensure_temp_dir()?;
        let generated = temp_dir.join(format!("{}_{}x{}.png", layout.name(), width, height));
        if generated.is_file() {
            return Ok(generated);
        }

        info!(
            "No {} in {}, generating a {} mask for {}x{}",
            layout.mask_file_name(),
            self.mask_dir.display(),
            layout.name(),
            width,
            height
        );

        render_mask(layout, width, height)?
            .save(&generated)
            .map_err(|e| VideoError::MaskFailed {
                reason: format!("Failed to save mask: {}", e),
            })?;

        Ok(generated)
    }

    pub fn cleanup(&mut self) -> Result<()> {
        if let Some(temp_dir) = &self.temp_dir {
            if let Err(e) = std::fs::remove_dir_all(temp_dir) {
                warn!("Failed to remove temporary directory: {}", e);
            }
            self.temp_dir = None;
        }
        Ok(())
    }
}

impl Drop for AssetStore {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Draw the alpha mask for a layout at the given frame size
pub fn render_mask(layout: HealthBarLayout, width: u32, height: u32) -> Result<GrayImage> {
    let region = layout.region(width, height)?;
    Ok(GrayImage::from_fn(width, height, |x, y| {
        if region.contains(x, y) {
            Luma([255])
        } else {
            Luma([0])
        }
    }))
}

/// Watermark layer for a frame height, or `None` when the logo file is absent
pub fn watermark_for(path: &Path, frame_height: u32) -> Result<Option<WatermarkLayer>> {
    if !path.is_file() {
        debug!("No watermark at {}, exporting without logo", path.display());
        return Ok(None);
    }

    let (logo_width, logo_height) = image::image_dimensions(path).map_err(|_| VideoError::LoadFailed {
        path: path.display().to_string(),
    })?;

    if logo_width == 0 || logo_height == 0 {
        return Err(VideoError::InvalidParameters {
            details: format!("watermark {} has no pixels", path.display()),
        }.into());
    }

    Ok(Some(WatermarkLayer {
        image_path: path.to_path_buf(),
        height: watermark_height(frame_height),
        margin: watermark_margin(frame_height),
    }))
}
