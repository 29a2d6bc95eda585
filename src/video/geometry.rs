//! # Frame Geometry
//!
//! Pixel arithmetic for the vertical crop and the layers composited on top of it.
//!
//! All positions are ratios of the source frame so that captures other than the
//! 1920x1080 reference land the health bar and the logo in the same relative place.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VideoError};
use crate::video::types::Rect;

/// Capture size the overlay ratios were measured on
pub const REFERENCE_FRAME: (u32, u32) = (1920, 1080);

/// Width of the vertical slice for a frame of the given height
pub fn vertical_width(height: u32) -> u32 {
    (height as f64 * 9.0 / 16.0).round() as u32
}

/// Centred 9:16 crop keeping the full frame height
pub fn vertical_crop(width: u32, height: u32) -> Result<Rect> {
    let crop_width = vertical_width(height);

    if height == 0 || crop_width == 0 {
        return Err(VideoError::InvalidParameters {
            details: format!("cannot crop a {}x{} frame", width, height),
        }.into());
    }

    if crop_width > width {
        return Err(VideoError::InvalidParameters {
            details: format!(
                "frame {}x{} is narrower than its 9:16 slice ({}px)",
                width, height, crop_width
            ),
        }.into());
    }

    Ok(Rect::new((width - crop_width) / 2, 0, crop_width, height))
}

/// Whether the frame matches the capture size the layouts were calibrated on
pub fn is_reference_frame(width: u32, height: u32) -> bool {
    (width, height) == REFERENCE_FRAME
}

/// Where the health bar sits in the capture and where it goes in the short
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthBarLayout {
    /// Native 16:9 capture
    #[default]
    Standard,

    /// 16:10 capture pillarboxed into a 16:9 frame
    Stretch,
}

impl HealthBarLayout {
    pub fn from_stretch(stretch: bool) -> Self {
        if stretch {
            Self::Stretch
        } else {
            Self::Standard
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Stretch => "stretch",
        }
    }

    /// Mask asset looked up in the configured mask folder
    pub fn mask_file_name(&self) -> &'static str {
        match self {
            Self::Standard => "mask.png",
            Self::Stretch => "mask_stretch.png",
        }
    }

    /// (x1, y1, x2, y2) of the health bar as fractions of the frame
    fn region_ratios(&self) -> (f64, f64, f64, f64) {
        match self {
            Self::Standard => (0.028125, 0.883333, 0.228125, 0.952778),
            // 1728px of game inside 96px side bars
            Self::Stretch => (0.0753125, 0.883333, 0.2553125, 0.952778),
        }
    }

    /// Health-bar rectangle in source frame pixels
    pub fn region(&self, width: u32, height: u32) -> Result<Rect> {
        let (x1, y1, x2, y2) = self.region_ratios();
        let left = (width as f64 * x1).round() as u32;
        let top = (height as f64 * y1).round() as u32;
        let right = ((width as f64 * x2).round() as u32).min(width);
        let bottom = ((height as f64 * y2).round() as u32).min(height);

        if right <= left || bottom <= top {
            return Err(VideoError::InvalidParameters {
                details: format!("health bar region collapses on a {}x{} frame", width, height),
            }.into());
        }

        Ok(Rect::new(left, top, right - left, bottom - top))
    }

    /// Top-left corner of the health bar inside the vertical frame.
    ///
    /// The vertical frame is always `vertical_width(height)` wide, so both
    /// coordinates scale with the height alone.
    pub fn position(&self, height: u32) -> (u32, u32) {
        // 113px from the left, 152px from the top at 1080p
        let x = (height as f64 * 113.0 / 1080.0).round() as u32;
        let y = (height as f64 * 152.0 / 1080.0).round() as u32;
        (x, y)
    }
}

/// Rendered logo height for a frame of the given height
pub fn watermark_height(height: u32) -> u32 {
    (height as f64 / 10.0).round().max(1.0) as u32
}

/// Margin kept between the logo and the right/bottom edges (45px at 1080p)
pub fn watermark_margin(height: u32) -> u32 {
    (height as f64 * 0.025).round() as u32 + 18
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_width_rounds() {
        assert_eq!(vertical_width(1080), 608);
        assert_eq!(vertical_width(720), 405);
        assert_eq!(vertical_width(1440), 810);
        assert_eq!(vertical_width(2160), 1215);
    }

    #[test]
    fn test_crop_is_centred_and_full_height() {
        let crop = vertical_crop(1920, 1080).unwrap();
        assert_eq!(crop, Rect::new(656, 0, 608, 1080));

        let crop = vertical_crop(1280, 720).unwrap();
        assert_eq!(crop.width, 405);
        assert_eq!(crop.height, 720);
        assert_eq!(crop.x, (1280 - 405) / 2);
    }

    #[test]
    fn test_crop_rejects_portrait_sources() {
        assert!(vertical_crop(500, 1080).is_err());
        assert!(vertical_crop(1920, 0).is_err());
    }

    #[test]
    fn test_standard_region_at_reference() {
        let region = HealthBarLayout::Standard.region(1920, 1080).unwrap();
        assert_eq!(region, Rect::new(54, 954, 384, 75));
    }

    #[test]
    fn test_standard_position_matches_reference_offset() {
        // Full-frame offset (59, -802) applied to a region at (54, 954)
        let region = HealthBarLayout::Standard.region(1920, 1080).unwrap();
        let (x, y) = HealthBarLayout::Standard.position(1080);
        assert_eq!(x as i64 - region.x as i64, 59);
        assert_eq!(y as i64 - region.y as i64, -802);
    }

    #[test]
    fn test_region_scales_with_frame() {
        let region = HealthBarLayout::Standard.region(1280, 720).unwrap();
        assert_eq!(region, Rect::new(36, 636, 256, 50));
        assert_eq!(HealthBarLayout::Standard.position(720), (75, 101));
    }

    #[test]
    fn test_stretch_layout_moves_region_only() {
        let standard = HealthBarLayout::Standard.region(1920, 1080).unwrap();
        let stretch = HealthBarLayout::Stretch.region(1920, 1080).unwrap();
        assert!(stretch.x > standard.x);
        assert_eq!(stretch.y, standard.y);
        assert_eq!(stretch.height, standard.height);
        assert_eq!(
            HealthBarLayout::Stretch.position(1080),
            HealthBarLayout::Standard.position(1080)
        );
        assert_eq!(HealthBarLayout::from_stretch(true).mask_file_name(), "mask_stretch.png");
    }

    #[test]
    fn test_overlay_fits_inside_vertical_frame() {
        for height in [720, 1080, 1440, 2160] {
            let width = height * 16 / 9;
            let crop = vertical_crop(width, height).unwrap();
            for layout in [HealthBarLayout::Standard, HealthBarLayout::Stretch] {
                let region = layout.region(width, height).unwrap();
                let (x, y) = layout.position(height);
                assert!(x + region.width <= crop.width, "{:?} at {}p", layout, height);
                assert!(y + region.height <= crop.height);
            }
        }
    }

    #[test]
    fn test_watermark_sizing() {
        assert_eq!(watermark_height(1080), 108);
        assert_eq!(watermark_margin(1080), 45);
        assert_eq!(watermark_height(720), 72);
        assert_eq!(watermark_margin(720), 36);
    }

    #[test]
    fn test_reference_frame_detection() {
        assert!(is_reference_frame(1920, 1080));
        assert!(!is_reference_frame(2560, 1440));
    }
}
