//! # Filter Graph
//!
//! Builds the ffmpeg `-filter_complex` graph for a [`RenderPlan`].
//!
//! Input 0 is always the trimmed source. The mask and the logo, when present,
//! follow as still-image inputs in that order. Layers stack bottom to top:
//! vertical crop, health bar, logo.

use std::path::PathBuf;

use crate::video::types::{AudioTreatment, RenderPlan};

/// Label of the final composited video stream
pub const VIDEO_OUT: &str = "vout";

/// Label of the gain-adjusted audio stream
pub const AUDIO_OUT: &str = "aout";

/// How the audio reaches the output file
#[derive(Debug, Clone, PartialEq)]
pub enum AudioMapping {
    /// Filtered through the graph, mapped from `[aout]`
    Filtered,

    /// First audio stream of the source copied into the encoder as is
    Direct,

    /// No audio track in the output
    Disabled,
}

/// A filter graph together with the extra image inputs it consumes
#[derive(Debug, Clone)]
pub struct FilterGraph {
    /// Still images fed after the source, in input index order
    pub image_inputs: Vec<PathBuf>,

    /// Semicolon-separated filter chains
    pub graph: String,

    pub audio: AudioMapping,
}

impl FilterGraph {
    pub fn build(plan: &RenderPlan) -> Self {
        let mut image_inputs = Vec::new();
        let mut chains = Vec::new();
        let crop = plan.crop;
        let mut current = "base".to_string();

        if let Some(overlay) = &plan.overlay {
            image_inputs.push(overlay.mask_path.clone());
            let mask_input = image_inputs.len();
            let region = overlay.region;

            chains.push("[0:v]split=2[src][dup]".to_string());
            chains.push(format!(
                "[src]crop={}:{}:{}:{}[base]",
                crop.width, crop.height, crop.x, crop.y
            ));
            chains.push(format!(
                "[{}:v]scale={}:{},format=gray[hbmask]",
                mask_input, plan.clip.width, plan.clip.height
            ));
            chains.push(format!(
                "[dup][hbmask]alphamerge,crop={}:{}:{}:{}[hbar]",
                region.width, region.height, region.x, region.y
            ));
            chains.push(format!(
                "[{}][hbar]overlay={}:{}:format=auto[withbar]",
                current, overlay.position.0, overlay.position.1
            ));
            current = "withbar".to_string();
        } else {
            chains.push(format!(
                "[0:v]crop={}:{}:{}:{}[base]",
                crop.width, crop.height, crop.x, crop.y
            ));
        }

        if let Some(watermark) = &plan.watermark {
            image_inputs.push(watermark.image_path.clone());
            let logo_input = image_inputs.len();

            chains.push(format!("[{}:v]scale=-1:{}[logo]", logo_input, watermark.height));
            chains.push(format!(
                "[{}][logo]overlay=W-w-{m}:H-h-{m}:format=auto[withlogo]",
                current,
                m = watermark.margin
            ));
            current = "withlogo".to_string();
        }

        // Rename the top layer so the output mapping never depends on the layer set
        chains.push(format!("[{}]null[{}]", current, VIDEO_OUT));

        let audio = match plan.audio {
            AudioTreatment::Normalize { gain_db } => {
                chains.push(format!("[0:a:0]volume={:.2}dB[{}]", gain_db, AUDIO_OUT));
                AudioMapping::Filtered
            }
            AudioTreatment::Passthrough => AudioMapping::Direct,
            AudioTreatment::Silent => AudioMapping::Disabled,
        };

        Self {
            image_inputs,
            graph: chains.join(";"),
            audio,
        }
    }
}
