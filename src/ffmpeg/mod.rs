mod builder;
pub mod discovery;
mod error;
pub mod ffprobe;
mod graph;
mod runner;

pub use builder::{build_filtered_args, build_whole_video_args, format_args_for_display};
pub use discovery::{FixedToolLocator, SystemToolLocator, Tool, ToolLocator};
pub use error::{FfmpegErrorPayload, parse_ffmpeg_error};
pub use ffprobe::probe_duration;
pub use graph::{FilterGraph, OUTPUT_LABEL};
pub use runner::run_ffmpeg_blocking;

use serde::Deserialize;

/// What to do when the destination already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Reject an existing destination up front and run ffmpeg with `-n`.
    #[default]
    Refuse,
    /// Skip the existence check and run ffmpeg with `-y`.
    Overwrite,
}

impl OverwritePolicy {
    pub fn ffmpeg_flag(self) -> &'static str {
        match self {
            OverwritePolicy::Refuse => "-n",
            OverwritePolicy::Overwrite => "-y",
        }
    }
}

/// Encoding settings for the preview output. Unset fields fall back to the
/// lightweight VP8/webm defaults.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreviewOptions {
    pub codec: Option<String>,
    pub qmin: Option<u32>,
    pub qmax: Option<u32>,
    pub crf: Option<u32>,
    /// Output width in pixels; height follows the aspect ratio, rounded to even.
    pub scale_width: Option<u32>,
    /// Encoder threads; 0 lets ffmpeg use every available core.
    pub threads: Option<u32>,
    pub log_level: Option<String>,
    pub overwrite: Option<OverwritePolicy>,
}

impl PreviewOptions {
    pub fn effective_codec(&self) -> &str {
        self.codec.as_deref().unwrap_or("libvpx")
    }

    pub fn effective_qmin(&self) -> u32 {
        self.qmin.unwrap_or(0)
    }

    pub fn effective_qmax(&self) -> u32 {
        self.qmax.unwrap_or(25).max(self.effective_qmin())
    }

    pub fn effective_crf(&self) -> u32 {
        self.crf.unwrap_or(23)
    }

    pub fn effective_scale_width(&self) -> u32 {
        self.scale_width.filter(|&w| w > 0).unwrap_or(320)
    }

    pub fn effective_threads(&self) -> u32 {
        self.threads.unwrap_or(0)
    }

    pub fn effective_log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or("error")
    }

    pub fn effective_overwrite(&self) -> OverwritePolicy {
        self.overwrite.unwrap_or_default()
    }

    /// Parse options from JSON (camelCase keys, all optional).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
