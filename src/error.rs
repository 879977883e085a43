//! Error type for preview generation. Implements Display and Serialize for CLI output.

use std::path::PathBuf;

use crate::ffmpeg::discovery::Tool;
use crate::ffmpeg::ffprobe::DurationParseError;
use crate::ffmpeg::parse_ffmpeg_error;

/// Filesystem checks made before any external process is spawned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Precondition {
    #[error("source file does not exist [{}]", .0.display())]
    SourceMissing(PathBuf),

    #[error("destination directory does not exist [{}]", .0.display())]
    DestinationDirMissing(PathBuf),

    #[error("destination file already exists [{}]", .0.display())]
    DestinationExists(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("could not find {tool}, please make sure it's installed")]
    ToolNotFound { tool: Tool },

    #[error("could not determine clip length [{}]", path.display())]
    DurationUndeterminable {
        path: PathBuf,
        #[source]
        reason: DurationParseError,
    },

    #[error("ffprobe failed on {} (code {code}): {stderr}", path.display())]
    ProbeFailed {
        path: PathBuf,
        code: i32,
        stderr: String,
    },

    #[error("FFmpeg failed (code {code}): {stderr}")]
    EngineExecutionFailed { code: i32, stderr: String },

    #[error(transparent)]
    PreconditionFailed(#[from] Precondition),

    #[error("invalid preview request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl PreviewError {
    pub fn engine_failed(code: i32, stderr: impl Into<String>) -> Self {
        Self::EngineExecutionFailed {
            code,
            stderr: stderr.into(),
        }
    }

    /// Short stage name, used as the `stage` field of serialized errors.
    pub fn stage(&self) -> &'static str {
        match self {
            PreviewError::ToolNotFound { .. } => "discovery",
            PreviewError::DurationUndeterminable { .. } | PreviewError::ProbeFailed { .. } => {
                "probe"
            }
            PreviewError::EngineExecutionFailed { .. } => "engine",
            PreviewError::PreconditionFailed(_) => "preconditions",
            PreviewError::InvalidRequest(_) => "request",
            PreviewError::Io(_) => "io",
        }
    }
}

impl serde::Serialize for PreviewError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            PreviewError::EngineExecutionFailed { code, stderr } => {
                let payload = parse_ffmpeg_error(stderr, Some(*code));
                let json = serde_json::json!({
                    "stage": self.stage(),
                    "summary": payload.summary,
                    "detail": payload.detail,
                });
                serializer.serialize_str(&json.to_string())
            }
            _ => serializer.serialize_str(&self.to_string()),
        }
    }
}
