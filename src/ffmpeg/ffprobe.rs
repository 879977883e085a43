//! Source duration via `ffprobe -show_entries format=duration`.
//!
//! ffprobe prints the format block as three lines:
//!
//! ```text
//! [FORMAT]
//! duration=12.345000
//! [/FORMAT]
//! ```
//!
//! Only the whole seconds are kept; the fraction is truncated, not rounded.

use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

use regex::Regex;

use super::discovery::{Tool, ToolLocator};
use crate::error::PreviewError;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"duration=(?P<seconds>\d+)\.(?P<fraction>\d+)").expect("valid duration regex")
});

const PROBE_LINE_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationParseError {
    #[error("expected 3 lines of ffprobe output, got {0}")]
    LineCount(usize),

    #[error("no duration=<seconds>.<fraction> in [{0}]")]
    NoDuration(String),

    #[error("duration seconds out of range in [{0}]")]
    OutOfRange(String),
}

/// Whole seconds from a single `duration=<int>.<frac>` line.
pub fn match_seconds(line: &str) -> Result<u64, DurationParseError> {
    let caps = DURATION_RE
        .captures(line)
        .ok_or_else(|| DurationParseError::NoDuration(line.to_string()))?;
    caps["seconds"]
        .parse::<u64>()
        .map_err(|_| DurationParseError::OutOfRange(line.to_string()))
}

/// Whole seconds from the complete ffprobe stdout.
pub fn parse_probe_output(stdout: &str) -> Result<u64, DurationParseError> {
    let lines: Vec<&str> = stdout.lines().collect();
    if lines.len() != PROBE_LINE_COUNT {
        return Err(DurationParseError::LineCount(lines.len()));
    }
    match_seconds(lines[1])
}

/// Probe `source` and return its duration in whole seconds.
pub fn probe_duration(locator: &impl ToolLocator, source: &Path) -> Result<u64, PreviewError> {
    let ffprobe = locator.locate(Tool::Ffprobe)?;

    log::debug!(
        target: "scrub_preview::ffmpeg::ffprobe",
        "probe_duration: ffprobe={}, source={}",
        ffprobe.display(),
        source.display()
    );

    let mut cmd = Command::new(&ffprobe);
    cmd.arg("-i")
        .arg(source)
        .args(["-show_entries", "format=duration", "-v", "quiet"]);
    #[cfg(windows)]
    cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW

    let output = cmd.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PreviewError::ToolNotFound {
                tool: Tool::Ffprobe,
            }
        } else {
            PreviewError::ProbeFailed {
                path: source.to_path_buf(),
                code: -1,
                stderr: e.to_string(),
            }
        }
    })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        log::warn!(
            target: "scrub_preview::ffmpeg::ffprobe",
            "ffprobe exited with code {} for {}",
            code,
            source.display()
        );
        return Err(PreviewError::ProbeFailed {
            path: source.to_path_buf(),
            code,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let secs = parse_probe_output(&stdout).map_err(|reason| PreviewError::DurationUndeterminable {
        path: source.to_path_buf(),
        reason,
    })?;
    log::debug!(
        target: "scrub_preview::ffmpeg::ffprobe",
        "{} is {}s long",
        source.display(),
        secs
    );
    Ok(secs)
}
