//! Turn an ffmpeg exit status plus captured stderr into a short summary.
//!
//! Exit codes come from ffmpeg.c: 1 (general failure), 69 (rate exceeded),
//! 123 (hard exit), 255 (signal). -1 marks a spawn failure on our side.

use serde::Serialize;

const SUMMARY_MAX_BYTES: usize = 120;
const ELLIPSIS: &str = "…";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FfmpegErrorPayload {
    pub summary: String,
    pub detail: String,
}

pub fn parse_ffmpeg_error(stderr: &str, exit_code: Option<i32>) -> FfmpegErrorPayload {
    let summary = match exit_code {
        Some(-1) => "FFmpeg not found or failed to start.".to_string(),
        Some(1) => "FFmpeg failed.".to_string(),
        Some(69) => "Encoding rate limit exceeded.".to_string(),
        Some(123 | 255) => "Encoding was stopped.".to_string(),
        Some(code) => format!("FFmpeg failed (exit code {}).", code),
        None => last_line_truncated(stderr, SUMMARY_MAX_BYTES),
    };
    FfmpegErrorPayload {
        summary,
        detail: stderr.trim().to_string(),
    }
}

/// With `-loglevel error` the fatal message is the last line ffmpeg prints.
fn last_line_truncated(stderr: &str, max_len: usize) -> String {
    let line = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    if line.len() <= max_len {
        return line.to_string();
    }
    let mut cut = max_len.saturating_sub(ELLIPSIS.len());
    while !line.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &line[..cut], ELLIPSIS)
}
