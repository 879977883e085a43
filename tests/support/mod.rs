#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use scrub_preview::ffmpeg::{SystemToolLocator, Tool, ToolLocator, probe_duration};

pub struct IntegrationEnv {
    pub locator: SystemToolLocator,
    pub ffmpeg: PathBuf,
    dir: tempfile::TempDir,
}

impl IntegrationEnv {
    pub fn new() -> Self {
        let locator = SystemToolLocator::new();
        let ffmpeg = locator.locate(Tool::Ffmpeg).expect("FFmpeg not found");
        let dir = tempfile::tempdir().expect("tempdir");
        Self {
            locator,
            ffmpeg,
            dir,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Writes a lavfi testsrc clip of `duration_secs`. 20 fps keeps quarter-second
    /// segment bounds on frame boundaries.
    pub fn with_test_video(&self, input_name: &str, duration_secs: f32) -> PathBuf {
        let output_path = self.path(input_name);
        let status =
            create_test_video(&self.ffmpeg, &output_path, duration_secs).expect("spawn ffmpeg");
        assert!(status.success(), "ffmpeg failed to create test video");
        output_path
    }

    pub fn probed_seconds(&self, path: &Path) -> u64 {
        probe_duration(&self.locator, path)
            .unwrap_or_else(|e| panic!("could not probe {}: {}", path.display(), e))
    }
}

pub fn create_test_video(
    ffmpeg: &Path,
    output_path: &Path,
    duration_secs: f32,
) -> std::io::Result<ExitStatus> {
    Command::new(ffmpeg)
        .args([
            "-loglevel",
            "error",
            "-y",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=duration={}:size=320x240:rate=20", duration_secs),
            "-c:v",
            "mpeg4",
            output_path.to_string_lossy().as_ref(),
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
}
