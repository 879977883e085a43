//! FFmpeg process spawning.
//!
//! Runs ffmpeg with an argument vector (no shell), drains stderr on a
//! background thread while the caller blocks on the exit status, and keeps
//! the tail of stderr for error reporting.

use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

use parking_lot::Mutex;

use crate::error::PreviewError;

/// Keep only the last N bytes of stderr to avoid unbounded memory growth.
const MAX_STDERR_BYTES: usize = 64 * 1024;

fn collect_stderr<R: Read + Send + 'static>(
    reader: R,
    buffer: Arc<Mutex<Vec<u8>>>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut stream_reader = BufReader::new(reader);
        let mut line_buf = Vec::with_capacity(256);
        while stream_reader.read_until(b'\n', &mut line_buf).unwrap_or(0) > 0 {
            let mut guard = buffer.lock();
            guard.extend_from_slice(&line_buf);
            if guard.len() > MAX_STDERR_BYTES {
                let excess = guard.len() - MAX_STDERR_BYTES;
                guard.drain(..excess);
            }
            drop(guard);
            line_buf.clear();
        }
    })
}

/// Run ffmpeg and block until it exits. Spawn failures report code -1.
pub fn run_ffmpeg_blocking(ffmpeg: &Path, args: &[OsString]) -> Result<(), PreviewError> {
    let input_arg = args
        .iter()
        .position(|a| a == "-i")
        .and_then(|i| args.get(i + 1));
    log::debug!(
        target: "scrub_preview::ffmpeg::runner",
        "Spawning FFmpeg: path={}, input={:?}, output={:?}",
        ffmpeg.display(),
        input_arg,
        args.last()
    );

    let mut cmd = Command::new(ffmpeg);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    #[cfg(windows)]
    cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW

    let mut child = cmd.spawn().map_err(|e| {
        log::error!(
            target: "scrub_preview::ffmpeg::runner",
            "Failed to spawn FFmpeg: {}",
            e
        );
        PreviewError::engine_failed(-1, format!("Failed to spawn FFmpeg: {}", e))
    })?;

    let stderr_buffer = Arc::new(Mutex::new(Vec::new()));
    let stderr_handle = child
        .stderr
        .take()
        .map(|stderr| collect_stderr(stderr, Arc::clone(&stderr_buffer)));

    let status = child.wait();
    if let Some(handle) = stderr_handle {
        let _ = handle.join();
    }
    let status = status.map_err(|e| PreviewError::engine_failed(-1, e.to_string()))?;

    let stderr_str = String::from_utf8_lossy(&stderr_buffer.lock()).to_string();

    if status.success() {
        log::info!(
            target: "scrub_preview::ffmpeg::runner",
            "FFmpeg completed successfully"
        );
        Ok(())
    } else {
        let code = status.code().unwrap_or(-1);
        let err_preview = stderr_str
            .lines()
            .rev()
            .take(3)
            .collect::<Vec<_>>()
            .join("; ");
        log::error!(
            target: "scrub_preview::ffmpeg::runner",
            "FFmpeg failed (code={}): {}",
            code,
            err_preview
        );
        Err(PreviewError::engine_failed(code, stderr_str))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    #[serial]
    fn zero_exit_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = script(dir.path(), "exit 0");
        run_ffmpeg_blocking(&ffmpeg, &["-i".into(), "in.mp4".into()]).unwrap();
    }

    #[test]
    #[serial]
    fn non_zero_exit_carries_code_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = script(dir.path(), "echo 'Invalid argument' >&2\nexit 1");
        let err = run_ffmpeg_blocking(&ffmpeg, &[]).unwrap_err();
        match err {
            PreviewError::EngineExecutionFailed { code, stderr } => {
                assert_eq!(code, 1);
                assert_eq!(stderr.trim(), "Invalid argument");
            }
            other => panic!("expected EngineExecutionFailed, got {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn args_are_passed_without_shell_splitting() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("argc");
        let ffmpeg = script(dir.path(), &format!("echo $# > '{}'", out.display()));
        run_ffmpeg_blocking(&ffmpeg, &["[0]split=2[v1][v2]; [v1]trim=1:2".into()]).unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap().trim(), "1");
    }

    #[test]
    #[serial]
    fn spawn_failure_is_code_minus_one() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_ffmpeg_blocking(&dir.path().join("missing"), &[]).unwrap_err();
        assert!(matches!(
            err,
            PreviewError::EngineExecutionFailed { code: -1, .. }
        ));
    }

    #[test]
    #[serial]
    fn stderr_tail_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = script(
            dir.path(),
            &format!(
                "i=0; while [ $i -lt 2000 ]; do echo '{}' >&2; i=$((i+1)); done\nexit 3",
                "x".repeat(100)
            ),
        );
        match run_ffmpeg_blocking(&ffmpeg, &[]).unwrap_err() {
            PreviewError::EngineExecutionFailed { code, stderr } => {
                assert_eq!(code, 3);
                assert!(stderr.len() <= MAX_STDERR_BYTES);
            }
            other => panic!("expected EngineExecutionFailed, got {other:?}"),
        }
    }
}
