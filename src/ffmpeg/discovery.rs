//! Locating the ffmpeg and ffprobe executables.
//!
//! The orchestrator never searches the filesystem itself; it asks a
//! [`ToolLocator`]. [`SystemToolLocator`] resolves through `which` on `PATH`
//! and then in common install directories, [`FixedToolLocator`] uses explicit paths (CLI
//! overrides, tests with fake binaries).

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::PreviewError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
}

impl Tool {
    pub fn binary_name(self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
        }
    }

    fn file_name(self) -> String {
        if cfg!(target_os = "windows") {
            format!("{}.exe", self.binary_name())
        } else {
            self.binary_name().to_string()
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

pub trait ToolLocator {
    fn locate(&self, tool: Tool) -> Result<PathBuf, PreviewError>;
}

impl<L: ToolLocator + ?Sized> ToolLocator for &L {
    fn locate(&self, tool: Tool) -> Result<PathBuf, PreviewError> {
        (**self).locate(tool)
    }
}

fn common_dirs() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/opt/homebrew/bin"),
            PathBuf::from("/usr/local/bin"),
            PathBuf::from("/opt/local/bin"),
        ]
    }

    #[cfg(target_os = "windows")]
    {
        vec![
            PathBuf::from("C:\\ffmpeg\\bin"),
            PathBuf::from("C:\\Program Files\\ffmpeg\\bin"),
        ]
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        vec![PathBuf::from("/usr/bin"), PathBuf::from("/usr/local/bin")]
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", unix)))]
    {
        vec![]
    }
}

/// First executable `tool` in `dirs`, honouring `PATHEXT` on Windows.
fn find_in_dirs(tool: Tool, dirs: &[PathBuf]) -> Option<PathBuf> {
    // an empty search path would mean the working directory
    if dirs.is_empty() {
        return None;
    }
    let joined = std::env::join_paths(dirs).ok()?;
    which::which_in(tool.binary_name(), Some(joined), ".").ok()
}

fn resolve_tool_path(tool: Tool) -> Result<PathBuf, PreviewError> {
    match which::which(tool.binary_name()) {
        Ok(p) => {
            log::debug!(
                target: "scrub_preview::ffmpeg::discovery",
                "{} found in PATH: {}",
                tool,
                p.display()
            );
            return Ok(p);
        }
        Err(e) => log::debug!(
            target: "scrub_preview::ffmpeg::discovery",
            "{} not on PATH ({}), trying common locations",
            tool,
            e
        ),
    }

    if let Some(p) = find_in_dirs(tool, &common_dirs()) {
        log::debug!(
            target: "scrub_preview::ffmpeg::discovery",
            "{} found in common path: {}",
            tool,
            p.display()
        );
        return Ok(p);
    }

    log::error!(
        target: "scrub_preview::ffmpeg::discovery",
        "{} not found in PATH or common locations",
        tool
    );
    Err(PreviewError::ToolNotFound { tool })
}

/// Searches `PATH`, then common install directories. A successful lookup is
/// cached for the lifetime of the locator; failures are retried on the next call.
#[derive(Debug, Default)]
pub struct SystemToolLocator {
    ffmpeg: OnceLock<PathBuf>,
    ffprobe: OnceLock<PathBuf>,
}

impl SystemToolLocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn cache(&self, tool: Tool) -> &OnceLock<PathBuf> {
        match tool {
            Tool::Ffmpeg => &self.ffmpeg,
            Tool::Ffprobe => &self.ffprobe,
        }
    }
}

impl ToolLocator for SystemToolLocator {
    fn locate(&self, tool: Tool) -> Result<PathBuf, PreviewError> {
        let cache = self.cache(tool);
        if let Some(path) = cache.get() {
            log::trace!(
                target: "scrub_preview::ffmpeg::discovery",
                "{} path (cached): {}",
                tool,
                path.display()
            );
            return Ok(path.clone());
        }
        let path = resolve_tool_path(tool)?;
        Ok(cache.get_or_init(|| path).clone())
    }
}

/// Explicit tool paths. `locate` still verifies the file is there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedToolLocator {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FixedToolLocator {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Use the given ffmpeg and the ffprobe shipped next to it.
    pub fn beside_ffmpeg(ffmpeg: impl Into<PathBuf>) -> Self {
        let ffmpeg = ffmpeg.into();
        let candidates = ffprobe_candidates(&ffmpeg);
        let ffprobe = candidates
            .iter()
            .find(|c| c.exists())
            .or(candidates.last())
            .cloned()
            .unwrap_or_else(|| PathBuf::from(Tool::Ffprobe.file_name()));
        Self { ffmpeg, ffprobe }
    }
}

impl ToolLocator for FixedToolLocator {
    fn locate(&self, tool: Tool) -> Result<PathBuf, PreviewError> {
        let path = match tool {
            Tool::Ffmpeg => &self.ffmpeg,
            Tool::Ffprobe => &self.ffprobe,
        };
        if path.is_file() {
            Ok(path.clone())
        } else {
            log::error!(
                target: "scrub_preview::ffmpeg::discovery",
                "{} not found at configured path {}",
                tool,
                path.display()
            );
            Err(PreviewError::ToolNotFound { tool })
        }
    }
}

/// Paths to try for ffprobe given an ffmpeg binary path (suffixed first, then plain).
/// A bundled `ffmpeg-x86_64-unknown-linux-gnu` pairs with `ffprobe-x86_64-unknown-linux-gnu`.
pub fn ffprobe_candidates(ffmpeg_path: &Path) -> Vec<PathBuf> {
    let Some(parent) = ffmpeg_path.parent() else {
        return vec![];
    };
    let ext = if cfg!(target_os = "windows") { ".exe" } else { "" };
    let mut candidates = Vec::with_capacity(2);
    if let Some(suffix) = ffmpeg_path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|stem| stem.strip_prefix("ffmpeg"))
        .filter(|suffix| !suffix.is_empty())
    {
        candidates.push(parent.join(format!("ffprobe{suffix}{ext}")));
    }
    candidates.push(parent.join(format!("ffprobe{ext}")));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[cfg(unix)]
    fn make_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        std::fs::write(path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    #[cfg(not(target_os = "windows"))]
    fn ffprobe_candidates_plain_ffmpeg() {
        let candidates = ffprobe_candidates(Path::new("/usr/bin/ffmpeg"));
        assert_eq!(candidates, vec![PathBuf::from("/usr/bin/ffprobe")]);
    }

    #[test]
    #[cfg(not(target_os = "windows"))]
    fn ffprobe_candidates_bundled_suffix() {
        let candidates = ffprobe_candidates(Path::new("/app/bin/ffmpeg-aarch64-apple-darwin"));
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/app/bin/ffprobe-aarch64-apple-darwin"),
                PathBuf::from("/app/bin/ffprobe"),
            ]
        );
    }

    #[test]
    fn fixed_locator_reports_missing_tool() {
        let dir = tempfile::tempdir().unwrap();
        let locator = FixedToolLocator::new(dir.path().join("ffmpeg"), dir.path().join("ffprobe"));
        let err = locator.locate(Tool::Ffprobe).unwrap_err();
        assert!(matches!(err, PreviewError::ToolNotFound { tool: Tool::Ffprobe }));
    }

    #[test]
    #[cfg(unix)]
    fn beside_ffmpeg_prefers_suffixed_ffprobe() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = dir.path().join("ffmpeg-x86_64-unknown-linux-gnu");
        let suffixed = dir.path().join("ffprobe-x86_64-unknown-linux-gnu");
        make_executable(&ffmpeg);
        make_executable(&suffixed);
        make_executable(&dir.path().join("ffprobe"));

        let locator = FixedToolLocator::beside_ffmpeg(&ffmpeg);
        assert_eq!(locator.locate(Tool::Ffmpeg).unwrap(), ffmpeg);
        assert_eq!(locator.locate(Tool::Ffprobe).unwrap(), suffixed);
    }

    #[test]
    #[cfg(unix)]
    #[serial]
    fn system_locator_finds_tools_on_path() {
        let dir = tempfile::tempdir().unwrap();
        make_executable(&dir.path().join("ffmpeg"));
        make_executable(&dir.path().join("ffprobe"));
        let old_path = std::env::var_os("PATH");
        // SAFETY: serialized test; no other thread reads the environment meanwhile
        unsafe {
            std::env::set_var("PATH", dir.path());
        }

        let locator = SystemToolLocator::new();
        let ffmpeg = locator.locate(Tool::Ffmpeg);
        let ffprobe = locator.locate(Tool::Ffprobe);

        unsafe {
            match old_path {
                Some(p) => std::env::set_var("PATH", p),
                None => std::env::remove_var("PATH"),
            }
        }
        assert_eq!(ffmpeg.unwrap(), dir.path().join("ffmpeg"));
        assert_eq!(ffprobe.unwrap(), dir.path().join("ffprobe"));
    }

    #[test]
    #[cfg(unix)]
    fn directory_search_skips_non_executable_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ffprobe"), "not a program").unwrap();
        make_executable(&dir.path().join("ffmpeg"));
        let dirs = vec![dir.path().to_path_buf()];

        assert_eq!(find_in_dirs(Tool::Ffprobe, &dirs), None);
        assert_eq!(
            find_in_dirs(Tool::Ffmpeg, &dirs),
            Some(dir.path().join("ffmpeg"))
        );
    }

    #[test]
    fn directory_search_with_no_dirs_finds_nothing() {
        assert_eq!(find_in_dirs(Tool::Ffmpeg, &[]), None);
    }
}
