//! Preview generation: probe the source, pick a strategy, run ffmpeg.
//!
//! A request with `parts` segments of `part_duration` seconds needs
//! `(parts + 2) * part_duration` seconds of source (one slot of margin on
//! each side). Shorter sources are scaled whole instead.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Precondition, PreviewError};
use crate::ffmpeg::{
    OverwritePolicy, PreviewOptions, SystemToolLocator, Tool, ToolLocator, build_filtered_args,
    build_whole_video_args, format_args_for_display, probe_duration, run_ffmpeg_blocking,
};
use crate::segments::{SegmentPlan, plan_segments};

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRequest {
    source: PathBuf,
    destination: PathBuf,
    parts: u32,
    part_duration: f64,
}

impl PreviewRequest {
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        parts: u32,
        part_duration: f64,
    ) -> Result<Self, PreviewError> {
        if parts == 0 {
            return Err(PreviewError::InvalidRequest(
                "parts must be at least 1".into(),
            ));
        }
        if !part_duration.is_finite() || part_duration <= 0.0 {
            return Err(PreviewError::InvalidRequest(format!(
                "part duration must be a positive number of seconds, got {}",
                part_duration
            )));
        }
        Ok(Self {
            source: source.into(),
            destination: destination.into(),
            parts,
            part_duration,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn parts(&self) -> u32 {
        self.parts
    }

    pub fn part_duration(&self) -> f64 {
        self.part_duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StrategyKind {
    Filtered,
    WholeVideo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewStrategy {
    Filtered(SegmentPlan),
    WholeVideo,
}

impl PreviewStrategy {
    /// Whole video iff `(parts + 2) * part_duration > total_secs`; equality still fits.
    pub fn select(parts: u32, part_duration: f64, total_secs: u64) -> Self {
        let total = total_secs as f64;
        if (f64::from(parts) + 2.0) * part_duration > total {
            PreviewStrategy::WholeVideo
        } else {
            PreviewStrategy::Filtered(plan_segments(parts, part_duration, total))
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            PreviewStrategy::Filtered(_) => StrategyKind::Filtered,
            PreviewStrategy::WholeVideo => StrategyKind::WholeVideo,
        }
    }

    pub fn build_args(
        &self,
        source: &Path,
        destination: &Path,
        options: &PreviewOptions,
    ) -> Vec<OsString> {
        match self {
            PreviewStrategy::Filtered(plan) => {
                build_filtered_args(source, destination, plan, options)
            }
            PreviewStrategy::WholeVideo => build_whole_video_args(source, destination, options),
        }
    }
}

/// Everything needed to run ffmpeg for one request.
#[derive(Debug, Clone)]
pub struct PreparedPreview {
    pub ffmpeg: PathBuf,
    pub source_duration_secs: u64,
    pub strategy: PreviewStrategy,
    pub args: Vec<OsString>,
}

impl PreparedPreview {
    /// Shell-quoted command line, for display and dry runs.
    pub fn command_line(&self) -> String {
        format!(
            "{} {}",
            format_args_for_display(&[self.ffmpeg.as_os_str()]),
            format_args_for_display(&self.args)
        )
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewOutcome {
    pub destination: PathBuf,
    pub source_duration_secs: u64,
    pub strategy: StrategyKind,
}

pub struct Previewer<L = SystemToolLocator> {
    locator: L,
    options: PreviewOptions,
}

impl Default for Previewer<SystemToolLocator> {
    fn default() -> Self {
        Self::new(SystemToolLocator::new(), PreviewOptions::default())
    }
}

impl<L: ToolLocator> Previewer<L> {
    pub fn new(locator: L, options: PreviewOptions) -> Self {
        Self { locator, options }
    }

    pub fn options(&self) -> &PreviewOptions {
        &self.options
    }

    /// Both ffmpeg and ffprobe must be resolvable.
    pub fn check_system_dependencies(&self) -> Result<(), PreviewError> {
        self.locator.locate(Tool::Ffmpeg)?;
        self.locator.locate(Tool::Ffprobe)?;
        Ok(())
    }

    /// Source exists, destination directory exists and, unless overwriting,
    /// the destination does not.
    pub fn check_preconditions(&self, request: &PreviewRequest) -> Result<(), PreviewError> {
        let result = check_paths(
            request.source(),
            request.destination(),
            self.options.effective_overwrite(),
        );
        if let Err(ref e) = result {
            log::warn!(target: "scrub_preview::preview", "Rejected preview request: {}", e);
        }
        result.map_err(PreviewError::from)
    }

    /// Resolve ffmpeg, probe the source and build the ffmpeg arguments.
    pub fn prepare(&self, request: &PreviewRequest) -> Result<PreparedPreview, PreviewError> {
        let ffmpeg = self.locator.locate(Tool::Ffmpeg)?;
        let source_duration_secs = probe_duration(&self.locator, request.source())?;
        let strategy = PreviewStrategy::select(
            request.parts(),
            request.part_duration(),
            source_duration_secs,
        );

        log::info!(
            target: "scrub_preview::preview",
            "{}: {}s source, {} x {}s requested -> {:?}",
            request.source().display(),
            source_duration_secs,
            request.parts(),
            request.part_duration(),
            strategy.kind()
        );

        let args = strategy.build_args(request.source(), request.destination(), &self.options);
        Ok(PreparedPreview {
            ffmpeg,
            source_duration_secs,
            strategy,
            args,
        })
    }

    pub fn create_preview(&self, request: &PreviewRequest) -> Result<PreviewOutcome, PreviewError> {
        self.check_preconditions(request)?;
        let prepared = self.prepare(request)?;
        run_ffmpeg_blocking(&prepared.ffmpeg, &prepared.args)?;
        log::info!(
            target: "scrub_preview::preview",
            "Preview written to {}",
            request.destination().display()
        );
        Ok(PreviewOutcome {
            destination: request.destination().to_path_buf(),
            source_duration_secs: prepared.source_duration_secs,
            strategy: prepared.strategy.kind(),
        })
    }
}

fn check_paths(
    source: &Path,
    destination: &Path,
    overwrite: OverwritePolicy,
) -> Result<(), Precondition> {
    if !source.exists() {
        return Err(Precondition::SourceMissing(source.to_path_buf()));
    }
    let dst_dir = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !dst_dir.is_dir() {
        return Err(Precondition::DestinationDirMissing(dst_dir.to_path_buf()));
    }
    if overwrite == OverwritePolicy::Refuse && destination.exists() {
        return Err(Precondition::DestinationExists(destination.to_path_buf()));
    }
    Ok(())
}

/// Run [`Previewer::create_preview`] on tokio's blocking pool.
pub async fn create_preview_async<L>(
    previewer: Arc<Previewer<L>>,
    request: PreviewRequest,
) -> Result<PreviewOutcome, PreviewError>
where
    L: ToolLocator + Send + Sync + 'static,
{
    let result = tokio::task::spawn_blocking(move || previewer.create_preview(&request)).await;

    match result {
        Ok(outcome) => outcome,
        Err(join_err) => Err(PreviewError::Io(std::io::Error::other(join_err))),
    }
}

/// Create a preview with tools from `PATH` and default encoding options.
pub fn create_preview(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    parts: u32,
    part_duration: f64,
) -> Result<PreviewOutcome, PreviewError> {
    let request = PreviewRequest::new(
        source.as_ref(),
        destination.as_ref(),
        parts,
        part_duration,
    )?;
    Previewer::<SystemToolLocator>::default().create_preview(&request)
}

/// Verify ffmpeg and ffprobe are on `PATH`.
pub fn check_system_dependencies() -> Result<(), PreviewError> {
    Previewer::<SystemToolLocator>::default().check_system_dependencies()
}
