use std::ffi::{OsStr, OsString};
use std::path::Path;

use super::PreviewOptions;
use super::graph::{FilterGraph, scale_filter};
use crate::segments::SegmentPlan;

/// Codec, quality bounds, no audio, threads, quiet logging and overwrite flag,
/// shared by both preview shapes.
fn encoding_args(options: &PreviewOptions) -> Vec<OsString> {
    [
        "-c:v".to_string(),
        options.effective_codec().to_string(),
        "-qmin".to_string(),
        options.effective_qmin().to_string(),
        "-qmax".to_string(),
        options.effective_qmax().to_string(),
        "-crf".to_string(),
        options.effective_crf().to_string(),
        "-an".to_string(),
        "-threads".to_string(),
        options.effective_threads().to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        options.effective_log_level().to_string(),
        options.effective_overwrite().ffmpeg_flag().to_string(),
    ]
    .into_iter()
    .map(OsString::from)
    .collect()
}

// Paths go through as OsString so non-UTF-8 names reach ffmpeg unchanged.
fn input_args(source: &Path) -> Vec<OsString> {
    vec![
        OsString::from("-nostdin"),
        OsString::from("-i"),
        source.as_os_str().to_owned(),
    ]
}

/// Arguments for the split/trim/concat/scale preview of `plan`.
pub fn build_filtered_args(
    source: &Path,
    destination: &Path,
    plan: &SegmentPlan,
    options: &PreviewOptions,
) -> Vec<OsString> {
    let graph = FilterGraph::from_plan(plan, options.effective_scale_width());

    log::debug!(
        target: "scrub_preview::ffmpeg::builder",
        "Building filtered preview: segments={}, codec={}, input={} -> output={}",
        graph.segment_count(),
        options.effective_codec(),
        source.display(),
        destination.display()
    );

    let mut args = input_args(source);
    args.extend([
        OsString::from("-filter_complex"),
        OsString::from(graph.render()),
        OsString::from("-map"),
        OsString::from(graph.output_map()),
    ]);
    args.extend(encoding_args(options));
    args.push(destination.as_os_str().to_owned());
    args
}

/// Arguments for scaling the whole source when the segments would not fit.
pub fn build_whole_video_args(
    source: &Path,
    destination: &Path,
    options: &PreviewOptions,
) -> Vec<OsString> {
    log::debug!(
        target: "scrub_preview::ffmpeg::builder",
        "Building whole-video preview: codec={}, input={} -> output={}",
        options.effective_codec(),
        source.display(),
        destination.display()
    );

    let mut args = input_args(source);
    args.extend([
        OsString::from("-vf"),
        OsString::from(scale_filter(options.effective_scale_width())),
    ]);
    args.extend(encoding_args(options));
    args.push(destination.as_os_str().to_owned());
    args
}

fn is_shell_safe(arg: &str) -> bool {
    !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@%".contains(c))
}

fn shell_quote(arg: &str) -> String {
    if is_shell_safe(arg) {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Render args as one POSIX-shell command line, quoting where needed.
/// The filter graph ends up as a single quoted word. Non-UTF-8 bytes are
/// shown as U+FFFD; the rendering is for display only.
pub fn format_args_for_display<S: AsRef<OsStr>>(args: &[S]) -> String {
    args.iter()
        .map(|a| shell_quote(&a.as_ref().to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ")
}
