use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use scrub_preview::ffmpeg::{FixedToolLocator, SystemToolLocator, ToolLocator};
use scrub_preview::{OverwritePolicy, PreviewError, PreviewOptions, PreviewRequest, Previewer};
use serde_json::json;

#[derive(Parser)]
#[command(name = "scrub-preview", version, about)]
struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results and errors as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// ffmpeg binary to use; ffprobe is taken from the same directory
    #[arg(long, global = true, env = "FFMPEG_PATH")]
    ffmpeg: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a preview clip from a source video
    Create(CreateArgs),
    /// Check that ffmpeg and ffprobe can be found
    Check,
}

#[derive(Args)]
struct CreateArgs {
    source: PathBuf,
    destination: PathBuf,

    /// Number of segments to sample
    #[arg(long, default_value_t = 5)]
    parts: u32,

    /// Length of each segment in seconds
    #[arg(long, default_value_t = 1.0)]
    part_duration: f64,

    /// JSON file with encoding options (camelCase keys)
    #[arg(long)]
    options: Option<PathBuf>,

    /// Output width in pixels
    #[arg(long)]
    scale_width: Option<u32>,

    /// Replace the destination if it already exists
    #[arg(long)]
    overwrite: bool,

    /// Print the ffmpeg command instead of running it
    #[arg(long)]
    dry_run: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(default)
        .parse_default_env()
        .init();
}

fn load_options(args: &CreateArgs) -> Result<PreviewOptions, PreviewError> {
    let mut options = match &args.options {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            PreviewOptions::from_json(&text).map_err(|e| {
                PreviewError::InvalidRequest(format!("bad options file {}: {}", path.display(), e))
            })?
        }
        None => PreviewOptions::default(),
    };
    if args.scale_width.is_some() {
        options.scale_width = args.scale_width;
    }
    if args.overwrite {
        options.overwrite = Some(OverwritePolicy::Overwrite);
    }
    Ok(options)
}

fn run_create<L: ToolLocator>(
    locator: L,
    args: &CreateArgs,
    as_json: bool,
) -> Result<(), PreviewError> {
    let options = load_options(args)?;
    let request = PreviewRequest::new(
        &args.source,
        &args.destination,
        args.parts,
        args.part_duration,
    )?;
    let previewer = Previewer::new(locator, options);

    if args.dry_run {
        previewer.check_preconditions(&request)?;
        let prepared = previewer.prepare(&request)?;
        if as_json {
            println!(
                "{}",
                json!({
                    "strategy": prepared.strategy.kind(),
                    "sourceDurationSecs": prepared.source_duration_secs,
                    "args": prepared
                        .args
                        .iter()
                        .map(|a| a.to_string_lossy())
                        .collect::<Vec<_>>(),
                })
            );
        } else {
            println!("{}", prepared.command_line());
        }
        return Ok(());
    }

    let outcome = previewer.create_preview(&request)?;
    if as_json {
        println!("{}", json!(outcome));
    } else {
        println!(
            "{} ({:?}, source {}s)",
            outcome.destination.display(),
            outcome.strategy,
            outcome.source_duration_secs
        );
    }
    Ok(())
}

fn run_check<L: ToolLocator>(locator: L, as_json: bool) -> Result<(), PreviewError> {
    Previewer::new(locator, PreviewOptions::default()).check_system_dependencies()?;
    if as_json {
        println!("{}", json!({ "ok": true }));
    } else {
        println!("ffmpeg and ffprobe found");
    }
    Ok(())
}

fn dispatch<L: ToolLocator>(locator: L, cli: &Cli) -> Result<(), PreviewError> {
    match &cli.command {
        Commands::Create(args) => run_create(locator, args, cli.json),
        Commands::Check => run_check(locator, cli.json),
    }
}

fn report_error(err: &PreviewError, as_json: bool) {
    if as_json {
        println!(
            "{}",
            json!({ "ok": false, "stage": err.stage(), "error": err })
        );
    } else {
        eprintln!("error: {}", err);
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.ffmpeg.as_deref() {
        Some(ffmpeg) => dispatch(FixedToolLocator::beside_ffmpeg(ffmpeg), &cli),
        None => dispatch(SystemToolLocator::new(), &cli),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, cli.json);
            ExitCode::FAILURE
        }
    }
}
