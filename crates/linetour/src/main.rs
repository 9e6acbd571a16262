//! linetour: draw an image as one continuous line.
//!
//! Samples dark pixels of the input image, connects them with the shortest
//! nearest-neighbor tour found from every start, and writes the drawing to
//! a raster file. Per-stage diagnostics go to stdout; log records go to
//! stderr.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin linetour -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use linetour_export::RasterStyle;
use linetour_pipeline::diagnostics::StdClock;
use linetour_pipeline::{PipelineConfig, StagedResult};
use log::LevelFilter;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Draw an image as a single closed nearest-neighbor tour.
///
/// Dark pixels on a coarse grid are sampled at random, a nearest-neighbor
/// tour is built from every sampled point, and the shortest one is drawn
/// over the sampled dots.
#[derive(Parser)]
#[command(name = "linetour", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Output file. The format follows the extension.
    #[arg(short, long, default_value = linetour_export::DEFAULT_FILE_NAME)]
    output: PathBuf,

    /// A pixel is dark if any channel is at or below this value.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_THRESHOLD)]
    threshold: u8,

    /// Sampling grid spacing in pixels.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_STRIDE, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    stride: u32,

    /// Probability that a dark grid pixel becomes a point (0.0-1.0).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_ACCEPTANCE)]
    acceptance: f64,

    /// How the closing edge counts toward tour length.
    #[arg(long, value_enum, default_value_t = Closing::Single)]
    closing_edge: Closing,

    /// Refuse to build a distance matrix for more points than this.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MAX_POINTS)]
    max_points: usize,

    /// Worker threads for tour construction (0 = all CPUs).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_WORKERS)]
    workers: usize,

    /// Sampling seed. Chosen at random (and logged) when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Draw tour lines without anti-aliasing.
    #[arg(long)]
    no_anti_alias: bool,

    /// Tour line width in pixels (0 = hairline).
    #[arg(long, default_value_t = RasterStyle::DEFAULT_LINE_WIDTH, allow_negative_numbers = true)]
    line_width: f32,

    /// Log more (-v per-start tour lengths, -vv everything).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Closing-edge accounting selection.
#[derive(Clone, Copy, ValueEnum)]
enum Closing {
    /// Count the edge back to the start once.
    Single,
    /// Count it twice, matching lengths reported by earlier tools.
    Doubled,
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(PipelineConfig {
        threshold: cli.threshold,
        stride: cli.stride,
        acceptance: cli.acceptance,
        closing_edge: match cli.closing_edge {
            Closing::Single => linetour_pipeline::ClosingEdge::Single,
            Closing::Doubled => linetour_pipeline::ClosingEdge::Doubled,
        },
        max_points: cli.max_points,
        workers: cli.workers,
    })
}

/// Build the [`RasterStyle`] for the drawing from CLI arguments.
fn style_from_cli(cli: &Cli) -> Result<RasterStyle, String> {
    let style = RasterStyle {
        anti_alias: !cli.no_anti_alias,
        line_width: cli.line_width,
        ..RasterStyle::default()
    };
    style.validate().map_err(|e| format!("Error in drawing options: {e}"))?;
    Ok(style)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    let style = match style_from_cli(&cli) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let seed = cli.seed.unwrap_or_else(rand::random);
    log::info!(
        "image {} ({} bytes), seed {seed}",
        cli.image_path.display(),
        image_bytes.len(),
    );
    log::debug!("config: {config:?}");

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let (result, diagnostics) = match linetour_pipeline::process_with_diagnostics(
        &image_bytes,
        &config,
        &mut rng,
        &StdClock,
    ) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&diagnostics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", diagnostics.report());
    }
    log::debug!("best tour: {:?}", result.best_order());

    match write_drawing(&result, &style, &cli.output) {
        Ok(len) => {
            log::info!("drawing written to {} ({len} bytes)", cli.output.display());
            ExitCode::SUCCESS
        }
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

/// Render, encode and write the best tour. Returns the encoded size.
fn write_drawing(result: &StagedResult, style: &RasterStyle, path: &Path) -> Result<usize, String> {
    let format = if path.extension().is_some() {
        image::ImageFormat::from_path(path)
            .map_err(|e| format!("Unsupported output format for {}: {e}", path.display()))?
    } else {
        linetour_export::DEFAULT_FORMAT
    };

    let drawing = linetour_export::render_result(result, style)
        .map_err(|e| format!("Error rendering drawing: {e}"))?;
    let bytes = linetour_export::encode(&drawing, format)
        .map_err(|e| format!("Error encoding drawing: {e}"))?;
    std::fs::write(path, &bytes)
        .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
    Ok(bytes.len())
}

/// Log level for the number of `-v` flags. Info by default.
const fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the stderr logger. `RUST_LOG`, when set, overrides `-v`.
fn init_logging(verbose: u8) {
    let installed = env_logger::Builder::new()
        .filter_level(log_level(verbose))
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .try_init();
    if let Err(e) = installed {
        eprintln!("Logging disabled: {e}");
    }
}
