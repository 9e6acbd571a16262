//! linetour-pipeline: Pure tour-construction pipeline (sans-IO).
//!
//! Turns a raster image into a single closed tour through a sparse set of
//! its dark pixels:
//! decode -> classify -> sample -> distance matrix -> nearest-neighbor
//! tours from every start -> select the shortest.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. Rendering and encoding live
//! in `linetour-export`, file access in the `linetour` binary.

pub mod classify;
pub mod diagnostics;
pub mod distance;
pub mod pipeline;
pub mod sample;
pub mod select;
pub mod tour;
pub mod types;

pub use classify::BinaryGrid;
pub use distance::DistanceMatrix;
pub use pipeline::Pipeline;
pub use select::BestTour;
pub use tour::{Tour, TourCollection, TourOptions};
pub use types::{
    ClosingEdge, Dimensions, PipelineConfig, PipelineError, Point, RgbImage, StagedResult,
};

use rand::Rng;

use diagnostics::{Clock, PipelineDiagnostics, PipelineSummary, StageDiagnostics, StageMetrics};

/// Run the full pipeline.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP), a configuration and the
/// random source used for point sampling, and returns every stage output
/// in a [`StagedResult`]. The same bytes, config and seed always produce
/// the same result.
///
/// # Pipeline steps
///
/// 1. Decode image to RGB
/// 2. Classify pixels as foreground/background
/// 3. Sample points on the coarse grid
/// 4. Build the pairwise distance matrix
/// 5. Nearest-neighbor tour from every start (parallel)
/// 6. Select the shortest tour
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] for an unusable config,
/// [`PipelineError::EmptyInput`] if `image_bytes` is empty,
/// [`PipelineError::ImageDecode`] if the image format is unrecognized,
/// and a capacity error if the sampled points do not fit in memory.
pub fn process<R: Rng + ?Sized>(
    image_bytes: &[u8],
    config: &PipelineConfig,
    rng: &mut R,
) -> Result<StagedResult, PipelineError> {
    Ok(Pipeline::new(image_bytes.to_vec(), config.clone())
        .decode()?
        .classify()
        .sample(rng)
        .measure()?
        .construct_tours()?
        .select()
        .into_result())
}

/// Run the full pipeline and collect per-stage [`PipelineDiagnostics`].
///
/// Identical to [`process`] except that each stage is timed with `clock`
/// and summarized.
///
/// # Errors
///
/// Same as [`process`].
pub fn process_with_diagnostics<R: Rng + ?Sized, C: Clock>(
    image_bytes: &[u8],
    config: &PipelineConfig,
    rng: &mut R,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    let started = clock.now();

    let t = clock.now();
    let decoded = Pipeline::new(image_bytes.to_vec(), config.clone()).decode()?;
    let decode = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Decode {
            input_bytes: decoded.source_len(),
            width: decoded.image().width(),
            height: decoded.image().height(),
        },
    };

    let t = clock.now();
    let classified = decoded.classify();
    let grid = classified.grid();
    let classify = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Classify {
            threshold: config.threshold,
            foreground_count: grid.foreground_count(),
            pixel_count: u64::from(grid.width()) * u64::from(grid.height()),
        },
    };

    let t = clock.now();
    let sampled = classified.sample(rng);
    let sample = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Sample {
            stride: config.stride,
            acceptance: config.acceptance,
            point_count: sampled.points().len(),
        },
    };

    let t = clock.now();
    let measured = sampled.measure()?;
    let distance_matrix = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::DistanceMatrix {
            points: measured.matrix().len(),
            bytes: measured.matrix().byte_size(),
        },
    };

    let t = clock.now();
    let toured = measured.construct_tours()?;
    let lengths = toured.tours().lengths();
    let stats = diagnostics::length_stats(&lengths);
    let tours = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Tours {
            tour_count: lengths.len(),
            min_length: stats.min,
            max_length: stats.max,
            mean_length: stats.mean,
        },
    };

    let t = clock.now();
    let result = toured.select().into_result();
    let select = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Select {
            best_start: result.best.map(|b| b.start),
            best_length: result.best_length(),
        },
    };

    let diagnostics = PipelineDiagnostics {
        decode,
        classify,
        sample,
        distance_matrix,
        tours,
        select,
        total_duration: clock.elapsed(&started),
        summary: PipelineSummary {
            image_width: result.dimensions.width,
            image_height: result.dimensions.height,
            point_count: result.points.len(),
            best_start: result.best.map(|b| b.start),
            best_length: result.best_length(),
        },
    };

    Ok((result, diagnostics))
}
