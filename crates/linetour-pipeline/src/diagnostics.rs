//! Pipeline diagnostics: timing and counts for each stage.
//!
//! Every call to [`process_with_diagnostics`](crate::process_with_diagnostics)
//! collects these alongside the pipeline results. Time is read through
//! the [`Clock`] trait so callers choose the time source (and tests can
//! use a fake one).
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] backed by [`std::time::Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StdClock;

impl Clock for StdClock {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn elapsed(&self, since: &Self::Instant) -> Duration {
        since.elapsed()
    }
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Image decoding.
    pub decode: StageDiagnostics,
    /// Foreground classification.
    pub classify: StageDiagnostics,
    /// Point sampling.
    pub sample: StageDiagnostics,
    /// Distance matrix construction.
    pub distance_matrix: StageDiagnostics,
    /// Nearest-neighbor tours from every start.
    pub tours: StageDiagnostics,
    /// Best tour selection.
    pub select: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary values across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
    },
    /// Classification metrics.
    Classify {
        /// Threshold used.
        threshold: u8,
        /// Number of foreground pixels.
        foreground_count: usize,
        /// Total pixel count.
        pixel_count: u64,
    },
    /// Sampling metrics.
    Sample {
        /// Grid stride.
        stride: u32,
        /// Acceptance probability.
        acceptance: f64,
        /// Number of sampled points.
        point_count: usize,
    },
    /// Distance matrix metrics.
    DistanceMatrix {
        /// Matrix side length.
        points: usize,
        /// Size of the matrix buffer in bytes.
        bytes: usize,
    },
    /// Tour construction metrics.
    Tours {
        /// Number of candidate tours built.
        tour_count: usize,
        /// Shortest candidate length (0 when there are none).
        min_length: f64,
        /// Longest candidate length (0 when there are none).
        max_length: f64,
        /// Mean candidate length (0 when there are none).
        mean_length: f64,
    },
    /// Selection metrics.
    Select {
        /// Start index of the best tour, if any.
        best_start: Option<usize>,
        /// Length of the best tour (0 when there is none).
        best_length: f64,
    },
}

/// High-level summary for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Number of sampled points.
    pub point_count: usize,
    /// Start index of the best tour, if any.
    pub best_start: Option<usize>,
    /// Length of the best tour (0 when there is none).
    pub best_length: f64,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{}",
            self.summary.image_width, self.summary.image_height,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Decode", &self.decode),
            ("Classify", &self.classify),
            ("Sample", &self.sample),
            ("Distance Matrix", &self.distance_matrix),
            ("Tours", &self.tours),
            ("Select", &self.select),
        ];

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        let best = self
            .summary
            .best_start
            .map_or_else(|| "none".to_string(), |s| s.to_string());
        lines.push(format!(
            "Points: {}  |  Best start: {best}  |  Best length: {:.3}",
            self.summary.point_count, self.summary.best_length,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::Classify {
            threshold,
            foreground_count,
            pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *pixel_count > 0 {
                *foreground_count as f64 / *pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!("threshold={threshold} foreground={foreground_count} ({density:.1}%)")
        }
        StageMetrics::Sample {
            stride,
            acceptance,
            point_count,
        } => format!("stride={stride} p={acceptance:.2} -> {point_count} points"),
        StageMetrics::DistanceMatrix { points, bytes } => {
            format!("{points}x{points} ({bytes} bytes)")
        }
        StageMetrics::Tours {
            tour_count,
            min_length,
            max_length,
            mean_length,
        } => format!(
            "{tour_count} tours (min={min_length:.1} max={max_length:.1} mean={mean_length:.1})"
        ),
        StageMetrics::Select {
            best_start,
            best_length,
        } => match best_start {
            Some(start) => format!("start={start} length={best_length:.3}"),
            None => "no tour".to_string(),
        },
    }
}

/// Statistics over candidate tour lengths.
pub(crate) struct LengthStats {
    /// Shortest length.
    pub min: f64,
    /// Longest length.
    pub max: f64,
    /// Mean length.
    pub mean: f64,
}

/// Compute length statistics; all zero for an empty slice.
pub(crate) fn length_stats(lengths: &[f64]) -> LengthStats {
    if lengths.is_empty() {
        return LengthStats {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
        };
    }
    let min = lengths.iter().copied().fold(f64::INFINITY, f64::min);
    let max = lengths.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    #[allow(clippy::cast_precision_loss)]
    let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
    LengthStats { min, max, mean }
}
