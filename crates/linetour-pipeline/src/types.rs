//! Shared types for the linetour pipeline.

use serde::{Deserialize, Serialize};

use crate::classify::BinaryGrid;
use crate::select::BestTour;
use crate::tour::{Tour, TourCollection};

/// Re-export `RgbImage` so downstream crates can reference the decoded
/// source raster without depending on `image` directly.
pub use image::RgbImage;

/// A sampled foreground location: one vertex of the tour problem.
///
/// `index` is dense and 0-based, assigned in discovery order by the
/// sampler, so `points[p.index] == p` holds for every sampled point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Position of this point in the sampled sequence.
    pub index: usize,
    /// Horizontal position (pixels from left edge).
    pub x: u32,
    /// Vertical position (pixels from top edge).
    pub y: u32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(index: usize, x: u32, y: u32) -> Self {
        Self { index, x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// How the edge from the last visited point back to the start is counted
/// in a tour's length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClosingEdge {
    /// The closing edge contributes its distance once. The tour length is
    /// the plain sum of all N edges of the closed loop.
    #[default]
    Single,

    /// The closing edge contributes its distance twice.
    ///
    /// Known quirk kept only for parity with lengths reported by earlier
    /// versions of this drawing tool. Reported lengths are not tour
    /// lengths, and selection favors tours with a short closing edge.
    Doubled,
}

impl ClosingEdge {
    /// Multiplier applied to the closing edge distance.
    #[must_use]
    pub const fn factor(self) -> f64 {
        match self {
            Self::Single => 1.0,
            Self::Doubled => 2.0,
        }
    }
}

/// Configuration for the tour pipeline.
///
/// Every field has a default exposed as an associated constant so that
/// command-line defaults cannot drift from the library defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// A pixel is foreground when any of its RGB channels is at or below
    /// this value.
    pub threshold: u8,

    /// Sampling grid spacing in pixels, applied on both axes.
    pub stride: u32,

    /// Probability that a foreground grid cell becomes a tour vertex.
    pub acceptance: f64,

    /// How the closing edge is counted in tour lengths.
    pub closing_edge: ClosingEdge,

    /// Upper bound on the number of sampled points. The distance matrix
    /// needs `8 * N * N` bytes, so this caps memory use.
    pub max_points: usize,

    /// Worker threads for tour construction. `0` uses the global rayon
    /// pool (one thread per CPU).
    pub workers: usize,
}

impl PipelineConfig {
    /// Default foreground threshold on the 0-255 channel scale.
    pub const DEFAULT_THRESHOLD: u8 = 110;

    /// Default sampling stride.
    pub const DEFAULT_STRIDE: u32 = 4;

    /// Default acceptance probability.
    pub const DEFAULT_ACCEPTANCE: f64 = 0.5;

    /// Default cap on sampled points.
    ///
    /// Peak memory is about 16·N² bytes (see
    /// [`estimated_peak_bytes`](Self::estimated_peak_bytes)), so this
    /// allows roughly 1.6 GB.
    pub const DEFAULT_MAX_POINTS: usize = 10_000;

    /// Default worker count (all CPUs).
    pub const DEFAULT_WORKERS: usize = 0;

    /// Bytes held at the peak of tour construction for `points` points.
    ///
    /// The distance matrix (N² `f64`) is still alive while the N tour
    /// orders (N + 1 indices each) are collected, so the two add up.
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn estimated_peak_bytes(points: usize) -> u128 {
        let n = points as u128;
        let matrix = n * n * size_of::<f64>() as u128;
        let orders = n * (n + 1) * size_of::<usize>() as u128;
        matrix + orders
    }

    /// Check the configuration for values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] when `stride` is zero or
    /// `acceptance` is not a probability.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.stride == 0 {
            return Err(PipelineError::InvalidConfig(
                "stride must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.acceptance) {
            return Err(PipelineError::InvalidConfig(format!(
                "acceptance must be within [0, 1], got {}",
                self.acceptance,
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            stride: Self::DEFAULT_STRIDE,
            acceptance: Self::DEFAULT_ACCEPTANCE,
            closing_edge: ClosingEdge::default(),
            max_points: Self::DEFAULT_MAX_POINTS,
            workers: Self::DEFAULT_WORKERS,
        }
    }
}

/// Result of running the pipeline with every stage output preserved.
///
/// The distance matrix is not kept: it is the largest intermediate and
/// everything downstream of it is already captured in `tours`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedResult {
    /// Source image dimensions; the output canvas has the same size.
    pub dimensions: Dimensions,
    /// Foreground/background classification of the source.
    pub grid: BinaryGrid,
    /// Sampled tour vertices in discovery order.
    pub points: Vec<Point>,
    /// One candidate tour per start index.
    pub tours: TourCollection,
    /// The shortest candidate, `None` when no points were sampled.
    pub best: Option<BestTour>,
}

impl StagedResult {
    /// The shortest tour, if any point was sampled.
    #[must_use]
    pub fn best_tour(&self) -> Option<&Tour> {
        self.best.and_then(|b| self.tours.get(b.start))
    }

    /// Visiting order of the best tour; empty when no points were sampled.
    #[must_use]
    pub fn best_order(&self) -> &[usize] {
        match self.best_tour() {
            Some(tour) => tour.order(),
            None => &[],
        }
    }

    /// Length of the best tour; `0.0` when no points were sampled.
    #[must_use]
    pub fn best_length(&self) -> f64 {
        self.best.map_or(0.0, |b| b.length)
    }
}

/// Errors that can occur during pipeline processing.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// More points were sampled than the configured limit allows.
    #[error("{points} points sampled, limit is {limit}")]
    TooManyPoints {
        /// Number of sampled points.
        points: usize,
        /// Configured `max_points`.
        limit: usize,
    },

    /// The distance matrix could not be allocated.
    #[error("cannot allocate a {points}x{points} distance matrix ({bytes} bytes)")]
    MatrixAllocation {
        /// Number of sampled points.
        points: usize,
        /// Requested size in bytes (saturated on overflow).
        bytes: usize,
    },

    /// Per-start tour buffers could not be allocated.
    #[error("cannot allocate tour buffers for {points} points")]
    TourAllocation {
        /// Number of sampled points.
        points: usize,
    },

    /// The dedicated worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),
}

/// Serde-compatible proxy for `PipelineError`.
///
/// `image::ImageError` does not implement serde, so the `ImageDecode`
/// variant stores its `Display` string instead.
#[derive(Serialize, Deserialize)]
enum PipelineErrorProxy {
    ImageDecode(String),
    EmptyInput,
    InvalidConfig(String),
    TooManyPoints { points: usize, limit: usize },
    MatrixAllocation { points: usize, bytes: usize },
    TourAllocation { points: usize },
    WorkerPool(String),
}

impl Serialize for PipelineError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::ImageDecode(e) => PipelineErrorProxy::ImageDecode(e.to_string()),
            Self::EmptyInput => PipelineErrorProxy::EmptyInput,
            Self::InvalidConfig(s) => PipelineErrorProxy::InvalidConfig(s.clone()),
            Self::TooManyPoints { points, limit } => PipelineErrorProxy::TooManyPoints {
                points: *points,
                limit: *limit,
            },
            Self::MatrixAllocation { points, bytes } => PipelineErrorProxy::MatrixAllocation {
                points: *points,
                bytes: *bytes,
            },
            Self::TourAllocation { points } => {
                PipelineErrorProxy::TourAllocation { points: *points }
            }
            Self::WorkerPool(s) => PipelineErrorProxy::WorkerPool(s.clone()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PipelineError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = PipelineErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            // The typed image error cannot be rebuilt; keep the message.
            PipelineErrorProxy::ImageDecode(msg) => {
                Self::InvalidConfig(format!("image decode error: {msg}"))
            }
            PipelineErrorProxy::EmptyInput => Self::EmptyInput,
            PipelineErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
            PipelineErrorProxy::TooManyPoints { points, limit } => {
                Self::TooManyPoints { points, limit }
            }
            PipelineErrorProxy::MatrixAllocation { points, bytes } => {
                Self::MatrixAllocation { points, bytes }
            }
            PipelineErrorProxy::TourAllocation { points } => Self::TourAllocation { points },
            PipelineErrorProxy::WorkerPool(s) => Self::WorkerPool(s),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Point tests ---

    #[test]
    fn peak_bytes_count_matrix_and_tour_orders() {
        assert_eq!(PipelineConfig::estimated_peak_bytes(0), 0);
        let word = size_of::<usize>() as u128;
        // One point: a single zero distance plus the order [0, 0].
        assert_eq!(PipelineConfig::estimated_peak_bytes(1), 8 + 2 * word);
        let n = PipelineConfig::DEFAULT_MAX_POINTS as u128;
        assert_eq!(
            PipelineConfig::estimated_peak_bytes(PipelineConfig::DEFAULT_MAX_POINTS),
            8 * n * n + word * n * (n + 1),
        );
        // Does not overflow for absurd counts.
        assert!(PipelineConfig::estimated_peak_bytes(usize::MAX) > 0);
    }

    #[test]
    fn point_distance() {
        let a = Point::new(0, 0, 0);
        let b = Point::new(1, 3, 4);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_distance_is_symmetric() {
        let a = Point::new(0, 7, 2);
        let b = Point::new(1, 1, 11);
        assert!((a.distance(b) - b.distance(a)).abs() < f64::EPSILON);
    }

    #[test]
    fn point_distance_to_self_is_zero() {
        let p = Point::new(0, 7, 11);
        assert!(p.distance(p).abs() < f64::EPSILON);
    }

    // --- ClosingEdge tests ---

    #[test]
    fn closing_edge_default_is_single() {
        assert_eq!(ClosingEdge::default(), ClosingEdge::Single);
        assert!((ClosingEdge::Single.factor() - 1.0).abs() < f64::EPSILON);
        assert!((ClosingEdge::Doubled.factor() - 2.0).abs() < f64::EPSILON);
    }

    // --- PipelineConfig tests ---

    #[test]
    fn pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.threshold, 110);
        assert_eq!(config.stride, 4);
        assert!((config.acceptance - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.closing_edge, ClosingEdge::Single);
        assert_eq!(config.max_points, 10_000);
        assert_eq!(config.workers, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_stride() {
        let config = PipelineConfig {
            stride: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn validate_rejects_out_of_range_acceptance() {
        for acceptance in [-0.1, 1.5, f64::NAN] {
            let config = PipelineConfig {
                acceptance,
                ..PipelineConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(PipelineError::InvalidConfig(_))),
                "acceptance {acceptance} should be rejected",
            );
        }
    }

    #[test]
    fn pipeline_config_partial_json_uses_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"threshold": 90}"#).unwrap();
        assert_eq!(config.threshold, 90);
        assert_eq!(config.stride, PipelineConfig::DEFAULT_STRIDE);
        assert_eq!(config.closing_edge, ClosingEdge::Single);
    }

    #[test]
    fn pipeline_config_serde_round_trip() {
        let config = PipelineConfig {
            threshold: 64,
            stride: 2,
            acceptance: 0.25,
            closing_edge: ClosingEdge::Doubled,
            max_points: 500,
            workers: 3,
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    // --- StagedResult tests ---

    fn staged(tours: Vec<Tour>, best: Option<BestTour>) -> StagedResult {
        StagedResult {
            dimensions: Dimensions {
                width: 4,
                height: 4,
            },
            grid: BinaryGrid::from_fn(4, 4, |_, _| false),
            points: Vec::new(),
            tours: TourCollection::new(tours),
            best,
        }
    }

    #[test]
    fn staged_result_without_points_reports_empty_tour() {
        let result = staged(Vec::new(), None);
        assert!(result.best_tour().is_none());
        assert!(result.best_order().is_empty());
        assert!(result.best_length().abs() < f64::EPSILON);
    }

    #[test]
    fn staged_result_looks_up_best_tour() {
        let result = staged(
            vec![
                Tour::new(0, vec![0, 1, 0], 8.0),
                Tour::new(1, vec![1, 0, 1], 6.0),
            ],
            Some(BestTour {
                start: 1,
                length: 6.0,
            }),
        );
        assert_eq!(result.best_order(), &[1, 0, 1]);
        assert!((result.best_length() - 6.0).abs() < f64::EPSILON);
    }

    // --- PipelineError tests ---

    #[test]
    fn error_empty_input_display() {
        assert_eq!(
            PipelineError::EmptyInput.to_string(),
            "input image data is empty"
        );
    }

    #[test]
    fn error_matrix_allocation_display() {
        let err = PipelineError::MatrixAllocation {
            points: 3,
            bytes: 72,
        };
        assert_eq!(
            err.to_string(),
            "cannot allocate a 3x3 distance matrix (72 bytes)"
        );
    }

    #[test]
    fn pipeline_error_serde_round_trip_too_many_points() {
        let err = PipelineError::TooManyPoints {
            points: 20,
            limit: 10,
        };
        let json = serde_json::to_string(&err).unwrap();
        let deserialized: PipelineError = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            deserialized,
            PipelineError::TooManyPoints {
                points: 20,
                limit: 10
            }
        ));
    }

    #[test]
    fn pipeline_error_serde_round_trip_invalid_config() {
        let err = PipelineError::InvalidConfig("bad value".to_string());
        let json = serde_json::to_string(&err).unwrap();
        let deserialized: PipelineError = serde_json::from_str(&json).unwrap();
        assert!(matches!(deserialized, PipelineError::InvalidConfig(ref s) if s == "bad value"));
    }
}
