//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! ```rust
//! # use linetour_pipeline::{Pipeline, PipelineConfig, PipelineError};
//! # fn run(png: Vec<u8>) -> Result<(), PipelineError> {
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let staged = Pipeline::new(png, PipelineConfig::default())
//!     .decode()?
//!     .classify()
//!     .sample(&mut rng)
//!     .measure()?
//!     .construct_tours()?
//!     .select()
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages), so stages cannot be skipped or run
//! out of order.
//!
//! # Memory
//!
//! The decoded raster is dropped once classified; only its dimensions
//! survive (the renderer starts from a blank canvas). The distance matrix
//! lives from [`Sampled::measure`] until [`Measured::construct_tours`]
//! consumes it.

use rand::Rng;

use crate::classify::BinaryGrid;
use crate::distance::DistanceMatrix;
use crate::select::BestTour;
use crate::tour::{TourCollection, TourOptions};
use crate::types::{Dimensions, PipelineConfig, PipelineError, Point, RgbImage, StagedResult};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`decode`](Self::decode) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .decode() to continue"]
pub struct Pending {
    config: PipelineConfig,
    source: Vec<u8>,
}

impl Pending {
    /// The raw source image bytes.
    #[must_use]
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Validate the config, decode the source image and advance to the
    /// [`Decoded`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for an unusable config,
    /// [`PipelineError::EmptyInput`] if the source bytes are empty and
    /// [`PipelineError::ImageDecode`] if the image cannot be decoded.
    pub fn decode(self) -> Result<Decoded, PipelineError> {
        self.config.validate()?;
        let image = crate::classify::decode(&self.source)?;
        log::info!("decoded {}x{} image", image.width(), image.height());
        Ok(Decoded {
            config: self.config,
            image,
            source_len: self.source.len(),
        })
    }
}

// ───────────────────────── Stage 1: Decoded ──────────────────────────

/// Pipeline state after decoding the source image.
#[must_use = "pipeline stages are consumed by advancing; call .classify() to continue"]
pub struct Decoded {
    config: PipelineConfig,
    image: RgbImage,
    source_len: usize,
}

impl Decoded {
    /// The decoded RGB image.
    #[must_use]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Size of the encoded source in bytes.
    #[must_use]
    pub const fn source_len(&self) -> usize {
        self.source_len
    }

    /// Classify every pixel and advance to the [`Classified`] stage.
    pub fn classify(self) -> Classified {
        let grid = crate::classify::classify(&self.image, self.config.threshold);
        Classified {
            config: self.config,
            grid,
        }
    }
}

// ───────────────────────── Stage 2: Classified ───────────────────────

/// Pipeline state after foreground classification.
#[must_use = "pipeline stages are consumed by advancing; call .sample() to continue"]
pub struct Classified {
    config: PipelineConfig,
    grid: BinaryGrid,
}

impl Classified {
    /// The binary foreground grid.
    #[must_use]
    pub const fn grid(&self) -> &BinaryGrid {
        &self.grid
    }

    /// Sample tour vertices using `rng` and advance to [`Sampled`].
    pub fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> Sampled {
        let points = crate::sample::sample_points(
            &self.grid,
            self.config.stride,
            self.config.acceptance,
            rng,
        );
        if points.is_empty() {
            log::warn!("no foreground points sampled; the drawing will be blank");
        } else {
            log::info!("sampled {} points", points.len());
        }
        Sampled {
            config: self.config,
            grid: self.grid,
            points,
        }
    }
}

// ───────────────────────── Stage 3: Sampled ──────────────────────────

/// Pipeline state after point sampling.
#[must_use = "pipeline stages are consumed by advancing; call .measure() to continue"]
pub struct Sampled {
    config: PipelineConfig,
    grid: BinaryGrid,
    points: Vec<Point>,
}

impl Sampled {
    /// The sampled points in discovery order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Build the distance matrix and advance to [`Measured`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::TooManyPoints`] or
    /// [`PipelineError::MatrixAllocation`] when the matrix does not fit.
    pub fn measure(self) -> Result<Measured, PipelineError> {
        log::debug!(
            "distance matrix and tours need about {} bytes",
            PipelineConfig::estimated_peak_bytes(self.points.len()),
        );
        let matrix = DistanceMatrix::build(&self.points, self.config.max_points)?;
        Ok(Measured {
            config: self.config,
            grid: self.grid,
            points: self.points,
            matrix,
        })
    }
}

// ───────────────────────── Stage 4: Measured ─────────────────────────

/// Pipeline state after the distance matrix has been built.
#[must_use = "pipeline stages are consumed by advancing; call .construct_tours() to continue"]
pub struct Measured {
    config: PipelineConfig,
    grid: BinaryGrid,
    points: Vec<Point>,
    matrix: DistanceMatrix,
}

impl Measured {
    /// The pairwise distance matrix.
    #[must_use]
    pub const fn matrix(&self) -> &DistanceMatrix {
        &self.matrix
    }

    /// Run the nearest-neighbor heuristic from every start and advance to
    /// [`Toured`]. The distance matrix is released afterwards.
    ///
    /// # Errors
    ///
    /// Returns the first error of any run, or
    /// [`PipelineError::WorkerPool`] if the requested pool cannot start.
    pub fn construct_tours(self) -> Result<Toured, PipelineError> {
        let options = TourOptions {
            closing_edge: self.config.closing_edge,
            workers: self.config.workers,
        };
        let tours = crate::tour::construct_tours(&self.matrix, &options)?;
        Ok(Toured {
            grid: self.grid,
            points: self.points,
            tours,
        })
    }
}

// ───────────────────────── Stage 5: Toured ───────────────────────────

/// Pipeline state after every candidate tour has been built.
#[must_use = "pipeline stages are consumed by advancing; call .select() to continue"]
pub struct Toured {
    grid: BinaryGrid,
    points: Vec<Point>,
    tours: TourCollection,
}

impl Toured {
    /// All candidate tours, indexed by start.
    #[must_use]
    pub const fn tours(&self) -> &TourCollection {
        &self.tours
    }

    /// Pick the shortest candidate and advance to [`Selected`].
    pub fn select(self) -> Selected {
        let best = crate::select::select_best(&self.tours);
        match best {
            Some(b) => log::info!(
                "the shortest tour distance is {:.3} for start index {}",
                b.length,
                b.start,
            ),
            None => log::info!("no tour to select"),
        }
        Selected {
            grid: self.grid,
            points: self.points,
            tours: self.tours,
            best,
        }
    }
}

// ───────────────────────── Stage 6: Selected ─────────────────────────

/// Pipeline state after selection, the final stage.
///
/// Call [`into_result`](Self::into_result) to extract the
/// [`StagedResult`].
#[must_use = "call .into_result() to extract the StagedResult"]
pub struct Selected {
    grid: BinaryGrid,
    points: Vec<Point>,
    tours: TourCollection,
    best: Option<BestTour>,
}

impl Selected {
    /// The best tour summary, `None` when no points were sampled.
    #[must_use]
    pub const fn best(&self) -> Option<BestTour> {
        self.best
    }

    /// Image dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.grid.dimensions()
    }

    /// Consume the pipeline and return the full [`StagedResult`].
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        StagedResult {
            dimensions: self.grid.dimensions(),
            grid: self.grid,
            points: self.points,
            tours: self.tours,
            best: self.best,
        }
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental tour pipeline.
///
/// Created via [`Pipeline::new`], which stores the source image and
/// config without doing any processing.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from source image bytes and config.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(image_bytes: Vec<u8>, config: PipelineConfig) -> Pending {
        Pending {
            config,
            source: image_bytes,
        }
    }
}
