//! Tour construction: the nearest-neighbor heuristic run from every start.
//!
//! For a start point `s` the heuristic repeatedly walks to the closest
//! unvisited point (lowest index on ties) until every point is visited,
//! then returns to `s`. Running it from all N starts yields N candidate
//! tours, from which [`crate::select`] picks the shortest.
//!
//! Each run reads the shared [`DistanceMatrix`] and owns its visited set,
//! so the N runs are independent rayon tasks writing disjoint slots of the
//! resulting [`TourCollection`].

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::distance::DistanceMatrix;
use crate::types::{ClosingEdge, PipelineError};

/// A closed visiting order over all points.
///
/// For N >= 1, `order` has N + 1 entries: every index in `[0, N)` exactly
/// once, followed by `start` again to close the loop. For N = 0 it is
/// empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    start: usize,
    order: Vec<usize>,
    length: f64,
}

impl Tour {
    /// Create a tour from its parts.
    #[must_use]
    pub const fn new(start: usize, order: Vec<usize>, length: f64) -> Self {
        Self {
            start,
            order,
            length,
        }
    }

    /// The tour over zero points.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(0, Vec::new(), 0.0)
    }

    /// Index of the start point.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Visiting order, closed on `start`.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Total length of the tour.
    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }

    /// Returns `true` if the tour visits no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Consecutive `(from, to)` index pairs, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.order.windows(2).map(|w| (w[0], w[1]))
    }
}

/// One tour per start index, slot `s` holding the tour started at `s`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TourCollection {
    tours: Vec<Tour>,
}

impl TourCollection {
    /// Wrap tours already ordered by start index.
    #[must_use]
    pub const fn new(tours: Vec<Tour>) -> Self {
        Self { tours }
    }

    /// Number of candidate tours.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tours.len()
    }

    /// Returns `true` if there are no candidates (no points were sampled).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tours.is_empty()
    }

    /// The tour started at `start`.
    #[must_use]
    pub fn get(&self, start: usize) -> Option<&Tour> {
        self.tours.get(start)
    }

    /// All tours in start-index order.
    #[must_use]
    pub fn tours(&self) -> &[Tour] {
        &self.tours
    }

    /// Tour length per start index.
    #[must_use]
    pub fn lengths(&self) -> Vec<f64> {
        self.tours.iter().map(Tour::length).collect()
    }
}

/// Settings for [`construct_tours`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TourOptions {
    /// How the closing edge is counted.
    pub closing_edge: ClosingEdge,
    /// Worker threads; `0` uses the global rayon pool.
    pub workers: usize,
}

/// Build one closed tour from `start` by greedy nearest-neighbor steps.
///
/// At every step the row of the current point is scanned over unvisited
/// points only and the strictly smallest distance wins, so ties go to the
/// lowest index. The matrix itself is never modified.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `start` is out of range
/// and [`PipelineError::TourAllocation`] if the per-run buffers cannot be
/// reserved.
pub fn nearest_neighbor_tour(
    matrix: &DistanceMatrix,
    start: usize,
    closing_edge: ClosingEdge,
) -> Result<Tour, PipelineError> {
    let n = matrix.len();
    if start >= n {
        return Err(PipelineError::InvalidConfig(format!(
            "start index {start} out of range for {n} points"
        )));
    }

    let alloc_err = |_| PipelineError::TourAllocation { points: n };
    let mut visited: Vec<bool> = Vec::new();
    visited.try_reserve_exact(n).map_err(alloc_err)?;
    visited.resize(n, false);
    let mut order = Vec::new();
    order.try_reserve_exact(n + 1).map_err(alloc_err)?;

    visited[start] = true;
    order.push(start);
    let mut current = start;
    let mut length = 0.0;

    for _ in 1..n {
        let mut next: Option<(usize, f64)> = None;
        for (j, &d) in matrix.row(current).iter().enumerate() {
            if visited[j] {
                continue;
            }
            if next.is_none_or(|(_, best)| d < best) {
                next = Some((j, d));
            }
        }

        // At least one point is unvisited while the loop runs.
        let Some((j, d)) = next else {
            break;
        };
        visited[j] = true;
        order.push(j);
        length += d;
        current = j;
    }

    order.push(start);
    length += matrix.get(current, start) * closing_edge.factor();

    Ok(Tour::new(start, order, length))
}

/// Run the nearest-neighbor heuristic from every start index.
///
/// Starts run in parallel; completion order does not matter because each
/// result lands in the slot of its start index. If any run fails the whole
/// phase fails with that error and no partial collection is returned.
///
/// # Errors
///
/// Returns [`PipelineError::WorkerPool`] if a dedicated pool was requested
/// and could not be built, or the first error of any run.
pub fn construct_tours(
    matrix: &DistanceMatrix,
    options: &TourOptions,
) -> Result<TourCollection, PipelineError> {
    let closing_edge = options.closing_edge;
    construct_with(matrix.len(), options.workers, |start| {
        nearest_neighbor_tour(matrix, start, closing_edge)
    })
}

/// Run `tour_from` for every start in `[0, n)` in parallel, collecting
/// the results into their start slots.
fn construct_with<F>(
    n: usize,
    workers: usize,
    tour_from: F,
) -> Result<TourCollection, PipelineError>
where
    F: Fn(usize) -> Result<Tour, PipelineError> + Sync,
{
    let run = || {
        (0..n)
            .into_par_iter()
            .map(|start| {
                let tour = tour_from(start)?;
                log::debug!("start {start}: tour length {:.3}", tour.length());
                Ok(tour)
            })
            .collect::<Result<Vec<_>, PipelineError>>()
    };

    let tours = if workers == 0 {
        run()?
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| PipelineError::WorkerPool(e.to_string()))?;
        pool.install(run)?
    };

    Ok(TourCollection::new(tours))
}
