//! Tour selection: pick the shortest candidate.

use serde::{Deserialize, Serialize};

use crate::tour::TourCollection;

/// The winning start index and its tour length.
///
/// The tour itself stays in the [`TourCollection`]; look it up with
/// [`TourCollection::get`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestTour {
    /// Start index of the shortest tour.
    pub start: usize,
    /// Its length.
    pub length: f64,
}

/// Scan `tours` in start-index order and return the shortest.
///
/// The running best starts at `+inf` so every real length is considered,
/// and only a strictly shorter tour replaces it, so the lowest start index
/// wins ties. Returns `None` for an empty collection.
#[must_use]
pub fn select_best(tours: &TourCollection) -> Option<BestTour> {
    let mut best: Option<BestTour> = None;
    let mut best_length = f64::INFINITY;

    for (start, tour) in tours.tours().iter().enumerate() {
        if best.is_none() || tour.length() < best_length {
            best_length = tour.length();
            best = Some(BestTour {
                start,
                length: best_length,
            });
        }
    }

    best
}
