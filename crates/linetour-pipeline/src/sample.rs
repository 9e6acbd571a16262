//! Stochastic point sampling over a coarse grid.
//!
//! Visits every `stride`-th row and column of a [`BinaryGrid`] and keeps a
//! random fraction of the foreground cells as tour vertices. The random
//! source is injected so that runs are reproducible under a fixed seed.

use rand::Rng;
use rand::distributions::Standard;

use crate::classify::BinaryGrid;
use crate::types::Point;

/// Sample tour vertices from the foreground of `grid`.
///
/// Rows are the outer loop and columns the inner loop, both stepping by
/// `stride` from 0. Exactly one uniform draw in `[0, 1)` is consumed per
/// visited cell, before the foreground test, so the random stream advances
/// identically regardless of image content. A cell is kept when the draw
/// is below `acceptance` and the cell is foreground.
///
/// Returned points carry dense indices in discovery order.
///
/// A `stride` of zero is treated as one.
pub fn sample_points<R: Rng + ?Sized>(
    grid: &BinaryGrid,
    stride: u32,
    acceptance: f64,
    rng: &mut R,
) -> Vec<Point> {
    let step = stride.max(1) as usize;
    let mut points = Vec::new();

    for y in (0..grid.height()).step_by(step) {
        for x in (0..grid.width()).step_by(step) {
            let draw: f64 = rng.sample(Standard);
            if draw < acceptance && grid.is_foreground(x, y) {
                points.push(Point::new(points.len(), x, y));
            }
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{RngCore, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn all_foreground(width: u32, height: u32) -> BinaryGrid {
        BinaryGrid::from_fn(width, height, |_, _| true)
    }

    #[test]
    fn same_seed_same_points() {
        let grid = all_foreground(64, 48);
        let mut a = Xoshiro256PlusPlus::seed_from_u64(7);
        let mut b = Xoshiro256PlusPlus::seed_from_u64(7);
        let first = sample_points(&grid, 4, 0.5, &mut a);
        let second = sample_points(&grid, 4, 0.5, &mut b);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn acceptance_one_keeps_every_grid_cell() {
        let grid = all_foreground(10, 9);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let points = sample_points(&grid, 4, 1.0, &mut rng);
        // x in {0, 4, 8}, y in {0, 4, 8}.
        assert_eq!(points.len(), 9);
        assert_eq!(points[0], Point::new(0, 0, 0));
        assert_eq!(points[1], Point::new(1, 4, 0));
        assert_eq!(points[3], Point::new(3, 0, 4));
        assert_eq!(points[8], Point::new(8, 8, 8));
    }

    #[test]
    fn acceptance_zero_keeps_nothing() {
        let grid = all_foreground(32, 32);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        assert!(sample_points(&grid, 4, 0.0, &mut rng).is_empty());
    }

    #[test]
    fn only_grid_coordinates_are_sampled() {
        let grid = all_foreground(40, 40);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(99);
        for p in sample_points(&grid, 4, 0.5, &mut rng) {
            assert_eq!(p.x % 4, 0);
            assert_eq!(p.y % 4, 0);
        }
    }

    #[test]
    fn background_cells_are_skipped() {
        // Only the column x == 8 is foreground.
        let grid = BinaryGrid::from_fn(16, 16, |x, _| x == 8);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let points = sample_points(&grid, 4, 1.0, &mut rng);
        assert_eq!(points.len(), 4);
        assert!(points.iter().all(|p| p.x == 8));
    }

    #[test]
    fn indices_are_dense_in_discovery_order() {
        let grid = all_foreground(64, 64);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        let points = sample_points(&grid, 4, 0.5, &mut rng);
        for (i, p) in points.iter().enumerate() {
            assert_eq!(p.index, i);
        }
        // Row-major: y never decreases, and x increases within a row.
        for pair in points.windows(2) {
            assert!(
                pair[0].y < pair[1].y || (pair[0].y == pair[1].y && pair[0].x < pair[1].x),
                "out of order: {:?} then {:?}",
                pair[0],
                pair[1],
            );
        }
    }

    #[test]
    fn random_stream_is_independent_of_content() {
        // The same seed over an empty and a full grid must consume the
        // same number of draws, leaving both generators in the same state.
        let empty = BinaryGrid::from_fn(20, 20, |_, _| false);
        let full = all_foreground(20, 20);
        let mut a = Xoshiro256PlusPlus::seed_from_u64(5);
        let mut b = Xoshiro256PlusPlus::seed_from_u64(5);
        let _ = sample_points(&empty, 4, 0.5, &mut a);
        let _ = sample_points(&full, 4, 0.5, &mut b);
        assert_eq!(a.next_u64(), b.next_u64());
    }
}
