//! Dense pairwise Euclidean distance matrix over the sampled points.
//!
//! The matrix is the dominant memory cost of the pipeline (`8 * N * N`
//! bytes), so construction checks capacity up front and fails with a
//! typed error instead of aborting on allocation failure.

use crate::types::{PipelineError, Point};

/// Symmetric `N x N` matrix of Euclidean distances, stored row-major.
///
/// Invariants: `get(i, j) == get(j, i)`, `get(i, i) == 0.0`, every entry
/// is non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Build the matrix for `points`.
    ///
    /// Each unordered pair is computed once and written to both `(i, j)`
    /// and `(j, i)`. The diagonal stays zero.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::TooManyPoints`] if `points.len()` exceeds
    /// `max_points`, and [`PipelineError::MatrixAllocation`] if the
    /// buffer size overflows or cannot be reserved.
    pub fn build(points: &[Point], max_points: usize) -> Result<Self, PipelineError> {
        let n = points.len();
        if n > max_points {
            return Err(PipelineError::TooManyPoints {
                points: n,
                limit: max_points,
            });
        }

        let len = n
            .checked_mul(n)
            .ok_or(PipelineError::MatrixAllocation {
                points: n,
                bytes: usize::MAX,
            })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| PipelineError::MatrixAllocation {
                points: n,
                bytes: len.saturating_mul(size_of::<f64>()),
            })?;
        data.resize(len, 0.0);

        for i in 0..n {
            for j in (i + 1)..n {
                let d = points[i].distance(points[j]);
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }

        Ok(Self { n, data })
    }

    /// Wrap an explicit row-major matrix.
    ///
    /// Intended for synthetic inputs (tests, precomputed metrics). The
    /// caller is responsible for symmetry and a zero diagonal.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `data.len() != n * n`
    /// or any entry is negative or NaN.
    pub fn from_rows(n: usize, data: Vec<f64>) -> Result<Self, PipelineError> {
        if Some(data.len()) != n.checked_mul(n) {
            return Err(PipelineError::InvalidConfig(format!(
                "distance matrix for {n} points needs {} entries, got {}",
                n.saturating_mul(n),
                data.len(),
            )));
        }
        if data.iter().any(|d| d.is_nan() || *d < 0.0) {
            return Err(PipelineError::InvalidConfig(
                "distances must be non-negative numbers".to_string(),
            ));
        }
        Ok(Self { n, data })
    }

    /// Number of points (rows).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.n
    }

    /// Returns `true` if the matrix covers no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance between points `i` and `j`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// All distances from point `i`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Size of the backing buffer in bytes.
    #[must_use]
    pub const fn byte_size(&self) -> usize {
        self.data.len() * size_of::<f64>()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pts(coords: &[(u32, u32)]) -> Vec<Point> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Point::new(i, x, y))
            .collect()
    }

    #[test]
    fn empty_points_build_empty_matrix() {
        let m = DistanceMatrix::build(&[], 10).unwrap();
        assert!(m.is_empty());
        assert_eq!(m.byte_size(), 0);
    }

    #[test]
    fn single_point_has_zero_diagonal() {
        let m = DistanceMatrix::build(&pts(&[(3, 4)]), 10).unwrap();
        assert_eq!(m.len(), 1);
        assert!(m.get(0, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn entries_are_euclidean() {
        let m = DistanceMatrix::build(&pts(&[(0, 0), (3, 4), (6, 8)]), 10).unwrap();
        assert!((m.get(0, 1) - 5.0).abs() < 1e-12);
        assert!((m.get(0, 2) - 10.0).abs() < 1e-12);
        assert!((m.get(1, 2) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn matrix_is_symmetric_with_zero_diagonal() {
        let points = pts(&[(0, 0), (17, 3), (8, 40), (25, 25), (1, 99), (60, 2)]);
        let m = DistanceMatrix::build(&points, 100).unwrap();
        for i in 0..m.len() {
            assert!(m.get(i, i).abs() < f64::EPSILON);
            for j in 0..m.len() {
                assert!(m.get(i, j) >= 0.0);
                assert!(
                    (m.get(i, j) - m.get(j, i)).abs() < f64::EPSILON,
                    "asymmetric at ({i}, {j})",
                );
            }
        }
    }

    #[test]
    fn triangle_inequality_holds() {
        let points = pts(&[(0, 0), (17, 3), (8, 40), (25, 25)]);
        let m = DistanceMatrix::build(&points, 100).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    assert!(m.get(i, k) <= m.get(i, j) + m.get(j, k) + 1e-9);
                }
            }
        }
    }

    #[test]
    fn row_matches_get() {
        let m = DistanceMatrix::build(&pts(&[(0, 0), (0, 10), (10, 10)]), 10).unwrap();
        let row = m.row(1);
        assert_eq!(row.len(), 3);
        for (j, d) in row.iter().enumerate() {
            assert!((d - m.get(1, j)).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn too_many_points_fails_before_allocating() {
        let points = pts(&[(0, 0), (1, 1), (2, 2)]);
        let result = DistanceMatrix::build(&points, 2);
        assert!(matches!(
            result,
            Err(PipelineError::TooManyPoints {
                points: 3,
                limit: 2
            })
        ));
    }

    #[test]
    fn from_rows_checks_shape() {
        let result = DistanceMatrix::from_rows(2, vec![0.0, 1.0, 1.0]);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn from_rows_rejects_negative_entries() {
        let result = DistanceMatrix::from_rows(2, vec![0.0, -1.0, -1.0, 0.0]);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }
}
