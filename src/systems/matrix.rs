use nalgebra::DMatrix;
use tracing::warn;

use crate::error::MatrixError;

/// Inverses of the dense covariance matrices of kriging systems.
pub trait MatrixInverse: Sized {
    /// In place Gauss-Jordan inversion with full pivoting.
    /// On a zero pivot the matrix is left partially reduced
    /// and [`MatrixError::Singular`] is returned.
    fn invert_gauss_jordan(&mut self) -> Result<(), MatrixError>;

    /// Gauss-Jordan inverse of a copy, leaves `self` untouched
    fn inverse_gauss_jordan(&self) -> Result<Self, MatrixError>;

    /// Moore-Penrose pseudoinverse `V Σ† Uᵗ` from the singular value decomposition.
    /// Singular values below `ε · max(rows, cols) · σ_max` are treated as zero.
    fn pseudo_inverse(&self) -> Result<Self, MatrixError>;
}

impl MatrixInverse for DMatrix<f64> {
    fn invert_gauss_jordan(&mut self) -> Result<(), MatrixError> {
        if !self.is_square() {
            return Err(MatrixError::NotSquare {
                rows: self.nrows(),
                cols: self.ncols(),
            });
        }
        let n = self.nrows();
        let mut index_col = vec![0usize; n];
        let mut index_row = vec![0usize; n];
        let mut pivoted = vec![false; n];

        for i in 0..n {
            // search the whole unreduced submatrix for the pivot
            let mut big = 0.0;
            let (mut row, mut col) = (0, 0);
            for j in (0..n).filter(|&j| !pivoted[j]) {
                for k in (0..n).filter(|&k| !pivoted[k]) {
                    let candidate = self[(j, k)].abs();
                    if candidate >= big {
                        big = candidate;
                        row = j;
                        col = k;
                    }
                }
            }
            pivoted[col] = true;

            // pivot lands on the diagonal
            if row != col {
                self.swap_rows(row, col);
            }
            index_row[i] = row;
            index_col[i] = col;

            let pivot = self[(col, col)];
            if pivot == 0.0 {
                warn!(n, column = col, "Gauss-Jordan inversion hit a zero pivot");
                return Err(MatrixError::Singular { column: col });
            }

            self[(col, col)] = 1.0;
            let mut pivot_row = self.row_mut(col);
            pivot_row /= pivot;
            let pivot_row = pivot_row.clone_owned();

            for r in (0..n).filter(|&r| r != col) {
                let factor = self[(r, col)];
                if factor == 0.0 {
                    continue;
                }
                self[(r, col)] = 0.0;
                let mut target = self.row_mut(r);
                target -= &pivot_row * factor;
            }
        }

        // undo the column permutations in reverse order
        for l in (0..n).rev() {
            if index_row[l] != index_col[l] {
                self.swap_columns(index_row[l], index_col[l]);
            }
        }
        Ok(())
    }

    fn inverse_gauss_jordan(&self) -> Result<Self, MatrixError> {
        let mut inv = self.clone();
        inv.invert_gauss_jordan()?;
        Ok(inv)
    }

    fn pseudo_inverse(&self) -> Result<Self, MatrixError> {
        let svd = self
            .clone()
            .try_svd(true, true, f64::EPSILON, 0)
            .ok_or(MatrixError::DecompositionFailed("singular value decomposition"))?;
        let (Some(u), Some(v_t)) = (svd.u.as_ref(), svd.v_t.as_ref()) else {
            return Err(MatrixError::DecompositionFailed("singular value decomposition"));
        };

        let sigma_max = svd.singular_values.max();
        let cutoff = f64::EPSILON * self.nrows().max(self.ncols()) as f64 * sigma_max;

        let sigma_inv = svd
            .singular_values
            .map(|s| if s > cutoff { 1.0 / s } else { 0.0 });

        Ok(v_t.transpose() * DMatrix::from_diagonal(&sigma_inv) * u.transpose())
    }
}
