use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::error::MatrixError;

/// Covariance matrices with a larger eigenvalue ratio are solved on a truncated eigenbasis.
pub const ILL_CONDITIONING_THRESHOLD: f64 = 10.0;

/// Eigen decomposition of a symmetric covariance matrix.
#[derive(Clone, Debug)]
pub struct EigenAnalysis {
    eigenvalues: Vec<f64>,
    /// eigenvectors stored as columns
    eigenvectors: DMatrix<f64>,
}

impl EigenAnalysis {
    pub fn new(cov_mat: &DMatrix<f64>) -> Result<Self, MatrixError> {
        if !cov_mat.is_square() {
            return Err(MatrixError::NotSquare {
                rows: cov_mat.nrows(),
                cols: cov_mat.ncols(),
            });
        }
        let eigen = SymmetricEigen::try_new(cov_mat.clone(), f64::EPSILON, 0)
            .ok_or(MatrixError::DecompositionFailed("symmetric eigendecomposition"))?;
        Ok(Self {
            eigenvalues: eigen.eigenvalues.iter().copied().collect(),
            eigenvectors: eigen.eigenvectors,
        })
    }

    pub fn eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }

    pub fn max_eigenvalue(&self) -> f64 {
        self.eigenvalues
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min_eigenvalue(&self) -> f64 {
        self.eigenvalues
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }

    /// λmax / λmin, infinite once the smallest eigenvalue is not positive
    pub fn condition_number(&self) -> f64 {
        let min = self.min_eigenvalue();
        if min <= 0.0 {
            return f64::INFINITY;
        }
        self.max_eigenvalue() / min
    }

    pub fn is_ill_conditioned(&self) -> bool {
        self.condition_number() > ILL_CONDITIONING_THRESHOLD
    }

    /// Indices of the eigenpairs kept for a cutoff relative to the largest eigenvalue
    fn retained(&self, cutoff: f64) -> impl Iterator<Item = usize> + '_ {
        let threshold = cutoff * self.max_eigenvalue();
        self.eigenvalues
            .iter()
            .enumerate()
            .filter(move |(_, l)| **l > threshold && **l > 0.0)
            .map(|(i, _)| i)
    }

    /// Solves `A x = y` as `Σ (vᵢᵗ y / λᵢ) vᵢ` over the retained eigenpairs.
    pub fn projected_solve(&self, rhs: &[f64], cutoff: f64) -> Result<Vec<f64>, MatrixError> {
        let n = self.eigenvectors.nrows();
        if rhs.len() != n {
            return Err(MatrixError::DimensionMismatch {
                left: (n, n),
                right: (rhs.len(), 1),
            });
        }
        let y = DVector::from_column_slice(rhs);
        let mut x = DVector::<f64>::zeros(n);
        for k in self.retained(cutoff) {
            let v = self.eigenvectors.column(k);
            x.axpy(v.dot(&y) / self.eigenvalues[k], &v, 1.0);
        }
        Ok(x.iter().copied().collect())
    }

    /// `Σ vᵢ vᵢᵗ / λᵢ` over the retained eigenpairs
    pub fn truncated_inverse(&self, cutoff: f64) -> DMatrix<f64> {
        let n = self.eigenvectors.nrows();
        let mut inv = DMatrix::<f64>::zeros(n, n);
        for k in self.retained(cutoff) {
            let v = self.eigenvectors.column(k);
            inv.ger(1.0 / self.eigenvalues[k], &v, &v, 1.0);
        }
        inv
    }
}
