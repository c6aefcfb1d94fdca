use nalgebra::{DMatrix, Point3};
use serde::{Deserialize, Serialize};

use crate::spatial_database::DataCell;
use crate::variography::model_variograms::{composite::VariogramSnapshot, VariogramValue};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KrigingType {
    /// known constant mean
    Simple,
    /// unknown local mean, weights constrained to sum to one
    #[default]
    Ordinary,
}

impl KrigingType {
    /// Extra row and column holding the unbiasedness constraint
    #[inline(always)]
    pub fn n_constraints(&self) -> usize {
        match self {
            KrigingType::Simple => 0,
            KrigingType::Ordinary => 1,
        }
    }
}

/// Assembles the left and right hand sides of point support kriging systems.
pub struct CovarianceSystemBuilder;

impl CovarianceSystemBuilder {
    /// Sample to sample matrix.
    /// For ordinary kriging the last row and column hold ones with a zero corner.
    pub fn build_cov_mat(
        cond: &[DataCell],
        vgram: &VariogramSnapshot,
        value: VariogramValue,
        kriging_type: KrigingType,
    ) -> DMatrix<f64> {
        let n = cond.len();
        let size = n + kriging_type.n_constraints();
        let mut cov_mat = DMatrix::zeros(size, size);

        //compute lower triangle and mirror it
        for (i, c1) in cond.iter().enumerate() {
            for (j, c2) in cond.iter().take(i + 1).enumerate() {
                let v = vgram.evaluate(&c1.location, &c2.location, value);
                cov_mat[(i, j)] = v;
                cov_mat[(j, i)] = v;
            }
        }

        if kriging_type == KrigingType::Ordinary {
            for i in 0..n {
                cov_mat[(i, n)] = 1.0;
                cov_mat[(n, i)] = 1.0;
            }
        }

        cov_mat
    }

    /// Sample to target vector, ordinary kriging appends the constraint value 1
    pub fn build_cov_vec(
        cond: &[DataCell],
        target: &Point3<f64>,
        vgram: &VariogramSnapshot,
        value: VariogramValue,
        kriging_type: KrigingType,
    ) -> Vec<f64> {
        let mut cov_vec = Vec::with_capacity(cond.len() + kriging_type.n_constraints());
        cov_vec.extend(
            cond.iter()
                .map(|c| vgram.evaluate(&c.location, target, value)),
        );
        if kriging_type == KrigingType::Ordinary {
            cov_vec.push(1.0);
        }
        cov_vec
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::variography::model_variograms::{
        composite::VariogramModel,
        structure::{StructureType, VariogramStructure},
    };

    use super::*;

    fn cells() -> Vec<DataCell> {
        [[0.0, 0.0, 0.0], [3.0, 4.0, 0.0], [10.0, 0.0, 0.0]]
            .iter()
            .enumerate()
            .map(|(index, p)| DataCell {
                index,
                location: Point3::from(*p),
                value: index as f64,
                distance: 0.0,
            })
            .collect()
    }

    fn snapshot() -> VariogramSnapshot {
        VariogramModel::new(
            0.1,
            vec![VariogramStructure::isotropic(
                StructureType::Spherical,
                0.9,
                20.0,
            )],
        )
        .snapshot()
    }

    #[test]
    fn simple_kriging_matrix_is_symmetric_with_sill_diagonal() {
        let m = CovarianceSystemBuilder::build_cov_mat(
            &cells(),
            &snapshot(),
            VariogramValue::Covariance,
            KrigingType::Simple,
        );
        assert_eq!(m.shape(), (3, 3));
        for i in 0..3 {
            assert_relative_eq!(m[(i, i)], 1.0);
            for j in 0..3 {
                assert_eq!(m[(i, j)], m[(j, i)]);
            }
        }
        assert!(m[(0, 1)] > m[(0, 2)]);
    }

    #[test]
    fn ordinary_kriging_system_is_bordered() {
        let cond = cells();
        let snap = snapshot();
        let m = CovarianceSystemBuilder::build_cov_mat(
            &cond,
            &snap,
            VariogramValue::Semivariance,
            KrigingType::Ordinary,
        );
        assert_eq!(m.shape(), (4, 4));
        assert_eq!(m[(3, 3)], 0.0);
        assert_eq!(m[(0, 0)], 0.0);
        assert_eq!(m[(3, 1)], 1.0);
        assert_eq!(m[(2, 3)], 1.0);

        let v = CovarianceSystemBuilder::build_cov_vec(
            &cond,
            &Point3::new(1.0, 1.0, 0.0),
            &snap,
            VariogramValue::Semivariance,
            KrigingType::Ordinary,
        );
        assert_eq!(v.len(), 4);
        assert_eq!(v[3], 1.0);
        assert_relative_eq!(
            v[0],
            snap.semivariance(&cond[0].location, &Point3::new(1.0, 1.0, 0.0))
        );
    }
}
