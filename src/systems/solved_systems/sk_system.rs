use nalgebra::DVector;
use tracing::debug;

use crate::error::SolveError;
use crate::systems::{kriging_system::KrigingSystem, matrix::MatrixInverse};

use super::{dot, SolvedSystem, SolvedSystemBuilder};

/// Simple kriging on zero mean values.
/// Wrap in a [`ModifiedSolvedSystemBuilder`](crate::systems::modifiers::ModifiedSolvedSystemBuilder)
/// with a mean transform for a non zero mean.
#[derive(Clone, Debug)]
pub struct SolvedSKSystemBuilder {
    pub eigenvalue_cutoff: f64,
}

impl SolvedSKSystemBuilder {
    pub fn new(eigenvalue_cutoff: f64) -> Self {
        Self { eigenvalue_cutoff }
    }
}

impl SolvedSystemBuilder for SolvedSKSystemBuilder {
    type SolvedSystem = SolvedSKSystem;

    fn build(&self, system: &KrigingSystem) -> Result<Self::SolvedSystem, SolveError> {
        let ill_conditioned = system.is_ill_conditioned();
        let weights = if ill_conditioned {
            debug!(
                condition_number = system.condition_number(),
                n = system.n_cond(),
                "solving simple kriging on truncated eigenbasis"
            );
            system
                .eigen
                .projected_solve(&system.cov_vec, self.eigenvalue_cutoff)?
        } else {
            let inv = system.cov_mat.inverse_gauss_jordan()?;
            let solution = inv * DVector::from_column_slice(&system.cov_vec);
            solution.iter().copied().collect()
        };

        Ok(SolvedSKSystem {
            weights,
            ill_conditioned,
        })
    }
}

#[derive(Clone, Debug)]
pub struct SolvedSKSystem {
    weights: Vec<f64>,
    ill_conditioned: bool,
}

impl SolvedSystem for SolvedSKSystem {
    fn weights(&self) -> &[f64] {
        &self.weights
    }

    fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.weights
    }

    #[inline(always)]
    fn estimate(&self, values: &[f64]) -> f64 {
        dot(&self.weights, values)
    }

    /// Zero, the known mean is restored by the mean transform
    fn local_mean(&self, _values: &[f64]) -> f64 {
        0.0
    }

    fn is_ill_conditioned(&self) -> bool {
        self.ill_conditioned
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    use crate::error::MatrixError;
    use crate::spatial_database::DataCell;
    use crate::variography::model_variograms::{
        composite::VariogramModel,
        structure::{StructureType, VariogramStructure},
    };

    use super::*;

    fn cell(index: usize, p: [f64; 3], value: f64) -> DataCell {
        DataCell {
            index,
            location: Point3::from(p),
            value,
            distance: 0.0,
        }
    }

    fn spherical() -> VariogramModel {
        VariogramModel::new(
            0.0,
            vec![VariogramStructure::isotropic(
                StructureType::Spherical,
                1.0,
                10.0,
            )],
        )
    }

    #[test]
    fn coincident_sample_is_honored() {
        let snap = spherical().snapshot();
        let cond = vec![cell(0, [1.0, 2.0, 3.0], 4.25)];
        let system = KrigingSystem::build(&cond, Point3::new(1.0, 2.0, 3.0), &snap, &snap).unwrap();
        let solved = SolvedSKSystemBuilder::new(1e-3).build(&system).unwrap();
        assert_eq!(solved.weights(), &[1.0]);
        assert_eq!(solved.estimate(&system.values()), 4.25);
        assert!(!solved.is_ill_conditioned());
    }

    #[test]
    fn duplicate_samples_fall_back_to_eigen_projection() {
        let snap = spherical().snapshot();
        let cond = vec![cell(0, [0.0, 0.0, 0.0], 1.0), cell(1, [0.0, 0.0, 0.0], 3.0)];
        let system = KrigingSystem::build(&cond, Point3::new(2.0, 0.0, 0.0), &snap, &snap).unwrap();

        assert!(matches!(
            system.cov_mat.inverse_gauss_jordan(),
            Err(MatrixError::Singular { .. })
        ));
        assert!(system.is_ill_conditioned());

        let solved = SolvedSKSystemBuilder::new(1e-3).build(&system).unwrap();
        assert!(solved.is_ill_conditioned());
        let estimate = solved.estimate(&system.values());
        assert!(estimate.is_finite());
        //both samples share the weight
        assert_relative_eq!(solved.weights()[0], solved.weights()[1], epsilon = 1e-12);
    }

    #[test]
    fn weights_solve_the_system() {
        let snap = spherical().snapshot();
        let cond = vec![
            cell(0, [2.0, 2.0, 0.0], 3.0),
            cell(1, [3.0, 7.0, 0.0], 4.0),
            cell(2, [9.0, 9.0, 0.0], 2.0),
            cell(3, [6.0, 5.0, 0.0], 4.0),
            cell(4, [5.0, 3.0, 0.0], 6.0),
        ];
        let system = KrigingSystem::build(&cond, Point3::new(5.0, 5.0, 0.0), &snap, &snap).unwrap();
        //no truncation so both paths solve exactly
        let solved = SolvedSKSystemBuilder::new(0.0).build(&system).unwrap();
        let lhs = &system.cov_mat * DVector::from_column_slice(solved.weights());
        assert_relative_eq!(
            lhs,
            DVector::from_column_slice(&system.cov_vec),
            epsilon = 1e-9
        );
    }
}
