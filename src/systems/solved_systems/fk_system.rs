use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::SolveError;
use crate::systems::{kriging_system::KrigingSystem, matrix::MatrixInverse};

use super::{dot, SolvedSystem, SolvedSystemBuilder};

/// Factorial kriging with a constant drift.
///
/// The local mean is the generalized least squares estimate
/// `m = (Pᵗ C⁻¹ P)⁻¹ Pᵗ C⁻¹ z` with `P = 1ₙ`, `p = [1]`, and the factor is kriged from the residuals:
/// `λ = C⁻¹ c - C⁻¹ P (Pᵗ C⁻¹ P)⁻¹ Pᵗ C⁻¹ c`
/// where `C` is the full model covariance matrix and `c` the covariance of the target factor.
///
/// Ma, Y. Z., Royer, J. J., Wang, H., Wang, Y., & Zhang, T. (2014).
/// Factorial kriging for multiscale modelling.
/// Journal of the Southern African Institute of Mining and Metallurgy, 114(8), 651-659.
#[derive(Clone, Debug)]
pub struct SolvedFKSystemBuilder {
    pub eigenvalue_cutoff: f64,
}

impl SolvedFKSystemBuilder {
    pub fn new(eigenvalue_cutoff: f64) -> Self {
        Self { eigenvalue_cutoff }
    }

    fn inverse(&self, system: &KrigingSystem) -> Result<(DMatrix<f64>, bool), SolveError> {
        if system.is_ill_conditioned() {
            debug!(
                condition_number = system.condition_number(),
                n = system.n_cond(),
                "factorial kriging on truncated eigenbasis"
            );
            Ok((system.eigen.truncated_inverse(self.eigenvalue_cutoff), true))
        } else {
            Ok((system.cov_mat.inverse_gauss_jordan()?, false))
        }
    }
}

impl SolvedSystemBuilder for SolvedFKSystemBuilder {
    type SolvedSystem = SolvedFKSystem;

    fn build(&self, system: &KrigingSystem) -> Result<Self::SolvedSystem, SolveError> {
        let n = system.n_cond();
        let (inv, ill_conditioned) = self.inverse(system)?;

        //drift functions
        let p_mat = DMatrix::from_element(n, 1, 1.0);
        let p_vec = DVector::from_element(1, 1.0);
        let p_t = p_mat.transpose();

        let cinv_p = &inv * &p_mat;
        let gls_inv = (&p_t * &cinv_p).inverse_gauss_jordan()?;
        let cinv_p_gls = &cinv_p * &gls_inv;

        let mean_weights = (&cinv_p_gls * &p_vec).iter().copied().collect();

        let cinv_c = &inv * DVector::from_column_slice(&system.cov_vec);
        let drift_part = &cinv_p_gls * (&p_t * &cinv_c);
        let factor_weights = (cinv_c - drift_part).iter().copied().collect();

        Ok(SolvedFKSystem {
            factor_weights,
            mean_weights,
            ill_conditioned,
        })
    }
}

#[derive(Clone, Debug)]
pub struct SolvedFKSystem {
    factor_weights: Vec<f64>,
    mean_weights: Vec<f64>,
    ill_conditioned: bool,
}

impl SolvedFKSystem {
    pub fn mean_weights(&self) -> &[f64] {
        &self.mean_weights
    }
}

impl SolvedSystem for SolvedFKSystem {
    fn weights(&self) -> &[f64] {
        &self.factor_weights
    }

    fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.factor_weights
    }

    /// Factor value, kriged from the residuals to the local mean
    fn estimate(&self, values: &[f64]) -> f64 {
        let mean = self.local_mean(values);
        self.factor_weights
            .iter()
            .zip(values.iter())
            .map(|(w, v)| w * (v - mean))
            .sum()
    }

    fn local_mean(&self, values: &[f64]) -> f64 {
        dot(&self.mean_weights, values)
    }

    fn is_ill_conditioned(&self) -> bool {
        self.ill_conditioned
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    use crate::spatial_database::DataCell;
    use crate::systems::solved_systems::ok_system::SolvedOKSystemBuilder;
    use crate::variography::model_variograms::{
        composite::VariogramModel,
        structure::{StructureType, VariogramStructure},
    };

    use super::*;

    fn cells() -> Vec<DataCell> {
        [
            ([0.0, 0.0, 0.0], 1.0),
            ([10.0, 0.0, 0.0], 3.0),
            ([0.0, 10.0, 0.0], 2.0),
            ([10.0, 10.0, 0.0], 6.0),
        ]
        .iter()
        .enumerate()
        .map(|(index, (p, value))| DataCell {
            index,
            location: Point3::from(*p),
            value: *value,
            distance: 0.0,
        })
        .collect()
    }

    fn model() -> VariogramModel {
        VariogramModel::new(
            0.2,
            vec![
                VariogramStructure::isotropic(StructureType::Spherical, 0.5, 8.0),
                VariogramStructure::isotropic(StructureType::Exponential, 0.3, 40.0),
            ],
        )
    }

    #[test]
    fn mean_weights_sum_to_one_and_factor_weights_to_zero() {
        let cond = cells();
        let snap = model().snapshot();
        let target = model().single_structure(1).unwrap().snapshot();
        let system =
            KrigingSystem::build(&cond, Point3::new(4.0, 3.0, 0.0), &snap, &target).unwrap();
        let solved = SolvedFKSystemBuilder::new(1e-3).build(&system).unwrap();
        assert_relative_eq!(
            solved.mean_weights().iter().sum::<f64>(),
            1.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(solved.weights().iter().sum::<f64>(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn mean_plus_total_factor_is_ordinary_kriging() {
        let cond = cells();
        let snap = model().snapshot();
        let system = KrigingSystem::build(&cond, Point3::new(4.0, 3.0, 0.0), &snap, &snap).unwrap();
        let fk = SolvedFKSystemBuilder::new(0.0).build(&system).unwrap();
        let ok = SolvedOKSystemBuilder::default().build(&system).unwrap();
        let values = system.values();
        assert_relative_eq!(
            fk.local_mean(&values) + fk.estimate(&values),
            ok.estimate(&values),
            epsilon = 1e-9
        );
        assert_relative_eq!(fk.local_mean(&values), ok.local_mean(&values), epsilon = 1e-9);
    }

    #[test]
    fn duplicate_samples_use_the_truncated_inverse() {
        let mut cond = cells();
        cond.push(DataCell {
            index: 4,
            value: 5.0,
            ..cond[1]
        });
        let snap = model().snapshot();
        let target = model().single_structure(1).unwrap().snapshot();
        let system =
            KrigingSystem::build(&cond, Point3::new(8.0, 2.0, 0.0), &snap, &target).unwrap();
        assert!(system.is_ill_conditioned());

        let solved = SolvedFKSystemBuilder::new(1e-3).build(&system).unwrap();
        assert!(solved.is_ill_conditioned());
        assert_relative_eq!(
            solved.mean_weights().iter().sum::<f64>(),
            1.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(solved.weights().iter().sum::<f64>(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(
            solved.mean_weights()[1],
            solved.mean_weights()[4],
            epsilon = 1e-9
        );
        let values = system.values();
        assert!(solved.local_mean(&values).is_finite());
        assert!(solved.estimate(&values).is_finite());
    }
}
