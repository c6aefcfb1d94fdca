use nalgebra::DVector;
use tracing::debug;

use crate::error::SolveError;
use crate::systems::{
    kriging_system::KrigingSystem,
    matrix::MatrixInverse,
    system_builder::{CovarianceSystemBuilder, KrigingType},
};
use crate::variography::model_variograms::VariogramValue;

use super::{dot, SolvedSystem, SolvedSystemBuilder};

/// Ordinary kriging through the system bordered by the unbiasedness constraint.
/// `convention` selects whether the bordered matrix holds covariances or semivariances,
/// both give the same weights.
#[derive(Clone, Debug, Default)]
pub struct SolvedOKSystemBuilder {
    pub convention: VariogramValue,
}

impl SolvedOKSystemBuilder {
    pub fn new(convention: VariogramValue) -> Self {
        Self { convention }
    }
}

impl SolvedSystemBuilder for SolvedOKSystemBuilder {
    type SolvedSystem = SolvedOKSystem;

    fn build(&self, system: &KrigingSystem) -> Result<Self::SolvedSystem, SolveError> {
        let n = system.n_cond();
        let lhs = CovarianceSystemBuilder::build_cov_mat(
            system.cond,
            system.model,
            self.convention,
            KrigingType::Ordinary,
        );
        let rhs = CovarianceSystemBuilder::build_cov_vec(
            system.cond,
            &system.target,
            system.target_model,
            self.convention,
            KrigingType::Ordinary,
        );

        let ill_conditioned = system.is_ill_conditioned();
        let inv = if ill_conditioned {
            debug!(
                condition_number = system.condition_number(),
                n,
                "solving ordinary kriging with pseudoinverse"
            );
            MatrixInverse::pseudo_inverse(&lhs)?
        } else {
            lhs.inverse_gauss_jordan()?
        };

        let solution = &inv * DVector::from_vec(rhs);
        //last column of the inverse is the response to the constraint alone
        let mean_weights = (0..n).map(|i| inv[(i, n)]).collect();

        Ok(SolvedOKSystem {
            weights: solution.rows(0, n).iter().copied().collect(),
            lagrange: solution[n],
            mean_weights,
            ill_conditioned,
        })
    }
}

#[derive(Clone, Debug)]
pub struct SolvedOKSystem {
    weights: Vec<f64>,
    lagrange: f64,
    mean_weights: Vec<f64>,
    ill_conditioned: bool,
}

impl SolvedOKSystem {
    pub fn lagrange_multiplier(&self) -> f64 {
        self.lagrange
    }

    pub fn mean_weights(&self) -> &[f64] {
        &self.mean_weights
    }
}

impl SolvedSystem for SolvedOKSystem {
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

    /// Kriged local mean
    fn local_mean(&self, values: &[f64]) -> f64 {
        dot(&self.mean_weights, values)
    }

    fn is_ill_conditioned(&self) -> bool {
        self.ill_conditioned
    }
}
