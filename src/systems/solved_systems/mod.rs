use crate::error::SolveError;

use super::kriging_system::KrigingSystem;

pub mod fk_system;
pub mod negative_weight_filtered_system;
pub mod ok_system;
pub mod sk_system;

pub trait SolvedSystemBuilder: Clone + Send + Sync {
    type SolvedSystem: SolvedSystem;
    fn build(&self, system: &KrigingSystem) -> Result<Self::SolvedSystem, SolveError>;
}

/// Weights of a solved kriging system, applied to the conditioning values.
pub trait SolvedSystem {
    fn weights(&self) -> &[f64];
    fn weights_mut(&mut self) -> &mut [f64];
    fn estimate(&self, values: &[f64]) -> f64;
    fn local_mean(&self, values: &[f64]) -> f64;
    /// True when the weights came from the regularized path
    fn is_ill_conditioned(&self) -> bool;
}

#[inline(always)]
pub(crate) fn dot(weights: &[f64], values: &[f64]) -> f64 {
    weights.iter().zip(values.iter()).map(|(w, v)| w * v).sum()
}
