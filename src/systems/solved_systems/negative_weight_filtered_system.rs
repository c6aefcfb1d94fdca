use tracing::warn;

use crate::error::SolveError;
use crate::systems::kriging_system::KrigingSystem;

use super::{SolvedSystem, SolvedSystemBuilder};

/// Corrected weights summing below this value are considered collapsed
pub const MIN_CORRECTED_WEIGHT_SUM: f64 = 1e-4;

#[derive(Clone, Debug)]
pub struct SolvedNegativeWeightFilteredSystemBuilder<S> {
    system: S,
}

impl<S> SolvedNegativeWeightFilteredSystemBuilder<S> {
    pub fn new(system: S) -> Self {
        SolvedNegativeWeightFilteredSystemBuilder { system }
    }
}

impl<S> SolvedSystemBuilder for SolvedNegativeWeightFilteredSystemBuilder<S>
where
    S: SolvedSystemBuilder,
{
    type SolvedSystem = SolvedNegativeWeightFilteredSystem<S::SolvedSystem>;

    /// Clayton V. Deutsch,
    /// Correcting for negative weights in ordinary kriging,
    /// Computers & Geosciences,
    /// Volume 22, Issue 7,
    /// 1996,
    /// Pages 765-773,
    /// ISSN 0098-3004,
    /// https://doi.org/10.1016/0098-3004(96)00005-2.
    fn build(&self, system: &KrigingSystem) -> Result<Self::SolvedSystem, SolveError> {
        // 1. Determine estimation node - data covariance values
        // 2. Compute weights
        // 3. Compute average absolute magnitude of negative weights
        // 4. Compute the average covariance between the estimation node and the data with negative weights
        // 5. Assign a weight of 0 to all negative weights
        // 6. Assign a weight of 0 to all data satisfying both:
        //    - the absolute magnitude of the weight is less than the average absolute magnitude of negative weights
        //    - the covariance is less than the average covariance of the data with negative weights
        // 7. Normalize the weights

        // 1. Determine estimation node - data covariance values
        let cov = &system.cov_vec;

        // 2. Compute weights
        let mut sys = self.system.build(system)?;

        // 3, 4. Average magnitude and covariance of negative weights
        let mut weight_sum = 0.0;
        let mut covariance_sum = 0.0;
        let mut count = 0;
        for (w, c) in sys.weights().iter().zip(cov.iter()) {
            if *w < 0.0 {
                weight_sum += w.abs();
                covariance_sum += *c;
                count += 1;
            }
        }
        if count == 0 {
            return Ok(SolvedNegativeWeightFilteredSystem { system: sys });
        }
        let avg_abs_neg_weight = weight_sum / count as f64;
        let avg_neg_cov = covariance_sum / count as f64;

        // 5, 6. Zero out negative and small, weakly correlated weights
        let mut total = 0.0;
        for (w, c) in sys.weights_mut().iter_mut().zip(cov.iter()) {
            if *w < 0.0 || (w.abs() < avg_abs_neg_weight && *c < avg_neg_cov) {
                *w = 0.0;
            }
            total += *w;
        }

        if total < MIN_CORRECTED_WEIGHT_SUM {
            warn!(
                weight_sum = total,
                n = system.n_cond(),
                "negative weight correction removed every weight"
            );
            return Err(SolveError::CollapsedWeights(total));
        }

        // 7. Normalize the weights
        sys.weights_mut().iter_mut().for_each(|w| *w /= total);

        Ok(SolvedNegativeWeightFilteredSystem { system: sys })
    }
}

#[derive(Clone, Debug)]
pub struct SolvedNegativeWeightFilteredSystem<S> {
    system: S,
}

impl<S> SolvedNegativeWeightFilteredSystem<S> {
    pub fn inner(&self) -> &S {
        &self.system
    }
}

/// Once constructed every negative weight has been addressed,
/// all methods forward to the underlying system.
impl<S> SolvedSystem for SolvedNegativeWeightFilteredSystem<S>
where
    S: SolvedSystem,
{
    fn weights(&self) -> &[f64] {
        self.system.weights()
    }

    fn weights_mut(&mut self) -> &mut [f64] {
        self.system.weights_mut()
    }

    fn estimate(&self, values: &[f64]) -> f64 {
        self.system.estimate(values)
    }

    fn local_mean(&self, values: &[f64]) -> f64 {
        self.system.local_mean(values)
    }

    fn is_ill_conditioned(&self) -> bool {
        self.system.is_ill_conditioned()
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

    fn cell(index: usize, p: [f64; 3], value: f64) -> DataCell {
        DataCell {
            index,
            location: Point3::from(p),
            value,
            distance: 0.0,
        }
    }

    /// gaussian models screen hidden samples strongly enough to produce negative weights
    fn screening_setup() -> (Vec<DataCell>, VariogramModel) {
        let cond = vec![
            cell(0, [1.0, 0.0, 0.0], 1.0),
            cell(1, [2.0, 0.0, 0.0], 2.0),
            cell(2, [3.0, 0.0, 0.0], 3.0),
            cell(3, [0.0, 1.0, 0.0], 4.0),
            cell(4, [0.0, 2.5, 0.0], 5.0),
            cell(5, [-1.5, -1.5, 0.0], 6.0),
        ];
        let model = VariogramModel::new(
            0.0,
            vec![VariogramStructure::isotropic(
                StructureType::Gaussian,
                1.0,
                6.0,
            )],
        );
        (cond, model)
    }

    #[test]
    fn corrected_weights_are_non_negative_and_sum_to_one() {
        let (cond, model) = screening_setup();
        let snap = model.snapshot();
        let system = KrigingSystem::build(&cond, Point3::origin(), &snap, &snap).unwrap();

        let raw = SolvedOKSystemBuilder::default().build(&system).unwrap();
        assert!(raw.weights().iter().any(|w| *w < 0.0));

        let corrected =
            SolvedNegativeWeightFilteredSystemBuilder::new(SolvedOKSystemBuilder::default())
                .build(&system)
                .unwrap();
        assert!(corrected.weights().iter().all(|w| *w >= 0.0));
        assert_relative_eq!(
            corrected.weights().iter().sum::<f64>(),
            1.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn positive_weights_are_left_alone() {
        let cond = vec![
            cell(0, [1.0, 0.0, 0.0], 1.0),
            cell(1, [-1.0, 0.0, 0.0], 3.0),
        ];
        let model = VariogramModel::new(
            0.0,
            vec![VariogramStructure::isotropic(
                StructureType::Spherical,
                1.0,
                10.0,
            )],
        );
        let snap = model.snapshot();
        let system = KrigingSystem::build(&cond, Point3::origin(), &snap, &snap).unwrap();
        let corrected =
            SolvedNegativeWeightFilteredSystemBuilder::new(SolvedOKSystemBuilder::default())
                .build(&system)
                .unwrap();
        assert_relative_eq!(corrected.weights()[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(corrected.estimate(&system.values()), 2.0, epsilon = 1e-12);
    }
}
