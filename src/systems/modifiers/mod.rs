use crate::error::SolveError;

use super::{
    kriging_system::KrigingSystem,
    solved_systems::{SolvedSystem, SolvedSystemBuilder},
};

pub mod mean_transform;

pub trait ValueTransform<T> {
    fn forward_transform(&self, value: &T) -> T;
    fn backward_transform(&self, value: &T) -> T;
}

/// A builder for a solved system that applies a modifier to the values.
/// Forward transforms are applied to conditioning data before estimation.
/// Backward transforms are applied to the estimated values and local means.
#[derive(Clone, Debug)]
pub struct ModifiedSolvedSystemBuilder<B, T> {
    builder: B,
    modifier: T,
}

impl<B, T> ModifiedSolvedSystemBuilder<B, T> {
    pub fn new(builder: B, modifier: T) -> Self {
        Self { builder, modifier }
    }
}

impl<B, VT> SolvedSystemBuilder for ModifiedSolvedSystemBuilder<B, VT>
where
    B: SolvedSystemBuilder,
    VT: ValueTransform<f64> + Clone + Send + Sync,
{
    type SolvedSystem = ModifiedSolvedSystem<B::SolvedSystem, VT>;

    fn build(&self, system: &KrigingSystem) -> Result<Self::SolvedSystem, SolveError> {
        // Weights depend only on the spatial configuration of the data,
        // nothing more needs to happen here.
        let system = self.builder.build(system)?;
        Ok(ModifiedSolvedSystem {
            system,
            modifier: self.modifier.clone(),
        })
    }
}

#[derive(Clone, Debug)]
pub struct ModifiedSolvedSystem<MS, VT> {
    system: MS,
    modifier: VT,
}

impl<MS, VT> ModifiedSolvedSystem<MS, VT>
where
    VT: ValueTransform<f64>,
{
    fn transformed(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .map(|v| self.modifier.forward_transform(v))
            .collect()
    }
}

impl<MS, VT> SolvedSystem for ModifiedSolvedSystem<MS, VT>
where
    MS: SolvedSystem,
    VT: ValueTransform<f64>,
{
    fn weights(&self) -> &[f64] {
        self.system.weights()
    }

    fn weights_mut(&mut self) -> &mut [f64] {
        self.system.weights_mut()
    }

    fn estimate(&self, values: &[f64]) -> f64 {
        let estimate = self.system.estimate(&self.transformed(values));
        self.modifier.backward_transform(&estimate)
    }

    fn local_mean(&self, values: &[f64]) -> f64 {
        let mean = self.system.local_mean(&self.transformed(values));
        self.modifier.backward_transform(&mean)
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
    use crate::systems::solved_systems::sk_system::SolvedSKSystemBuilder;
    use crate::variography::model_variograms::{
        composite::VariogramModel,
        structure::{StructureType, VariogramStructure},
    };

    use super::{mean_transform::MeanTransform, *};

    #[test]
    fn simple_kriging_far_from_data_returns_the_mean() {
        let cond = vec![DataCell {
            index: 0,
            location: Point3::origin(),
            value: 10.0,
            distance: 0.0,
        }];
        let snap = VariogramModel::new(
            0.0,
            vec![VariogramStructure::isotropic(
                StructureType::Spherical,
                1.0,
                5.0,
            )],
        )
        .snapshot();
        let builder = ModifiedSolvedSystemBuilder::new(
            SolvedSKSystemBuilder::new(1e-3),
            MeanTransform::new(2.5),
        );

        let far = KrigingSystem::build(&cond, Point3::new(50.0, 0.0, 0.0), &snap, &snap).unwrap();
        let solved = builder.build(&far).unwrap();
        assert_relative_eq!(solved.estimate(&far.values()), 2.5);
        assert_relative_eq!(solved.local_mean(&far.values()), 2.5);

        let near = KrigingSystem::build(&cond, Point3::origin(), &snap, &snap).unwrap();
        let solved = builder.build(&near).unwrap();
        assert_relative_eq!(solved.estimate(&near.values()), 10.0);
    }
}
