use nalgebra::Point3;
use tracing::debug;

use crate::error::{KrigingError, SolveError};
use crate::spatial_database::{
    search_strategy::SearchStrategy, spatial_index::SpatialIndex, DataCell, DataSource,
};
use crate::systems::{
    kriging_system::KrigingSystem,
    modifiers::{mean_transform::MeanTransform, ModifiedSolvedSystemBuilder},
    solved_systems::{
        negative_weight_filtered_system::SolvedNegativeWeightFilteredSystemBuilder,
        ok_system::SolvedOKSystemBuilder, sk_system::SolvedSKSystemBuilder, SolvedSystem,
        SolvedSystemBuilder,
    },
    system_builder::KrigingType,
};
use crate::variography::model_variograms::composite::{VariogramModel, VariogramSnapshot};

use super::{solve_cell, CellEstimator, CellStatus, EstimationParams, EstimationResult};

/// Simple and ordinary kriging of point targets.
pub struct KrigingEstimator<'a> {
    source: &'a DataSource,
    spatial_index: &'a SpatialIndex,
    search_strategy: SearchStrategy,
    variogram: VariogramModel,
    snapshot: VariogramSnapshot,
    params: EstimationParams,
}

impl<'a> KrigingEstimator<'a> {
    pub fn builder() -> KrigingEstimatorBuilder<'a> {
        KrigingEstimatorBuilder::default()
    }

    pub fn snapshot(&self) -> &VariogramSnapshot {
        &self.snapshot
    }

    fn simple_builder(&self) -> ModifiedSolvedSystemBuilder<SolvedSKSystemBuilder, MeanTransform> {
        ModifiedSolvedSystemBuilder::new(
            SolvedSKSystemBuilder::new(self.params.eigenvalue_cutoff),
            MeanTransform::new(self.params.simple_kriging_mean),
        )
    }

    fn ordinary_builder(&self) -> SolvedOKSystemBuilder {
        SolvedOKSystemBuilder::new(self.params.ok_convention)
    }

    /// Kriging weights at `target` keyed by sample index, empty when no sample is in reach
    pub fn weights(&self, target: &Point3<f64>) -> Result<Vec<(usize, f64)>, SolveError> {
        let cond = self.conditioning_cells(target);
        if cond.is_empty() {
            return Ok(Vec::new());
        }
        let system = KrigingSystem::build(&cond, *target, &self.snapshot, &self.snapshot)?;
        let weights = match (self.params.kriging_type, self.params.negative_weight_correction) {
            (KrigingType::Simple, _) => self.simple_builder().build(&system)?.weights().to_vec(),
            (KrigingType::Ordinary, true) => {
                SolvedNegativeWeightFilteredSystemBuilder::new(self.ordinary_builder())
                    .build(&system)?
                    .weights()
                    .to_vec()
            }
            (KrigingType::Ordinary, false) => {
                self.ordinary_builder().build(&system)?.weights().to_vec()
            }
        };
        Ok(cond.iter().map(|c| c.index).zip(weights).collect())
    }
}

impl<'a> CellEstimator for KrigingEstimator<'a> {
    fn params(&self) -> &EstimationParams {
        &self.params
    }

    fn search_strategy(&self) -> &SearchStrategy {
        &self.search_strategy
    }

    fn variogram(&self) -> &VariogramModel {
        &self.variogram
    }

    fn source(&self) -> &DataSource {
        self.source
    }

    fn spatial_index(&self) -> &SpatialIndex {
        self.spatial_index
    }

    fn estimate_with(&self, target: &Point3<f64>, cond: &[DataCell]) -> EstimationResult {
        let system = match KrigingSystem::build(cond, *target, &self.snapshot, &self.snapshot) {
            Ok(system) => system,
            Err(e) => {
                debug!(n = cond.len(), "eigen decomposition failed: {e}");
                return EstimationResult::unsolved(&self.params, CellStatus::Singular, cond.len());
            }
        };

        match (self.params.kriging_type, self.params.negative_weight_correction) {
            (KrigingType::Simple, _) => solve_cell(&self.simple_builder(), &system, &self.params),
            (KrigingType::Ordinary, true) => solve_cell(
                &SolvedNegativeWeightFilteredSystemBuilder::new(self.ordinary_builder()),
                &system,
                &self.params,
            ),
            (KrigingType::Ordinary, false) => {
                solve_cell(&self.ordinary_builder(), &system, &self.params)
            }
        }
    }
}

/// Collects the configuration of a [`KrigingEstimator`], `build` reports what is missing.
#[derive(Default)]
pub struct KrigingEstimatorBuilder<'a> {
    source: Option<&'a DataSource>,
    spatial_index: Option<&'a SpatialIndex>,
    search_strategy: Option<SearchStrategy>,
    variogram: Option<VariogramModel>,
    params: EstimationParams,
}

impl<'a> KrigingEstimatorBuilder<'a> {
    pub fn source(mut self, source: &'a DataSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn spatial_index(mut self, spatial_index: &'a SpatialIndex) -> Self {
        self.spatial_index = Some(spatial_index);
        self
    }

    pub fn search_strategy(mut self, search_strategy: SearchStrategy) -> Self {
        self.search_strategy = Some(search_strategy);
        self
    }

    pub fn variogram(mut self, variogram: VariogramModel) -> Self {
        self.variogram = Some(variogram);
        self
    }

    pub fn params(mut self, params: EstimationParams) -> Self {
        self.params = params;
        self
    }

    pub fn kriging_type(mut self, kriging_type: KrigingType) -> Self {
        self.params.kriging_type = kriging_type;
        self
    }

    pub fn build(self) -> Result<KrigingEstimator<'a>, KrigingError> {
        let variogram = self.variogram.ok_or(KrigingError::MissingVariogramModel)?;
        let search_strategy = self
            .search_strategy
            .ok_or(KrigingError::MissingSearchStrategy)?;
        let source = self.source.ok_or(KrigingError::MissingDataSource)?;
        let spatial_index = self.spatial_index.ok_or(KrigingError::MissingSpatialIndex)?;

        variogram.validate()?;
        search_strategy.validate()?;

        Ok(KrigingEstimator {
            source,
            spatial_index,
            search_strategy,
            snapshot: variogram.snapshot(),
            variogram,
            params: self.params,
        })
    }
}
