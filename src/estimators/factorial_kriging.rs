use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::KrigingError;
use crate::spatial_database::{
    coordinate_system::GridSpacing, search_strategy::SearchStrategy, spatial_index::SpatialIndex,
    DataCell, DataSource,
};
use crate::systems::{
    kriging_system::KrigingSystem,
    solved_systems::{fk_system::SolvedFKSystemBuilder, SolvedSystem, SolvedSystemBuilder},
};
use crate::variography::model_variograms::composite::{VariogramModel, VariogramSnapshot};

use super::{
    failed_cell, solve_cell, CellEstimator, CellStatus, EstimationParams, EstimationResult,
};

/// Offset used for the nugget factor when no cell size is known
pub const DEFAULT_NUGGET_OFFSET: f64 = 1e-3;

/// Component of the model isolated by factorial kriging
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Factor {
    /// nonstationary local mean
    Mean,
    Nugget,
    /// nested structure, 0 based
    Structure(usize),
}

impl Factor {
    /// Numbering used by parameter files: -1 mean, 0 nugget, k structure k (1 based)
    pub fn from_number(n: i32) -> Option<Self> {
        match n {
            -1 => Some(Factor::Mean),
            0 => Some(Factor::Nugget),
            k if k > 0 => Some(Factor::Structure(k as usize - 1)),
            _ => None,
        }
    }

    pub fn number(&self) -> i32 {
        match self {
            Factor::Mean => -1,
            Factor::Nugget => 0,
            Factor::Structure(i) => *i as i32 + 1,
        }
    }
}

/// Factorial kriging of one factor at point targets.
///
/// The nugget factor is a discontinuity at the origin and has no covariance of its own away from a
/// sample, it is taken as the total factor at the target minus the total factor at the target
/// shifted by `nugget_offset` along every axis.
pub struct FactorialKrigingEstimator<'a> {
    source: &'a DataSource,
    spatial_index: &'a SpatialIndex,
    search_strategy: SearchStrategy,
    variogram: VariogramModel,
    snapshot: VariogramSnapshot,
    /// model of the kriged factor, the full model for the mean and the nugget
    factor_snapshot: VariogramSnapshot,
    factor: Factor,
    nugget_offset: f64,
    params: EstimationParams,
}

impl<'a> FactorialKrigingEstimator<'a> {
    pub fn builder() -> FactorialKrigingEstimatorBuilder<'a> {
        FactorialKrigingEstimatorBuilder::default()
    }

    pub fn factor(&self) -> Factor {
        self.factor
    }

    pub fn nugget_offset(&self) -> f64 {
        self.nugget_offset
    }

    fn solved_builder(&self) -> SolvedFKSystemBuilder {
        SolvedFKSystemBuilder::new(self.params.eigenvalue_cutoff)
    }

    fn nugget_factor(&self, system: &KrigingSystem) -> EstimationResult {
        let builder = self.solved_builder();
        let shifted_target = system.target + Vector3::repeat(self.nugget_offset);
        let shifted = system.retargeted(shifted_target);

        let (at_target, at_shift) = match (builder.build(system), builder.build(&shifted)) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(e), _) | (_, Err(e)) => return failed_cell(e, system, &self.params),
        };

        let values = system.values();
        EstimationResult {
            value: at_target.estimate(&values) - at_shift.estimate(&values),
            local_mean: at_target.local_mean(&values),
            n_samples: system.n_cond(),
            ill_conditioned: at_target.is_ill_conditioned(),
            status: CellStatus::Kriged,
        }
        .guarded(&self.params)
    }
}

impl<'a> CellEstimator for FactorialKrigingEstimator<'a> {
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
        let built = KrigingSystem::build(cond, *target, &self.snapshot, &self.factor_snapshot);
        let system = match built {
            Ok(system) => system,
            Err(e) => {
                debug!(n = cond.len(), "eigen decomposition failed: {e}");
                return EstimationResult::unsolved(&self.params, CellStatus::Singular, cond.len());
            }
        };

        match self.factor {
            Factor::Mean => {
                let mut result = solve_cell(&self.solved_builder(), &system, &self.params);
                if result.status == CellStatus::Kriged {
                    result.value = result.local_mean;
                }
                result
            }
            Factor::Structure(_) => solve_cell(&self.solved_builder(), &system, &self.params),
            Factor::Nugget => self.nugget_factor(&system),
        }
    }
}

#[derive(Default)]
pub struct FactorialKrigingEstimatorBuilder<'a> {
    source: Option<&'a DataSource>,
    spatial_index: Option<&'a SpatialIndex>,
    search_strategy: Option<SearchStrategy>,
    variogram: Option<VariogramModel>,
    factor: Option<Factor>,
    nugget_offset: Option<f64>,
    params: EstimationParams,
}

impl<'a> FactorialKrigingEstimatorBuilder<'a> {
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

    pub fn factor(mut self, factor: Factor) -> Self {
        self.factor = Some(factor);
        self
    }

    pub fn nugget_offset(mut self, offset: f64) -> Self {
        self.nugget_offset = Some(offset);
        self
    }

    /// Nugget offset of a tenth of the smallest target cell size
    pub fn target_spacing(self, spacing: GridSpacing) -> Self {
        self.nugget_offset(spacing.min() / 10.0)
    }

    pub fn params(mut self, params: EstimationParams) -> Self {
        self.params = params;
        self
    }

    pub fn build(self) -> Result<FactorialKrigingEstimator<'a>, KrigingError> {
        let variogram = self.variogram.ok_or(KrigingError::MissingVariogramModel)?;
        let search_strategy = self
            .search_strategy
            .ok_or(KrigingError::MissingSearchStrategy)?;
        let source = self.source.ok_or(KrigingError::MissingDataSource)?;
        let spatial_index = self.spatial_index.ok_or(KrigingError::MissingSpatialIndex)?;

        variogram.validate()?;
        search_strategy.validate()?;

        let factor = self.factor.unwrap_or(Factor::Mean);
        let factor_snapshot = match factor {
            Factor::Structure(i) => variogram.single_structure(i)?.snapshot(),
            Factor::Mean | Factor::Nugget => variogram.snapshot(),
        };

        let nugget_offset = self
            .nugget_offset
            .or_else(|| source.as_grid().map(|g| g.grid_spacing().min() / 10.0))
            .unwrap_or(DEFAULT_NUGGET_OFFSET);

        Ok(FactorialKrigingEstimator {
            source,
            spatial_index,
            search_strategy,
            snapshot: variogram.snapshot(),
            variogram,
            factor_snapshot,
            factor,
            nugget_offset,
            params: self.params,
        })
    }
}
