use indicatif::ParallelProgressIterator;
use nalgebra::Point3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SolveError;
use crate::spatial_database::{
    search_strategy::SearchStrategy, spatial_index::SpatialIndex, DataCell, DataSource,
    SampleSource,
};
use crate::systems::{
    kriging_system::KrigingSystem,
    solved_systems::{SolvedSystem, SolvedSystemBuilder},
    system_builder::KrigingType,
};
use crate::variography::model_variograms::{composite::VariogramModel, VariogramValue};

pub mod drift_analysis;
pub mod factorial_kriging;
pub mod kriging;
pub mod runner;

/// Per run estimation settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationParams {
    pub kriging_type: KrigingType,
    /// known mean used by simple kriging
    pub simple_kriging_mean: f64,
    /// value written where no estimate can be made, `no_data_value` when unset
    pub default_value: Option<f64>,
    pub no_data_value: f64,
    /// eigenvalues below `eigenvalue_cutoff * λmax` are dropped on ill conditioned systems
    pub eigenvalue_cutoff: f64,
    pub negative_weight_correction: bool,
    /// entries of the bordered ordinary kriging system
    pub ok_convention: VariogramValue,
}

impl Default for EstimationParams {
    fn default() -> Self {
        Self {
            kriging_type: KrigingType::Ordinary,
            simple_kriging_mean: 0.0,
            default_value: None,
            no_data_value: f64::NAN,
            eigenvalue_cutoff: 1e-3,
            negative_weight_correction: true,
            ok_convention: VariogramValue::Covariance,
        }
    }
}

impl EstimationParams {
    #[inline(always)]
    pub fn fallback_value(&self) -> f64 {
        self.default_value.unwrap_or(self.no_data_value)
    }
}

/// How the value of a cell was obtained
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellStatus {
    Kriged,
    /// valued cell carried over while gap filling
    Copied,
    /// no (or too few) samples in the neighborhood
    NoSamples,
    /// skipped by the dilation mask
    Masked,
    Singular,
    CollapsedWeights,
    /// estimate or local mean was not finite
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EstimationResult {
    pub value: f64,
    pub local_mean: f64,
    pub n_samples: usize,
    pub ill_conditioned: bool,
    pub status: CellStatus,
}

impl EstimationResult {
    pub fn fallback(params: &EstimationParams, status: CellStatus, n_samples: usize) -> Self {
        Self {
            value: params.fallback_value(),
            local_mean: params.no_data_value,
            n_samples,
            ill_conditioned: false,
            status,
        }
    }

    /// Numerical failure, written as the no-data value whatever the default value
    pub fn unsolved(params: &EstimationParams, status: CellStatus, n_samples: usize) -> Self {
        Self {
            value: params.no_data_value,
            ..Self::fallback(params, status, n_samples)
        }
    }

    pub fn copied(value: f64) -> Self {
        Self {
            value,
            local_mean: value,
            n_samples: 0,
            ill_conditioned: false,
            status: CellStatus::Copied,
        }
    }

    /// Replaces non finite numbers by the no-data value and flags the cell as failed
    pub(crate) fn guarded(mut self, params: &EstimationParams) -> Self {
        let mut failed = false;
        if !self.value.is_finite() {
            self.value = params.no_data_value;
            failed = true;
        }
        if !self.local_mean.is_finite() {
            self.local_mean = params.no_data_value;
            failed = true;
        }
        if failed {
            self.status = CellStatus::Failed;
        }
        self
    }

    pub fn is_trivial(&self) -> bool {
        matches!(self.status, CellStatus::NoSamples | CellStatus::Masked)
    }
}

/// Counters accumulated over a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub processed: usize,
    pub kriged: usize,
    pub trivial: usize,
    pub copied: usize,
    pub ill_conditioned: usize,
    pub singular: usize,
    pub collapsed: usize,
    /// non finite results replaced by the no-data value
    pub failed: usize,
}

impl Diagnostics {
    pub fn record(&mut self, result: &EstimationResult) {
        self.processed += 1;
        if result.ill_conditioned {
            self.ill_conditioned += 1;
        }
        match result.status {
            CellStatus::Kriged => self.kriged += 1,
            CellStatus::Copied => self.copied += 1,
            CellStatus::NoSamples | CellStatus::Masked => self.trivial += 1,
            CellStatus::Singular => self.singular += 1,
            CellStatus::CollapsedWeights => self.collapsed += 1,
            CellStatus::Failed => self.failed += 1,
        }
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.processed += other.processed;
        self.kriged += other.kriged;
        self.trivial += other.trivial;
        self.copied += other.copied;
        self.ill_conditioned += other.ill_conditioned;
        self.singular += other.singular;
        self.collapsed += other.collapsed;
        self.failed += other.failed;
        self
    }

    /// Cells that fell back to the no-data value because of a numerical problem
    pub fn failures(&self) -> usize {
        self.singular + self.collapsed + self.failed
    }
}

/// Single location estimation over a read only dataset, index and variogram snapshot.
pub trait CellEstimator: Sync {
    fn params(&self) -> &EstimationParams;
    fn search_strategy(&self) -> &SearchStrategy;
    fn variogram(&self) -> &VariogramModel;
    fn source(&self) -> &DataSource;
    fn spatial_index(&self) -> &SpatialIndex;

    /// Estimate from an already selected, non empty neighborhood
    fn estimate_with(&self, target: &Point3<f64>, cond: &[DataCell]) -> EstimationResult;

    fn conditioning_cells(&self, target: &Point3<f64>) -> Vec<DataCell> {
        self.spatial_index()
            .nearest_within(target, self.search_strategy())
            .into_iter()
            .map(|n| self.source().data_cell(n.index, target))
            .collect()
    }

    fn estimate(&self, target: &Point3<f64>) -> EstimationResult {
        let cond = self.conditioning_cells(target);
        if cond.is_empty() {
            return EstimationResult::fallback(self.params(), CellStatus::NoSamples, 0);
        }
        self.estimate_with(target, &cond)
    }

    /// Independent targets estimated in parallel
    fn estimate_points(&self, targets: &[Point3<f64>]) -> (Vec<EstimationResult>, Diagnostics) {
        let results = targets
            .par_iter()
            .map(|target| self.estimate(target))
            .collect::<Vec<_>>();
        let diagnostics = summarize(&results);
        (results, diagnostics)
    }

    /// [`CellEstimator::estimate_points`] with a terminal progress bar
    fn estimate_points_with_progress(
        &self,
        targets: &[Point3<f64>],
    ) -> (Vec<EstimationResult>, Diagnostics) {
        let results = targets
            .par_iter()
            .progress_count(targets.len() as u64)
            .map(|target| self.estimate(target))
            .collect::<Vec<_>>();
        let diagnostics = summarize(&results);
        (results, diagnostics)
    }
}

fn summarize(results: &[EstimationResult]) -> Diagnostics {
    results.iter().fold(Diagnostics::default(), |mut d, r| {
        d.record(r);
        d
    })
}

/// Solves one system and turns the outcome into a cell result, numerical failures never propagate.
pub(crate) fn solve_cell<B>(
    builder: &B,
    system: &KrigingSystem,
    params: &EstimationParams,
) -> EstimationResult
where
    B: SolvedSystemBuilder,
{
    let n = system.n_cond();
    match builder.build(system) {
        Ok(solved) => {
            let values = system.values();
            EstimationResult {
                value: solved.estimate(&values),
                local_mean: solved.local_mean(&values),
                n_samples: n,
                ill_conditioned: solved.is_ill_conditioned(),
                status: CellStatus::Kriged,
            }
            .guarded(params)
        }
        Err(e) => failed_cell(e, system, params),
    }
}

pub(crate) fn failed_cell(
    error: SolveError,
    system: &KrigingSystem,
    params: &EstimationParams,
) -> EstimationResult {
    let n = system.n_cond();
    match error {
        SolveError::Matrix(e) => {
            warn!(
                n,
                x = system.target.x,
                y = system.target.y,
                z = system.target.z,
                "kriging system could not be solved: {e}"
            );
            EstimationResult {
                ill_conditioned: system.is_ill_conditioned(),
                ..EstimationResult::unsolved(params, CellStatus::Singular, n)
            }
        }
        SolveError::CollapsedWeights(_) => EstimationResult {
            ill_conditioned: system.is_ill_conditioned(),
            ..EstimationResult::unsolved(params, CellStatus::CollapsedWeights, n)
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::error::MatrixError;
    use crate::variography::model_variograms::structure::{StructureType, VariogramStructure};

    use super::*;

    #[test]
    fn default_params() {
        let params = EstimationParams::default();
        assert_eq!(params.kriging_type, KrigingType::Ordinary);
        assert!(params.fallback_value().is_nan());
        assert!(params.negative_weight_correction);

        let params: EstimationParams =
            serde_json::from_str(r#"{"kriging_type": "Simple", "default_value": -1.0}"#).unwrap();
        assert_eq!(params.kriging_type, KrigingType::Simple);
        assert_eq!(params.fallback_value(), -1.0);
        assert_eq!(params.eigenvalue_cutoff, 1e-3);
    }

    #[test]
    fn non_finite_results_are_replaced() {
        let params = EstimationParams {
            no_data_value: -999.0,
            ..Default::default()
        };
        let result = EstimationResult {
            value: f64::NAN,
            local_mean: 1.0,
            n_samples: 3,
            ill_conditioned: false,
            status: CellStatus::Kriged,
        }
        .guarded(&params);
        assert_eq!(result.value, -999.0);
        assert_eq!(result.local_mean, 1.0);
        assert_eq!(result.status, CellStatus::Failed);

        let mut diagnostics = Diagnostics::default();
        diagnostics.record(&result);
        diagnostics.record(&EstimationResult::fallback(&params, CellStatus::NoSamples, 0));
        assert_eq!(diagnostics.processed, 2);
        assert_eq!(diagnostics.failed, 1);
        assert_eq!(diagnostics.trivial, 1);
        assert_eq!(diagnostics.failures(), 1);
    }

    #[test]
    fn singular_cells_ignore_the_default_value() {
        let params = EstimationParams {
            default_value: Some(-1.0),
            no_data_value: -9999.0,
            ..Default::default()
        };
        let cond = vec![DataCell {
            index: 0,
            location: Point3::origin(),
            value: 2.0,
            distance: 0.0,
        }];
        let snap = VariogramModel::new(
            0.0,
            vec![VariogramStructure::isotropic(
                StructureType::Spherical,
                1.0,
                10.0,
            )],
        )
        .snapshot();
        let system = KrigingSystem::build(&cond, Point3::new(1.0, 0.0, 0.0), &snap, &snap).unwrap();

        let result = failed_cell(
            SolveError::Matrix(MatrixError::Singular { column: 0 }),
            &system,
            &params,
        );
        assert_eq!(result.value, -9999.0);
        assert_eq!(result.local_mean, -9999.0);
        assert_eq!(result.status, CellStatus::Singular);

        let result = failed_cell(SolveError::CollapsedWeights(0.0), &system, &params);
        assert_eq!(result.value, -9999.0);
        assert_eq!(result.status, CellStatus::CollapsedWeights);

        //an empty neighborhood still takes the default value
        let result = EstimationResult::fallback(&params, CellStatus::NoSamples, 0);
        assert_eq!(result.value, -1.0);
    }
}
