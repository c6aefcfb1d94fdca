use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::{self, Receiver, Sender},
    Arc,
};
use std::thread::{self, Scope, ScopedJoinHandle};

use bitvec::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, instrument};

use crate::error::KrigingError;
use crate::geometry::Geometry;
use crate::spatial_database::{
    gridded_db::{spacing_ratio, CartesianGrid},
    SampleSource,
};

use super::{CellEstimator, CellStatus, Diagnostics, EstimationResult};

/// Cells to estimate
#[derive(Clone, Copy, Debug)]
pub enum RunMode<'g> {
    /// every cell of a target grid
    Grid(&'g CartesianGrid),
    /// unvalued cells of the gridded data source, valued cells are copied
    GapFill,
}

/// Shared flag checked once per cell
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressEvent {
    pub processed: usize,
    pub total: usize,
    pub diagnostics: Diagnostics,
}

#[derive(Clone, Debug)]
pub struct RunOutput {
    pub values: Vec<f64>,
    pub local_means: Vec<f64>,
    pub diagnostics: Diagnostics,
}

/// Estimation running on a scoped worker thread
pub struct RunHandle<'scope> {
    pub events: Receiver<ProgressEvent>,
    cancel: CancellationToken,
    handle: ScopedJoinHandle<'scope, Result<RunOutput, KrigingError>>,
}

impl<'scope> RunHandle<'scope> {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn join(self) -> Result<RunOutput, KrigingError> {
        match self.handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// Sequential grid estimation in scan order (x fastest, then y, then z).
pub struct EstimationRunner<'a, E> {
    estimator: &'a E,
    mode: RunMode<'a>,
    dilation_mask: bool,
}

impl<'a, E> EstimationRunner<'a, E>
where
    E: CellEstimator,
{
    pub fn new(estimator: &'a E, mode: RunMode<'a>) -> Result<Self, KrigingError> {
        if matches!(mode, RunMode::GapFill) && estimator.source().as_grid().is_none() {
            return Err(KrigingError::GapFillRequiresGrid);
        }
        Ok(Self {
            estimator,
            mode,
            dilation_mask: false,
        })
    }

    /// Skip the solver on cells that no valued cell can reach
    pub fn with_dilation_mask(mut self, dilation_mask: bool) -> Self {
        self.dilation_mask = dilation_mask;
        self
    }

    fn target_grid(&self) -> Result<&'a CartesianGrid, KrigingError> {
        match self.mode {
            RunMode::Grid(grid) => Ok(grid),
            RunMode::GapFill => self
                .estimator
                .source()
                .as_grid()
                .ok_or(KrigingError::GapFillRequiresGrid),
        }
    }

    pub fn n_cells(&self) -> usize {
        self.target_grid().map_or(0, |g| g.n_cells())
    }

    /// Cells within neighborhood reach of a valued sample.
    /// Box dilation is separable, so the seed mask is dilated along x, y and z in turn.
    pub fn dilation_mask(&self) -> Result<BitVec, KrigingError> {
        let grid = self.target_grid()?;
        let dims = grid.dims();
        let mut mask = bitvec![0; grid.n_cells()];

        match self.mode {
            RunMode::GapFill => {
                let source = self.estimator.source();
                for i in (0..grid.n_cells()).filter(|i| source.has_value(*i)) {
                    mask.set(i, true);
                }
            }
            RunMode::Grid(_) => {
                for sample in self.estimator.spatial_index().samples() {
                    let ijk = grid.coord_to_ind_clamped(&sample.point());
                    mask.set(grid.ijk_to_ind(ijk), true);
                }
            }
        }

        let half_extents = self
            .estimator
            .search_strategy()
            .neighborhood
            .bounding_box(&grid.origin())
            .half_extents;
        let ratio = spacing_ratio(&half_extents, &grid.grid_spacing());

        for axis in 0..3 {
            let reach = (ratio[axis].ceil() + 1.0).min(dims[axis] as f64) as usize;
            mask = dilate_axis(&mask, dims, axis, reach);
        }
        Ok(mask)
    }

    #[instrument(skip_all)]
    pub fn run(
        &self,
        cancel: &CancellationToken,
        progress: Option<&Sender<ProgressEvent>>,
    ) -> Result<RunOutput, KrigingError> {
        let grid = self.target_grid()?;
        let total = grid.n_cells();
        let row_len = grid.dims()[0];
        let params = self.estimator.params();
        let source = self.estimator.source();

        let mask = if self.dilation_mask {
            Some(self.dilation_mask()?)
        } else {
            None
        };

        info!(
            cells = total,
            gap_fill = matches!(self.mode, RunMode::GapFill),
            masked = mask.as_ref().map_or(0, |m| m.count_zeros()),
            "starting estimation"
        );

        let mut values = Vec::with_capacity(total);
        let mut local_means = Vec::with_capacity(total);
        let mut diagnostics = Diagnostics::default();

        for ind in 0..total {
            if cancel.is_cancelled() {
                info!(processed = ind, "estimation cancelled");
                return Err(KrigingError::Cancelled { processed: ind });
            }

            let result = if matches!(self.mode, RunMode::GapFill) && source.has_value(ind) {
                EstimationResult::copied(source.value(ind))
            } else if mask.as_ref().is_some_and(|m| !m[ind]) {
                EstimationResult::fallback(params, CellStatus::Masked, 0)
            } else {
                self.estimator.estimate(&grid.cell(ind).center)
            };

            diagnostics.record(&result);
            values.push(result.value);
            local_means.push(result.local_mean);

            let processed = ind + 1;
            if processed % row_len == 0 || processed == total {
                debug!(processed, total, "row done");
                if let Some(sender) = progress {
                    //receiver may be gone, the run still completes
                    let _ = sender.send(ProgressEvent {
                        processed,
                        total,
                        diagnostics,
                    });
                }
            }
        }

        info!(
            kriged = diagnostics.kriged,
            trivial = diagnostics.trivial,
            copied = diagnostics.copied,
            ill_conditioned = diagnostics.ill_conditioned,
            failed = diagnostics.failures(),
            "estimation finished"
        );

        Ok(RunOutput {
            values,
            local_means,
            diagnostics,
        })
    }

    /// Starts the run on a worker of `scope`, progress arrives on [`RunHandle::events`]
    pub fn spawn<'scope>(
        &'scope self,
        scope: &'scope Scope<'scope, '_>,
        cancel: CancellationToken,
    ) -> RunHandle<'scope>
    where
        'a: 'scope,
    {
        let (sender, events) = mpsc::channel();
        let token = cancel.clone();
        let handle = scope.spawn(move || self.run(&token, Some(&sender)));
        RunHandle {
            events,
            cancel,
            handle,
        }
    }

    /// Runs on a worker and calls `on_progress` for every event on the calling thread
    pub fn run_with_progress<F>(
        &self,
        cancel: CancellationToken,
        mut on_progress: F,
    ) -> Result<RunOutput, KrigingError>
    where
        F: FnMut(&ProgressEvent),
    {
        thread::scope(|scope| {
            let handle = self.spawn(scope, cancel);
            for event in handle.events.iter() {
                on_progress(&event);
            }
            handle.join()
        })
    }

    pub fn run_with_progress_bar(&self) -> Result<RunOutput, KrigingError> {
        let bar = ProgressBar::new(self.n_cells() as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{bar:40} {pos}/{len} [{elapsed_precise}<{eta_precise}] {msg}",
        ) {
            bar.set_style(style);
        }
        let result = self.run_with_progress(CancellationToken::new(), |event| {
            bar.set_position(event.processed as u64);
            bar.set_message(format!(
                "ill conditioned: {} failed: {}",
                event.diagnostics.ill_conditioned,
                event.diagnostics.failures()
            ));
        });
        bar.finish();
        result
    }
}

/// Sets every cell within `reach` cells of a set cell along one axis
fn dilate_axis(mask: &BitSlice, dims: [usize; 3], axis: usize, reach: usize) -> BitVec {
    let strides = [1, dims[0], dims[0] * dims[1]];
    let stride = strides[axis];
    let n = dims[axis];
    let (a, b) = match axis {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    };

    let mut out = bitvec![0; mask.len()];
    for u in 0..dims[a] {
        for v in 0..dims[b] {
            let start = u * strides[a] + v * strides[b];
            //distance to the last set cell seen from either side
            let mut last: Option<usize> = None;
            for i in 0..n {
                let ind = start + i * stride;
                if mask[ind] {
                    last = Some(i);
                }
                if last.is_some_and(|l| i - l <= reach) {
                    out.set(ind, true);
                }
            }
            let mut next: Option<usize> = None;
            for i in (0..n).rev() {
                let ind = start + i * stride;
                if mask[ind] {
                    next = Some(i);
                }
                if next.is_some_and(|l| l - i <= reach) {
                    out.set(ind, true);
                }
            }
        }
    }
    out
}
