use std::num::ParseFloatError;

use thiserror::Error;

/// Failures of the dense matrix routines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
    #[error("dimension mismatch: {left:?} vs {right:?}")]
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    #[error("singular matrix: zero pivot in column {column}")]
    Singular { column: usize },
    #[error("{0} did not converge")]
    DecompositionFailed(&'static str),
}

/// Errors that abort a whole estimation run (or a data load) before any cell is processed.
#[derive(Debug, Error)]
pub enum KrigingError {
    #[error("no variogram model was provided")]
    MissingVariogramModel,
    #[error("no search strategy was provided")]
    MissingSearchStrategy,
    #[error("no input data source was provided")]
    MissingDataSource,
    #[error("no spatial index was provided")]
    MissingSpatialIndex,
    #[error("invalid search strategy: {0}")]
    InvalidSearchStrategy(String),
    #[error("invalid variogram model: {0}")]
    InvalidVariogramModel(String),
    #[error("factor {factor} does not exist in a model with {n_structures} structures")]
    InvalidFactor { factor: usize, n_structures: usize },
    #[error("gap filling requires a gridded data source")]
    GapFillRequiresGrid,
    #[error("{locations} sample locations for {values} values")]
    LengthMismatch { locations: usize, values: usize },
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    #[error("estimation cancelled after {processed} cells")]
    Cancelled { processed: usize },
    #[error("column {0} not found")]
    MissingColumn(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),
}

/// Reasons a single kriging system could not produce weights.
/// These never abort a run, the estimator maps them onto a cell status.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    #[error("negative weight correction left a weight sum of {0}")]
    CollapsedWeights(f64),
}
