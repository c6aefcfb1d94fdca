pub mod error;
pub mod estimators;
pub mod geometry;
pub mod spatial_database;
pub mod systems;
pub mod variography;

pub mod prelude {

    pub mod re_exports {
        pub use nalgebra;
        pub use rstar;
    }

    pub use crate::error::{KrigingError, MatrixError, SolveError};
    pub use crate::estimators::{
        drift_analysis::{DriftAnalysis, DriftReport},
        factorial_kriging::{Factor, FactorialKrigingEstimator},
        kriging::KrigingEstimator,
        runner::{CancellationToken, EstimationRunner, ProgressEvent, RunMode, RunOutput},
        CellEstimator, CellStatus, Diagnostics, EstimationParams, EstimationResult,
    };
    pub use crate::geometry::{
        annulus::{Annulus, SphericalShell, Washer},
        dumbbell::VerticalDumbbell,
        ellipsoid::Ellipsoid,
        search_box::SearchBox,
        Geometry, SearchNeighborhood,
    };
    pub use crate::spatial_database::{
        coordinate_system::{CoordinateSystem, GridSpacing, Orientation},
        gridded_db::CartesianGrid,
        point_set::PointSet,
        search_strategy::SearchStrategy,
        segment_set::SegmentSet,
        spatial_index::SpatialIndex,
        DataSource, SampleSource,
    };
    pub use crate::systems::system_builder::KrigingType;
    pub use crate::variography::model_variograms::{
        composite::VariogramModel,
        structure::{StructureType, VariogramStructure},
        VariogramValue,
    };
}
