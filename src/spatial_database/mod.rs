use approx::ulps_eq;
use nalgebra::Point3;

use crate::geometry::aabb::Aabb;

use self::{gridded_db::CartesianGrid, point_set::PointSet, segment_set::SegmentSet};

pub mod coordinate_system;
pub mod gridded_db;
pub mod point_set;
pub mod search_strategy;
pub mod segment_set;
pub mod spatial_index;

/// Location and value access over one dataset.
/// Sample indices are row indices for point and segment sets and linear cell indices for grids.
pub trait SampleSource {
    fn n_samples(&self) -> usize;

    /// Location of sample, always resolvable even if its value is no-data
    fn location(&self, ind: usize) -> Point3<f64>;

    fn value(&self, ind: usize) -> f64;

    fn no_data_value(&self) -> Option<f64>;

    /// Box stored in the spatial index for the sample
    fn index_bounds(&self, ind: usize, tolerance: f64) -> Aabb;

    fn is_no_data(&self, value: f64) -> bool {
        value.is_nan()
            || self
                .no_data_value()
                .is_some_and(|ndv| ulps_eq!(value, ndv, max_ulps = 1))
    }

    fn has_value(&self, ind: usize) -> bool {
        !self.is_no_data(self.value(ind))
    }

    /// Handle to a sample seen from `target`
    fn data_cell(&self, ind: usize, target: &Point3<f64>) -> DataCell {
        let location = self.location(ind);
        DataCell {
            index: ind,
            location,
            value: self.value(ind),
            distance: nalgebra::distance(&location, target),
        }
    }

    /// Bounding box of every sample location
    fn bounding_box(&self) -> Option<Aabb> {
        let locations = (0..self.n_samples())
            .map(|i| self.location(i))
            .collect::<Vec<_>>();
        Aabb::from_points(&locations)
    }
}

/// One observation as seen by an estimator, built on demand and discarded after use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DataCell {
    pub index: usize,
    pub location: Point3<f64>,
    pub value: f64,
    /// distance to the location the cell was retrieved for
    pub distance: f64,
}

/// Supported datasets, resolved once when a run is configured.
#[derive(Clone, Debug)]
pub enum DataSource {
    PointSet(PointSet),
    Grid(CartesianGrid),
    SegmentSet(SegmentSet),
}

impl DataSource {
    pub fn as_grid(&self) -> Option<&CartesianGrid> {
        match self {
            DataSource::Grid(g) => Some(g),
            _ => None,
        }
    }

    /// True when every sample lies in one horizontal plane
    pub fn is_2d(&self) -> bool {
        match self {
            DataSource::Grid(g) => g.dims()[2] == 1,
            _ => self
                .bounding_box()
                .map_or(true, |b| b.half_extents.z == 0.0),
        }
    }
}

impl SampleSource for DataSource {
    fn n_samples(&self) -> usize {
        match self {
            DataSource::PointSet(s) => s.n_samples(),
            DataSource::Grid(s) => s.n_samples(),
            DataSource::SegmentSet(s) => s.n_samples(),
        }
    }

    fn location(&self, ind: usize) -> Point3<f64> {
        match self {
            DataSource::PointSet(s) => s.location(ind),
            DataSource::Grid(s) => s.location(ind),
            DataSource::SegmentSet(s) => s.location(ind),
        }
    }

    fn value(&self, ind: usize) -> f64 {
        match self {
            DataSource::PointSet(s) => s.value(ind),
            DataSource::Grid(s) => s.value(ind),
            DataSource::SegmentSet(s) => s.value(ind),
        }
    }

    fn no_data_value(&self) -> Option<f64> {
        match self {
            DataSource::PointSet(s) => s.no_data_value(),
            DataSource::Grid(s) => s.no_data_value(),
            DataSource::SegmentSet(s) => s.no_data_value(),
        }
    }

    fn index_bounds(&self, ind: usize, tolerance: f64) -> Aabb {
        match self {
            DataSource::PointSet(s) => s.index_bounds(ind, tolerance),
            DataSource::Grid(s) => s.index_bounds(ind, tolerance),
            DataSource::SegmentSet(s) => s.index_bounds(ind, tolerance),
        }
    }

    fn bounding_box(&self) -> Option<Aabb> {
        match self {
            DataSource::Grid(g) => g.bounding_box(),
            DataSource::PointSet(s) => Aabb::from_points(s.points()),
            DataSource::SegmentSet(s) => s.bounding_box(),
        }
    }
}

impl From<PointSet> for DataSource {
    fn from(value: PointSet) -> Self {
        DataSource::PointSet(value)
    }
}

impl From<CartesianGrid> for DataSource {
    fn from(value: CartesianGrid) -> Self {
        DataSource::Grid(value)
    }
}

impl From<SegmentSet> for DataSource {
    fn from(value: SegmentSet) -> Self {
        DataSource::SegmentSet(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_detection() {
        let ps = PointSet::new(
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
            vec![-999.0, 2.0],
        )
        .unwrap()
        .with_no_data_value(-999.0);
        let source = DataSource::from(ps);
        assert!(!source.has_value(0));
        assert!(source.has_value(1));
        assert!(source.is_no_data(f64::NAN));
        assert!(source.is_2d());
    }
}
