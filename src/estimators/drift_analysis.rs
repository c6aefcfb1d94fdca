use serde::{Deserialize, Serialize};

use crate::geometry::aabb::Aabb;
use crate::spatial_database::{spatial_index::SpatialIndex, DataSource, SampleSource};

/// Mean of the valued samples inside one slab of the data extent
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftSlice {
    /// slab center along the sliced axis
    pub center: f64,
    /// NaN for an empty slab
    pub mean: f64,
    pub n_samples: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub x: Vec<DriftSlice>,
    pub y: Vec<DriftSlice>,
    /// absent for planar data
    pub z: Option<Vec<DriftSlice>>,
}

/// Trend of sample values along the coordinate axes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftAnalysis {
    pub n_slices: usize,
}

impl DriftAnalysis {
    pub fn new(n_slices: usize) -> Self {
        Self { n_slices }
    }

    pub fn run(&self, source: &DataSource, index: &SpatialIndex) -> Option<DriftReport> {
        let bounds = source.bounding_box()?;
        if self.n_slices == 0 {
            return None;
        }
        Some(DriftReport {
            x: self.slices(source, index, &bounds, 0),
            y: self.slices(source, index, &bounds, 1),
            z: (!source.is_2d()).then(|| self.slices(source, index, &bounds, 2)),
        })
    }

    fn slices(
        &self,
        source: &DataSource,
        index: &SpatialIndex,
        bounds: &Aabb,
        axis: usize,
    ) -> Vec<DriftSlice> {
        let mins = bounds.mins();
        let maxs = bounds.maxs();
        let width = (maxs[axis] - mins[axis]) / self.n_slices as f64;

        (0..self.n_slices)
            .map(|s| {
                let last = s + 1 == self.n_slices;
                let lo = mins[axis] + s as f64 * width;
                let hi = if last { maxs[axis] } else { lo + width };

                let mut slab_min = mins;
                let mut slab_max = maxs;
                slab_min[axis] = lo;
                slab_max[axis] = hi;
                let slab = Aabb::from_min_max(slab_min, slab_max);

                //sample boxes may straddle a border, each sample counts in one slab only
                let values = index
                    .within_bounding_box(&slab)
                    .into_iter()
                    .filter(|i| {
                        let c = source.location(*i)[axis];
                        c >= lo && (c < hi || (last && c <= hi))
                    })
                    .map(|i| source.value(i))
                    .filter(|v| !source.is_no_data(*v))
                    .collect::<Vec<_>>();

                let n_samples = values.len();
                let mean = if n_samples == 0 {
                    f64::NAN
                } else {
                    values.iter().sum::<f64>() / n_samples as f64
                };

                DriftSlice {
                    center: (lo + hi) / 2.0,
                    mean,
                    n_samples,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    use crate::spatial_database::point_set::PointSet;

    use super::*;

    #[test]
    fn linear_trend_along_x() {
        let points = (0..10)
            .map(|i| Point3::new(i as f64, (i % 3) as f64, 0.0))
            .collect::<Vec<_>>();
        let values = (0..10).map(|i| 2.0 * i as f64).collect::<Vec<_>>();
        let source: DataSource = PointSet::new(points, values).unwrap().into();
        let index = SpatialIndex::from_source(&source, 0.0);

        let report = DriftAnalysis::new(2).run(&source, &index).unwrap();
        assert!(report.z.is_none());
        assert_eq!(report.x.len(), 2);
        assert_eq!(report.x[0].n_samples + report.x[1].n_samples, 10);
        //x in [0, 4.5) then [4.5, 9]
        assert_relative_eq!(report.x[0].mean, 4.0);
        assert_relative_eq!(report.x[1].mean, 14.0);
        assert_relative_eq!(report.x[0].center, 2.25);
        assert_eq!(report.y.iter().map(|s| s.n_samples).sum::<usize>(), 10);
    }

    #[test]
    fn empty_slab_has_nan_mean() {
        let source: DataSource = PointSet::new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 5.0)],
            vec![1.0, 3.0],
        )
        .unwrap()
        .into();
        let index = SpatialIndex::from_source(&source, 0.0);
        let report = DriftAnalysis::new(3).run(&source, &index).unwrap();
        assert!(report.x[1].mean.is_nan());
        assert_eq!(report.x[1].n_samples, 0);
        let z = report.z.unwrap();
        assert_eq!(z[0].mean, 1.0);
        assert_eq!(z[2].mean, 3.0);
    }
}
