use nalgebra::Point3;

use crate::error::KrigingError;
use crate::geometry::aabb::Aabb;

use super::SampleSource;

/// Samples measured along straight segments (e.g. drill hole intervals).
/// A segment is located at its midpoint.
#[derive(Clone, Debug, Default)]
pub struct SegmentSet {
    segments: Vec<[Point3<f64>; 2]>,
    values: Vec<f64>,
    no_data_value: Option<f64>,
}

impl SegmentSet {
    pub fn new(segments: Vec<[Point3<f64>; 2]>, values: Vec<f64>) -> Result<Self, KrigingError> {
        if segments.len() != values.len() {
            return Err(KrigingError::LengthMismatch {
                locations: segments.len(),
                values: values.len(),
            });
        }
        Ok(Self {
            segments,
            values,
            no_data_value: None,
        })
    }

    pub fn segments(&self) -> &[[Point3<f64>; 2]] {
        &self.segments
    }

    pub fn with_no_data_value(mut self, no_data_value: f64) -> Self {
        self.no_data_value = Some(no_data_value);
        self
    }

    pub fn length(&self, ind: usize) -> f64 {
        let [from, to] = self.segments[ind];
        nalgebra::distance(&from, &to)
    }
}

impl SampleSource for SegmentSet {
    fn n_samples(&self) -> usize {
        self.segments.len()
    }

    fn location(&self, ind: usize) -> Point3<f64> {
        let [from, to] = self.segments[ind];
        nalgebra::center(&from, &to)
    }

    fn value(&self, ind: usize) -> f64 {
        self.values[ind]
    }

    fn no_data_value(&self) -> Option<f64> {
        self.no_data_value
    }

    fn index_bounds(&self, ind: usize, tolerance: f64) -> Aabb {
        let [from, to] = self.segments[ind];
        Aabb::from_min_max(from.inf(&to), from.sup(&to)).loosened(tolerance)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        self.segments
            .iter()
            .map(|[from, to]| Aabb::from_min_max(from.inf(to), from.sup(to)))
            .reduce(|a, b| a.merged(&b))
    }
}
