use std::collections::HashMap;
use std::path::Path;

use nalgebra::{Point3, Vector3};

use crate::error::KrigingError;
use crate::geometry::aabb::Aabb;

use super::SampleSource;

/// Scattered samples
#[derive(Clone, Debug, Default)]
pub struct PointSet {
    points: Vec<Point3<f64>>,
    values: Vec<f64>,
    no_data_value: Option<f64>,
}

impl PointSet {
    /// One value per point
    pub fn new(points: Vec<Point3<f64>>, values: Vec<f64>) -> Result<Self, KrigingError> {
        if points.len() != values.len() {
            return Err(KrigingError::LengthMismatch {
                locations: points.len(),
                values: values.len(),
            });
        }
        Ok(Self {
            points,
            values,
            no_data_value: None,
        })
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn with_no_data_value(mut self, no_data_value: f64) -> Self {
        self.no_data_value = Some(no_data_value);
        self
    }

    /// Read x, y, (optional) z and value columns from a csv with headers.
    /// Missing z places the points at elevation 0.
    pub fn from_csv_index<P: AsRef<Path>>(
        csv_path: P,
        x_col: &str,
        y_col: &str,
        z_col: Option<&str>,
        value_col: &str,
    ) -> Result<Self, KrigingError> {
        //storage for data
        let mut point_vec = Vec::new();
        let mut value_vec = Vec::new();

        let column = |record: &HashMap<String, String>, col: &str| -> Result<f64, KrigingError> {
            let raw = record
                .get(col)
                .ok_or_else(|| KrigingError::MissingColumn(col.to_string()))?;
            Ok(raw.trim().parse::<f64>()?)
        };

        //read data from csv
        let mut rdr = csv::Reader::from_path(csv_path)?;
        for result in rdr.deserialize() {
            let record: HashMap<String, String> = result?;

            let x = column(&record, x_col)?;
            let y = column(&record, y_col)?;
            let z = match z_col {
                Some(z_col) => column(&record, z_col)?,
                None => 0.0,
            };
            let value = column(&record, value_col)?;

            point_vec.push(Point3::new(x, y, z));
            value_vec.push(value);
        }

        Self::new(point_vec, value_vec)
    }
}

impl SampleSource for PointSet {
    fn n_samples(&self) -> usize {
        self.points.len()
    }

    fn location(&self, ind: usize) -> Point3<f64> {
        self.points[ind]
    }

    fn value(&self, ind: usize) -> f64 {
        self.values[ind]
    }

    fn no_data_value(&self) -> Option<f64> {
        self.no_data_value
    }

    fn index_bounds(&self, ind: usize, tolerance: f64) -> Aabb {
        Aabb::new(self.points[ind], Vector3::repeat(tolerance.max(0.0)))
    }
}
