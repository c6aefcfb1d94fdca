use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::{aabb::Aabb, Geometry};

/// Axis aligned box of the given size centered on the query point,
/// containment is exactly the bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchBox {
    pub size_x: f64,
    pub size_y: f64,
    pub size_z: f64,
}

impl SearchBox {
    pub fn new(size_x: f64, size_y: f64, size_z: f64) -> Self {
        Self {
            size_x,
            size_y,
            size_z,
        }
    }
}

impl Geometry for SearchBox {
    fn bounding_box(&self, center: &Point3<f64>) -> Aabb {
        Aabb::new(
            *center,
            Vector3::new(self.size_x, self.size_y, self.size_z) / 2.0,
        )
    }

    fn is_inside(&self, center: &Point3<f64>, point: &Point3<f64>) -> bool {
        self.bounding_box(center).contains_point(point)
    }
}
