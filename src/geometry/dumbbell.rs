use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::{aabb::Aabb, Geometry};

/// Two vertical cylinders of equal radius stacked above and below the query point
/// with a gap of `separation` between them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerticalDumbbell {
    pub cylinder_height: f64,
    pub separation: f64,
    pub radius: f64,
}

impl VerticalDumbbell {
    pub fn new(cylinder_height: f64, separation: f64, radius: f64) -> Self {
        Self {
            cylinder_height,
            separation,
            radius,
        }
    }
}

impl Geometry for VerticalDumbbell {
    fn bounding_box(&self, center: &Point3<f64>) -> Aabb {
        Aabb::new(
            *center,
            Vector3::new(
                self.radius,
                self.radius,
                self.separation / 2.0 + self.cylinder_height,
            ),
        )
    }

    fn is_inside(&self, center: &Point3<f64>, point: &Point3<f64>) -> bool {
        let dx = point.x - center.x;
        let dy = point.y - center.y;
        let dz = (point.z - center.z).abs();
        dx * dx + dy * dy <= self.radius * self.radius
            && dz >= self.separation / 2.0
            && dz <= self.separation / 2.0 + self.cylinder_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_between_cylinders_is_excluded() {
        let dumbbell = VerticalDumbbell::new(4.0, 2.0, 1.0);
        let c = Point3::origin();
        assert!(!dumbbell.is_inside(&c, &Point3::new(0.0, 0.0, 0.5)));
        assert!(dumbbell.is_inside(&c, &Point3::new(0.0, 0.5, 3.0)));
        assert!(dumbbell.is_inside(&c, &Point3::new(0.0, 0.5, -3.0)));
        assert!(!dumbbell.is_inside(&c, &Point3::new(0.0, 0.0, 5.5)));
        assert!(!dumbbell.is_inside(&c, &Point3::new(1.5, 0.0, 3.0)));
    }
}
