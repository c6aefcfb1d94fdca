use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::{aabb::Aabb, Geometry};

/// Horizontal ring, unbounded vertically.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annulus {
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl Annulus {
    pub fn new(inner_radius: f64, outer_radius: f64) -> Self {
        Self {
            inner_radius,
            outer_radius,
        }
    }

    #[inline(always)]
    fn contains_offset(&self, dx: f64, dy: f64) -> bool {
        ring_contains(dx * dx + dy * dy, self.inner_radius, self.outer_radius)
    }
}

impl Geometry for Annulus {
    fn bounding_box(&self, center: &Point3<f64>) -> Aabb {
        Aabb::new(
            *center,
            Vector3::new(self.outer_radius, self.outer_radius, f64::MAX),
        )
    }

    fn is_inside(&self, center: &Point3<f64>, point: &Point3<f64>) -> bool {
        self.contains_offset(point.x - center.x, point.y - center.y)
    }
}

/// Annulus with a finite vertical thickness centered on the query point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Washer {
    pub annulus: Annulus,
    pub thickness: f64,
}

impl Washer {
    pub fn new(inner_radius: f64, outer_radius: f64, thickness: f64) -> Self {
        Self {
            annulus: Annulus::new(inner_radius, outer_radius),
            thickness,
        }
    }
}

impl Geometry for Washer {
    fn bounding_box(&self, center: &Point3<f64>) -> Aabb {
        let r = self.annulus.outer_radius;
        Aabb::new(*center, Vector3::new(r, r, self.thickness / 2.0))
    }

    fn is_inside(&self, center: &Point3<f64>, point: &Point3<f64>) -> bool {
        (point.z - center.z).abs() <= self.thickness / 2.0
            && self
                .annulus
                .contains_offset(point.x - center.x, point.y - center.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SphericalShell {
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl SphericalShell {
    pub fn new(inner_radius: f64, outer_radius: f64) -> Self {
        Self {
            inner_radius,
            outer_radius,
        }
    }
}

impl Geometry for SphericalShell {
    fn bounding_box(&self, center: &Point3<f64>) -> Aabb {
        Aabb::new(*center, Vector3::repeat(self.outer_radius))
    }

    fn is_inside(&self, center: &Point3<f64>, point: &Point3<f64>) -> bool {
        ring_contains(
            (point - center).norm_squared(),
            self.inner_radius,
            self.outer_radius,
        )
    }
}

// inner boundary is open, outer closed; a zero inner radius keeps the center
#[inline(always)]
fn ring_contains(d2: f64, inner: f64, outer: f64) -> bool {
    d2 <= outer * outer && (inner <= 0.0 || d2 > inner * inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annulus_ignores_elevation() {
        let annulus = Annulus::new(1.0, 3.0);
        let c = Point3::new(0.0, 0.0, 0.0);
        assert!(annulus.is_inside(&c, &Point3::new(2.0, 0.0, 1e6)));
        assert!(!annulus.is_inside(&c, &Point3::new(0.5, 0.0, 0.0)));
        assert!(!annulus.is_inside(&c, &Point3::new(3.5, 0.0, 0.0)));
        assert!(annulus
            .bounding_box(&c)
            .contains_point(&Point3::new(2.0, 0.0, 1e6)));
    }

    #[test]
    fn washer_limits_thickness() {
        let washer = Washer::new(1.0, 3.0, 2.0);
        let c = Point3::new(10.0, 10.0, 5.0);
        assert!(washer.is_inside(&c, &Point3::new(12.0, 10.0, 5.9)));
        assert!(!washer.is_inside(&c, &Point3::new(12.0, 10.0, 6.1)));
    }

    #[test]
    fn spherical_shell_excludes_core() {
        let shell = SphericalShell::new(1.0, 2.0);
        let c = Point3::origin();
        assert!(shell.is_inside(&c, &Point3::new(0.0, 0.0, 1.5)));
        assert!(!shell.is_inside(&c, &Point3::new(0.0, 0.0, 0.5)));
        assert!(SphericalShell::new(0.0, 2.0).is_inside(&c, &c));
    }
}
