use nalgebra::{Matrix3, Point3, Vector3};
use rstar::AABB;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub center: Point3<f64>,
    pub half_extents: Vector3<f64>,
}

impl Aabb {
    #[inline(always)]
    pub fn new(center: Point3<f64>, half_extents: Vector3<f64>) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    #[inline(always)]
    pub fn from_min_max(min: Point3<f64>, max: Point3<f64>) -> Self {
        let center = nalgebra::center(&min, &max);
        let half_extents = (max - min) / 2.0;
        Self {
            center,
            half_extents,
        }
    }

    /// Box enclosing all points, `None` if the iterator is empty.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (mins, maxs) = points.fold((*first, *first), |(mins, maxs), p| {
            (mins.inf(p), maxs.sup(p))
        });
        Some(Self::from_min_max(mins, maxs))
    }

    #[inline(always)]
    pub fn mins(&self) -> Point3<f64> {
        self.center - self.half_extents
    }

    #[inline(always)]
    pub fn maxs(&self) -> Point3<f64> {
        self.center + self.half_extents
    }

    #[inline(always)]
    pub fn contains_point(&self, point: &Point3<f64>) -> bool {
        let mins = self.mins();
        let maxs = self.maxs();

        mins.x <= point.x
            && mins.y <= point.y
            && mins.z <= point.z
            && maxs.x >= point.x
            && maxs.y >= point.y
            && maxs.z >= point.z
    }

    /// Box grown by `tolerance` on every side.
    #[inline(always)]
    pub fn loosened(&self, tolerance: f64) -> Self {
        Self::new(
            self.center,
            self.half_extents.add_scalar(tolerance.max(0.0)),
        )
    }

    /// Enclosing box of this box (expressed in a local frame centered at the origin)
    /// after rotation into world space and translation to `origin`.
    #[inline(always)]
    pub fn transformed_by(&self, rotation: &Matrix3<f64>, origin: &Point3<f64>) -> Self {
        let center = origin + rotation * self.center.coords;
        let half_extents = rotation.abs() * self.half_extents;

        Self {
            center,
            half_extents,
        }
    }

    #[inline(always)]
    pub fn merged(&self, other: &Self) -> Self {
        Self::from_min_max(self.mins().inf(&other.mins()), self.maxs().sup(&other.maxs()))
    }

    /// Envelope used to query the r-tree.
    pub fn envelope(&self) -> AABB<[f64; 3]> {
        let mins = self.mins();
        let maxs = self.maxs();
        AABB::from_corners([mins.x, mins.y, mins.z], [maxs.x, maxs.y, maxs.z])
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn rotated_box_encloses_rotated_corners() {
        let bbox = Aabb::new(Point3::origin(), Vector3::new(2.0, 1.0, 0.5));
        let angle = std::f64::consts::FRAC_PI_4;
        let rotation = Matrix3::new(
            angle.cos(),
            -angle.sin(),
            0.0,
            angle.sin(),
            angle.cos(),
            0.0,
            0.0,
            0.0,
            1.0,
        );
        let origin = Point3::new(10.0, 0.0, 0.0);
        let world = bbox.transformed_by(&rotation, &origin);

        for sx in [-1.0, 1.0] {
            for sy in [-1.0, 1.0] {
                let corner = Vector3::new(2.0 * sx, 1.0 * sy, 0.0);
                assert!(world.loosened(1e-9).contains_point(&(origin + rotation * corner)));
            }
        }
        assert_relative_eq!(world.half_extents.x, 3.0 * angle.cos(), epsilon = 1e-12);
    }

    #[test]
    fn bounding_box_of_points() {
        let points = vec![
            Point3::new(0.0, 5.0, -1.0),
            Point3::new(2.0, 1.0, 3.0),
            Point3::new(-1.0, 2.0, 0.0),
        ];
        let bbox = Aabb::from_points(&points).unwrap();
        assert_eq!(bbox.mins(), Point3::new(-1.0, 1.0, -1.0));
        assert_eq!(bbox.maxs(), Point3::new(2.0, 5.0, 3.0));
        assert!(Aabb::from_points(&Vec::<Point3<f64>>::new()).is_none());
    }
}
