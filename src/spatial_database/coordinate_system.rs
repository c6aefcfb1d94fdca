use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct GridSpacing {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl GridSpacing {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn min(&self) -> f64 {
        self.x.min(self.y).min(self.z)
    }

    pub fn as_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// Geological orientation in degrees.
///  - azimuth: clockwise from north (+y) to the major axis
///  - dip: rotation of the major axis below the horizontal
///  - roll: rotation about the major axis
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub azimuth: f64,
    pub dip: f64,
    pub roll: f64,
}

impl Orientation {
    pub fn new(azimuth: f64, dip: f64, roll: f64) -> Self {
        Self { azimuth, dip, roll }
    }
}

/// Rotation pair between world axes and the local (major, minor, vertical) axes of an orientation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CoordinateSystem {
    pub world_to_local: Matrix3<f64>,
    pub local_to_world: Matrix3<f64>,
}

impl Default for CoordinateSystem {
    fn default() -> Self {
        Self::from_orientation(&Orientation::default())
    }
}

impl CoordinateSystem {
    /// Creates the coordinate system for an orientation
    /// local x is the major axis, local y the minor axis and local z the vertical axis
    pub fn from_orientation(orientation: &Orientation) -> Self {
        //azimuth is measured from north, trigonometric angles from east
        let yaw = (orientation.azimuth - 90.0).to_radians();
        let pitch = orientation.dip.to_radians();
        let roll = orientation.roll.to_radians();

        let t_yaw = Matrix3::new(
            yaw.cos(),
            -yaw.sin(),
            0.0,
            yaw.sin(),
            yaw.cos(),
            0.0,
            0.0,
            0.0,
            1.0,
        );
        let t_pitch = Matrix3::new(
            pitch.cos(),
            0.0,
            pitch.sin(),
            0.0,
            1.0,
            0.0,
            -pitch.sin(),
            0.0,
            pitch.cos(),
        );
        let t_roll = Matrix3::new(
            1.0,
            0.0,
            0.0,
            0.0,
            roll.cos(),
            roll.sin(),
            0.0,
            -roll.sin(),
            roll.cos(),
        );

        let world_to_local = t_roll * t_pitch * t_yaw;
        Self {
            world_to_local,
            local_to_world: world_to_local.transpose(),
        }
    }

    /// Convert a world space offset to local coordinates
    #[inline(always)]
    pub fn global_to_local(&self, offset: &Vector3<f64>) -> Vector3<f64> {
        self.world_to_local * offset
    }

    /// Convert a local offset to world coordinates
    #[inline(always)]
    pub fn local_to_global(&self, offset: &Vector3<f64>) -> Vector3<f64> {
        self.local_to_world * offset
    }

    /// Offset of `point` from `origin` in local coordinates
    #[inline(always)]
    pub fn local_offset(&self, origin: &Point3<f64>, point: &Point3<f64>) -> Vector3<f64> {
        self.global_to_local(&(point - origin))
    }
}

/// Linear transform mapping a world separation vector into an isotropic space
/// where distances are expressed in units of the major range.
pub fn anisotropy_transform(orientation: &Orientation, ranges: [f64; 3]) -> Matrix3<f64> {
    let [major, minor, vertical] = ranges;
    let stretch = Matrix3::from_diagonal(&Vector3::new(1.0, major / minor, major / vertical));
    stretch * CoordinateSystem::from_orientation(orientation).world_to_local
}

/// Octant of a point
pub fn octant(point: &Vector3<f64>) -> u8 {
    match (point.x >= 0.0, point.y >= 0.0, point.z >= 0.0) {
        (true, true, true) => 1,
        (false, true, true) => 2,
        (false, false, true) => 3,
        (true, false, true) => 4,
        (true, true, false) => 5,
        (false, true, false) => 6,
        (false, false, false) => 7,
        (true, false, false) => 8,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn zero_azimuth_major_axis_points_north() {
        let cs = CoordinateSystem::from_orientation(&Orientation::default());
        let local = cs.global_to_local(&Vector3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(local, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn azimuth_ninety_major_axis_points_east() {
        let cs = CoordinateSystem::from_orientation(&Orientation::new(90.0, 0.0, 0.0));
        let local = cs.global_to_local(&Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(local, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn local_to_global_inverts_global_to_local() {
        let cs = CoordinateSystem::from_orientation(&Orientation::new(33.0, 12.0, -7.0));
        let v = Vector3::new(1.5, -2.0, 0.25);
        assert_relative_eq!(
            cs.local_to_global(&cs.global_to_local(&v)),
            v,
            epsilon = 1e-12
        );
    }

    #[test]
    fn anisotropy_scales_minor_axis_to_major_units() {
        let t = anisotropy_transform(&Orientation::default(), [100.0, 50.0, 10.0]);
        //50 units east is the full minor range, i.e. one major range
        let h = t * Vector3::new(50.0, 0.0, 0.0);
        assert_relative_eq!(h.norm(), 100.0, epsilon = 1e-9);
        let h = t * Vector3::new(0.0, 0.0, 10.0);
        assert_relative_eq!(h.norm(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn octants_cover_all_sign_combinations() {
        let mut seen = [false; 8];
        for x in [-1.0, 1.0] {
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    seen[octant(&Vector3::new(x, y, z)) as usize - 1] = true;
                }
            }
        }
        assert!(seen.iter().all(|s| *s));
    }
}
