use itertools::Itertools;
use nalgebra::{Point3, Vector3};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::spatial_database::coordinate_system::{octant, CoordinateSystem, Orientation};
use crate::spatial_database::spatial_index::Neighbor;

use super::{aabb::Aabb, Geometry};

/// Serializable description of an [`Ellipsoid`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EllipsoidParams {
    pub range_major: f64,
    pub range_minor: f64,
    pub range_vertical: f64,
    #[serde(default)]
    pub orientation: Orientation,
    /// maximum accepted samples per octant (0 = no octant search)
    #[serde(default)]
    pub max_per_octant: usize,
    /// minimum number of informed octants (0 = unused)
    #[serde(default)]
    pub min_octants: usize,
}

/// Oriented search ellipsoid
/// local axes are (major, minor, vertical), see [`CoordinateSystem::from_orientation`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "EllipsoidParams", into = "EllipsoidParams")]
pub struct Ellipsoid {
    pub params: EllipsoidParams,
    coordinate_system: CoordinateSystem,
}

impl From<EllipsoidParams> for Ellipsoid {
    fn from(params: EllipsoidParams) -> Self {
        Self {
            coordinate_system: CoordinateSystem::from_orientation(&params.orientation),
            params,
        }
    }
}

impl From<Ellipsoid> for EllipsoidParams {
    fn from(value: Ellipsoid) -> Self {
        value.params
    }
}

impl Ellipsoid {
    /// Create a new Ellipsoid with given major, minor and vertical semi axes
    pub fn new(
        range_major: f64,
        range_minor: f64,
        range_vertical: f64,
        orientation: Orientation,
    ) -> Self {
        EllipsoidParams {
            range_major,
            range_minor,
            range_vertical,
            orientation,
            max_per_octant: 0,
            min_octants: 0,
        }
        .into()
    }

    /// Isotropic sphere
    pub fn sphere(radius: f64) -> Self {
        Self::new(radius, radius, radius, Orientation::default())
    }

    /// Limit the number of accepted samples in each octant
    pub fn with_octants(mut self, max_per_octant: usize, min_octants: usize) -> Self {
        self.params.max_per_octant = max_per_octant;
        self.params.min_octants = min_octants;
        self
    }

    pub fn coordinate_system(&self) -> &CoordinateSystem {
        &self.coordinate_system
    }

    #[inline(always)]
    pub fn normalized_local_distance_sq(&self, local: &Vector3<f64>) -> f64 {
        let u = local.x / self.params.range_major;
        let v = local.y / self.params.range_minor;
        let w = local.z / self.params.range_vertical;

        u * u + v * v + w * w
    }

    pub fn has_spatial_filtering(&self) -> bool {
        self.params.max_per_octant > 0 || self.params.min_octants > 0
    }

    /// Octant balanced selection
    ///  1. bucket candidates by octant of their local offset
    ///  2. keep the `max_per_octant` closest (anisotropic distance) of every octant
    ///  3. reject everything if fewer than `min_octants` octants are informed
    ///  4. keep the `max_samples` closest of the survivors
    pub fn perform_spatial_filter(
        &self,
        center: &Point3<f64>,
        candidates: Vec<Neighbor>,
        max_samples: usize,
    ) -> Vec<Neighbor> {
        let per_octant = match self.params.max_per_octant {
            0 => usize::MAX,
            n => n,
        };

        let keyed = candidates.into_iter().map(|n| {
            let local = self.coordinate_system.local_offset(center, &n.location);
            (octant(&local), self.normalized_local_distance_sq(&local), n)
        });

        let octants = keyed.into_group_map_by(|(o, _, _)| *o);
        if octants.len() < self.params.min_octants {
            return Vec::new();
        }

        octants
            .into_values()
            .flat_map(|group| {
                group
                    .into_iter()
                    .sorted_by_key(|(_, d, _)| OrderedFloat(*d))
                    .take(per_octant)
            })
            .sorted_by_key(|(_, d, _)| OrderedFloat(*d))
            .take(max_samples)
            .map(|(_, _, n)| n)
            .collect()
    }
}

impl Geometry for Ellipsoid {
    /// Computes the bounding box of the ellipsoid in world coordinates
    fn bounding_box(&self, center: &Point3<f64>) -> Aabb {
        let local = Aabb::new(
            Point3::origin(),
            Vector3::new(
                self.params.range_major,
                self.params.range_minor,
                self.params.range_vertical,
            ),
        );
        local.transformed_by(&self.coordinate_system.local_to_world, center)
    }

    fn is_inside(&self, center: &Point3<f64>, point: &Point3<f64>) -> bool {
        let local = self.coordinate_system.local_offset(center, point);
        self.normalized_local_distance_sq(&local) <= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbor(index: usize, x: f64, y: f64, z: f64) -> Neighbor {
        let location = Point3::new(x, y, z);
        Neighbor {
            index,
            location,
            distance: location.coords.norm(),
        }
    }

    #[test]
    fn oriented_ellipsoid_contains_major_axis() {
        //major axis toward the east
        let e = Ellipsoid::new(10.0, 2.0, 1.0, Orientation::new(90.0, 0.0, 0.0));
        let c = Point3::new(100.0, 100.0, 0.0);
        assert!(e.is_inside(&c, &Point3::new(109.0, 100.0, 0.0)));
        assert!(!e.is_inside(&c, &Point3::new(100.0, 109.0, 0.0)));
        assert!(e.is_inside(&c, &Point3::new(100.0, 101.5, 0.0)));
    }

    #[test]
    fn bounding_box_encloses_ellipsoid() {
        let e = Ellipsoid::new(10.0, 4.0, 2.0, Orientation::new(30.0, 20.0, 10.0));
        let c = Point3::new(1.0, 2.0, 3.0);
        let bbox = e.bounding_box(&c).loosened(1e-9);
        let cs = e.coordinate_system();
        for axis in [
            Vector3::new(10.0, 0.0, 0.0),
            Vector3::new(0.0, 4.0, 0.0),
            Vector3::new(0.0, 0.0, 2.0),
        ] {
            for sign in [-1.0, 1.0] {
                let p = c + cs.local_to_global(&(axis * sign));
                assert!(e.is_inside(&c, &(c + (p - c) * 0.999)));
                assert!(bbox.contains_point(&p));
            }
        }
    }

    #[test]
    fn octant_filter_limits_each_octant() {
        let e = Ellipsoid::sphere(100.0).with_octants(2, 0);
        //five samples in the first octant and one in the seventh
        let mut candidates: Vec<_> = (1..=5)
            .map(|i| neighbor(i, i as f64, i as f64, i as f64))
            .collect();
        candidates.push(neighbor(0, -50.0, -50.0, -50.0));

        let kept = e.perform_spatial_filter(&Point3::origin(), candidates, 10);
        let mut inds: Vec<_> = kept.iter().map(|n| n.index).collect();
        inds.sort();
        assert_eq!(inds, vec![0, 1, 2]);
    }

    #[test]
    fn octant_filter_requires_min_octants() {
        let e = Ellipsoid::sphere(100.0).with_octants(4, 2);
        let candidates = vec![neighbor(0, 1.0, 1.0, 1.0), neighbor(1, 2.0, 2.0, 2.0)];
        assert!(e
            .perform_spatial_filter(&Point3::origin(), candidates, 10)
            .is_empty());
    }
}
