use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::spatial_database::spatial_index::Neighbor;

use self::{
    aabb::Aabb,
    annulus::{Annulus, SphericalShell, Washer},
    dumbbell::VerticalDumbbell,
    ellipsoid::Ellipsoid,
    search_box::SearchBox,
};

pub mod aabb;
pub mod annulus;
pub mod dumbbell;
pub mod ellipsoid;
pub mod search_box;

/// Center relative search geometry.
pub trait Geometry {
    /// Axis aligned box enclosing the geometry placed at `center`
    fn bounding_box(&self, center: &Point3<f64>) -> Aabb;

    /// Exact containment test of `point` for the geometry placed at `center`
    fn is_inside(&self, center: &Point3<f64>, point: &Point3<f64>) -> bool;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SearchNeighborhood {
    Ellipsoid(Ellipsoid),
    Annulus(Annulus),
    Washer(Washer),
    SphericalShell(SphericalShell),
    Box(SearchBox),
    VerticalDumbbell(VerticalDumbbell),
}

impl SearchNeighborhood {
    /// Whether accepted candidates must go through [`Self::perform_spatial_filter`]
    pub fn has_spatial_filtering(&self) -> bool {
        match self {
            SearchNeighborhood::Ellipsoid(e) => e.has_spatial_filtering(),
            _ => false,
        }
    }

    /// Sector balancing of the accepted candidates, keeping at most `max_samples`.
    /// Shapes without sectors keep the `max_samples` nearest.
    pub fn perform_spatial_filter(
        &self,
        center: &Point3<f64>,
        candidates: Vec<Neighbor>,
        max_samples: usize,
    ) -> Vec<Neighbor> {
        match self {
            SearchNeighborhood::Ellipsoid(e) => {
                e.perform_spatial_filter(center, candidates, max_samples)
            }
            _ => nearest(candidates, max_samples),
        }
    }
}

impl Geometry for SearchNeighborhood {
    fn bounding_box(&self, center: &Point3<f64>) -> Aabb {
        match self {
            SearchNeighborhood::Ellipsoid(g) => g.bounding_box(center),
            SearchNeighborhood::Annulus(g) => g.bounding_box(center),
            SearchNeighborhood::Washer(g) => g.bounding_box(center),
            SearchNeighborhood::SphericalShell(g) => g.bounding_box(center),
            SearchNeighborhood::Box(g) => g.bounding_box(center),
            SearchNeighborhood::VerticalDumbbell(g) => g.bounding_box(center),
        }
    }

    fn is_inside(&self, center: &Point3<f64>, point: &Point3<f64>) -> bool {
        match self {
            SearchNeighborhood::Ellipsoid(g) => g.is_inside(center, point),
            SearchNeighborhood::Annulus(g) => g.is_inside(center, point),
            SearchNeighborhood::Washer(g) => g.is_inside(center, point),
            SearchNeighborhood::SphericalShell(g) => g.is_inside(center, point),
            SearchNeighborhood::Box(g) => g.is_inside(center, point),
            SearchNeighborhood::VerticalDumbbell(g) => g.is_inside(center, point),
        }
    }
}

impl From<Ellipsoid> for SearchNeighborhood {
    fn from(value: Ellipsoid) -> Self {
        SearchNeighborhood::Ellipsoid(value)
    }
}

impl From<SearchBox> for SearchNeighborhood {
    fn from(value: SearchBox) -> Self {
        SearchNeighborhood::Box(value)
    }
}

/// `n` candidates closest to the query center
pub(crate) fn nearest(mut candidates: Vec<Neighbor>, n: usize) -> Vec<Neighbor> {
    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    candidates.truncate(n);
    candidates
}
