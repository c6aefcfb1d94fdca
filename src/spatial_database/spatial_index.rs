use nalgebra::Point3;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::RTree;
use tracing::{debug, warn};

use crate::geometry::{aabb::Aabb, nearest, Geometry};

use super::{search_strategy::SearchStrategy, SampleSource};

/// Back reference stored in the r-tree: sample index in the dataset and its location.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleRef {
    pub index: usize,
    pub location: [f64; 3],
}

impl SampleRef {
    #[inline(always)]
    pub fn point(&self) -> Point3<f64> {
        Point3::from(self.location)
    }
}

type IndexedSample = GeomWithData<Rectangle<[f64; 3]>, SampleRef>;

/// Sample returned by a query, `distance` is the euclidean distance to the query point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub location: Point3<f64>,
    pub distance: f64,
}

impl Neighbor {
    #[inline(always)]
    fn new(sample: &SampleRef, query: &Point3<f64>) -> Self {
        let location = sample.point();
        Self {
            index: sample.index,
            location,
            distance: nalgebra::distance(&location, query),
        }
    }
}

/// R-tree over the boxes of valued samples.
/// Holds geometry and back references only, refill after the dataset changes.
#[derive(Clone, Default)]
pub struct SpatialIndex {
    tree: RTree<IndexedSample>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_source<S: SampleSource + ?Sized>(source: &S, tolerance: f64) -> Self {
        let mut index = Self::new();
        index.fill(source, tolerance);
        index
    }

    /// Clears the index and bulk loads one box per valued sample.
    /// Points get a box of half size `tolerance`, grid cells a half cell box
    /// and segments their extent grown by `tolerance`.
    pub fn fill<S: SampleSource + ?Sized>(&mut self, source: &S, tolerance: f64) {
        let entries = (0..source.n_samples())
            .filter(|&i| source.has_value(i))
            .map(|i| {
                let bounds = source.index_bounds(i, tolerance);
                let location = source.location(i);
                let mins = bounds.mins();
                let maxs = bounds.maxs();
                IndexedSample::new(
                    Rectangle::from_corners([mins.x, mins.y, mins.z], [maxs.x, maxs.y, maxs.z]),
                    SampleRef {
                        index: i,
                        location: [location.x, location.y, location.z],
                    },
                )
            })
            .collect::<Vec<_>>();

        if entries.is_empty() {
            warn!(
                n_samples = source.n_samples(),
                "spatial index filled without any valued sample"
            );
        } else {
            debug!(n_indexed = entries.len(), "spatial index filled");
        }

        self.tree = RTree::bulk_load(entries);
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// All indexed samples in arbitrary order
    pub fn samples(&self) -> impl Iterator<Item = &SampleRef> {
        self.tree.iter().map(|entry| &entry.data)
    }

    /// Up to `n` samples closest to `point`, nearest first
    pub fn k_nearest(&self, point: &Point3<f64>, n: usize) -> Vec<Neighbor> {
        self.k_nearest_filtered(point, n, f64::INFINITY, None)
    }

    /// Up to `n` samples closest to the location of sample `index`, the sample itself excluded
    pub fn k_nearest_excluding(
        &self,
        point: &Point3<f64>,
        n: usize,
        index: usize,
    ) -> Vec<Neighbor> {
        self.k_nearest_filtered(point, n, f64::INFINITY, Some(index))
    }

    /// Up to `n` samples closest to `point` no farther than `max_distance`
    pub fn k_nearest_within(
        &self,
        point: &Point3<f64>,
        n: usize,
        max_distance: f64,
    ) -> Vec<Neighbor> {
        self.k_nearest_filtered(point, n, max_distance, None)
    }

    fn k_nearest_filtered(
        &self,
        point: &Point3<f64>,
        n: usize,
        max_distance: f64,
        exclude: Option<usize>,
    ) -> Vec<Neighbor> {
        let mut best: Vec<Neighbor> = Vec::with_capacity(n + 1);
        if n == 0 {
            return best;
        }

        // a sample is never closer than its box, stop once boxes are farther than the current worst
        for (entry, box_dist_sq) in self
            .tree
            .nearest_neighbor_iter_with_distance_2(&[point.x, point.y, point.z])
        {
            let worst = if best.len() == n {
                best[n - 1].distance.min(max_distance)
            } else {
                max_distance
            };
            if box_dist_sq > worst * worst {
                break;
            }
            if Some(entry.data.index) == exclude {
                continue;
            }

            let neighbor = Neighbor::new(&entry.data, point);
            if neighbor.distance > max_distance {
                continue;
            }
            let pos = best.partition_point(|b| b.distance <= neighbor.distance);
            best.insert(pos, neighbor);
            best.truncate(n);
        }

        best
    }

    /// Samples selected by a search strategy around `center`, nearest first unless the
    /// neighborhood reorders them. Empty when fewer than `min_samples` survive.
    pub fn nearest_within(&self, center: &Point3<f64>, strategy: &SearchStrategy) -> Vec<Neighbor> {
        let neighborhood = &strategy.neighborhood;
        let envelope = neighborhood.bounding_box(center).envelope();

        let min_dist = strategy.min_distance_between_samples;
        let mut accepted_points: RTree<[f64; 3]> = RTree::new();
        let mut accepted = Vec::new();

        for entry in self.tree.locate_in_envelope_intersecting(&envelope) {
            let sample = &entry.data;
            if !neighborhood.is_inside(center, &sample.point()) {
                continue;
            }

            if min_dist > 0.0 {
                let too_close = accepted_points
                    .nearest_neighbor(&sample.location)
                    .is_some_and(|p| {
                        nalgebra::distance(&Point3::from(*p), &sample.point()) < min_dist
                    });
                if too_close {
                    continue;
                }
                accepted_points.insert(sample.location);
            }

            accepted.push(Neighbor::new(sample, center));
        }

        let selected = if neighborhood.has_spatial_filtering() {
            neighborhood.perform_spatial_filter(center, accepted, strategy.max_samples)
        } else {
            nearest(accepted, strategy.max_samples)
        };

        if selected.len() < strategy.min_samples {
            return Vec::new();
        }
        selected
    }

    /// Indices of samples whose box intersects `bbox`
    pub fn within_bounding_box(&self, bbox: &Aabb) -> Vec<usize> {
        self.tree
            .locate_in_envelope_intersecting(&bbox.envelope())
            .map(|entry| entry.data.index)
            .collect()
    }
}
