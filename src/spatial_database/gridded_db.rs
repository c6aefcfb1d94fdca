use nalgebra::{Point3, Vector3};

use crate::error::KrigingError;
use crate::geometry::aabb::Aabb;

use super::{coordinate_system::GridSpacing, SampleSource};

/// Regular axis aligned grid, values stored with x varying fastest then y then z.
/// # Members
/// * `origin` - center of the first cell
/// * `grid_spacing` - size of each cell
/// * `dims` - number of cells along x, y and z
#[derive(Clone, Debug)]
pub struct CartesianGrid {
    origin: Point3<f64>,
    grid_spacing: GridSpacing,
    dims: [usize; 3],
    values: Vec<f64>,
    no_data_value: Option<f64>,
}

/// Cell of a [`CartesianGrid`] addressed by its (i, j, k) indices
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridCell {
    pub ijk: [usize; 3],
    pub center: Point3<f64>,
}

impl GridCell {
    /// Manhattan distance in cells
    pub fn topological_distance(&self, other: &GridCell) -> usize {
        self.ijk
            .iter()
            .zip(other.ijk.iter())
            .map(|(a, b)| a.abs_diff(*b))
            .sum()
    }
}

impl CartesianGrid {
    pub fn new(
        origin: Point3<f64>,
        grid_spacing: GridSpacing,
        dims: [usize; 3],
        values: Vec<f64>,
    ) -> Result<Self, KrigingError> {
        let n_cells = dims.iter().product::<usize>();
        if n_cells == 0 {
            return Err(KrigingError::InvalidGrid(format!("empty grid {:?}", dims)));
        }
        if values.len() != n_cells {
            return Err(KrigingError::InvalidGrid(format!(
                "{} values for {}x{}x{} cells",
                values.len(),
                dims[0],
                dims[1],
                dims[2]
            )));
        }
        if grid_spacing.x <= 0.0 || grid_spacing.y <= 0.0 || grid_spacing.z <= 0.0 {
            return Err(KrigingError::InvalidGrid(format!(
                "cell sizes must be positive, got {:?}",
                grid_spacing
            )));
        }
        Ok(Self {
            origin,
            grid_spacing,
            dims,
            values,
            no_data_value: None,
        })
    }

    /// Grid holding only geometry, every cell is no-data
    pub fn geometry_only(
        origin: Point3<f64>,
        grid_spacing: GridSpacing,
        dims: [usize; 3],
    ) -> Result<Self, KrigingError> {
        let n_cells = dims.iter().product::<usize>();
        Self::new(origin, grid_spacing, dims, vec![f64::NAN; n_cells])
    }

    pub fn with_no_data_value(mut self, no_data_value: f64) -> Self {
        self.no_data_value = Some(no_data_value);
        self
    }

    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    pub fn grid_spacing(&self) -> GridSpacing {
        self.grid_spacing
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn n_cells(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline(always)]
    pub fn ijk_to_ind(&self, ijk: [usize; 3]) -> usize {
        ijk[0] + ijk[1] * self.dims[0] + ijk[2] * self.dims[0] * self.dims[1]
    }

    #[inline(always)]
    pub fn ind_to_ijk(&self, ind: usize) -> [usize; 3] {
        let nxy = self.dims[0] * self.dims[1];
        let k = ind / nxy;
        let rem = ind % nxy;
        [rem % self.dims[0], rem / self.dims[0], k]
    }

    /// Point at index grid in world coordinates
    #[inline(always)]
    pub fn ind_to_point(&self, ijk: [usize; 3]) -> Point3<f64> {
        Point3::new(
            self.origin.x + ijk[0] as f64 * self.grid_spacing.x,
            self.origin.y + ijk[1] as f64 * self.grid_spacing.y,
            self.origin.z + ijk[2] as f64 * self.grid_spacing.z,
        )
    }

    /// Cell containing the point, points outside the grid snap to the closest border cell
    pub fn coord_to_ind_clamped(&self, point: &Point3<f64>) -> [usize; 3] {
        let local = (point - self.origin).component_div(&self.grid_spacing.as_vector());
        let clamp = |v: f64, n: usize| v.round().clamp(0.0, (n - 1) as f64) as usize;
        [
            clamp(local.x, self.dims[0]),
            clamp(local.y, self.dims[1]),
            clamp(local.z, self.dims[2]),
        ]
    }

    pub fn cell(&self, ind: usize) -> GridCell {
        let ijk = self.ind_to_ijk(ind);
        GridCell {
            ijk,
            center: self.ind_to_point(ijk),
        }
    }

    pub fn get(&self, ijk: [usize; 3]) -> Option<f64> {
        if ijk.iter().zip(self.dims.iter()).any(|(i, n)| i >= n) {
            return None;
        }
        self.values.get(self.ijk_to_ind(ijk)).copied()
    }
}

impl SampleSource for CartesianGrid {
    fn n_samples(&self) -> usize {
        self.values.len()
    }

    fn location(&self, ind: usize) -> Point3<f64> {
        self.ind_to_point(self.ind_to_ijk(ind))
    }

    fn value(&self, ind: usize) -> f64 {
        self.values[ind]
    }

    fn no_data_value(&self) -> Option<f64> {
        self.no_data_value
    }

    /// Half cell sized box, the tolerance is not used for grids
    fn index_bounds(&self, ind: usize, _tolerance: f64) -> Aabb {
        Aabb::new(self.location(ind), self.grid_spacing.as_vector() / 2.0)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        if self.values.is_empty() {
            return None;
        }
        let last = self.ind_to_point([self.dims[0] - 1, self.dims[1] - 1, self.dims[2] - 1]);
        Some(Aabb::from_min_max(self.origin, last))
    }
}

impl std::ops::Index<[usize; 3]> for CartesianGrid {
    type Output = f64;

    fn index(&self, ijk: [usize; 3]) -> &Self::Output {
        &self.values[self.ijk_to_ind(ijk)]
    }
}

pub(crate) fn spacing_ratio(extent: &Vector3<f64>, spacing: &GridSpacing) -> [f64; 3] {
    [
        extent.x / spacing.x,
        extent.y / spacing.y,
        extent.z / spacing.z,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> CartesianGrid {
        CartesianGrid::new(
            Point3::new(0.5, 0.5, 0.5),
            GridSpacing::new(1.0, 2.0, 3.0),
            [4, 3, 2],
            (0..24).map(|v| v as f64).collect(),
        )
        .unwrap()
    }

    #[test]
    fn linear_index_round_trip() {
        let g = grid();
        for ind in 0..g.n_cells() {
            assert_eq!(g.ijk_to_ind(g.ind_to_ijk(ind)), ind);
        }
        assert_eq!(g.ind_to_ijk(13), [1, 0, 1]);
        assert_eq!(g[[1, 0, 1]], 13.0);
        assert_eq!(g.get([1, 0, 1]), Some(13.0));
        assert_eq!(g.get([4, 0, 0]), None);
        assert_eq!(g.values().len(), g.n_cells());
    }

    #[test]
    fn cell_centers_and_topology() {
        let g = grid();
        let a = g.cell(0);
        let b = g.cell(g.ijk_to_ind([3, 2, 1]));
        assert_eq!(b.center, Point3::new(3.5, 4.5, 3.5));
        assert_eq!(a.topological_distance(&b), 6);
        assert_eq!(g.coord_to_ind_clamped(&Point3::new(100.0, -5.0, 3.6)), [3, 0, 1]);
    }

    #[test]
    fn rejects_mismatched_values() {
        let g = CartesianGrid::new(
            Point3::origin(),
            GridSpacing::new(1.0, 1.0, 1.0),
            [2, 2, 2],
            vec![0.0; 7],
        );
        assert!(matches!(g, Err(KrigingError::InvalidGrid(_))));
    }
}
