use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::spatial_database::coordinate_system::{anisotropy_transform, Orientation};

use super::{
    iso_exponential::IsoExponential, iso_gaussian::IsoGaussian, iso_hole_effect::IsoHoleEffect,
    iso_power::IsoPower, iso_spherical::IsoSpherical, IsoVariogramModel,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureType {
    Spherical,
    Exponential,
    Gaussian,
    Power,
    HoleEffect,
}

/// One nested structure of a variogram model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariogramStructure {
    pub structure_type: StructureType,
    pub contribution: f64,
    #[serde(flatten)]
    pub orientation: Orientation,
    pub range_major: f64,
    pub range_minor: f64,
    pub range_vertical: f64,
}

impl VariogramStructure {
    pub fn new(
        structure_type: StructureType,
        contribution: f64,
        ranges: [f64; 3],
        orientation: Orientation,
    ) -> Self {
        Self {
            structure_type,
            contribution,
            orientation,
            range_major: ranges[0],
            range_minor: ranges[1],
            range_vertical: ranges[2],
        }
    }

    pub fn isotropic(structure_type: StructureType, contribution: f64, range: f64) -> Self {
        Self::new(
            structure_type,
            contribution,
            [range; 3],
            Orientation::default(),
        )
    }

    pub fn ranges(&self) -> [f64; 3] {
        [self.range_major, self.range_minor, self.range_vertical]
    }

    /// Isotropic model evaluated on lags expressed in major range units
    pub fn iso_model(&self) -> VariogramType {
        let (range, sill) = (self.range_major, self.contribution);
        match self.structure_type {
            StructureType::Spherical => VariogramType::Spherical(IsoSpherical::new(range, sill)),
            StructureType::Exponential => {
                VariogramType::Exponential(IsoExponential::new(range, sill))
            }
            StructureType::Gaussian => VariogramType::Gaussian(IsoGaussian::new(range, sill)),
            StructureType::Power => VariogramType::Power(IsoPower::new(sill)),
            StructureType::HoleEffect => VariogramType::HoleEffect(IsoHoleEffect::new(range, sill)),
        }
    }

    /// Structure with its anisotropy transform precomputed
    pub fn prepare(&self) -> PreparedStructure {
        PreparedStructure {
            model: self.iso_model(),
            transform: anisotropy_transform(&self.orientation, self.ranges()),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum VariogramType {
    Spherical(IsoSpherical),
    Exponential(IsoExponential),
    Gaussian(IsoGaussian),
    Power(IsoPower),
    HoleEffect(IsoHoleEffect),
}

impl IsoVariogramModel for VariogramType {
    fn c_0(&self) -> f64 {
        match self {
            VariogramType::Spherical(v) => v.c_0(),
            VariogramType::Exponential(v) => v.c_0(),
            VariogramType::Gaussian(v) => v.c_0(),
            VariogramType::Power(v) => v.c_0(),
            VariogramType::HoleEffect(v) => v.c_0(),
        }
    }

    #[inline(always)]
    fn variogram(&self, h: f64) -> f64 {
        match self {
            VariogramType::Spherical(v) => v.variogram(h),
            VariogramType::Exponential(v) => v.variogram(h),
            VariogramType::Gaussian(v) => v.variogram(h),
            VariogramType::Power(v) => v.variogram(h),
            VariogramType::HoleEffect(v) => v.variogram(h),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PreparedStructure {
    pub model: VariogramType,
    pub transform: Matrix3<f64>,
}

impl PreparedStructure {
    /// Anisotropic lag of a world separation vector
    #[inline(always)]
    pub fn lag(&self, h: &Vector3<f64>) -> f64 {
        (self.transform * h).norm()
    }

    #[inline(always)]
    pub fn variogram(&self, h: &Vector3<f64>) -> f64 {
        self.model.variogram(self.lag(h))
    }
}
