use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::KrigingError;

use super::{
    iso_nugget::IsoNugget,
    structure::{PreparedStructure, StructureType, VariogramStructure},
    IsoVariogramModel, VariogramValue,
};

/// Nugget plus an ordered list of nested structures, `sill = nugget + Σ contribution`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariogramModel {
    pub nugget: f64,
    #[serde(default)]
    pub structures: Vec<VariogramStructure>,
}

impl VariogramModel {
    pub fn new(nugget: f64, structures: Vec<VariogramStructure>) -> Self {
        Self { nugget, structures }
    }

    pub fn sill(&self) -> f64 {
        self.nugget + self.structures.iter().map(|s| s.contribution).sum::<f64>()
    }

    pub fn n_structures(&self) -> usize {
        self.structures.len()
    }

    pub fn structure(&self, i: usize) -> Option<&VariogramStructure> {
        self.structures.get(i)
    }

    /// Largest major range of all structures, 0 for a pure nugget model
    pub fn max_range(&self) -> f64 {
        self.structures
            .iter()
            .map(|s| s.range_major)
            .fold(0.0, f64::max)
    }

    /// Model made of structure `i` alone, without nugget
    pub fn single_structure(&self, i: usize) -> Result<Self, KrigingError> {
        let structure = self
            .structures
            .get(i)
            .ok_or(KrigingError::InvalidFactor {
                factor: i,
                n_structures: self.structures.len(),
            })?;
        Ok(Self::new(0.0, vec![*structure]))
    }

    /// Model made of the nugget alone
    pub fn nugget_only(&self) -> Self {
        Self::new(self.nugget, Vec::new())
    }

    pub fn without_nugget(&self) -> Self {
        Self::new(0.0, self.structures.clone())
    }

    pub fn validate(&self) -> Result<(), KrigingError> {
        if !(self.nugget >= 0.0) || !self.nugget.is_finite() {
            return Err(KrigingError::InvalidVariogramModel(format!(
                "nugget must be a non negative number, got {}",
                self.nugget
            )));
        }
        for (i, s) in self.structures.iter().enumerate() {
            if !(s.contribution >= 0.0) || !s.contribution.is_finite() {
                return Err(KrigingError::InvalidVariogramModel(format!(
                    "structure {} has contribution {}",
                    i, s.contribution
                )));
            }
            if s.ranges().iter().any(|r| !(*r > 0.0) || !r.is_finite()) {
                return Err(KrigingError::InvalidVariogramModel(format!(
                    "structure {} has non positive ranges {:?}",
                    i,
                    s.ranges()
                )));
            }
        }
        if self.sill() <= 0.0 {
            return Err(KrigingError::InvalidVariogramModel(
                "model has a zero sill".to_string(),
            ));
        }
        Ok(())
    }

    /// Immutable copy with precomputed anisotropy transforms, shared by every worker of a run
    pub fn snapshot(&self) -> VariogramSnapshot {
        if self
            .structures
            .iter()
            .any(|s| s.structure_type == StructureType::Power)
        {
            warn!("power structure has no sill, covariances of this model are not bounded");
        }
        VariogramSnapshot {
            nugget: IsoNugget::new(self.nugget),
            sill: self.sill(),
            structures: self.structures.iter().map(|s| s.prepare()).collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct VariogramSnapshot {
    nugget: IsoNugget,
    sill: f64,
    structures: Vec<PreparedStructure>,
}

impl VariogramSnapshot {
    pub fn sill(&self) -> f64 {
        self.sill
    }

    pub fn nugget(&self) -> f64 {
        self.nugget.nugget
    }

    pub fn n_structures(&self) -> usize {
        self.structures.len()
    }

    /// γ between two locations, zero at zero separation
    #[inline(always)]
    pub fn semivariance(&self, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
        let h = b - a;
        let lag = h.norm();
        self.nugget.variogram(lag)
            + self
                .structures
                .iter()
                .map(|s| s.variogram(&h))
                .sum::<f64>()
    }

    /// sill - γ between two locations
    #[inline(always)]
    pub fn covariance(&self, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
        self.sill - self.semivariance(a, b)
    }

    #[inline(always)]
    pub fn evaluate(&self, a: &Point3<f64>, b: &Point3<f64>, value: VariogramValue) -> f64 {
        match value {
            VariogramValue::Covariance => self.covariance(a, b),
            VariogramValue::Semivariance => self.semivariance(a, b),
        }
    }
}
