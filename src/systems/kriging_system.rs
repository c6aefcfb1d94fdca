use nalgebra::{DMatrix, Point3};

use crate::error::MatrixError;
use crate::spatial_database::DataCell;
use crate::variography::model_variograms::{composite::VariogramSnapshot, VariogramValue};

use super::{
    conditioning::EigenAnalysis,
    system_builder::{CovarianceSystemBuilder, KrigingType},
};

/// Kriging system of one target location.
/// # Members
/// * `cov_mat` - sample to sample covariances of the full model (Czz)
/// * `cov_vec` - sample to target covariances of the target model (Cyz)
/// * `eigen` - conditioning analysis of `cov_mat`
pub struct KrigingSystem<'a> {
    pub cond: &'a [DataCell],
    pub target: Point3<f64>,
    pub model: &'a VariogramSnapshot,
    pub target_model: &'a VariogramSnapshot,
    pub cov_mat: DMatrix<f64>,
    pub cov_vec: Vec<f64>,
    pub eigen: EigenAnalysis,
}

impl<'a> KrigingSystem<'a> {
    pub fn build(
        cond: &'a [DataCell],
        target: Point3<f64>,
        model: &'a VariogramSnapshot,
        target_model: &'a VariogramSnapshot,
    ) -> Result<Self, MatrixError> {
        let cov_mat = CovarianceSystemBuilder::build_cov_mat(
            cond,
            model,
            VariogramValue::Covariance,
            KrigingType::Simple,
        );
        let cov_vec = CovarianceSystemBuilder::build_cov_vec(
            cond,
            &target,
            target_model,
            VariogramValue::Covariance,
            KrigingType::Simple,
        );
        let eigen = EigenAnalysis::new(&cov_mat)?;
        Ok(Self {
            cond,
            target,
            model,
            target_model,
            cov_mat,
            cov_vec,
            eigen,
        })
    }

    #[inline(always)]
    pub fn n_cond(&self) -> usize {
        self.cond.len()
    }

    pub fn values(&self) -> Vec<f64> {
        self.cond.iter().map(|c| c.value).collect()
    }

    pub fn is_ill_conditioned(&self) -> bool {
        self.eigen.is_ill_conditioned()
    }

    pub fn condition_number(&self) -> f64 {
        self.eigen.condition_number()
    }

    /// Same samples seen from another location, the conditioning analysis is reused
    pub fn retargeted(&self, target: Point3<f64>) -> Self {
        Self {
            cond: self.cond,
            target,
            model: self.model,
            target_model: self.target_model,
            cov_mat: self.cov_mat.clone(),
            cov_vec: CovarianceSystemBuilder::build_cov_vec(
                self.cond,
                &target,
                self.target_model,
                VariogramValue::Covariance,
                KrigingType::Simple,
            ),
            eigen: self.eigen.clone(),
        }
    }
}
