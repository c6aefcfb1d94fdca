use serde::{Deserialize, Serialize};

pub mod composite;
pub mod iso_exponential;
pub mod iso_gaussian;
pub mod iso_hole_effect;
pub mod iso_nugget;
pub mod iso_power;
pub mod iso_spherical;
pub mod structure;

/// Isotropic model of one variogram structure evaluated on a scalar lag.
pub trait IsoVariogramModel {
    /// Covariance at zero lag
    fn c_0(&self) -> f64;
    fn variogram(&self, h: f64) -> f64;

    fn covariogram(&self, h: f64) -> f64 {
        self.c_0() - self.variogram(h)
    }
}

/// Which side of the model a system is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VariogramValue {
    /// C(h) = sill - γ(h)
    #[default]
    Covariance,
    /// γ(h)
    Semivariance,
}
