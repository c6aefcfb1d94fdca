use std::f64::consts::PI;

use super::IsoVariogramModel;

/// Cosine hole effect, periodic with wavelength `2 * range`
#[derive(Debug, Clone, Default, Copy)]
pub struct IsoHoleEffect {
    pub range: f64,
    pub sill: f64,
}

impl IsoHoleEffect {
    pub fn new(range: f64, sill: f64) -> Self {
        Self { range, sill }
    }
}

impl IsoVariogramModel for IsoHoleEffect {
    fn c_0(&self) -> f64 {
        self.sill
    }

    #[inline(always)]
    fn variogram(&self, h: f64) -> f64 {
        self.sill * (1.0 - (PI * h / self.range).cos())
    }
}
