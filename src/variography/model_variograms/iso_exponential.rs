use super::IsoVariogramModel;

/// Exponential structure with practical range (95% of the sill reached at `range`)
#[derive(Debug, Clone, Default, Copy)]
pub struct IsoExponential {
    pub range: f64,
    pub sill: f64,
}

impl IsoExponential {
    pub fn new(range: f64, sill: f64) -> Self {
        Self { range, sill }
    }
}

impl IsoVariogramModel for IsoExponential {
    fn c_0(&self) -> f64 {
        self.sill
    }

    #[inline(always)]
    fn variogram(&self, h: f64) -> f64 {
        self.sill * (1.0 - (-3.0 * h / self.range).exp())
    }
}
