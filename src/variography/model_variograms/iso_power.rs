use super::IsoVariogramModel;

/// Power structure `c * h^1.5`, unbounded so its covariance has no physical meaning.
#[derive(Debug, Clone, Default, Copy)]
pub struct IsoPower {
    pub contribution: f64,
}

impl IsoPower {
    pub const EXPONENT: f64 = 1.5;

    pub fn new(contribution: f64) -> Self {
        Self { contribution }
    }
}

impl IsoVariogramModel for IsoPower {
    fn c_0(&self) -> f64 {
        self.contribution
    }

    #[inline(always)]
    fn variogram(&self, h: f64) -> f64 {
        self.contribution * h.powf(Self::EXPONENT)
    }
}
