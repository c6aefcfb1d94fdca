use super::IsoVariogramModel;

/// Gaussian structure with practical range
#[derive(Debug, Clone, Default, Copy)]
pub struct IsoGaussian {
    pub range: f64,
    pub sill: f64,
}

impl IsoGaussian {
    pub fn new(range: f64, sill: f64) -> Self {
        Self { range, sill }
    }
}

impl IsoVariogramModel for IsoGaussian {
    fn c_0(&self) -> f64 {
        self.sill
    }

    #[inline(always)]
    fn variogram(&self, h: f64) -> f64 {
        let r = h / self.range;
        self.sill * (1.0 - (-9.0 * r * r).exp())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::variography::model_variograms::iso_exponential::IsoExponential;

    #[test]
    fn practical_range_reaches_95_percent() {
        let g = IsoGaussian::new(100.0, 1.0);
        let e = IsoExponential::new(100.0, 1.0);
        assert_relative_eq!(g.variogram(100.0), 1.0 - (-9f64).exp());
        assert_relative_eq!(e.variogram(100.0), 1.0 - (-3f64).exp());
        assert!(g.variogram(100.0) > 0.95 && e.variogram(100.0) > 0.95);
        assert_eq!(g.variogram(0.0), 0.0);
    }
}
