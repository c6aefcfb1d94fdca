use super::ValueTransform;

/// Shifts conditioning values by the known mean of simple kriging.
///
/// Simple kriging systems estimate residuals of a zero mean field, the mean is added back to the
/// estimate and to the local mean. Non finite values pass through unchanged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeanTransform {
    mean: f64,
}

impl MeanTransform {
    pub fn new(mean: f64) -> Self {
        Self { mean }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }
}

impl ValueTransform<f64> for MeanTransform {
    #[inline(always)]
    fn forward_transform(&self, value: &f64) -> f64 {
        *value - self.mean
    }

    #[inline(always)]
    fn backward_transform(&self, value: &f64) -> f64 {
        *value + self.mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residuals_around_the_mean() {
        let transform = MeanTransform::new(2.5);
        assert_eq!(transform.forward_transform(&4.0), 1.5);
        assert_eq!(transform.backward_transform(&-0.5), 2.0);
        assert!(transform.forward_transform(&f64::NAN).is_nan());
        assert_eq!(transform.mean(), 2.5);
    }
}
