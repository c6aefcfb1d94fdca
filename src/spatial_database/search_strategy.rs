use serde::{Deserialize, Serialize};

use crate::error::KrigingError;
use crate::geometry::SearchNeighborhood;

/// Couples a search neighborhood with sample count bounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchStrategy {
    pub neighborhood: SearchNeighborhood,
    pub max_samples: usize,
    /// 0 = unused
    #[serde(default)]
    pub min_samples: usize,
    /// 0 = unused
    #[serde(default)]
    pub min_distance_between_samples: f64,
}

impl SearchStrategy {
    pub fn new(neighborhood: impl Into<SearchNeighborhood>, max_samples: usize) -> Self {
        Self {
            neighborhood: neighborhood.into(),
            max_samples,
            min_samples: 0,
            min_distance_between_samples: 0.0,
        }
    }

    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    pub fn with_min_distance_between_samples(mut self, distance: f64) -> Self {
        self.min_distance_between_samples = distance;
        self
    }

    pub fn validate(&self) -> Result<(), KrigingError> {
        if self.max_samples == 0 {
            return Err(KrigingError::InvalidSearchStrategy(
                "max_samples must be positive".to_string(),
            ));
        }
        if self.min_samples > self.max_samples {
            return Err(KrigingError::InvalidSearchStrategy(format!(
                "min_samples ({}) exceeds max_samples ({})",
                self.min_samples, self.max_samples
            )));
        }
        if !(self.min_distance_between_samples >= 0.0) {
            return Err(KrigingError::InvalidSearchStrategy(format!(
                "invalid minimum distance between samples {}",
                self.min_distance_between_samples
            )));
        }
        Ok(())
    }
}
