//! Detector configuration.

use crate::error::{AnomalyError, Result};
use serde::{Deserialize, Serialize};

/// Hyper-parameters for one detector instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Expected proportion of anomalous orders, in (0, 0.5].
    pub contamination: f64,
    /// Number of isolation trees.
    pub n_estimators: usize,
    /// Sub-sample size per tree (capped at the batch size).
    pub max_samples: usize,
    pub random_seed: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            contamination: 0.1,
            n_estimators: 100,
            max_samples: 256,
            random_seed: 42,
        }
    }
}

impl DetectorConfig {
    pub fn with_contamination(mut self, c: f64) -> Self {
        self.contamination = c;
        self
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_max_samples(mut self, n: usize) -> Self {
        self.max_samples = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(invalid("contamination", self.contamination, "must be in (0, 0.5]"));
        }
        if self.n_estimators == 0 {
            return Err(invalid("n_estimators", self.n_estimators, "must be at least 1"));
        }
        if self.max_samples < 2 {
            return Err(invalid("max_samples", self.max_samples, "must be at least 2"));
        }
        Ok(())
    }
}

fn invalid(name: &str, value: impl ToString, reason: &str) -> AnomalyError {
    AnomalyError::InvalidConfig {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
