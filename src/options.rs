//! Configuration for a Haydock recurrence run.

use serde::{Deserialize, Serialize};

use crate::error::{HaydockError, Result};

/// Controls termination and bookkeeping of the recurrence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HaydockOptions {
    /// Noise floor for `b2`: states with `b2 <= tolerance` end the recurrence,
    /// and raw values below `-tolerance` raise a precision warning.
    pub tolerance: f64,
    /// Upper bound on the number of steps taken by [`run`](crate::HaydockEngine::run).
    pub max_iterations: Option<usize>,
    /// Whether `run` keeps every generated basis state in its history.
    pub keep_states: bool,
}

impl Default for HaydockOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-7,
            max_iterations: None,
            keep_states: false,
        }
    }
}

impl HaydockOptions {
    /// Override the tolerance while preserving other defaults.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Cap the number of steps `run` may take.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Keep (or drop) basis states in the run history.
    pub fn with_keep_states(mut self, keep_states: bool) -> Self {
        self.keep_states = keep_states;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(HaydockError::invalid_parameter(
                "tolerance",
                self.tolerance,
            ));
        }
        Ok(())
    }
}
