//! Coefficient snapshots, accumulated histories, and run diagnostics.

use serde::{Deserialize, Serialize};

use crate::engine::{PrecisionWarning, Sign};
use crate::field::VectorField;

/// Scalar state of an engine at one point in time.
///
/// `current_*` values are `None` until the first step; `next_c` is `None`
/// until a step has produced it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    /// Completed steps.
    pub iteration: usize,
    /// `a_n` of the current state.
    pub current_a: Option<f64>,
    /// `b2_n` of the current state.
    pub current_b2: Option<f64>,
    /// `b_n` of the current state.
    pub current_b: Option<f64>,
    /// `c_n` of the current state.
    pub current_c: Option<f64>,
    /// `g_n` of the current state.
    pub current_g: Option<Sign>,
    /// `b2_{n+1}` after the sign flip.
    pub next_b2: f64,
    /// `b_{n+1}`.
    pub next_b: f64,
    /// `c_{n+1}`.
    pub next_c: Option<f64>,
    /// `g_{n+1}`.
    pub next_g: Sign,
}

/// Coefficient sequence indexed by `n`, as consumed by continued-fraction evaluators.
///
/// Entry `n` holds `a_n`, `b2_n`, `b_n`, `c_n`, `g_n`. The seed has no
/// predecessor, so `c[0]` is zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoefficientHistory {
    /// Diagonal coefficients `a_n`.
    pub a: Vec<f64>,
    /// Squared off-diagonal magnitudes `b2_n`.
    pub b2: Vec<f64>,
    /// Off-diagonal magnitudes `b_n`.
    pub b: Vec<f64>,
    /// Signed couplings `c_n`.
    pub c: Vec<f64>,
    /// Definiteness signs `g_n`.
    pub g: Vec<Sign>,
    /// Basis states `psi_n`, only filled when states are kept.
    pub states: Vec<VectorField>,
}

impl CoefficientHistory {
    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.a.len()
    }

    /// Returns `true` when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// Appends the `current_*` slots of a snapshot taken right after a step.
    pub(crate) fn record(&mut self, coefficients: &Coefficients, state: Option<&VectorField>) {
        let (Some(a), Some(b2), Some(b), Some(g)) = (
            coefficients.current_a,
            coefficients.current_b2,
            coefficients.current_b,
            coefficients.current_g,
        ) else {
            return;
        };
        self.a.push(a);
        self.b2.push(b2);
        self.b.push(b);
        self.c.push(coefficients.current_c.unwrap_or(0.0));
        self.g.push(g);
        if let Some(state) = state {
            self.states.push(state.clone());
        }
    }
}

/// Diagnostics returned by [`HaydockEngine::run`](crate::HaydockEngine::run).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Steps taken during this run.
    pub iterations: usize,
    /// Whether the recurrence reached its natural end (as opposed to the iteration cap).
    pub terminated: bool,
    /// Precision warnings raised during this run.
    pub warnings: Vec<PrecisionWarning>,
    /// Coefficients recorded step by step.
    pub history: CoefficientHistory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_skips_snapshots_without_current_values() {
        let mut history = CoefficientHistory::default();
        let seed_only = Coefficients {
            iteration: 0,
            current_a: None,
            current_b2: None,
            current_b: None,
            current_c: None,
            current_g: None,
            next_b2: 1.0,
            next_b: 1.0,
            next_c: None,
            next_g: Sign::Plus,
        };
        history.record(&seed_only, None);
        assert!(history.is_empty());

        let first = Coefficients {
            iteration: 1,
            current_a: Some(0.5),
            current_b2: Some(1.0),
            current_b: Some(1.0),
            current_g: Some(Sign::Plus),
            next_b2: 0.25,
            next_b: 0.5,
            next_c: Some(0.5),
            ..seed_only
        };
        history.record(&first, None);
        assert_eq!(history.len(), 1);
        assert_eq!(history.c, vec![0.0]);
        assert!(history.states.is_empty());
    }
}
