//! The generalized Haydock recurrence under a possibly indefinite metric.
//!
//! The engine keeps a three-state window (`previous`, `current`, `next`) and
//! the scalar coefficients attached to it. Each call to
//! [`HaydockEngine::step`] applies the medium operator to the pending state,
//! orthogonalizes the image against the two preceding states, and either
//! produces the following state or marks the recurrence as finished.
//!
//! With `<.,.>_g` the metric-weighted inner product and `g_n = <psi_n, psi_n>_g`
//! the definiteness sign of state `n`:
//!
//! ```text
//! a_n       = g_n Re <g psi_n, O psi_n>
//! b2_{n+1}  = Re <O psi_n, g O psi_n> - g_n a_n^2 - g_{n-1} b2_n
//! c_{n+1}   = g_{n+1} g_n b_{n+1}
//! psi_{n+1} = (O psi_n - a_n psi_n - c_n psi_{n-1}) / b_{n+1}
//! ```

use std::fmt;

use nalgebra::DVector;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{HaydockError, Result};
use crate::field::VectorField;
use crate::history::{CoefficientHistory, Coefficients, RunSummary};
use crate::metric::{validate_provider, MetricProvider};
use crate::operator::{apply, metric_inner};
use crate::options::HaydockOptions;
use crate::transform::{FftTransform, GridTransform};

/// Definiteness of a state under the metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    /// Positive pseudo-norm.
    Plus,
    /// Negative pseudo-norm.
    Minus,
}

impl Sign {
    /// `+1.0` or `-1.0`.
    pub fn value(self) -> f64 {
        match self {
            Sign::Plus => 1.0,
            Sign::Minus => -1.0,
        }
    }

    /// Splits a raw squared pseudo-norm into its sign and magnitude.
    fn split(b2: f64) -> (Self, f64) {
        if b2 < 0.0 {
            (Sign::Minus, -b2)
        } else {
            (Sign::Plus, b2)
        }
    }
}

/// A squared pseudo-norm fell below `-tolerance` before its sign was flipped.
///
/// The recurrence carries on; this only records that the metric's
/// indefiniteness showed up above the expected noise floor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrecisionWarning {
    /// Iteration count when the step that produced the value started.
    pub iteration: usize,
    /// The raw (negative) `b2`.
    pub b2: f64,
    /// Tolerance in effect.
    pub tolerance: f64,
}

impl fmt::Display for PrecisionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "b2 = {:e} at iteration {} is below -tolerance ({:e})",
            self.b2, self.iteration, self.tolerance
        )
    }
}

/// Incremental Haydock recurrence over one metric and one polarization.
///
/// The metric is borrowed for the engine's whole lifetime and never mutated.
pub struct HaydockEngine<'a, M, T = FftTransform>
where
    M: MetricProvider + ?Sized,
    T: GridTransform,
{
    metric: &'a M,
    transform: T,
    options: HaydockOptions,
    iteration: usize,

    previous_state: Option<VectorField>,
    current_state: Option<VectorField>,
    next_state: Option<VectorField>,

    current_a: Option<f64>,
    current_b2: Option<f64>,
    current_b: Option<f64>,
    current_c: Option<f64>,
    current_g: Option<Sign>,
    previous_g: Option<Sign>,

    next_b2: f64,
    next_b: f64,
    next_c: Option<f64>,
    next_g: Sign,

    warnings: Vec<PrecisionWarning>,
}

impl<'a, M> HaydockEngine<'a, M, FftTransform>
where
    M: MetricProvider + ?Sized,
{
    /// Seeds the recurrence with the zero-wavevector state along `polarization`.
    pub fn new(metric: &'a M, polarization: &DVector<Complex64>, tolerance: f64) -> Result<Self> {
        let options = HaydockOptions::default().with_tolerance(tolerance);
        Self::with_options(metric, polarization, &options)
    }

    /// Like [`new`](Self::new), with tolerance and run settings taken from `options`.
    pub fn with_options(
        metric: &'a M,
        polarization: &DVector<Complex64>,
        options: &HaydockOptions,
    ) -> Result<Self> {
        options.validate()?;
        validate_provider(metric)?;
        let transform = FftTransform::new(metric.dims());
        Self::seed(metric, polarization, options, transform)
    }
}

impl<'a, M, T> HaydockEngine<'a, M, T>
where
    M: MetricProvider + ?Sized,
    T: GridTransform,
{
    /// Seeds the recurrence using a caller-supplied transform.
    pub fn with_transform(
        metric: &'a M,
        polarization: &DVector<Complex64>,
        options: &HaydockOptions,
        transform: T,
    ) -> Result<Self> {
        options.validate()?;
        validate_provider(metric)?;
        Self::seed(metric, polarization, options, transform)
    }

    /// Builds the seed state. `metric` and `options` are already validated.
    fn seed(
        metric: &'a M,
        polarization: &DVector<Complex64>,
        options: &HaydockOptions,
        transform: T,
    ) -> Result<Self> {
        let n = metric.ndims();
        if polarization.len() != n {
            return Err(HaydockError::dimension_mismatch(
                "polarization length",
                n,
                polarization.len(),
            ));
        }
        if let Some(bad) = polarization.iter().find(|value| !value.is_finite()) {
            return Err(HaydockError::invalid_parameter(
                "polarization component",
                if bad.re.is_finite() { bad.im } else { bad.re },
            ));
        }
        // Rescale by the largest entry first so the Euclidean norm cannot overflow.
        let largest = polarization.camax();
        if largest == 0.0 {
            return Err(HaydockError::ZeroPolarization);
        }
        let scaled = polarization.map(|value| value / largest);
        let norm = scaled.norm();
        let unit = scaled.map(|value| value / norm);

        let mut seed = VectorField::zero_wavevector(&unit, metric.dims())?;
        let b2 = metric_inner(metric, &seed, &seed)?.re;
        if !b2.is_finite() {
            return Err(HaydockError::NumericalError {
                context: "seed normalization",
            });
        }
        if b2 == 0.0 {
            return Err(HaydockError::DegenerateInput { b2 });
        }
        let (g, b2) = Sign::split(b2);
        let b = b2.sqrt();
        seed.scale(1.0 / b);

        log::debug!("haydock seed: b2_0 = {b2:e}, g_0 = {:+}", g.value());

        Ok(Self {
            metric,
            transform,
            options: options.clone(),
            iteration: 0,
            previous_state: None,
            current_state: None,
            next_state: Some(seed),
            current_a: None,
            current_b2: None,
            current_b: None,
            current_c: None,
            current_g: None,
            previous_g: None,
            next_b2: b2,
            next_b: b,
            next_c: None,
            next_g: g,
            warnings: Vec::new(),
        })
    }

    /// Advances the recurrence by one state.
    ///
    /// Returns `Ok(false)` without touching anything when no next state is
    /// pending. All new values are computed before any field is updated, so
    /// an error leaves the engine exactly as it was.
    pub fn step(&mut self) -> Result<bool> {
        let Some(psi) = self.next_state.as_ref() else {
            return Ok(false);
        };

        // After the shift: g_n, b2_n, c_n belong to `psi`; g_{n-1} to the current state.
        let g_n = self.next_g;
        let g_prev = self.current_g;
        let b2_n = self.next_b2;
        let c_n = self.next_c;

        let image = apply(self.metric, &self.transform, psi)?;

        let a = g_n.value() * image.g_psi.inner(&image.o_psi)?.re;
        let norm2 = image.o_psi.inner(&image.g_o_psi)?.re;
        let coupling = g_prev.map_or(0.0, |g| g.value() * b2_n);
        let raw_b2 = norm2 - g_n.value() * a * a - coupling;
        if !a.is_finite() || !raw_b2.is_finite() {
            return Err(HaydockError::NumericalError {
                context: "haydock coefficients",
            });
        }

        let warning = (raw_b2 < -self.options.tolerance).then(|| PrecisionWarning {
            iteration: self.iteration,
            b2: raw_b2,
            tolerance: self.options.tolerance,
        });
        let (g_next, b2_next) = Sign::split(raw_b2);
        let b_next = b2_next.sqrt();
        let c_next = g_next.value() * g_n.value() * b_next;

        let next_state = if b2_next < self.options.tolerance || b2_next == 0.0 {
            None
        } else {
            let mut next = image.o_psi;
            next.axpy(-a, psi)?;
            if let (Some(c), Some(previous)) = (c_n, self.current_state.as_ref()) {
                next.axpy(-c, previous)?;
            }
            next.scale(1.0 / b_next);
            if !next.is_finite() {
                return Err(HaydockError::NumericalError {
                    context: "next haydock state",
                });
            }
            Some(next)
        };

        log::trace!(
            "haydock step {}: a = {a:e}, b2 = {b2_next:e}, g = {:+}",
            self.iteration,
            g_next.value()
        );

        // Commit.
        self.previous_state = self.current_state.take();
        self.current_state = self.next_state.take();
        self.next_state = next_state;

        self.previous_g = self.current_g;
        self.current_g = Some(g_n);
        self.current_b2 = Some(b2_n);
        self.current_b = Some(self.next_b);
        self.current_c = c_n;
        self.current_a = Some(a);

        self.next_b2 = b2_next;
        self.next_b = b_next;
        self.next_c = Some(c_next);
        self.next_g = g_next;

        if let Some(warning) = warning {
            log::warn!("haydock precision warning: {warning}");
            self.warnings.push(warning);
        }
        self.iteration += 1;

        if self.next_state.is_none() {
            log::debug!(
                "haydock recurrence terminated after {} steps (b2 = {b2_next:e})",
                self.iteration
            );
        }
        Ok(true)
    }

    /// Steps until the recurrence ends or the configured iteration cap is hit.
    pub fn run(&mut self) -> Result<RunSummary> {
        let limit = self.options.max_iterations.unwrap_or(usize::MAX);
        let keep_states = self.options.keep_states;
        let warnings_before = self.warnings.len();
        let mut history = CoefficientHistory::default();
        let mut iterations = 0usize;

        while iterations < limit {
            if !self.step()? {
                break;
            }
            iterations += 1;
            let state = if keep_states {
                self.current_state.as_ref()
            } else {
                None
            };
            history.record(&self.coefficients(), state);
        }

        Ok(RunSummary {
            iterations,
            terminated: self.is_terminated(),
            warnings: self.warnings[warnings_before..].to_vec(),
            history,
        })
    }

    /// Number of completed steps.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// `a_n` of the current state; `None` before the first step.
    pub fn current_a(&self) -> Option<f64> {
        self.current_a
    }

    /// `b2_n` of the current state; `None` before the first step.
    pub fn current_b2(&self) -> Option<f64> {
        self.current_b2
    }

    /// `b_n` of the current state; `None` before the first step.
    pub fn current_b(&self) -> Option<f64> {
        self.current_b
    }

    /// `c_n` of the current state; `None` for the seed.
    pub fn current_c(&self) -> Option<f64> {
        self.current_c
    }

    /// `g_n` of the current state; `None` before the first step.
    pub fn current_g(&self) -> Option<Sign> {
        self.current_g
    }

    /// `g_{n-1}`; `None` until two steps have been taken.
    pub fn previous_g(&self) -> Option<Sign> {
        self.previous_g
    }

    /// `b2_{n+1}`, kept even after the recurrence has ended.
    pub fn next_b2(&self) -> f64 {
        self.next_b2
    }

    /// `b_{n+1}`.
    pub fn next_b(&self) -> f64 {
        self.next_b
    }

    /// `c_{n+1}`; `None` before the first step.
    pub fn next_c(&self) -> Option<f64> {
        self.next_c
    }

    /// `g_{n+1}`.
    pub fn next_g(&self) -> Sign {
        self.next_g
    }

    /// `psi_{n-1}`; `None` until two steps have been taken.
    pub fn previous_state(&self) -> Option<&VectorField> {
        self.previous_state.as_ref()
    }

    /// `psi_n`, the state whose coefficients the last step reported.
    pub fn current_state(&self) -> Option<&VectorField> {
        self.current_state.as_ref()
    }

    /// The pending state; `None` once the recurrence has ended.
    pub fn next_state(&self) -> Option<&VectorField> {
        self.next_state.as_ref()
    }

    /// `true` when no further step is possible.
    pub fn is_terminated(&self) -> bool {
        self.next_state.is_none()
    }

    /// Noise floor used for termination and precision warnings.
    pub fn tolerance(&self) -> f64 {
        self.options.tolerance
    }

    /// Settings the engine was built with.
    pub fn options(&self) -> &HaydockOptions {
        &self.options
    }

    /// The borrowed geometry and metric.
    pub fn metric(&self) -> &M {
        self.metric
    }

    /// The transform applied on every step.
    pub fn transform(&self) -> &T {
        &self.transform
    }

    /// Every precision warning raised so far, oldest first.
    pub fn precision_warnings(&self) -> &[PrecisionWarning] {
        &self.warnings
    }

    /// Snapshot of all scalar coefficients.
    pub fn coefficients(&self) -> Coefficients {
        Coefficients {
            iteration: self.iteration,
            current_a: self.current_a,
            current_b2: self.current_b2,
            current_b: self.current_b,
            current_c: self.current_c,
            current_g: self.current_g,
            next_b2: self.next_b2,
            next_b: self.next_b,
            next_c: self.next_c,
            next_g: self.next_g,
        }
    }
}

impl<M, T> fmt::Debug for HaydockEngine<'_, M, T>
where
    M: MetricProvider + ?Sized,
    T: GridTransform + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HaydockEngine")
            .field("dims", &self.metric.dims())
            .field("transform", &self.transform)
            .field("options", &self.options)
            .field("coefficients", &self.coefficients())
            .field("terminated", &self.is_terminated())
            .field("warnings", &self.warnings.len())
            .finish()
    }
}
