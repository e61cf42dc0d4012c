//! Generalized Haydock (Lanczos) recurrence for periodic two-component media.
//!
//! This crate generates, one step at a time, the coefficients `a_n`, `b2_n`,
//! `c_n`, `g_n` of a three-term recurrence for the operator that multiplies a
//! field by a material's characteristic function in real space, with inner
//! products weighted by a possibly indefinite metric tensor supplied over
//! reciprocal space. Downstream code turns these coefficients into continued
//! fractions and response functions; that part is not handled here.
//!
//! The crate offers
//!
//! - grid geometry and material fields behind the [`MetricProvider`] trait (`metric` module),
//! - dense complex vector fields on the grid (`field` module),
//! - spatial Fourier transforms with a fixed normalization (`transform` module),
//! - the operator application itself (`operator` module), and
//! - the incremental recurrence engine with its sign bookkeeping (`engine` module).
//!
//! # Quick start
//!
//! ```no_run
//! use haydock::metric::{CharacteristicField, MetricBuilder};
//! use haydock::HaydockEngine;
//! use nalgebra::DVector;
//! use num_complex::Complex64;
//!
//! // A one-dimensional crystal with alternating phases.
//! let characteristic = CharacteristicField::from_values(&[1.0, 0.0, 1.0, 0.0])
//!     .expect("finite values");
//! let metric = MetricBuilder::new(vec![4])
//!     .characteristic(characteristic)
//!     .build()
//!     .expect("consistent shapes");
//!
//! let polarization = DVector::from_element(1, Complex64::new(1.0, 0.0));
//! let mut engine = HaydockEngine::new(&metric, &polarization, 1e-10).expect("valid seed");
//!
//! while engine.step().expect("finite coefficients") {
//!     println!("a_{} = {:?}", engine.iteration() - 1, engine.current_a());
//! }
//! ```

pub mod engine;
pub mod error;
pub mod field;
pub mod history;
pub mod metric;
pub mod operator;
pub mod options;
pub mod transform;

pub use engine::{HaydockEngine, PrecisionWarning, Sign};
pub use error::{HaydockError, Result};
pub use field::VectorField;
pub use history::{CoefficientHistory, Coefficients, RunSummary};
pub use metric::{Metric, MetricBuilder, MetricProvider};
pub use options::HaydockOptions;
pub use transform::{FftTransform, GridTransform};
