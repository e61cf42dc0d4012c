use thiserror::Error;

/// Unified error type for `haydock` operations.
#[derive(Debug, Error)]
pub enum HaydockError {
    /// Raised when supplied arrays, fields, or vectors have incompatible dimensions.
    #[error("dimension mismatch in {context}: expected {expected} but found {found}")]
    DimensionMismatch {
        /// Human-readable context describing the operation.
        context: &'static str,
        /// The required dimension, usually implied by the grid.
        expected: usize,
        /// The dimension that was actually supplied.
        found: usize,
    },

    /// Raised when the polarization used to seed the recurrence is the null vector.
    #[error("polarization must not be the zero vector")]
    ZeroPolarization,

    /// Raised when a scalar parameter is outside its admissible range.
    #[error("invalid value for {name}: {value}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Raised when the seed state has a vanishing metric-weighted norm.
    #[error("initial state is null under the metric (b2 = {b2}); cannot normalize")]
    DegenerateInput { b2: f64 },

    /// Raised when numerical routines produce NaN or infinite scalars.
    #[error("encountered a non-finite value during {context}")]
    NumericalError { context: &'static str },

    /// Raised when a required component has not been provided to a builder.
    #[error("{component} must be provided before building the metric")]
    MissingComponent { component: &'static str },
}

impl HaydockError {
    /// Helper to format a [`DimensionMismatch`](HaydockError::DimensionMismatch) error.
    pub fn dimension_mismatch(context: &'static str, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            context,
            expected,
            found,
        }
    }

    /// Helper to reject a scalar parameter.
    pub fn invalid_parameter(name: &'static str, value: f64) -> Self {
        Self::InvalidParameter { name, value }
    }

    /// Helper for bubbling up missing component errors from builders.
    pub fn missing_component(component: &'static str) -> Self {
        Self::MissingComponent { component }
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, HaydockError>;
