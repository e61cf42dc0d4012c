//! Grid geometry, material fields, and the metric tensor consumed by the recurrence.

use nalgebra::DMatrix;
use ndarray::{ArrayD, Dimension, IxDyn};
use num_complex::Complex64;

use crate::error::{HaydockError, Result};

/// Capabilities the recurrence needs from a geometry/metric provider.
///
/// Implementors own the grid and the fields; the engine only borrows them and
/// treats them as read-only for its whole lifetime.
pub trait MetricProvider {
    /// Number of spatial dimensions `N`.
    fn ndims(&self) -> usize;

    /// Grid shape `(d_1, ..., d_N)`.
    fn dims(&self) -> &[usize];

    /// Real-space indicator of the material phase, shape `dims`.
    fn characteristic_field(&self) -> &CharacteristicField;

    /// Reciprocal-space metric tensor, shape `(N, N) + dims`.
    fn metric_tensor_field(&self) -> &MetricTensorField;
}

/// Real-valued weight over real space marking which phase occupies each point.
#[derive(Clone, Debug)]
pub struct CharacteristicField {
    data: ArrayD<f64>,
}

impl CharacteristicField {
    /// Wraps an existing array; its shape is the grid shape.
    pub fn from_array(data: ArrayD<f64>) -> Result<Self> {
        if data.iter().any(|value| !value.is_finite()) {
            return Err(HaydockError::NumericalError {
                context: "characteristic field validation",
            });
        }
        Ok(Self { data })
    }

    /// Evaluates `f` at every grid index.
    pub fn from_fn<F>(dims: &[usize], mut f: F) -> Result<Self>
    where
        F: FnMut(&[usize]) -> f64,
    {
        let data = ArrayD::from_shape_fn(IxDyn(dims), |index| f(index.slice()));
        Self::from_array(data)
    }

    /// Builds a one-dimensional field from a slice of values.
    pub fn from_values(values: &[f64]) -> Result<Self> {
        let data = ArrayD::from_shape_vec(IxDyn(&[values.len()]), values.to_vec())
            .map_err(|_| HaydockError::dimension_mismatch("characteristic values", 1, 0))?;
        Self::from_array(data)
    }

    /// Grid shape of the field.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Read-only view of the underlying array.
    pub fn values(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Mean of the field over the grid, i.e. the volume fraction of the weighted phase.
    pub fn filling_fraction(&self) -> f64 {
        self.data.mean().unwrap_or(0.0)
    }
}

/// Metric tensor attached to every reciprocal-space grid point.
#[derive(Clone, Debug)]
pub struct MetricTensorField {
    data: ArrayD<Complex64>,
}

impl MetricTensorField {
    /// Wraps an array of shape `(N, N) + dims`.
    pub fn from_array(data: ArrayD<Complex64>) -> Result<Self> {
        let shape = data.shape();
        if shape.len() < 3 {
            return Err(HaydockError::dimension_mismatch(
                "metric tensor rank",
                3,
                shape.len(),
            ));
        }
        if shape[0] != shape[1] {
            return Err(HaydockError::dimension_mismatch(
                "metric tensor components",
                shape[0],
                shape[1],
            ));
        }
        if shape[0] != shape.len() - 2 {
            return Err(HaydockError::dimension_mismatch(
                "metric tensor components",
                shape.len() - 2,
                shape[0],
            ));
        }
        if data.iter().any(|value| !value.is_finite()) {
            return Err(HaydockError::NumericalError {
                context: "metric tensor validation",
            });
        }
        Ok(Self { data })
    }

    /// The same `N x N` tensor at every grid point.
    pub fn uniform(dims: &[usize], tensor: &DMatrix<Complex64>) -> Result<Self> {
        let n = dims.len();
        if tensor.nrows() != n || tensor.ncols() != n {
            return Err(HaydockError::dimension_mismatch(
                "uniform metric tensor",
                n,
                tensor.nrows(),
            ));
        }
        let mut shape = vec![n, n];
        shape.extend_from_slice(dims);
        let data = ArrayD::from_shape_fn(IxDyn(&shape), |index| tensor[(index[0], index[1])]);
        Self::from_array(data)
    }

    /// Euclidean metric: the identity tensor everywhere.
    pub fn identity(dims: &[usize]) -> Result<Self> {
        let n = dims.len();
        Self::uniform(dims, &DMatrix::identity(n, n))
    }

    /// Number of vector components `N`.
    pub fn ndims(&self) -> usize {
        self.data.shape()[0]
    }

    /// Grid part of the shape.
    pub fn grid_shape(&self) -> &[usize] {
        &self.data.shape()[2..]
    }

    /// Read-only view of the full `(N, N) + dims` array.
    pub fn values(&self) -> &ArrayD<Complex64> {
        &self.data
    }
}

/// Validated geometry: grid shape, characteristic field, and metric tensor field.
#[derive(Clone, Debug)]
pub struct Metric {
    dims: Vec<usize>,
    characteristic: CharacteristicField,
    tensor: MetricTensorField,
}

impl Metric {
    /// Creates a `Metric` from validated components.
    pub fn new(characteristic: CharacteristicField, tensor: MetricTensorField) -> Result<Self> {
        MetricBuilder::new(characteristic.shape().to_vec())
            .characteristic(characteristic)
            .tensor(tensor)
            .build()
    }
}

impl MetricProvider for Metric {
    fn ndims(&self) -> usize {
        self.dims.len()
    }

    fn dims(&self) -> &[usize] {
        &self.dims
    }

    fn characteristic_field(&self) -> &CharacteristicField {
        &self.characteristic
    }

    fn metric_tensor_field(&self) -> &MetricTensorField {
        &self.tensor
    }
}

/// Builder that validates shapes before constructing a [`Metric`].
#[derive(Debug)]
pub struct MetricBuilder {
    dims: Vec<usize>,
    characteristic: Option<CharacteristicField>,
    tensor: Option<MetricTensorField>,
}

impl MetricBuilder {
    /// Start building a metric over a grid of shape `dims`.
    pub fn new(dims: Vec<usize>) -> Self {
        Self {
            dims,
            characteristic: None,
            tensor: None,
        }
    }

    /// Sets the characteristic field.
    pub fn characteristic(mut self, field: CharacteristicField) -> Self {
        self.characteristic = Some(field);
        self
    }

    /// Sets the metric tensor field. Defaults to the identity when omitted.
    pub fn tensor(mut self, field: MetricTensorField) -> Self {
        self.tensor = Some(field);
        self
    }

    /// Finalizes construction after validating every shape against the grid.
    pub fn build(self) -> Result<Metric> {
        let characteristic = self
            .characteristic
            .ok_or_else(|| HaydockError::missing_component("characteristic field"))?;
        let tensor = match self.tensor {
            Some(tensor) => tensor,
            None => MetricTensorField::identity(&self.dims)?,
        };
        let metric = Metric {
            dims: self.dims,
            characteristic,
            tensor,
        };
        validate_provider(&metric)?;
        Ok(metric)
    }
}

/// Checks that a provider's fields agree with its declared grid.
pub fn validate_provider<M: MetricProvider + ?Sized>(metric: &M) -> Result<()> {
    let dims = metric.dims();
    let n = metric.ndims();
    if n == 0 {
        return Err(HaydockError::invalid_parameter("ndims", 0.0));
    }
    if dims.len() != n {
        return Err(HaydockError::dimension_mismatch("grid rank", n, dims.len()));
    }
    if let Some(&axis) = dims.iter().find(|&&axis| axis == 0) {
        return Err(HaydockError::invalid_parameter("grid axis length", axis as f64));
    }

    let characteristic = metric.characteristic_field().shape();
    if characteristic.len() != n {
        return Err(HaydockError::dimension_mismatch(
            "characteristic field rank",
            n,
            characteristic.len(),
        ));
    }
    for (&expected, &found) in dims.iter().zip(characteristic) {
        if expected != found {
            return Err(HaydockError::dimension_mismatch(
                "characteristic field shape",
                expected,
                found,
            ));
        }
    }

    let tensor = metric.metric_tensor_field();
    if tensor.ndims() != n {
        return Err(HaydockError::dimension_mismatch(
            "metric tensor components",
            n,
            tensor.ndims(),
        ));
    }
    for (&expected, &found) in dims.iter().zip(tensor.grid_shape()) {
        if expected != found {
            return Err(HaydockError::dimension_mismatch(
                "metric tensor grid shape",
                expected,
                found,
            ));
        }
    }
    Ok(())
}
