//! Dense complex vector fields over the reciprocal-space grid.

use nalgebra::DVector;
use ndarray::{ArrayD, IxDyn};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{HaydockError, Result};

/// An `N`-component complex vector at every grid point, stored as an array of
/// shape `(N, d_1, ..., d_N)`. Axis 0 is the component axis; the remaining axes
/// are spatial.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorField {
    data: ArrayD<Complex64>,
}

impl VectorField {
    /// The zero field on a grid of shape `dims`.
    pub fn zeros(dims: &[usize]) -> Self {
        Self {
            data: ArrayD::zeros(IxDyn(&field_shape(dims))),
        }
    }

    /// Wraps an array whose leading axis holds one component per spatial axis.
    pub fn from_array(data: ArrayD<Complex64>) -> Result<Self> {
        let shape = data.shape();
        if shape.len() < 2 {
            return Err(HaydockError::dimension_mismatch(
                "vector field rank",
                2,
                shape.len(),
            ));
        }
        if shape[0] != shape.len() - 1 {
            return Err(HaydockError::dimension_mismatch(
                "vector field components",
                shape.len() - 1,
                shape[0],
            ));
        }
        Ok(Self { data })
    }

    /// The field equal to `polarization` at the zero wavevector and zero elsewhere.
    pub fn zero_wavevector(polarization: &DVector<Complex64>, dims: &[usize]) -> Result<Self> {
        if polarization.len() != dims.len() {
            return Err(HaydockError::dimension_mismatch(
                "polarization length",
                dims.len(),
                polarization.len(),
            ));
        }
        let mut field = Self::zeros(dims);
        let mut index = vec![0usize; dims.len() + 1];
        for (component, value) in polarization.iter().enumerate() {
            index[0] = component;
            field.data[&index[..]] = *value;
        }
        Ok(field)
    }

    /// Number of vector components (equal to the number of spatial axes).
    pub fn ndims(&self) -> usize {
        self.data.shape()[0]
    }

    /// Grid shape, without the component axis.
    pub fn grid_shape(&self) -> &[usize] {
        &self.data.shape()[1..]
    }

    /// Read-only view of the underlying array.
    pub fn values(&self) -> &ArrayD<Complex64> {
        &self.data
    }

    pub(crate) fn values_mut(&mut self) -> &mut ArrayD<Complex64> {
        &mut self.data
    }

    /// Euclidean inner product `sum conj(self) * other` over components and grid points.
    ///
    /// Metric weighting is applied by the caller by contracting one argument first.
    pub fn inner(&self, other: &VectorField) -> Result<Complex64> {
        self.ensure_same_shape(other, "inner product")?;
        Ok(self
            .data
            .iter()
            .zip(other.data.iter())
            .fold(Complex64::new(0.0, 0.0), |acc, (lhs, rhs)| {
                acc + lhs.conj() * *rhs
            }))
    }

    /// `self += alpha * other`.
    pub fn axpy(&mut self, alpha: f64, other: &VectorField) -> Result<()> {
        self.ensure_same_shape(other, "linear combination")?;
        self.data.scaled_add(Complex64::new(alpha, 0.0), &other.data);
        Ok(())
    }

    /// Multiplies every entry by a real factor.
    pub fn scale(&mut self, factor: f64) {
        self.data.mapv_inplace(|value| value * factor);
    }

    /// Returns `true` when every entry is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|value| value.is_finite())
    }

    pub(crate) fn ensure_grid(&self, dims: &[usize], context: &'static str) -> Result<()> {
        if self.ndims() != dims.len() {
            return Err(HaydockError::dimension_mismatch(
                context,
                dims.len(),
                self.ndims(),
            ));
        }
        for (&expected, &found) in dims.iter().zip(self.grid_shape()) {
            if expected != found {
                return Err(HaydockError::dimension_mismatch(context, expected, found));
            }
        }
        Ok(())
    }

    fn ensure_same_shape(&self, other: &VectorField, context: &'static str) -> Result<()> {
        if self.data.shape() != other.data.shape() {
            return Err(HaydockError::dimension_mismatch(
                context,
                self.data.len(),
                other.data.len(),
            ));
        }
        Ok(())
    }
}

fn field_shape(dims: &[usize]) -> Vec<usize> {
    let mut shape = Vec::with_capacity(dims.len() + 1);
    shape.push(dims.len());
    shape.extend_from_slice(dims);
    shape
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_wavevector_places_polarization_at_origin() {
        let polarization =
            DVector::from_vec(vec![Complex64::new(1.0, 0.0), Complex64::new(0.0, 2.0)]);
        let field = VectorField::zero_wavevector(&polarization, &[3, 2]).unwrap();

        assert_eq!(field.ndims(), 2);
        assert_eq!(field.grid_shape(), &[3, 2]);
        assert_eq!(field.values()[[0, 0, 0]], Complex64::new(1.0, 0.0));
        assert_eq!(field.values()[[1, 0, 0]], Complex64::new(0.0, 2.0));
        let nonzero = field.values().iter().filter(|value| value.norm() > 0.0).count();
        assert_eq!(nonzero, 2);
    }

    #[test]
    fn zero_wavevector_checks_polarization_length() {
        let polarization = DVector::from_element(3, Complex64::new(1.0, 0.0));
        let result = VectorField::zero_wavevector(&polarization, &[4, 4]);
        assert!(matches!(
            result,
            Err(HaydockError::DimensionMismatch {
                expected: 2,
                found: 3,
                ..
            })
        ));
    }

    #[test]
    fn inner_product_conjugates_left_argument() {
        let polarization = DVector::from_vec(vec![Complex64::new(0.0, 1.0)]);
        let field = VectorField::zero_wavevector(&polarization, &[4]).unwrap();
        let product = field.inner(&field).unwrap();
        assert_relative_eq!(product.re, 1.0);
        assert_relative_eq!(product.im, 0.0);
    }

    #[test]
    fn axpy_and_scale_combine_fields() {
        let polarization = DVector::from_vec(vec![Complex64::new(1.0, 0.0)]);
        let seed = VectorField::zero_wavevector(&polarization, &[2]).unwrap();
        let mut field = seed.clone();
        field.axpy(3.0, &seed).unwrap();
        field.scale(0.5);
        assert_eq!(field.values()[[0, 0]], Complex64::new(2.0, 0.0));
    }

    #[test]
    fn from_array_rejects_mismatched_component_axis() {
        let data = ArrayD::zeros(IxDyn(&[3, 4, 4]));
        let result = VectorField::from_array(data);
        assert!(matches!(result, Err(HaydockError::DimensionMismatch { .. })));
    }
}
