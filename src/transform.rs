//! Multidimensional discrete Fourier transforms between reciprocal and real space.
//!
//! Convention: the forward transform is unnormalized,
//! `F(k) = sum_r f(r) exp(-2 pi i k.r / d)`, and the inverse carries the full
//! `1 / prod(d_i)` factor, so `inverse(forward(x)) == x` up to rounding. Both
//! act only on the axes they are given; the component axis of a
//! [`VectorField`](crate::field::VectorField) is never transformed.

use std::fmt;
use std::sync::Arc;

use ndarray::{ArrayD, Axis};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::error::{HaydockError, Result};

/// Forward/inverse transform pair over selected axes of a complex array.
pub trait GridTransform {
    /// Reciprocal-space image of `field` along `axes`, in place.
    fn forward(&self, field: &mut ArrayD<Complex64>, axes: &[usize]) -> Result<()>;

    /// Real-space image of `field` along `axes`, in place, scaled by `1 / prod(len(axes))`.
    fn inverse(&self, field: &mut ArrayD<Complex64>, axes: &[usize]) -> Result<()>;
}

/// Axes `1..=ndims`, i.e. every spatial axis of a vector field.
pub fn spatial_axes(ndims: usize) -> Vec<usize> {
    (1..=ndims).collect()
}

#[derive(Clone)]
struct AxisPlan {
    len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

/// [`GridTransform`] backed by `rustfft`, planned once for a fixed grid.
#[derive(Clone)]
pub struct FftTransform {
    plans: Vec<AxisPlan>,
}

impl FftTransform {
    /// Plans forward and inverse transforms for every distinct axis length in `dims`.
    pub fn new(dims: &[usize]) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let mut plans: Vec<AxisPlan> = Vec::new();
        for &len in dims {
            if plans.iter().any(|plan| plan.len == len) {
                continue;
            }
            plans.push(AxisPlan {
                len,
                forward: planner.plan_fft_forward(len),
                inverse: planner.plan_fft_inverse(len),
            });
        }
        Self { plans }
    }

    fn plan_for(&self, len: usize) -> Result<&AxisPlan> {
        self.plans.iter().find(|plan| plan.len == len).ok_or_else(|| {
            let planned = self.plans.first().map_or(0, |plan| plan.len);
            HaydockError::dimension_mismatch("transform axis length", planned, len)
        })
    }

    fn transform(
        &self,
        field: &mut ArrayD<Complex64>,
        axes: &[usize],
        inverse: bool,
    ) -> Result<()> {
        let mut points = 1usize;
        for &axis in axes {
            if axis >= field.ndim() {
                return Err(HaydockError::dimension_mismatch(
                    "transform axis",
                    field.ndim(),
                    axis,
                ));
            }
            let len = field.shape()[axis];
            let plan = self.plan_for(len)?;
            let fft = if inverse { &plan.inverse } else { &plan.forward };
            process_lanes(field, axis, fft.as_ref());
            points *= len;
        }
        if inverse && points > 1 {
            let scale = 1.0 / points as f64;
            field.mapv_inplace(|value| value * scale);
        }
        Ok(())
    }
}

impl GridTransform for FftTransform {
    fn forward(&self, field: &mut ArrayD<Complex64>, axes: &[usize]) -> Result<()> {
        self.transform(field, axes, false)
    }

    fn inverse(&self, field: &mut ArrayD<Complex64>, axes: &[usize]) -> Result<()> {
        self.transform(field, axes, true)
    }
}

impl fmt::Debug for FftTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lengths: Vec<usize> = self.plans.iter().map(|plan| plan.len).collect();
        f.debug_struct("FftTransform")
            .field("axis_lengths", &lengths)
            .finish()
    }
}

// rustfft needs contiguous buffers; lanes along inner axes are strided, so copy through.
fn process_lanes(field: &mut ArrayD<Complex64>, axis: usize, fft: &dyn Fft<f64>) {
    let len = field.shape()[axis];
    let mut buffer = vec![Complex64::new(0.0, 0.0); len];
    let mut scratch = vec![Complex64::new(0.0, 0.0); fft.get_inplace_scratch_len()];
    for mut lane in field.lanes_mut(Axis(axis)) {
        for (slot, value) in buffer.iter_mut().zip(lane.iter()) {
            *slot = *value;
        }
        fft.process_with_scratch(&mut buffer, &mut scratch);
        for (value, slot) in lane.iter_mut().zip(buffer.iter()) {
            *value = *slot;
        }
    }
}
