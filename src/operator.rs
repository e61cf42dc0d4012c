//! The medium operator: metric contraction, real-space masking by the
//! characteristic field, and the transforms in between.

use ndarray::{Axis, Zip};
use num_complex::Complex64;

use crate::error::Result;
use crate::field::VectorField;
use crate::metric::MetricProvider;
use crate::transform::{spatial_axes, GridTransform};

/// Everything one operator application produces.
#[derive(Clone, Debug)]
pub struct OperatorImage {
    /// Metric-contracted input, `g psi`.
    pub g_psi: VectorField,
    /// Operator image, `O psi`.
    pub o_psi: VectorField,
    /// Metric-contracted operator image, `g O psi`.
    pub g_o_psi: VectorField,
}

/// Full tensor-vector product `out[i, k] = sum_j g[i, j, k] psi[j, k]` at every grid point.
pub fn contract<M>(metric: &M, psi: &VectorField) -> Result<VectorField>
where
    M: MetricProvider + ?Sized,
{
    let dims = metric.dims();
    psi.ensure_grid(dims, "metric contraction")?;

    let tensor = metric.metric_tensor_field().values();
    let n = metric.ndims();
    let mut out = VectorField::zeros(dims);
    {
        let data = out.values_mut();
        for i in 0..n {
            let mut out_i = data.index_axis_mut(Axis(0), i);
            for j in 0..n {
                let g_ij = tensor.index_axis(Axis(0), i).index_axis_move(Axis(0), j);
                let psi_j = psi.values().index_axis(Axis(0), j);
                Zip::from(&mut out_i)
                    .and(&g_ij)
                    .and(&psi_j)
                    .for_each(|acc, &g, &value| *acc += g * value);
            }
        }
    }
    Ok(out)
}

/// Metric-weighted inner product `<lhs, g rhs>`.
pub fn metric_inner<M>(metric: &M, lhs: &VectorField, rhs: &VectorField) -> Result<Complex64>
where
    M: MetricProvider + ?Sized,
{
    let g_rhs = contract(metric, rhs)?;
    lhs.inner(&g_rhs)
}

/// Applies the medium operator to a reciprocal-space state.
///
/// The contracted input is taken to real space, weighted pointwise by the
/// characteristic field (broadcast over components), brought back, and
/// contracted again. The result is a pure function of `psi`, the metric, and
/// the transform convention.
///
/// `metric` is expected to have passed
/// [`validate_provider`](crate::metric::validate_provider); only the grid of
/// `psi` is checked here.
pub fn apply<M, T>(metric: &M, transform: &T, psi: &VectorField) -> Result<OperatorImage>
where
    M: MetricProvider + ?Sized,
    T: GridTransform + ?Sized,
{
    let axes = spatial_axes(metric.ndims());

    let g_psi = contract(metric, psi)?;

    let mut field = g_psi.values().clone();
    transform.inverse(&mut field, &axes)?;
    let characteristic = metric.characteristic_field().values();
    for mut component in field.outer_iter_mut() {
        Zip::from(&mut component)
            .and(characteristic)
            .for_each(|value, &weight| *value *= weight);
    }
    transform.forward(&mut field, &axes)?;

    let o_psi = VectorField::from_array(field)?;
    let g_o_psi = contract(metric, &o_psi)?;

    Ok(OperatorImage {
        g_psi,
        o_psi,
        g_o_psi,
    })
}
