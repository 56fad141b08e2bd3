//! Validation and sampling of the dense scalar fields used as extraction input

use nalgebra::Vector3;
use ndarray::{ArrayView3, ArrayViewD, Ix3};

use crate::{IsosurfaceError, Real};

/// Checks that the given dynamic-dimensional view has exactly three axes
pub(crate) fn require_3d<R: Real>(
    volume: ArrayViewD<'_, R>,
) -> Result<ArrayView3<'_, R>, IsosurfaceError> {
    let ndim = volume.ndim();
    volume
        .into_dimensionality::<Ix3>()
        .map_err(|_| IsosurfaceError::InvalidDimension { ndim })
}

/// Returns the smallest and largest value of the field, `None` if the field is empty
pub(crate) fn value_range<R: Real>(volume: &ArrayView3<'_, R>) -> Option<(R, R)> {
    let mut values = volume.iter().copied();
    let first = values.next()?;
    Some(values.fold((first, first), |(min, max), v| {
        (min.min(v), max.max(v))
    }))
}

/// Samples a scalar field at a (fractional) position in index space using multilinear
/// interpolation, clamping the position to the field's domain
pub(crate) fn trilinear_sample<R: Real>(field: &ArrayView3<'_, R>, position: &Vector3<R>) -> R {
    let shape = field.dim();
    let shape = [shape.0, shape.1, shape.2];

    let mut lower = [0usize; 3];
    let mut frac = [R::zero(); 3];
    for axis in 0..3 {
        let max_index = R::from_usize(shape[axis] - 1).unwrap();
        let p = position[axis].clamp(R::zero(), max_index);
        // The lower sample has to leave room for the upper one, except on single-sample axes
        let i = p.floor().to_usize().unwrap().min(shape[axis].saturating_sub(2));
        lower[axis] = i;
        frac[axis] = p - R::from_usize(i).unwrap();
    }

    let one = R::one();
    let [fx, fy, fz] = frac;
    let mut value = R::zero();
    for corner in 0..8usize {
        let (dx, dy, dz) = (corner & 1, (corner >> 1) & 1, (corner >> 2) & 1);
        let ix = (lower[0] + dx).min(shape[0] - 1);
        let iy = (lower[1] + dy).min(shape[1] - 1);
        let iz = (lower[2] + dz).min(shape[2] - 1);

        let wx = if dx == 1 { fx } else { one - fx };
        let wy = if dy == 1 { fy } else { one - fy };
        let wz = if dz == 1 { fz } else { one - fz };

        value += field[(ix, iy, iz)] * wx * wy * wz;
    }

    value
}
