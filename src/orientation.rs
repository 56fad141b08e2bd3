//! Gradient-based correction of mesh face orientations

use std::str::FromStr;

use log::info;
use nalgebra::Vector3;
use ndarray::{Array3, ArrayView3, Axis, Slice, Zip};
use rayon::prelude::*;

use crate::{IsosurfaceError, Real, volume};

/// Gradient convention of the surfaced object relative to its exterior
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum GradientDirection {
    /// Object was greater than exterior (the default, matching the classifier's sign test)
    #[default]
    Descent,
    /// Exterior was greater than object
    Ascent,
}

impl FromStr for GradientDirection {
    type Err = IsosurfaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "descent" => Ok(GradientDirection::Descent),
            "ascent" => Ok(GradientDirection::Ascent),
            _ => Err(IsosurfaceError::InvalidMode(s.to_string())),
        }
    }
}

/// Flips all faces whose normal disagrees with the field gradient at their centroid
///
/// Returns a corrected copy of the face list; the input mesh data is left untouched.
pub(crate) fn correct_orientation<R: Real>(
    volume: &ArrayView3<'_, R>,
    vertices: &[Vector3<R>],
    faces: &[[usize; 3]],
    spacing: [R; 3],
    direction: GradientDirection,
) -> Vec<[usize; 3]> {
    let gradients = gradient(volume, &spacing);
    let gradient_views = [
        gradients[0].view(),
        gradients[1].view(),
        gradients[2].view(),
    ];

    let three = R::from_f64_unchecked(3.0);

    let corrected: Vec<[usize; 3]> = faces
        .par_iter()
        .map(|&face| {
            let [v0, v1, v2] = face.map(|i| vertices[i]);
            let a = v0 - v1;
            let b = v0 - v2;
            let normal = a.cross(&b);

            // Centroids are in physical coordinates, the gradient fields are sampled in
            // index space
            let centroid = (v0 + v1 + v2) / three;
            let index_position = Vector3::new(
                centroid.x / spacing[0],
                centroid.y / spacing[1],
                centroid.z / spacing[2],
            );
            let sampled = Vector3::new(
                volume::trilinear_sample(&gradient_views[0], &index_position),
                volume::trilinear_sample(&gradient_views[1], &index_position),
                volume::trilinear_sample(&gradient_views[2], &index_position),
            );

            // The sign of the dot product is unaffected by normalization; a zero norm
            // (degenerate face or vanishing gradient) counts as correctly oriented
            let scale = sampled.norm() * normal.norm();
            let dot = if scale > R::zero() {
                sampled.dot(&normal) / scale
            } else {
                R::zero()
            };

            let mis_oriented = match direction {
                GradientDirection::Descent => dot < R::zero(),
                GradientDirection::Ascent => dot > R::zero(),
            };

            if mis_oriented {
                [face[2], face[1], face[0]]
            } else {
                face
            }
        })
        .collect();

    let flipped = corrected
        .iter()
        .zip(faces)
        .filter(|(corrected, original)| corrected != original)
        .count();
    info!("Flipped {} of {} faces", flipped, faces.len());

    corrected
}

/// Computes the per-axis gradient of the field, scaled by the voxel spacing
///
/// Central differences in the interior, one-sided differences at the boundary. Axes with
/// fewer than two samples get a zero gradient component.
fn gradient<R: Real>(volume: &ArrayView3<'_, R>, spacing: &[R; 3]) -> [Array3<R>; 3] {
    let two = R::from_f64_unchecked(2.0);

    [0, 1, 2].map(|axis| {
        let mut component = Array3::zeros(volume.dim());
        let ax = Axis(axis);
        let n = volume.len_of(ax);
        if n < 2 {
            return component;
        }
        let h = spacing[axis];

        // Central differences in the interior
        Zip::from(component.slice_axis_mut(ax, Slice::from(1..n - 1)))
            .and(volume.slice_axis(ax, Slice::from(2..n)))
            .and(volume.slice_axis(ax, Slice::from(0..n - 2)))
            .for_each(|d, &ahead, &behind| *d = (ahead - behind) / (two * h));

        // One-sided differences at the boundary
        Zip::from(component.slice_axis_mut(ax, Slice::from(0..1)))
            .and(volume.slice_axis(ax, Slice::from(1..2)))
            .and(volume.slice_axis(ax, Slice::from(0..1)))
            .for_each(|d, &ahead, &behind| *d = (ahead - behind) / h);
        Zip::from(component.slice_axis_mut(ax, Slice::from(n - 1..n)))
            .and(volume.slice_axis(ax, Slice::from(n - 1..n)))
            .and(volume.slice_axis(ax, Slice::from(n - 2..n - 1)))
            .for_each(|d, &ahead, &behind| *d = (ahead - behind) / h);

        component
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn linear_ramp() -> Array3<f64> {
        // f(i, j, k) = 2i + 3j - k
        Array3::from_shape_fn((4, 4, 4), |(i, j, k)| {
            2.0 * i as f64 + 3.0 * j as f64 - k as f64
        })
    }

    #[test]
    fn test_gradient_of_linear_ramp() {
        let field = linear_ramp();
        let [gx, gy, gz] = gradient(&field.view(), &[1.0; 3]);
        for index in ndarray::indices((4, 4, 4)) {
            assert_relative_eq!(gx[index], 2.0);
            assert_relative_eq!(gy[index], 3.0);
            assert_relative_eq!(gz[index], -1.0);
        }
    }

    #[test]
    fn test_gradient_respects_spacing() {
        let field = linear_ramp();
        let [gx, gy, gz] = gradient(&field.view(), &[2.0, 0.5, 1.0]);
        assert_relative_eq!(gx[(1, 1, 1)], 1.0);
        assert_relative_eq!(gy[(1, 1, 1)], 6.0);
        assert_relative_eq!(gz[(1, 1, 1)], -1.0);
    }

    #[test]
    fn test_gradient_single_sample_axis_is_zero() {
        let field = Array3::<f64>::ones((1, 3, 3));
        let [gx, _, _] = gradient(&field.view(), &[1.0; 3]);
        assert!(gx.iter().all(|&g| g == 0.0));
    }

    #[test]
    fn test_gradient_direction_parsing() {
        assert_eq!(
            "descent".parse::<GradientDirection>().unwrap(),
            GradientDirection::Descent
        );
        assert_eq!(
            "ascent".parse::<GradientDirection>().unwrap(),
            GradientDirection::Ascent
        );
        assert!(matches!(
            "sideways".parse::<GradientDirection>(),
            Err(IsosurfaceError::InvalidMode(_))
        ));
    }

    #[test]
    fn test_opposite_modes_flip_disjoint_face_sets() {
        let field = Array3::from_shape_fn((3, 3, 3), |(i, j, k)| {
            let (x, y, z) = (i as f64 - 1.0, j as f64 - 1.0, k as f64 - 1.0);
            -(x * x + y * y + z * z)
        });
        let mesh = crate::marching_cubes(field.view().into_dyn(), -1.5, [1.0; 3]).unwrap();

        let descent = correct_orientation(
            &field.view(),
            &mesh.vertices,
            &mesh.triangles,
            [1.0; 3],
            GradientDirection::Descent,
        );
        let ascent = correct_orientation(
            &field.view(),
            &mesh.vertices,
            &mesh.triangles,
            [1.0; 3],
            GradientDirection::Ascent,
        );

        for ((d, a), original) in descent.iter().zip(&ascent).zip(&mesh.triangles) {
            let d_flipped = d != original;
            let a_flipped = a != original;
            assert!(!(d_flipped && a_flipped));
        }
    }
}
