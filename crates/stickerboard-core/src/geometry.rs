//! Transform composition for widget gestures.
//!
//! Widgets carry rotation and scale in an [`Affine`] and their translation
//! separately as a center [`Point`]. Every function here is pure; gesture
//! baselines live in the manipulation controller.

use kurbo::{Affine, Point, Vec2};

/// Right-multiply a rotation of `delta` radians onto `transform`.
///
/// `delta` must be the increment since the last gesture sample, not the
/// gesture's cumulative rotation.
pub fn rotate(transform: Affine, delta: f64) -> Affine {
    transform * Affine::rotate(delta)
}

/// Right-multiply a uniform scale of `factor` onto `transform`.
///
/// `factor` is the incremental ratio since the last sample. Callers must
/// never pass zero.
pub fn scale(transform: Affine, factor: f64) -> Affine {
    transform * Affine::scale(factor)
}

/// Move a position by a delta. Independent of any transform.
pub fn translate(position: Point, dx: f64, dy: f64) -> Point {
    position + Vec2::new(dx, dy)
}

/// Mirror `transform` around the widget's vertical axis.
pub fn mirror_horizontal(transform: Affine) -> Affine {
    transform * Affine::scale_non_uniform(-1.0, 1.0)
}

/// True when every coefficient is finite and the determinant is non-zero.
pub fn is_invertible(transform: Affine) -> bool {
    let det = transform.determinant();
    transform.as_coeffs().iter().all(|c| c.is_finite()) && det.is_finite() && det != 0.0
}

/// Coefficient-wise comparison with an absolute tolerance.
pub fn approx_eq(a: Affine, b: Affine, epsilon: f64) -> bool {
    a.as_coeffs()
        .iter()
        .zip(b.as_coeffs().iter())
        .all(|(x, y)| (x - y).abs() <= epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn sample() -> Affine {
        Affine::new([0.8, 0.3, -0.3, 0.8, 0.0, 0.0])
    }

    #[test]
    fn test_identity_rotation_and_scale() {
        let t = sample();
        assert_eq!(rotate(t, 0.0), t);
        assert_eq!(scale(t, 1.0), t);
    }

    #[test]
    fn test_incremental_rotation_matches_single_rotation() {
        let t = sample();
        let (first, second) = (0.35, -1.1);
        let stepped = rotate(rotate(t, first), second);
        let direct = rotate(t, first + second);
        assert!(approx_eq(stepped, direct, 1e-12));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let t = rotate(Affine::IDENTITY, FRAC_PI_2);
        let p = t * Point::new(1.0, 0.0);
        assert!((p.x).abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_scale_composes_multiplicatively() {
        let t = scale(scale(Affine::IDENTITY, 2.0), 1.5);
        assert!(approx_eq(t, Affine::scale(3.0), 1e-12));
    }

    #[test]
    fn test_translation_leaves_transform_alone() {
        let p = translate(Point::new(10.0, 20.0), 5.0, -2.5);
        assert_eq!(p, Point::new(15.0, 17.5));
    }

    #[test]
    fn test_mirror_flips_determinant_sign() {
        let t = rotate(Affine::IDENTITY, FRAC_PI_4);
        let mirrored = mirror_horizontal(t);
        assert!(mirrored.determinant() < 0.0);
        assert!(approx_eq(mirror_horizontal(mirrored), t, 1e-12));
    }

    #[test]
    fn test_is_invertible() {
        assert!(is_invertible(Affine::IDENTITY));
        assert!(!is_invertible(Affine::scale(0.0)));
        assert!(!is_invertible(Affine::new([f64::NAN, 0.0, 0.0, 1.0, 0.0, 0.0])));
    }
}
