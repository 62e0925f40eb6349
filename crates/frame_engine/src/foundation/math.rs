//! Math utilities and types
//!
//! 2D affine transforms for the software renderer, backed by `nalgebra`.

pub use nalgebra::{Matrix3, Point2, Vector2};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 2D point type
pub type Point = Point2<f32>;

/// Affine 2D transform applied to drawing operations
///
/// Composition follows drawing order: `a.then(&b)` maps a point through `a`
/// first and `b` second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    matrix: Mat3,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2D {
    /// The identity transform
    pub fn identity() -> Self {
        Self { matrix: Mat3::identity() }
    }

    /// A pure scale
    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self {
            matrix: Mat3::new_nonuniform_scaling(&Vec2::new(sx, sy)),
        }
    }

    /// A pure translation
    pub fn translation(dx: f32, dy: f32) -> Self {
        Self {
            matrix: Mat3::new_translation(&Vec2::new(dx, dy)),
        }
    }

    /// Build from a raw homogeneous matrix
    pub fn from_matrix(matrix: Mat3) -> Self {
        Self { matrix }
    }

    /// The underlying homogeneous matrix
    pub fn matrix(&self) -> &Mat3 {
        &self.matrix
    }

    /// Apply `self` first, then `next`
    #[must_use]
    pub fn then(&self, next: &Self) -> Self {
        Self {
            matrix: next.matrix * self.matrix,
        }
    }

    /// Append a scale after this transform
    #[must_use]
    pub fn scale(&self, sx: f32, sy: f32) -> Self {
        self.then(&Self::scaling(sx, sy))
    }

    /// Append a translation after this transform
    #[must_use]
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        self.then(&Self::translation(dx, dy))
    }

    /// Inverse transform, if the matrix is invertible
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }

    /// Map a point through the transform
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        let p = self.matrix.transform_point(&Point::new(x, y));
        (p.x, p.y)
    }

    /// Whether this is exactly the identity
    pub fn is_identity(&self) -> bool {
        self.matrix == Mat3::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity() {
        let t = Transform2D::identity();
        assert!(t.is_identity());
        assert_eq!(t.transform_point(3.0, 4.0), (3.0, 4.0));
    }

    #[test]
    fn test_scale_then_translate_order() {
        let t = Transform2D::scaling(2.0, 3.0).translate(10.0, 0.0);
        let (x, y) = t.transform_point(1.0, 1.0);
        assert_relative_eq!(x, 12.0);
        assert_relative_eq!(y, 3.0);

        let t = Transform2D::translation(10.0, 0.0).scale(2.0, 3.0);
        let (x, y) = t.transform_point(1.0, 1.0);
        assert_relative_eq!(x, 22.0);
        assert_relative_eq!(y, 3.0);
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = Transform2D::scaling(0.5, 4.0).translate(-3.0, 7.0);
        let inv = t.inverse().unwrap();
        let (x, y) = t.transform_point(5.0, -2.0);
        let (bx, by) = inv.transform_point(x, y);
        assert_relative_eq!(bx, 5.0, epsilon = 1e-5);
        assert_relative_eq!(by, -2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_degenerate_scale_has_no_inverse() {
        assert!(Transform2D::scaling(0.0, 1.0).inverse().is_none());
    }
}
