use crate::util::Rect;

/// A transform consisting of an optional horizontal flip, then uniform scale,
/// then rotation, then translation.
///
/// This transform maintains the "Similarity" of shapes and their image, maintaining
/// all angles and the ratios between all lengths.
#[derive(
    Copy,
    Clone,
    Debug,
    bytemuck::Pod,
    bytemuck::Zeroable,
    PartialEq,
    PartialOrd,
    serde::Serialize,
    serde::Deserialize,
)]
#[repr(C)]
pub struct Similarity {
    /// Special interpretation: Negative bit set == hflip.
    /// Uniform scale should occur as abs(scale).
    pub flip_scale: f32,
    /// Rotation, in radians *CW* from positive X
    pub rotation: f32,
    /// Translation, in canvas units. 0,0 is top left, +X Right, +Y down.
    pub translation: [f32; 2],
}

impl Similarity {
    #[must_use]
    pub fn hflip(&self) -> bool {
        // We want the literal sign bit, regardless of the numerical interpretation.
        self.flip_scale.is_sign_negative()
    }
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.flip_scale.abs()
    }
}

impl Default for Similarity {
    fn default() -> Self {
        Self {
            flip_scale: 1.0,
            rotation: 0.0,
            translation: [0.0; 2],
        }
    }
}

/// An arbitrary affine transform.
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)` where the columns are `[a, b]`, `[c, d]`, `[e, f]`.
#[derive(
    Copy,
    Clone,
    Debug,
    bytemuck::Pod,
    bytemuck::Zeroable,
    PartialEq,
    PartialOrd,
    serde::Serialize,
    serde::Deserialize,
)]
#[repr(C)]
pub struct Matrix {
    /// Column-major matrix elements
    pub elements: [[f32; 2]; 3],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        elements: [[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]],
    };
    #[must_use]
    pub fn translation(dx: f32, dy: f32) -> Self {
        Self {
            elements: [[1.0, 0.0], [0.0, 1.0], [dx, dy]],
        }
    }
    #[must_use]
    pub fn scaling(scale: f32) -> Self {
        Self {
            elements: [[scale, 0.0], [0.0, scale], [0.0, 0.0]],
        }
    }
    /// Uniform scale such that `center` is a fixed point.
    #[must_use]
    pub fn scaling_about(center: [f32; 2], scale: f32) -> Self {
        Self::translation(-center[0], -center[1])
            .then(&Self::scaling(scale))
            .then(&Self::translation(center[0], center[1]))
    }
    /// Rotation, in radians *CW* (+Y is down) about the origin.
    #[must_use]
    pub fn rotation(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            elements: [[cos, sin], [-sin, cos], [0.0, 0.0]],
        }
    }
    /// Compose, applying `self` first and then `next`.
    #[must_use]
    pub fn then(&self, next: &Matrix) -> Matrix {
        let [[a, b], [c, d], [e, f]] = self.elements;
        let [[na, nb], [nc, nd], [ne, nf]] = next.elements;
        Self {
            elements: [
                [na * a + nc * b, nb * a + nd * b],
                [na * c + nc * d, nb * c + nd * d],
                [na * e + nc * f + ne, nb * e + nd * f + nf],
            ],
        }
    }
    #[must_use]
    pub fn determinant(&self) -> f32 {
        let [[a, b], [c, d], _] = self.elements;
        a * d - b * c
    }
    /// Get the inverse transform, or None if it's degenerate.
    #[must_use]
    pub fn invert(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let [[a, b], [c, d], [e, f]] = self.elements;
        let inv = Self {
            elements: [
                [d / det, -b / det],
                [-c / det, a / det],
                [(c * f - d * e) / det, (b * e - a * f) / det],
            ],
        };
        inv.elements
            .iter()
            .flatten()
            .all(|v| v.is_finite())
            .then_some(inv)
    }
    #[must_use]
    pub fn transform_point(&self, [x, y]: [f32; 2]) -> [f32; 2] {
        let [[a, b], [c, d], [e, f]] = self.elements;
        [a * x + c * y + e, b * x + d * y + f]
    }
    /// Transform a direction, ignoring translation.
    #[must_use]
    pub fn transform_vector(&self, [x, y]: [f32; 2]) -> [f32; 2] {
        let [[a, b], [c, d], _] = self.elements;
        [a * x + c * y, b * x + d * y]
    }
    /// Axis-aligned bounds of the transformed rectangle.
    #[must_use]
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        // Four corners always yield Some.
        Rect::bounding_box_of(rect.corners().map(|p| self.transform_point(p))).unwrap_or(*rect)
    }
    /// Average linear scale - the factor by which areas scale, square-rooted.
    #[must_use]
    pub fn scale_factor(&self) -> f32 {
        self.determinant().abs().sqrt()
    }
    /// Rotation of the X axis, in radians *CW*.
    #[must_use]
    pub fn rotation_angle(&self) -> f32 {
        let [[a, b], _, _] = self.elements;
        b.atan2(a)
    }
    /// True if this is a positive uniform scale plus translation, i.e. it maps
    /// axis-aligned pixel grids onto axis-aligned pixel grids without flipping.
    #[must_use]
    pub fn is_axis_aligned_uniform(&self) -> bool {
        let [[a, b], [c, d], _] = self.elements;
        b == 0.0 && c == 0.0 && a > 0.0 && (a - d).abs() <= a * 1e-6
    }
    #[must_use]
    pub fn offset(&self) -> [f32; 2] {
        self.elements[2]
    }
}

impl From<Similarity> for Matrix {
    fn from(value: Similarity) -> Self {
        // The sign bit already holds the flip, so the X axis scale needs no special handling.
        let h_scale = value.flip_scale;
        let v_scale = value.scale();

        let (sin, cos) = value.rotation.sin_cos();

        Self {
            // Rotation times scale, and then translate.
            elements: [
                [h_scale * cos, h_scale * sin],
                [v_scale * -sin, v_scale * cos],
                value.translation,
            ],
        }
    }
}

impl From<[[f32; 2]; 3]> for Matrix {
    fn from(elements: [[f32; 2]; 3]) -> Self {
        Self { elements }
    }
}

impl From<Matrix> for [[f32; 2]; 3] {
    fn from(value: Matrix) -> Self {
        value.elements
    }
}

#[cfg(test)]
mod test {
    use super::{Matrix, Similarity};
    use crate::util::Rect;

    fn approx(a: [f32; 2], b: [f32; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-4 && (a[1] - b[1]).abs() < 1e-4
    }
    #[test]
    fn compose_order() {
        // Scale then translate != translate then scale.
        let st = Matrix::scaling(2.0).then(&Matrix::translation(1.0, 0.0));
        let ts = Matrix::translation(1.0, 0.0).then(&Matrix::scaling(2.0));
        assert_eq!(st.transform_point([1.0, 1.0]), [3.0, 2.0]);
        assert_eq!(ts.transform_point([1.0, 1.0]), [4.0, 2.0]);
    }
    #[test]
    fn inverse_round_trips() {
        let m = Matrix::from(Similarity {
            flip_scale: -2.5,
            rotation: 0.7,
            translation: [10.0, -3.0],
        });
        let inv = m.invert().unwrap();
        let p = [3.0, 4.0];
        assert!(approx(inv.transform_point(m.transform_point(p)), p));
        assert!(approx(m.then(&inv).transform_point(p), p));
        assert!(Matrix::scaling(0.0).invert().is_none());
    }
    #[test]
    fn scaling_about_fixes_center() {
        let m = Matrix::scaling_about([5.0, 5.0], 3.0);
        assert_eq!(m.transform_point([5.0, 5.0]), [5.0, 5.0]);
        assert!((m.scale_factor() - 3.0).abs() < 1e-6);
        assert!(m.is_axis_aligned_uniform());
        assert!(!Matrix::rotation(0.5).is_axis_aligned_uniform());
    }
    #[test]
    fn rect_bounds_under_rotation() {
        let r = Rect::new(0.0, 0.0, 2.0, 2.0);
        let rotated = Matrix::rotation(std::f32::consts::FRAC_PI_4).transform_rect(&r);
        let diag = 2.0 * std::f32::consts::SQRT_2;
        assert!((rotated.w - diag).abs() < 1e-4);
        assert!((rotated.h - diag).abs() < 1e-4);
    }
}
