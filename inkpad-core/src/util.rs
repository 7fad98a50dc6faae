//! Utility types, used throughout the crate.
//! `FiniteF32` for floats that must hash and order, and `Rect` for every axis-aligned bound.

/// A float which is non-NaN
// Because of the preconditions invalidating many bitpatterns, this is not Pod.
#[derive(Copy, Clone, PartialEq, PartialOrd, bytemuck::NoUninit, bytemuck::Zeroable, Debug)]
#[repr(transparent)]
pub struct FiniteF32(f32);
impl FiniteF32 {
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);
    pub fn new(val: f32) -> Result<Self, FiniteF32Error> {
        if val.is_finite() {
            Ok(Self(val))
        } else {
            Err(FiniteF32Error::NotFinite)
        }
    }
    /// Clamp infinities to the largest finite values, and NaN to zero.
    #[must_use]
    pub fn saturating(val: f32) -> Self {
        if val.is_nan() {
            Self::ZERO
        } else {
            Self(val.clamp(f32::MIN, f32::MAX))
        }
    }
    #[must_use]
    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for FiniteF32 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<f32> for FiniteF32 {
    type Error = FiniteF32Error;
    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
impl From<FiniteF32> for f32 {
    fn from(value: FiniteF32) -> Self {
        value.get()
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FiniteF32Error {
    #[error("not finite")]
    NotFinite,
}

// This is safe - even though f32 is !Eq, we guarantee that no component is ever NaN
// So PartialEq can act like Eq
impl Eq for FiniteF32 {}
// Doing this on purpose! taking partial ord logic to impl Ord because of struct invariants.
#[allow(clippy::derive_ord_xor_partial_ord)]
impl Ord for FiniteF32 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Never None - wrapped floats are never NaN.
        self.partial_cmp(other).unwrap_or(std::cmp::Ordering::Equal)
    }
}
impl std::hash::Hash for FiniteF32 {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Since we now impl *Eq, we can now impl Hash too!
        // (As x == y is required to imply Hash(x) == Hash(y) which isn't possible with NaN)
        state.write_u32(self.0.to_bits());
    }
}

/// An axis-aligned rectangle. `x, y` is the top-left corner, +X right, +Y down.
///
/// Width and height are never negative - constructors normalize flipped rectangles.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Debug,
    Default,
    bytemuck::Pod,
    bytemuck::Zeroable,
    serde::Serialize,
    serde::Deserialize,
)]
#[repr(C)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}
impl Rect {
    pub const EMPTY: Self = Self {
        x: 0.0,
        y: 0.0,
        w: 0.0,
        h: 0.0,
    };
    #[must_use]
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::from_corners([x, y], [x + w, y + h])
    }
    /// Rectangle spanning two opposite corners, in any order.
    #[must_use]
    pub fn from_corners(a: [f32; 2], b: [f32; 2]) -> Self {
        let min = [a[0].min(b[0]), a[1].min(b[1])];
        let max = [a[0].max(b[0]), a[1].max(b[1])];
        Self {
            x: min[0],
            y: min[1],
            w: max[0] - min[0],
            h: max[1] - min[1],
        }
    }
    /// Smallest rectangle containing every point, or `None` if there are no points.
    pub fn bounding_box_of(points: impl IntoIterator<Item = [f32; 2]>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| {
            (
                [min[0].min(p[0]), min[1].min(p[1])],
                [max[0].max(p[0]), max[1].max(p[1])],
            )
        });
        Some(Self::from_corners(min, max))
    }
    #[must_use]
    pub fn min(&self) -> [f32; 2] {
        [self.x, self.y]
    }
    #[must_use]
    pub fn max(&self) -> [f32; 2] {
        [self.right(), self.bottom()]
    }
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
    #[must_use]
    pub fn center(&self) -> [f32; 2] {
        [self.x + self.w / 2.0, self.y + self.h / 2.0]
    }
    #[must_use]
    pub fn area(&self) -> f32 {
        self.w * self.h
    }
    /// True if the rectangle covers no area. Lines and points have zero area,
    /// but may still intersect other rectangles!
    #[must_use]
    pub fn has_zero_area(&self) -> bool {
        !(self.area() > 0.0)
    }
    #[must_use]
    pub fn corners(&self) -> [[f32; 2]; 4] {
        [
            [self.x, self.y],
            [self.right(), self.y],
            [self.right(), self.bottom()],
            [self.x, self.bottom()],
        ]
    }
    /// Closed intersection test - touching edges count as intersecting.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self::from_corners(
            [self.x.max(other.x), self.y.max(other.y)],
            [self.right().min(other.right()), self.bottom().min(other.bottom())],
        ))
    }
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        Self::from_corners(
            [self.x.min(other.x), self.y.min(other.y)],
            [self.right().max(other.right()), self.bottom().max(other.bottom())],
        )
    }
    /// Grow outwards by `margin` on every side.
    #[must_use]
    pub fn grown_by(&self, margin: f32) -> Rect {
        Self::from_corners(
            [self.x - margin, self.y - margin],
            [self.right() + margin, self.bottom() + margin],
        )
    }
    #[must_use]
    pub fn contains_point(&self, [x, y]: [f32; 2]) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }
    #[must_use]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.contains_point(other.min()) && self.contains_point(other.max())
    }
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.w.is_finite() && self.h.is_finite()
    }
}
