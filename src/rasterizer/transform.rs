//! Coordinate transform stage: world/view/projection composition,
//! canonical view volume tests and the perspective divide

use bitflags::bitflags;

use super::math::{Matrix, Vector};

/// Vertical field of view used by `Transform::new`
pub const FOVY: f32 = std::f32::consts::PI * 0.5;
pub const NEAR_PLANE: f32 = 1.0;
pub const FAR_PLANE: f32 = 500.0;

bitflags! {
    /// Planes of the canonical view volume a clip-space point lies outside of
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClipFlags: u8 {
        /// z < 0
        const NEAR = 1 << 0;
        /// z > w
        const FAR = 1 << 1;
        /// x < -w
        const LEFT = 1 << 2;
        /// x > w
        const RIGHT = 1 << 3;
        /// y < -w
        const BOTTOM = 1 << 4;
        /// y > w
        const TOP = 1 << 5;
    }
}

/// Transform state owned by the device
#[derive(Debug, Clone)]
pub struct Transform {
    pub world: Matrix,
    pub view: Matrix,
    pub projection: Matrix,
    /// `world * view * projection`
    pub transform: Matrix,
    /// Inverse of `world`, for transforming normals
    pub world_inv: Matrix,
    pub view_inv: Matrix,
    /// Screen width in pixels
    pub w: f32,
    /// Screen height in pixels
    pub h: f32,
}

impl Transform {
    /// Identity world and view, 90 degree perspective with near 1 and far 500
    pub fn new(width: usize, height: usize) -> Self {
        let mut ts = Self {
            world: Matrix::identity(),
            view: Matrix::identity(),
            projection: Matrix::identity(),
            transform: Matrix::identity(),
            world_inv: Matrix::identity(),
            view_inv: Matrix::identity(),
            w: width as f32,
            h: height as f32,
        };
        ts.resize(width, height);
        ts
    }

    /// Rebuild the projection for a new target size. World and view are kept.
    pub fn resize(&mut self, width: usize, height: usize) {
        let aspect = width as f32 / height as f32;
        self.projection = Matrix::perspective(FOVY, aspect, NEAR_PLANE, FAR_PLANE);
        self.w = width as f32;
        self.h = height as f32;
        self.update();
    }

    /// Recompose `transform` and the cached inverses. Callers must invoke this
    /// after changing any of the three factors.
    pub fn update(&mut self) {
        self.transform = self.world * self.view * self.projection;
        self.world_inv = self.world.inverse();
        self.view_inv = self.view.inverse();
    }

    /// Object space to clip space (not yet divided by w)
    pub fn apply(&self, x: Vector) -> Vector {
        self.transform.apply(x)
    }

    /// Perspective divide and viewport mapping. `z/w` is kept in z, w becomes 1.
    pub fn homogenize(&self, x: Vector) -> Vector {
        let rhw = 1.0 / x.w;
        Vector {
            x: (x.x * rhw + 1.0) * self.w * 0.5,
            y: (1.0 - x.y * rhw) * self.h * 0.5,
            z: x.z * rhw,
            w: 1.0,
        }
    }
}

/// Classify a clip-space point against the six planes of the view volume
pub fn check_cvv(v: &Vector) -> ClipFlags {
    let w = v.w;
    let mut check = ClipFlags::empty();
    if v.z < 0.0 {
        check |= ClipFlags::NEAR;
    }
    if v.z > w {
        check |= ClipFlags::FAR;
    }
    if v.x < -w {
        check |= ClipFlags::LEFT;
    }
    if v.x > w {
        check |= ClipFlags::RIGHT;
    }
    if v.y < -w {
        check |= ClipFlags::BOTTOM;
    }
    if v.y > w {
        check |= ClipFlags::TOP;
    }
    check
}

/// Parameter along `c1 -> c2` where the segment crosses the near plane
/// (z = 0). Returns `None` when both ends sit on the same side of it.
///
/// Only the near plane is considered, whatever other planes the two ends
/// violate: side and far planes are never cut per edge.
pub fn cvv_cut_ratio(c1: &Vector, c2: &Vector) -> Option<f32> {
    let near1 = check_cvv(c1).contains(ClipFlags::NEAR);
    let near2 = check_cvv(c2).contains(ClipFlags::NEAR);
    if near1 == near2 {
        return None;
    }
    Some(-(c1.z / (c2.z - c1.z)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homogenize_center() {
        let ts = Transform::new(512, 512);
        let p = ts.homogenize(Vector::point(0.0, 0.0, 0.0));
        assert!((p.x - 256.0).abs() < 1e-4);
        assert!((p.y - 256.0).abs() < 1e-4);
        assert_eq!(p.w, 1.0);
    }

    #[test]
    fn test_homogenize_corners() {
        let ts = Transform::new(640, 480);
        let top_left = ts.homogenize(Vector::new(-2.0, 2.0, 1.0, 2.0));
        assert!(top_left.x.abs() < 1e-4);
        assert!(top_left.y.abs() < 1e-4);
        assert!((top_left.z - 0.5).abs() < 1e-6);
        let bottom_right = ts.homogenize(Vector::point(1.0, -1.0, 0.0));
        assert!((bottom_right.x - 640.0).abs() < 1e-3);
        assert!((bottom_right.y - 480.0).abs() < 1e-3);
    }

    #[test]
    fn test_cvv_mask_each_plane() {
        let w = 2.0;
        let cases = [
            (Vector::new(0.0, 0.0, -1.0, w), ClipFlags::NEAR),
            (Vector::new(0.0, 0.0, w + 1.0, w), ClipFlags::FAR),
            (Vector::new(-w - 1.0, 0.0, 1.0, w), ClipFlags::LEFT),
            (Vector::new(w + 1.0, 0.0, 1.0, w), ClipFlags::RIGHT),
            (Vector::new(0.0, -w - 1.0, 1.0, w), ClipFlags::BOTTOM),
            (Vector::new(0.0, w + 1.0, 1.0, w), ClipFlags::TOP),
        ];
        for (v, expected) in cases {
            assert_eq!(check_cvv(&v), expected, "{:?}", v);
        }
        assert!(check_cvv(&Vector::new(0.5, -0.5, 1.0, w)).is_empty());
    }

    #[test]
    fn test_cut_ratio() {
        let inside = Vector::new(0.0, 0.0, 2.0, 3.0);
        let behind = Vector::new(0.0, 0.0, -2.0, -1.0);
        let t = cvv_cut_ratio(&inside, &behind).unwrap();
        assert!((t - 0.5).abs() < 1e-6);
        let crossing = inside.interp(behind, t);
        assert!(crossing.z.abs() < 1e-6);
    }

    #[test]
    fn test_cut_ratio_ignores_side_planes() {
        let a = Vector::new(0.0, 0.0, 1.0, 2.0);
        let b = Vector::new(10.0, 0.0, 1.0, 2.0);
        assert_eq!(cvv_cut_ratio(&a, &b), None);
        let c = Vector::new(0.0, 0.0, -1.0, 2.0);
        let d = Vector::new(0.0, 0.0, -3.0, 2.0);
        assert_eq!(cvv_cut_ratio(&c, &d), None);
    }

    #[test]
    fn test_update_composes_in_order() {
        let mut ts = Transform::new(100, 100);
        ts.world = Matrix::translate(0.0, 0.0, 10.0);
        ts.update();
        let clip = ts.apply(Vector::point(0.0, 0.0, 0.0));
        assert!((clip.w - 10.0).abs() < 1e-4);
        let round = ts.world_inv.apply(Vector::point(0.0, 0.0, 10.0));
        assert!(round.z.abs() < 1e-5);
    }
}
