//! Triangle to trapezoid decomposition and scanline stepping
//!
//! A triangle is split at its middle vertex into at most two trapezoids with
//! horizontal top and bottom. Each trapezoid is walked one pixel row at a
//! time; every row becomes a scanline with a start vertex and a per-pixel
//! step, so attributes advance by plain addition.

use super::math::{interp, Vector};
use super::types::{ColorF, TexCoord, Vertex};

/// Number of vertex-shader result slots carried to the fragment stage
pub const VS_RESULT_SLOTS: usize = 2;

/// Slot holding the world-space vector from surface to eye
pub const VS_EYE_VIEW: usize = 0;
/// Slot holding the light-space clip position of a shadow receiver
pub const VS_LIGHT_POS: usize = 1;

/// Vertex as it moves through clipping and rasterization. Built fresh per
/// primitive from an application `Vertex`; nothing here outlives the draw.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RasterVertex {
    /// Screen position after the divide; w holds the clip-space w
    pub pos: Vector,
    pub tc: TexCoord,
    pub color: ColorF,
    pub normal: Vector,
    pub vs_result: [Vector; VS_RESULT_SLOTS],
    /// Reciprocal of clip-space w
    pub rhw: f32,
}

impl From<&Vertex> for RasterVertex {
    fn from(v: &Vertex) -> Self {
        Self {
            pos: v.pos,
            tc: v.tc,
            color: v.color,
            normal: v.normal,
            vs_result: [Vector::ZERO; VS_RESULT_SLOTS],
            rhw: 1.0,
        }
    }
}

impl RasterVertex {
    /// Set `rhw = 1 / pos.w` and premultiply every varying by it so that
    /// linear stepping in screen space stays perspective-correct
    pub fn rhw_init(&mut self) {
        let rhw = 1.0 / self.pos.w;
        self.rhw = rhw;
        self.tc.u *= rhw;
        self.tc.v *= rhw;
        self.color.r *= rhw;
        self.color.g *= rhw;
        self.color.b *= rhw;
        self.normal = self.normal * rhw;
        for slot in self.vs_result.iter_mut() {
            *slot = *slot * rhw;
        }
    }

    /// Interpolate every attribute, position included
    pub fn interp(a: &RasterVertex, b: &RasterVertex, t: f32) -> RasterVertex {
        let mut vs_result = [Vector::ZERO; VS_RESULT_SLOTS];
        for (i, slot) in vs_result.iter_mut().enumerate() {
            *slot = a.vs_result[i].interp(b.vs_result[i], t);
        }
        RasterVertex {
            pos: a.pos.interp(b.pos, t),
            tc: TexCoord::new(interp(a.tc.u, b.tc.u, t), interp(a.tc.v, b.tc.v, t)),
            color: ColorF::new(
                interp(a.color.r, b.color.r, t),
                interp(a.color.g, b.color.g, t),
                interp(a.color.b, b.color.b, t),
            ),
            normal: a.normal.interp(b.normal, t),
            vs_result,
            rhw: interp(a.rhw, b.rhw, t),
        }
    }

    /// Per-unit step `(b - a) / w`
    pub fn division(a: &RasterVertex, b: &RasterVertex, w: f32) -> RasterVertex {
        let inv = 1.0 / w;
        let mut vs_result = [Vector::ZERO; VS_RESULT_SLOTS];
        for (i, slot) in vs_result.iter_mut().enumerate() {
            *slot = (b.vs_result[i] - a.vs_result[i]) * inv;
        }
        RasterVertex {
            pos: (b.pos - a.pos) * inv,
            tc: TexCoord::new((b.tc.u - a.tc.u) * inv, (b.tc.v - a.tc.v) * inv),
            color: ColorF::new(
                (b.color.r - a.color.r) * inv,
                (b.color.g - a.color.g) * inv,
                (b.color.b - a.color.b) * inv,
            ),
            normal: (b.normal - a.normal) * inv,
            vs_result,
            rhw: (b.rhw - a.rhw) * inv,
        }
    }

    /// Advance by one step
    pub fn add(&mut self, step: &RasterVertex) {
        self.pos = self.pos + step.pos;
        self.tc.u += step.tc.u;
        self.tc.v += step.tc.v;
        self.color.r += step.color.r;
        self.color.g += step.color.g;
        self.color.b += step.color.b;
        self.normal = self.normal + step.normal;
        for (slot, d) in self.vs_result.iter_mut().zip(step.vs_result.iter()) {
            *slot = *slot + *d;
        }
        self.rhw += step.rhw;
    }
}

/// One side of a trapezoid: `v` is the point at the current row
#[derive(Debug, Clone, Copy, Default)]
pub struct Edge {
    pub v: RasterVertex,
    pub v1: RasterVertex,
    pub v2: RasterVertex,
}

impl Edge {
    fn new(v1: &RasterVertex, v2: &RasterVertex) -> Self {
        Self { v: *v1, v1: *v1, v2: *v2 }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Trapezoid {
    pub top: f32,
    pub bottom: f32,
    pub left: Edge,
    pub right: Edge,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Scanline {
    /// Attributes at the current pixel
    pub v: RasterVertex,
    pub step: RasterVertex,
    pub x: i32,
    pub y: i32,
    /// Pixel count
    pub w: i32,
}

/// Split a screen-space triangle into up to two trapezoids. Returns how many
/// of `traps` were filled; zero-height and zero-width triangles give 0.
pub fn trapezoid_init_triangle(
    traps: &mut [Trapezoid; 2],
    p1: &RasterVertex,
    p2: &RasterVertex,
    p3: &RasterVertex,
) -> usize {
    let (mut p1, mut p2, mut p3) = (p1, p2, p3);
    if p1.pos.y > p2.pos.y {
        std::mem::swap(&mut p1, &mut p2);
    }
    if p1.pos.y > p3.pos.y {
        std::mem::swap(&mut p1, &mut p3);
    }
    if p2.pos.y > p3.pos.y {
        std::mem::swap(&mut p2, &mut p3);
    }

    if p1.pos.y == p2.pos.y && p1.pos.y == p3.pos.y {
        return 0;
    }
    if p1.pos.x == p2.pos.x && p1.pos.x == p3.pos.x {
        return 0;
    }

    // Flat top
    if p1.pos.y == p2.pos.y {
        if p1.pos.x > p2.pos.x {
            std::mem::swap(&mut p1, &mut p2);
        }
        traps[0].top = p1.pos.y;
        traps[0].bottom = p3.pos.y;
        traps[0].left = Edge::new(p1, p3);
        traps[0].right = Edge::new(p2, p3);
        return if traps[0].top < traps[0].bottom { 1 } else { 0 };
    }

    // Flat bottom
    if p2.pos.y == p3.pos.y {
        if p2.pos.x > p3.pos.x {
            std::mem::swap(&mut p2, &mut p3);
        }
        traps[0].top = p1.pos.y;
        traps[0].bottom = p3.pos.y;
        traps[0].left = Edge::new(p1, p2);
        traps[0].right = Edge::new(p1, p3);
        return if traps[0].top < traps[0].bottom { 1 } else { 0 };
    }

    traps[0].top = p1.pos.y;
    traps[0].bottom = p2.pos.y;
    traps[1].top = p2.pos.y;
    traps[1].bottom = p3.pos.y;

    // Where the long edge p1 -> p3 crosses the middle row
    let t = (p2.pos.y - p1.pos.y) / (p3.pos.y - p1.pos.y);
    let split_x = interp(p1.pos.x, p3.pos.x, t);

    if p2.pos.x <= split_x {
        // Middle vertex on the left
        traps[0].left = Edge::new(p1, p2);
        traps[0].right = Edge::new(p1, p3);
        traps[1].left = Edge::new(p2, p3);
        traps[1].right = Edge::new(p1, p3);
    } else {
        traps[0].left = Edge::new(p1, p3);
        traps[0].right = Edge::new(p1, p2);
        traps[1].left = Edge::new(p1, p3);
        traps[1].right = Edge::new(p2, p3);
    }

    2
}

impl Trapezoid {
    /// Move both edges' current vertex to row `y`. The parameter is clamped
    /// to [0, 1] because pixel-center rows can fall just outside an edge.
    pub fn edge_interp(&mut self, y: f32) {
        for edge in [&mut self.left, &mut self.right] {
            let s = edge.v2.pos.y - edge.v1.pos.y;
            let t = if s == 0.0 { 0.0 } else { ((y - edge.v1.pos.y) / s).clamp(0.0, 1.0) };
            edge.v = RasterVertex::interp(&edge.v1, &edge.v2, t);
        }
    }

    /// Scanline for row `y` from the edges' current vertices
    pub fn init_scan_line(&self, y: i32) -> Scanline {
        let left = &self.left.v;
        let right = &self.right.v;
        let width = right.pos.x - left.pos.x;
        let x = (left.pos.x + 0.5).floor() as i32;
        let mut w = (right.pos.x + 0.5).floor() as i32 - x;
        if left.pos.x >= right.pos.x {
            w = 0;
        }
        let step = if w > 0 {
            RasterVertex::division(left, right, width)
        } else {
            RasterVertex::default()
        };
        Scanline { v: *left, step, x, y, w }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen_vertex(x: f32, y: f32) -> RasterVertex {
        RasterVertex {
            pos: Vector::new(x, y, 0.5, 1.0),
            rhw: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_split_counts() {
        let mut traps = [Trapezoid::default(); 2];

        let general = trapezoid_init_triangle(
            &mut traps,
            &screen_vertex(10.0, 10.0),
            &screen_vertex(40.0, 25.0),
            &screen_vertex(20.0, 50.0),
        );
        assert_eq!(general, 2);

        let flat_top = trapezoid_init_triangle(
            &mut traps,
            &screen_vertex(10.0, 10.0),
            &screen_vertex(40.0, 10.0),
            &screen_vertex(20.0, 50.0),
        );
        assert_eq!(flat_top, 1);

        let flat_bottom = trapezoid_init_triangle(
            &mut traps,
            &screen_vertex(20.0, 10.0),
            &screen_vertex(40.0, 50.0),
            &screen_vertex(5.0, 50.0),
        );
        assert_eq!(flat_bottom, 1);

        let degenerate = trapezoid_init_triangle(
            &mut traps,
            &screen_vertex(10.0, 30.0),
            &screen_vertex(40.0, 30.0),
            &screen_vertex(20.0, 30.0),
        );
        assert_eq!(degenerate, 0);
    }

    #[test]
    fn test_left_edge_is_lesser_x() {
        let mut traps = [Trapezoid::default(); 2];
        // Input order deliberately puts the right-hand vertex first
        let n = trapezoid_init_triangle(
            &mut traps,
            &screen_vertex(40.0, 10.0),
            &screen_vertex(10.0, 10.0),
            &screen_vertex(25.0, 40.0),
        );
        assert_eq!(n, 1);
        traps[0].edge_interp(20.5);
        assert!(traps[0].left.v.pos.x < traps[0].right.v.pos.x);

        let n = trapezoid_init_triangle(
            &mut traps,
            &screen_vertex(20.0, 0.0),
            &screen_vertex(60.0, 20.0),
            &screen_vertex(0.0, 40.0),
        );
        assert_eq!(n, 2);
        for trap in traps.iter_mut() {
            let mid = (trap.top + trap.bottom) * 0.5;
            trap.edge_interp(mid);
            assert!(trap.left.v.pos.x <= trap.right.v.pos.x);
        }
    }

    #[test]
    fn test_edge_interp_clamps() {
        let mut traps = [Trapezoid::default(); 2];
        trapezoid_init_triangle(
            &mut traps,
            &screen_vertex(0.0, 0.0),
            &screen_vertex(10.0, 0.0),
            &screen_vertex(0.0, 10.0),
        );
        traps[0].edge_interp(10.5);
        assert!((traps[0].left.v.pos.y - 10.0).abs() < 1e-5);
        traps[0].edge_interp(-3.0);
        assert!(traps[0].right.v.pos.y.abs() < 1e-5);
    }

    #[test]
    fn test_scanline_steps_reach_right_edge() {
        let mut traps = [Trapezoid::default(); 2];
        let mut a = screen_vertex(0.0, 0.0);
        a.color = ColorF::new(0.0, 0.0, 0.0);
        let mut b = screen_vertex(20.0, 0.0);
        b.color = ColorF::new(1.0, 0.0, 0.0);
        let mut c = screen_vertex(0.0, 20.0);
        c.color = ColorF::new(0.0, 0.0, 0.0);
        trapezoid_init_triangle(&mut traps, &a, &b, &c);

        traps[0].edge_interp(0.5);
        let mut scan = traps[0].init_scan_line(0);
        assert_eq!(scan.x, 0);
        assert_eq!(scan.w, 20);
        let width = traps[0].right.v.pos.x - traps[0].left.v.pos.x;
        let steps = width.round() as i32;
        let start = scan.v.color.r;
        for _ in 0..steps {
            scan.v.add(&scan.step);
        }
        let walked = scan.v.color.r - start;
        let span = traps[0].right.v.color.r - traps[0].left.v.color.r;
        assert!((walked - span * steps as f32 / width).abs() < 1e-4);
        assert!((scan.step.color.r * width - span).abs() < 1e-5);
    }

    #[test]
    fn test_rhw_init_premultiplies() {
        let mut v = RasterVertex {
            pos: Vector::new(0.0, 0.0, 0.0, 4.0),
            tc: TexCoord::new(1.0, 0.5),
            color: ColorF::new(1.0, 1.0, 1.0),
            ..Default::default()
        };
        v.rhw_init();
        assert!((v.rhw - 0.25).abs() < 1e-6);
        assert!((v.tc.u - 0.25).abs() < 1e-6);
        assert!((v.tc.v / v.rhw - 0.5).abs() < 1e-6);
    }
}
