//! Primitive submission: vertex shading, culling, near-plane clipping and
//! scanline rasterization into the device's active target

use super::blend::{blend_pixel, is_opaque};
use super::device::{Device, TargetView};
use super::geometry::{trapezoid_init_triangle, RasterVertex, Scanline, Trapezoid};
use super::math::Vector;
use super::shader::{FragmentShader, ShaderContext};
use super::transform::{check_cvv, cvv_cut_ratio, ClipFlags};
use super::types::{FuncState, RenderMode, Vertex};

impl TargetView<'_> {
    /// Draw a line from (x0, y0) to (x1, y1) using Bresenham's algorithm
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);

        loop {
            self.set_pixel(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

/// Per-draw settings copied out of the device before it is split
#[derive(Clone, Copy)]
struct DrawState {
    mode: RenderMode,
    cull_back: bool,
    foreground: u32,
}

/// Step one scanline, depth testing and shading each covered pixel
fn draw_scanline(ctx: &ShaderContext, target: &mut TargetView, scanline: &Scanline, fragment: FragmentShader) {
    let width = target.width as i32;
    let row = scanline.y as usize * target.width;
    let mut v = scanline.v;
    let mut x = scanline.x;

    for _ in 0..scanline.w {
        if x >= 0 && x < width {
            let idx = row + x as usize;
            if v.rhw >= target.depth[idx] {
                let color = fragment.shade(ctx, &v);
                if is_opaque(color, ctx.format) {
                    target.color[idx] = color;
                    target.depth[idx] = v.rhw;
                } else {
                    target.color[idx] = blend_pixel(ctx.blend_state, color, target.color[idx], ctx.format);
                }
            }
        }
        v.add(&scanline.step);
        x += 1;
        if x >= width {
            break;
        }
    }
}

fn render_trap(ctx: &ShaderContext, target: &mut TargetView, trap: &mut Trapezoid, fragment: FragmentShader) {
    let top = (trap.top + 0.5).floor() as i32;
    let bottom = (trap.bottom + 0.5).floor() as i32;
    let height = target.height as i32;

    for j in top.max(0)..bottom.min(height) {
        trap.edge_interp(j as f32 + 0.5);
        let scanline = trap.init_scan_line(j);
        draw_scanline(ctx, target, &scanline, fragment);
    }
}

/// Back-facing test on clip-space positions. Front faces wind
/// counter-clockwise with y up.
fn is_back_facing(c: &[Vector; 3]) -> bool {
    let e1 = c[1] - c[0];
    let e2 = c[2] - c[1];
    let face = e1.cross(e2);
    face.dot(Vector::direction(0.0, 0.0, -1.0)) > 0.0
}

/// A vertex after the vertex stage: clip position plus varyings
#[derive(Clone, Copy)]
struct Shaded {
    clip: Vector,
    v: RasterVertex,
}

/// Point where the edge `a -> b` crosses the near plane
fn cut(a: &Shaded, b: &Shaded) -> Option<Shaded> {
    let t = cvv_cut_ratio(&a.clip, &b.clip)?;
    Some(Shaded {
        clip: a.clip.interp(b.clip, t),
        v: RasterVertex::interp(&a.v, &b.v, t),
    })
}

/// Divide, rasterize and optionally outline one clipped triangle
fn finish_triangle(
    ctx: &ShaderContext,
    target: &mut TargetView,
    state: DrawState,
    fragment: Option<FragmentShader>,
    tri: [Shaded; 3],
) {
    let t = tri.map(|s| {
        let mut v = s.v;
        v.pos = ctx.transform.homogenize(s.clip);
        v.pos.w = s.clip.w;
        v.rhw_init();
        v
    });

    if let Some(fragment) = fragment {
        let mut traps = [Trapezoid::default(); 2];
        let n = trapezoid_init_triangle(&mut traps, &t[0], &t[1], &t[2]);
        for trap in traps.iter_mut().take(n) {
            render_trap(ctx, target, trap, fragment);
        }
    }

    if state.mode == RenderMode::Wireframe {
        let p = t.map(|v| (v.pos.x as i32, v.pos.y as i32));
        target.draw_line(p[0].0, p[0].1, p[1].0, p[1].1, state.foreground);
        target.draw_line(p[0].0, p[0].1, p[2].0, p[2].1, state.foreground);
        target.draw_line(p[2].0, p[2].1, p[1].0, p[1].1, state.foreground);
    }
}

fn draw_triangle(ctx: &ShaderContext, target: &mut TargetView, state: DrawState, input: [&Vertex; 3]) {
    let program = state.mode.program();

    let shaded = input.map(|vertex| {
        let mut v = RasterVertex::from(vertex);
        let clip = program.vertex.run(ctx, &mut v);
        Shaded { clip, v }
    });
    let clip = shaded.map(|s| s.clip);

    if state.cull_back && is_back_facing(&clip) {
        log::trace!("primitive culled: back facing");
        return;
    }

    let masks = clip.map(|c| check_cvv(&c));
    if !(masks[0] & masks[1] & masks[2]).is_empty() {
        log::trace!("primitive rejected: outside {:?}", masks[0] & masks[1] & masks[2]);
        return;
    }

    let behind = masks.map(|m| m.contains(ClipFlags::NEAR));
    let fragment = program.fragment;
    match behind.iter().filter(|&&b| b).count() {
        0 => finish_triangle(ctx, target, state, fragment, shaded),
        1 => {
            // The quad (p_ab, b, c, p_ac) keeps the input winding
            let a = behind.iter().position(|&b| b).unwrap_or(0);
            let (b, c) = ((a + 1) % 3, (a + 2) % 3);
            let (Some(p_ab), Some(p_ac)) = (cut(&shaded[a], &shaded[b]), cut(&shaded[a], &shaded[c])) else {
                return;
            };
            finish_triangle(ctx, target, state, fragment, [p_ab, shaded[b], shaded[c]]);
            finish_triangle(ctx, target, state, fragment, [p_ab, shaded[c], p_ac]);
        }
        2 => {
            let a = behind.iter().position(|&b| !b).unwrap_or(0);
            let (b, c) = ((a + 1) % 3, (a + 2) % 3);
            let (Some(p_ab), Some(p_ac)) = (cut(&shaded[a], &shaded[b]), cut(&shaded[a], &shaded[c])) else {
                return;
            };
            finish_triangle(ctx, target, state, fragment, [shaded[a], p_ab, p_ac]);
        }
        _ => log::trace!("primitive rejected: behind the near plane"),
    }
}

fn draw_state(device: &Device) -> DrawState {
    DrawState {
        mode: device.render_mode(),
        cull_back: device.is_enabled(FuncState::CULL_BACK),
        foreground: device.foreground.pack(device.format()),
    }
}

/// Shade, clip and rasterize one triangle with the current render mode
pub fn draw_primitive(device: &mut Device, v1: &Vertex, v2: &Vertex, v3: &Vertex) {
    let state = draw_state(device);
    let (ctx, mut target) = device.raster_parts();
    draw_triangle(&ctx, &mut target, state, [v1, v2, v3]);
}

/// Draw an indexed triangle list. Triangles with an index past the end of
/// `vertices` are skipped.
pub fn draw_elements(device: &mut Device, vertices: &[Vertex], indices: &[u32]) {
    let state = draw_state(device);
    let (ctx, mut target) = device.raster_parts();

    for tri in indices.chunks_exact(3) {
        let fetch = |i: u32| vertices.get(i as usize);
        match (fetch(tri[0]), fetch(tri[1]), fetch(tri[2])) {
            (Some(a), Some(b), Some(c)) => draw_triangle(&ctx, &mut target, state, [a, b, c]),
            _ => log::warn!("skipping triangle {:?}: index out of range ({} vertices)", tri, vertices.len()),
        }
    }
}
