//! Alpha blending of shaded fragments against the target

use super::types::{BlendFactor, BlendState, Color, PixelFormat};

/// A fragment is opaque iff its alpha is 255. Xrgb pixels carry no alpha and
/// are always opaque.
pub fn is_opaque(pixel: u32, format: PixelFormat) -> bool {
    match format {
        PixelFormat::Rgba8888 => pixel & 0xff == 0xff,
        PixelFormat::Xrgb8888 => true,
    }
}

fn factor(f: BlendFactor, src_alpha: f32) -> f32 {
    match f {
        BlendFactor::Zero => 0.0,
        BlendFactor::One => 1.0,
        BlendFactor::SrcAlpha => src_alpha,
        BlendFactor::OneMinusSrcAlpha => 1.0 - src_alpha,
    }
}

/// `src * src_factor + dst * dst_factor` per channel, clamped to 255
pub fn blend(state: BlendState, src: Color, dst: Color) -> Color {
    let alpha = src.a as f32 / 255.0;
    let fs = factor(state.src, alpha);
    let fd = factor(state.dst, alpha);
    let mix = |s: u8, d: u8| (s as f32 * fs + d as f32 * fd) as i32;
    Color::clamped(mix(src.r, dst.r), mix(src.g, dst.g), mix(src.b, dst.b), mix(src.a, dst.a))
}

/// Blend packed pixels in the given format
pub fn blend_pixel(state: BlendState, src: u32, dst: u32, format: PixelFormat) -> u32 {
    blend(state, Color::unpack(src, format), Color::unpack(dst, format)).pack(format)
}
