//! Built-in shader variants and the render-mode dispatch table
//!
//! Shading is a closed set: each `RenderMode` selects one vertex variant and
//! at most one fragment variant. Fragment shaders receive varyings still
//! multiplied by rhw and undo that themselves.

use super::device::{Texture, Uniforms};
use super::geometry::{RasterVertex, VS_EYE_VIEW, VS_LIGHT_POS};
use super::math::Vector;
use super::transform::{Transform, FAR_PLANE};
use super::types::{BlendState, Color, PixelFormat, RenderMode};
use super::MAX_TEXTURE_UNITS;

/// Vector uniform: light energy per channel
pub const UNIFORM_LIGHT_ENERGY: usize = 0;
/// Vector uniform: direction towards the light
pub const UNIFORM_LIGHT_DIRECTION: usize = 1;
/// Vector uniform: eye position in world space
pub const UNIFORM_EYE: usize = 2;
/// Vector uniform: material (x = kD, y = kS, z = kQ)
pub const UNIFORM_MATERIAL: usize = 3;
/// Matrix uniform: light view * projection
pub const UNIFORM_LIGHT_VIEW_PROJ: usize = 0;

pub const TEXTURE_UNIT_DIFFUSE: usize = 0;
pub const TEXTURE_UNIT_SHADOW: usize = 1;

/// Alpha written by the translucent texture variant
pub const TEXTURE_ALPHA: u8 = 128;
/// Depth slack before a receiver counts as occluded
pub const SHADOW_BIAS: f32 = 0.05;
/// Brightness multiplier inside shadow
pub const SHADOW_FACTOR: f32 = 0.5;

/// Read-only state visible to shaders during a draw
pub struct ShaderContext<'a> {
    pub transform: &'a Transform,
    pub uniforms: &'a Uniforms,
    pub textures: &'a [Texture],
    pub texture_units: &'a [usize; MAX_TEXTURE_UNITS],
    pub format: PixelFormat,
    pub blend_state: BlendState,
}

impl ShaderContext<'_> {
    fn texture(&self, unit: usize) -> &Texture {
        &self.textures[self.texture_units[unit]]
    }

    fn sample(&self, unit: usize, u: f32, v: f32) -> Color {
        Color::unpack(self.texture(unit).read(u, v), self.format)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexShader {
    /// Object space straight to clip space
    Mvp,
    /// MVP plus the world-space vector towards the eye
    MvpEyeView,
    /// MVP plus the position projected into light space
    MvpLightSpace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentShader {
    Color,
    Texture,
    LambertTexture,
    PhongTexture,
    BlinnTexture,
    TextureAlpha,
    ShadowDepth,
    ShadowLambertTexture,
}

/// Vertex + fragment pair. A missing fragment stage means no fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderProgram {
    pub vertex: VertexShader,
    pub fragment: Option<FragmentShader>,
}

impl RenderMode {
    pub fn program(self) -> ShaderProgram {
        use FragmentShader as F;
        use VertexShader as V;
        let (vertex, fragment) = match self {
            RenderMode::Wireframe => (V::Mvp, None),
            RenderMode::Texture => (V::Mvp, Some(F::Texture)),
            RenderMode::Color => (V::Mvp, Some(F::Color)),
            RenderMode::LambertLightTexture => (V::Mvp, Some(F::LambertTexture)),
            RenderMode::PhongLightTexture => (V::MvpEyeView, Some(F::PhongTexture)),
            RenderMode::TextureAlpha => (V::Mvp, Some(F::TextureAlpha)),
            RenderMode::ShadowMap => (V::Mvp, Some(F::ShadowDepth)),
            RenderMode::BlinnLightTexture => (V::MvpEyeView, Some(F::BlinnTexture)),
            RenderMode::ShadowLambertTexture => (V::MvpLightSpace, Some(F::ShadowLambertTexture)),
        };
        ShaderProgram { vertex, fragment }
    }
}

impl VertexShader {
    /// Transform `v` (object space) to clip space, filling any extra
    /// varyings this variant produces
    pub fn run(self, ctx: &ShaderContext, v: &mut RasterVertex) -> Vector {
        let clip = ctx.transform.apply(v.pos);
        match self {
            VertexShader::Mvp => {}
            VertexShader::MvpEyeView => {
                let world_pos = ctx.transform.world.apply(v.pos);
                v.vs_result[VS_EYE_VIEW] = ctx.uniforms.vectors[UNIFORM_EYE] - world_pos;
            }
            VertexShader::MvpLightSpace => {
                let world_pos = ctx.transform.world.apply(v.pos);
                v.vs_result[VS_LIGHT_POS] = ctx.uniforms.matrices[UNIFORM_LIGHT_VIEW_PROJ].apply(world_pos);
            }
        }
        clip
    }
}

/// Lighting terms shared by the lit variants
struct Lighting {
    normal: Vector,
    light: Vector,
    diffuse: f32,
}

fn lighting(ctx: &ShaderContext, v: &RasterVertex, w: f32) -> Lighting {
    let normal_world = ctx.transform.world_inv.transpose();
    let normal = normal_world.apply((v.normal * w).normalize()).normalize();
    let light = ctx.uniforms.vectors[UNIFORM_LIGHT_DIRECTION].normalize();
    Lighting {
        normal,
        light,
        diffuse: light.dot(normal),
    }
}

/// `tex * factor * energy` for each channel
fn modulate(tex: Color, factor: f32, energy: Vector) -> [f32; 3] {
    [
        tex.r as f32 * factor * energy.x,
        tex.g as f32 * factor * energy.y,
        tex.b as f32 * factor * energy.z,
    ]
}

fn opaque(rgb: [f32; 3]) -> Color {
    Color::clamped(rgb[0] as i32, rgb[1] as i32, rgb[2] as i32, 255)
}

impl FragmentShader {
    /// Shade one fragment, returning a pixel packed in the context format
    pub fn shade(self, ctx: &ShaderContext, v: &RasterVertex) -> u32 {
        let w = 1.0 / v.rhw;
        let (u, tv) = (v.tc.u * w, v.tc.v * w);

        let color = match self {
            FragmentShader::Color => {
                let ch = |c: f32| (c * w * 255.0) as i32;
                Color::clamped(ch(v.color.r), ch(v.color.g), ch(v.color.b), 255)
            }
            FragmentShader::Texture => {
                let tex = ctx.sample(TEXTURE_UNIT_DIFFUSE, u, tv);
                Color::new(tex.r, tex.g, tex.b)
            }
            FragmentShader::TextureAlpha => {
                let tex = ctx.sample(TEXTURE_UNIT_DIFFUSE, u, tv);
                Color::with_alpha(tex.r, tex.g, tex.b, TEXTURE_ALPHA)
            }
            FragmentShader::LambertTexture => lambert(ctx, v, w, u, tv),
            FragmentShader::PhongTexture | FragmentShader::BlinnTexture => {
                specular(ctx, v, w, u, tv, self == FragmentShader::BlinnTexture)
            }
            FragmentShader::ShadowDepth => {
                let level = (w / FAR_PLANE * 255.0) as i32;
                Color::clamped(level, level, level, 255)
            }
            FragmentShader::ShadowLambertTexture => {
                let lit = lambert(ctx, v, w, u, tv);
                if in_shadow(ctx, v, w) {
                    let dim = |c: u8| (c as f32 * SHADOW_FACTOR) as i32;
                    Color::clamped(dim(lit.r), dim(lit.g), dim(lit.b), 255)
                } else {
                    lit
                }
            }
        };
        color.pack(ctx.format)
    }
}

fn lambert(ctx: &ShaderContext, v: &RasterVertex, w: f32, u: f32, tv: f32) -> Color {
    let l = lighting(ctx, v, w);
    if l.diffuse < 0.001 {
        return Color::BLACK;
    }
    let tex = ctx.sample(TEXTURE_UNIT_DIFFUSE, u, tv);
    opaque(modulate(tex, l.diffuse, ctx.uniforms.vectors[UNIFORM_LIGHT_ENERGY]))
}

fn specular(ctx: &ShaderContext, v: &RasterVertex, w: f32, u: f32, tv: f32, blinn: bool) -> Color {
    let l = lighting(ctx, v, w);
    if l.diffuse < 0.001 {
        return Color::BLACK;
    }
    let tex = ctx.sample(TEXTURE_UNIT_DIFFUSE, u, tv);
    let energy = ctx.uniforms.vectors[UNIFORM_LIGHT_ENERGY];
    let material = ctx.uniforms.vectors[UNIFORM_MATERIAL];
    let (kd, ks, kq) = (material.x, material.y, material.z);

    let eye_view = (v.vs_result[VS_EYE_VIEW] * w).normalize();
    let spec = if blinn {
        let half = (l.light + eye_view).normalize();
        l.normal.dot(half)
    } else {
        let reflect = (l.normal.scale(2.0 * l.diffuse) - l.light).normalize();
        eye_view.dot(reflect)
    };

    let diffuse = modulate(tex, l.diffuse, energy);
    if spec < 0.0 {
        return opaque(diffuse.map(|c| c * kd));
    }
    let highlight = modulate(tex, spec.powf(kq), energy);
    opaque([
        diffuse[0] * kd + highlight[0] * ks,
        diffuse[1] * kd + highlight[1] * ks,
        diffuse[2] * kd + highlight[2] * ks,
    ])
}

/// Project the receiver into the shadow map and compare depths. Texels hold
/// rhw as seen from the light; 0 means nothing was drawn there.
fn in_shadow(ctx: &ShaderContext, v: &RasterVertex, w: f32) -> bool {
    let lp = v.vs_result[VS_LIGHT_POS] * w;
    if lp.w <= 0.0 {
        return false;
    }
    let su = (lp.x / lp.w + 1.0) * 0.5;
    let sv = (1.0 - lp.y / lp.w) * 0.5;
    let stored = ctx.texture(TEXTURE_UNIT_SHADOW).read_float(su, sv);
    stored > 0.0 && 1.0 / stored + SHADOW_BIAS < lp.w
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::device::Device;
    use crate::rasterizer::types::ColorF;

    #[test]
    fn test_program_table() {
        assert_eq!(RenderMode::Wireframe.program().fragment, None);
        for mode in RenderMode::ALL.into_iter().skip(1) {
            assert!(mode.program().fragment.is_some(), "{:?}", mode);
        }
        assert_eq!(RenderMode::PhongLightTexture.program().vertex, VertexShader::MvpEyeView);
        assert_eq!(RenderMode::ShadowLambertTexture.program().vertex, VertexShader::MvpLightSpace);
    }

    fn lit_device() -> Device<'static> {
        let mut device = Device::new(4, 4, None, PixelFormat::Rgba8888);
        let diffuse = device.gen_texture().unwrap();
        device.set_texture(&[0xffffffff; 4], 2, 2, 2, diffuse).unwrap();
        device.bind_texture(TEXTURE_UNIT_DIFFUSE, diffuse).unwrap();
        device.set_uniform_vector(UNIFORM_LIGHT_ENERGY, Vector::direction(1.0, 1.0, 1.0));
        device.set_uniform_vector(UNIFORM_LIGHT_DIRECTION, Vector::direction(0.0, 0.0, 1.0));
        device
    }

    fn facing(nz: f32) -> RasterVertex {
        RasterVertex {
            normal: Vector::direction(0.0, 0.0, nz),
            rhw: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_color_fragment() {
        let mut device = Device::new(4, 4, None, PixelFormat::Rgba8888);
        let (ctx, _) = device.raster_parts();
        let v = RasterVertex {
            color: ColorF::new(0.5, 0.25, 0.0),
            rhw: 0.5,
            ..Default::default()
        };
        let c = Color::unpack(FragmentShader::Color.shade(&ctx, &v), ctx.format);
        assert_eq!(c, Color::new(255, 127, 0));
    }

    #[test]
    fn test_lambert_back_lit_is_black() {
        let mut device = lit_device();
        let (ctx, _) = device.raster_parts();
        let front = FragmentShader::LambertTexture.shade(&ctx, &facing(1.0));
        assert_eq!(Color::unpack(front, ctx.format), Color::WHITE);
        let back = FragmentShader::LambertTexture.shade(&ctx, &facing(-1.0));
        assert_eq!(Color::unpack(back, ctx.format), Color::BLACK);
    }

    #[test]
    fn test_shadow_depth_encodes_distance() {
        let mut device = Device::new(4, 4, None, PixelFormat::Rgba8888);
        let (ctx, _) = device.raster_parts();
        let v = RasterVertex { rhw: 1.0 / 250.0, ..Default::default() };
        let c = Color::unpack(FragmentShader::ShadowDepth.shade(&ctx, &v), ctx.format);
        assert_eq!(c.r, 127);
        assert_eq!(c.a, 255);
    }

    #[test]
    fn test_shadow_receiver() {
        let mut device = lit_device();
        let shadow = device.gen_texture().unwrap();
        device.set_texture(&[0.5f32.to_bits(); 4], 2, 2, 2, shadow).unwrap();
        device.bind_texture(TEXTURE_UNIT_SHADOW, shadow).unwrap();
        let (ctx, _) = device.raster_parts();

        let mut occluded = facing(1.0);
        occluded.vs_result[VS_LIGHT_POS] = Vector::new(0.0, 0.0, 1.0, 4.0);
        let c = Color::unpack(FragmentShader::ShadowLambertTexture.shade(&ctx, &occluded), ctx.format);
        assert_eq!(c, Color::gray(127));

        let mut nearest = facing(1.0);
        nearest.vs_result[VS_LIGHT_POS] = Vector::new(0.0, 0.0, 1.0, 2.0);
        let c = Color::unpack(FragmentShader::ShadowLambertTexture.shade(&ctx, &nearest), ctx.format);
        assert_eq!(c, Color::WHITE);
    }

    #[test]
    fn test_phong_highlight_brightens() {
        let mut device = lit_device();
        device.set_uniform_vector(UNIFORM_MATERIAL, Vector::direction(0.5, 1.0, 1.0));
        let (ctx, _) = device.raster_parts();

        let mut v = facing(1.0);
        v.vs_result[VS_EYE_VIEW] = Vector::direction(0.0, 0.0, 1.0);
        for shader in [FragmentShader::PhongTexture, FragmentShader::BlinnTexture] {
            let c = Color::unpack(shader.shade(&ctx, &v), ctx.format);
            assert_eq!(c, Color::WHITE, "{:?}", shader);
        }

        v.vs_result[VS_EYE_VIEW] = Vector::direction(0.0, 1.0, -1.0);
        let c = Color::unpack(FragmentShader::PhongTexture.shade(&ctx, &v), ctx.format);
        assert_eq!(c, Color::gray(127));
    }

    #[test]
    fn test_translucent_texture_alpha() {
        let mut device = lit_device();
        let (ctx, _) = device.raster_parts();
        let c = Color::unpack(FragmentShader::TextureAlpha.shade(&ctx, &facing(1.0)), ctx.format);
        assert_eq!(c.a, TEXTURE_ALPHA);
    }
}
