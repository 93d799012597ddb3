//! Core types for the rasterizer

use bitflags::bitflags;
use serde::{Serialize, Deserialize};

use super::math::{cmid, Vector};

/// Channel layout of a packed 32-bit pixel, fixed when the device is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// `0xRRGGBBAA`, used for texture-mapped presentation
    #[default]
    Rgba8888,
    /// `0x00RRGGBB`, GDI-style surfaces. Alpha is implied opaque.
    Xrgb8888,
}

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from integer channels, clamping each to [0, 255]
    pub fn clamped(r: i32, g: i32, b: i32, a: i32) -> Self {
        Self {
            r: cmid(r, 0, 255) as u8,
            g: cmid(g, 0, 255) as u8,
            b: cmid(b, 0, 255) as u8,
            a: cmid(a, 0, 255) as u8,
        }
    }

    pub fn gray(level: u8) -> Self {
        Self::new(level, level, level)
    }

    pub fn pack(self, format: PixelFormat) -> u32 {
        match format {
            PixelFormat::Rgba8888 => {
                ((self.r as u32) << 24) | ((self.g as u32) << 16) | ((self.b as u32) << 8) | (self.a as u32)
            }
            PixelFormat::Xrgb8888 => ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32),
        }
    }

    pub fn unpack(pixel: u32, format: PixelFormat) -> Self {
        match format {
            PixelFormat::Rgba8888 => Self {
                r: (pixel >> 24) as u8,
                g: (pixel >> 16) as u8,
                b: (pixel >> 8) as u8,
                a: pixel as u8,
            },
            PixelFormat::Xrgb8888 => Self {
                r: (pixel >> 16) as u8,
                g: (pixel >> 8) as u8,
                b: pixel as u8,
                a: 255,
            },
        }
    }

    /// Convert to [u8; 4] for presentation
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Floating-point vertex color, channels nominally in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorF {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ColorF {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// Texture coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TexCoord {
    pub u: f32,
    pub v: f32,
}

impl TexCoord {
    pub const fn new(u: f32, v: f32) -> Self {
        Self { u, v }
    }
}

/// Application-supplied vertex. Never mutated by the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub pos: Vector,
    pub tc: TexCoord,
    pub color: ColorF,
    pub normal: Vector,
}

impl Vertex {
    pub const fn new(pos: Vector, tc: TexCoord, color: ColorF, normal: Vector) -> Self {
        Self { pos, tc, color, normal }
    }
}

/// Built-in render modes. Raw values match the register encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderMode {
    Wireframe = 1,
    Texture = 2,
    Color = 4,
    LambertLightTexture = 8,
    PhongLightTexture = 16,
    TextureAlpha = 32,
    ShadowMap = 64,
    BlinnLightTexture = 128,
    ShadowLambertTexture = 256,
}

impl RenderMode {
    pub const ALL: [RenderMode; 9] = [
        RenderMode::Wireframe,
        RenderMode::Texture,
        RenderMode::Color,
        RenderMode::LambertLightTexture,
        RenderMode::PhongLightTexture,
        RenderMode::TextureAlpha,
        RenderMode::ShadowMap,
        RenderMode::BlinnLightTexture,
        RenderMode::ShadowLambertTexture,
    ];

    pub fn bits(self) -> u32 {
        self as u32
    }

    /// Decode a raw register value; unknown values yield `None`
    pub fn from_bits(bits: u32) -> Option<RenderMode> {
        RenderMode::ALL.iter().copied().find(|m| m.bits() == bits)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RenderMode::Wireframe => "Line Mode",
            RenderMode::Texture => "Texture Mode",
            RenderMode::Color => "Color Mode",
            RenderMode::LambertLightTexture => "Lambert Light Mode",
            RenderMode::PhongLightTexture => "Phong Light Mode",
            RenderMode::TextureAlpha => "Texture Alpha Mode",
            RenderMode::ShadowMap => "Shadow Map Mode",
            RenderMode::BlinnLightTexture => "Blinn Light Mode",
            RenderMode::ShadowLambertTexture => "Shadow Receive Mode",
        }
    }

    /// Next mode in `ALL`, wrapping around
    pub fn next(self) -> RenderMode {
        let i = RenderMode::ALL.iter().position(|m| *m == self).unwrap_or(0);
        RenderMode::ALL[(i + 1) % RenderMode::ALL.len()]
    }
}

bitflags! {
    /// Optional pipeline features
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FuncState: u32 {
        const CULL_BACK = 1 << 0;
        const ANTI_ALIAS_FSAA = 1 << 1;
    }
}

/// Blend factor applied to one side of the blend equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// `result = src * src_factor + dst * dst_factor`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlendState {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            src: BlendFactor::SrcAlpha,
            dst: BlendFactor::OneMinusSrcAlpha,
        }
    }
}

/// How to fill the color plane when clearing a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearMode {
    /// Flat device background color
    Background,
    /// Vertical gray ramp, darkest on the bottom row
    Gradient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_rgba() {
        let c = Color::with_alpha(0x12, 0x34, 0x56, 0x78);
        assert_eq!(c.pack(PixelFormat::Rgba8888), 0x12345678);
        assert_eq!(Color::unpack(0x12345678, PixelFormat::Rgba8888), c);
    }

    #[test]
    fn test_xrgb_drops_alpha() {
        let c = Color::with_alpha(0x12, 0x34, 0x56, 0x10);
        assert_eq!(c.pack(PixelFormat::Xrgb8888), 0x00123456);
        assert_eq!(Color::unpack(0x00123456, PixelFormat::Xrgb8888).a, 255);
    }

    #[test]
    fn test_render_mode_bits() {
        for mode in RenderMode::ALL {
            assert_eq!(RenderMode::from_bits(mode.bits()), Some(mode));
        }
        assert_eq!(RenderMode::from_bits(0), None);
        assert_eq!(RenderMode::from_bits(3), None);
        assert_eq!(RenderMode::ShadowLambertTexture.next(), RenderMode::Wireframe);
    }
}
