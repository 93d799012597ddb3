//! Render device: render targets, texture slots, uniforms and pipeline state
//!
//! The device is an explicit context object. Every draw call takes it by
//! reference; there is no global instance.
//!
//! Drawing goes to exactly one target at a time:
//! - a bound offscreen framebuffer, if one is bound
//! - otherwise the supersample target, while 2x2 anti-aliasing is on
//! - otherwise the primary target
//!
//! Offscreen framebuffers and textures live in fixed pools allocated up front.
//! A slot is either in use or free; there is no reference counting.

use std::ops::{Deref, DerefMut};

use super::error::DeviceError;
use super::math::{cmid, Matrix, Vector};
use super::shader::ShaderContext;
use super::transform::Transform;
use super::types::{BlendState, ClearMode, Color, FuncState, PixelFormat, RenderMode};
use super::{
    MAX_BUFFER_HEIGHT, MAX_BUFFER_WIDTH, MAX_FRAMEBUFFER_NUM, MAX_TEXTURE_NUM, MAX_TEXTURE_SIZE,
    MAX_TEXTURE_UNITS, MAX_UNIFORM_NUM,
};

/// Handle to an offscreen framebuffer slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub usize);

/// Handle to a texture slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// Color plane storage: owned by the device, or a caller-owned slice that
/// must outlive the device
enum ColorStore<'fb> {
    Owned(Vec<u32>),
    External(&'fb mut [u32]),
}

impl Deref for ColorStore<'_> {
    type Target = [u32];
    fn deref(&self) -> &[u32] {
        match self {
            ColorStore::Owned(v) => v,
            ColorStore::External(s) => s,
        }
    }
}

impl DerefMut for ColorStore<'_> {
    fn deref_mut(&mut self) -> &mut [u32] {
        match self {
            ColorStore::Owned(v) => v,
            ColorStore::External(s) => s,
        }
    }
}

/// A color + depth buffer pair, row-major, top row first
pub struct RenderTarget<'fb> {
    width: usize,
    height: usize,
    color: ColorStore<'fb>,
    depth: Vec<f32>,
}

impl RenderTarget<'static> {
    fn owned(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            color: ColorStore::Owned(vec![0; width * height]),
            depth: vec![0.0; width * height],
        }
    }
}

impl<'fb> RenderTarget<'fb> {
    fn external(pixels: &'fb mut [u32], width: usize, height: usize) -> Self {
        assert!(
            pixels.len() >= width * height,
            "external framebuffer holds {} pixels, {}x{} needed",
            pixels.len(),
            width,
            height
        );
        Self {
            width,
            height,
            color: ColorStore::External(pixels),
            depth: vec![0.0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Color plane, `width * height` packed pixels
    pub fn color(&self) -> &[u32] {
        &self.color[..self.width * self.height]
    }

    /// Depth plane holding rhw; 0 means nothing drawn
    pub fn depth(&self) -> &[f32] {
        &self.depth
    }

    fn resize(&mut self, width: usize, height: usize) {
        if let ColorStore::Owned(v) = &mut self.color {
            v.resize(width * height, 0);
            self.depth.resize(width * height, 0.0);
            self.width = width;
            self.height = height;
        }
    }

    fn clear(&mut self, mode: ClearMode, background: Color, format: PixelFormat) {
        let (width, height) = (self.width, self.height);
        let bg = background.pack(format);
        for (y, row) in self.color[..width * height].chunks_exact_mut(width).enumerate() {
            let cc = match mode {
                ClearMode::Background => bg,
                ClearMode::Gradient => {
                    let level = if height > 1 { (height - 1 - y) * 230 / (height - 1) } else { 230 };
                    Color::gray(level as u8).pack(format)
                }
            };
            row.fill(cc);
        }
        self.depth.fill(0.0);
    }

    pub(crate) fn view_mut(&mut self) -> TargetView<'_> {
        let len = self.width * self.height;
        TargetView {
            width: self.width,
            height: self.height,
            color: &mut self.color[..len],
            depth: &mut self.depth[..len],
        }
    }
}

/// Mutable window onto whichever target is currently drawn to
pub struct TargetView<'a> {
    pub width: usize,
    pub height: usize,
    pub color: &'a mut [u32],
    pub depth: &'a mut [f32],
}

impl TargetView<'_> {
    /// Write a pixel, ignoring coordinates outside the target
    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.color[y as usize * self.width + x as usize] = color;
        }
    }
}

struct FramebufferSlot {
    target: RenderTarget<'static>,
    is_used: bool,
}

/// Texture slot. Texels are packed in the device pixel format, or hold raw
/// `f32` bits for depth textures.
#[derive(Debug, Clone)]
pub struct Texture {
    width: usize,
    height: usize,
    max_u: f32,
    max_v: f32,
    texels: Vec<u32>,
    is_used: bool,
}

impl Texture {
    fn placeholder() -> Self {
        Self {
            width: 2,
            height: 2,
            max_u: 1.0,
            max_v: 1.0,
            texels: vec![0; 4],
            is_used: false,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Nearest-neighbor sample with clamp-to-edge addressing
    pub fn read(&self, u: f32, v: f32) -> u32 {
        let x = (u * self.max_u + 0.5) as i32;
        let y = (v * self.max_v + 0.5) as i32;
        let x = cmid(x, 0, self.width as i32 - 1) as usize;
        let y = cmid(y, 0, self.height as i32 - 1) as usize;
        self.texels[y * self.width + x]
    }

    /// Sample and reinterpret the texel bits as a float
    pub fn read_float(&self, u: f32, v: f32) -> f32 {
        f32::from_bits(self.read(u, v))
    }
}

/// Shader constant registers
#[derive(Debug, Clone)]
pub struct Uniforms {
    pub vectors: [Vector; MAX_UNIFORM_NUM],
    pub matrices: [Matrix; MAX_UNIFORM_NUM],
}

impl Default for Uniforms {
    fn default() -> Self {
        Self {
            vectors: [Vector::ZERO; MAX_UNIFORM_NUM],
            matrices: [Matrix::identity(); MAX_UNIFORM_NUM],
        }
    }
}

/// Software render device
pub struct Device<'fb> {
    pub transform: Transform,
    /// Current drawing resolution (doubled while supersampling)
    width: usize,
    height: usize,
    native_width: usize,
    native_height: usize,
    format: PixelFormat,
    primary: RenderTarget<'fb>,
    supersample: Option<RenderTarget<'static>>,
    framebuffers: Vec<FramebufferSlot>,
    bound_framebuffer: Option<usize>,
    textures: Vec<Texture>,
    texture_units: [usize; MAX_TEXTURE_UNITS],
    uniforms: Uniforms,
    pub blend_state: BlendState,
    render_mode: RenderMode,
    function_state: FuncState,
    /// Flat clear color
    pub background: Color,
    /// Wireframe line color
    pub foreground: Color,
}

impl<'fb> Device<'fb> {
    /// Create a device drawing into `framebuffer` when given, otherwise into
    /// a buffer it allocates. Zero dimensions or a short external buffer are
    /// programming errors and panic.
    pub fn new(width: usize, height: usize, framebuffer: Option<&'fb mut [u32]>, format: PixelFormat) -> Self {
        assert!(width > 0 && height > 0, "device dimensions must be non-zero");

        let primary = match framebuffer {
            Some(pixels) => RenderTarget::external(pixels, width, height),
            None => RenderTarget::owned(width, height),
        };

        let framebuffers = (0..MAX_FRAMEBUFFER_NUM)
            .map(|_| FramebufferSlot {
                target: RenderTarget::owned(width, height),
                is_used: false,
            })
            .collect();

        let textures = (0..MAX_TEXTURE_NUM).map(|_| Texture::placeholder()).collect();

        log::info!("device created: {}x{} {:?}", width, height, format);

        Self {
            transform: Transform::new(width, height),
            width,
            height,
            native_width: width,
            native_height: height,
            format,
            primary,
            supersample: None,
            framebuffers,
            bound_framebuffer: None,
            textures,
            texture_units: [0; MAX_TEXTURE_UNITS],
            uniforms: Uniforms::default(),
            blend_state: BlendState::default(),
            render_mode: RenderMode::ShadowMap,
            function_state: FuncState::empty(),
            background: Color::with_alpha(0xc0, 0xc0, 0xc0, 0xff),
            foreground: Color::BLACK,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    // ---------------------------------------------------------------- state

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        if mode != self.render_mode {
            log::debug!("render mode -> {}", mode.label());
        }
        self.render_mode = mode;
    }

    /// Select a mode by its raw register value
    pub fn set_render_mode_bits(&mut self, bits: u32) -> Result<(), DeviceError> {
        let mode = RenderMode::from_bits(bits).ok_or(DeviceError::UnknownRenderMode(bits))?;
        self.set_render_mode(mode);
        Ok(())
    }

    pub fn function_state(&self) -> FuncState {
        self.function_state
    }

    pub fn is_enabled(&self, state: FuncState) -> bool {
        self.function_state.contains(state)
    }

    /// Turn on optional features. Enabling anti-aliasing doubles the drawing
    /// resolution and fails if that would exceed the maximum buffer size.
    pub fn enable_render_func_state(&mut self, state: FuncState) -> Result<(), DeviceError> {
        if state.contains(FuncState::ANTI_ALIAS_FSAA) && !self.is_enabled(FuncState::ANTI_ALIAS_FSAA) {
            let (w, h) = (self.native_width * 2, self.native_height * 2);
            if w > MAX_BUFFER_WIDTH || h > MAX_BUFFER_HEIGHT {
                log::warn!("cannot supersample at {}x{}", w, h);
                return Err(DeviceError::SupersampleTooLarge { width: w, height: h });
            }
            self.supersample = Some(RenderTarget::owned(w, h));
            self.apply_resolution(w, h);
            log::info!("2x2 supersampling on ({}x{})", w, h);
        }
        self.function_state |= state;
        Ok(())
    }

    pub fn disable_render_func_state(&mut self, state: FuncState) {
        if state.contains(FuncState::ANTI_ALIAS_FSAA) && self.is_enabled(FuncState::ANTI_ALIAS_FSAA) {
            self.supersample = None;
            self.apply_resolution(self.native_width, self.native_height);
            log::info!("2x2 supersampling off");
        }
        self.function_state.remove(state);
    }

    fn apply_resolution(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        for slot in self.framebuffers.iter_mut() {
            slot.target.resize(width, height);
        }
        self.transform.resize(width, height);
    }

    pub fn set_blend_state(&mut self, blend_state: BlendState) {
        self.blend_state = blend_state;
    }

    pub fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }

    pub fn set_uniform_vector(&mut self, slot: usize, value: Vector) {
        match self.uniforms.vectors.get_mut(slot) {
            Some(v) => *v = value,
            None => log::warn!("uniform vector slot {} out of range", slot),
        }
    }

    pub fn set_uniform_matrix(&mut self, slot: usize, value: Matrix) {
        match self.uniforms.matrices.get_mut(slot) {
            Some(m) => *m = value,
            None => log::warn!("uniform matrix slot {} out of range", slot),
        }
    }

    // -------------------------------------------------------------- targets

    /// Clear the default target (primary, or supersample while enabled)
    pub fn clear(&mut self, mode: ClearMode) {
        let (background, format) = (self.background, self.format);
        match &mut self.supersample {
            Some(ss) => ss.clear(mode, background, format),
            None => self.primary.clear(mode, background, format),
        }
    }

    /// The primary target, as presented
    pub fn primary(&self) -> &RenderTarget<'fb> {
        &self.primary
    }

    /// Whichever target draws currently land in
    pub fn active_target(&self) -> &RenderTarget<'fb> {
        if let Some(id) = self.bound_framebuffer {
            return &self.framebuffers[id].target;
        }
        match &self.supersample {
            Some(ss) => ss,
            None => &self.primary,
        }
    }

    /// Split the device into read-only shading state and the active target
    pub(crate) fn raster_parts(&mut self) -> (ShaderContext<'_>, TargetView<'_>) {
        let target = match self.bound_framebuffer {
            Some(id) => self.framebuffers[id].target.view_mut(),
            None => match &mut self.supersample {
                Some(ss) => ss.view_mut(),
                None => self.primary.view_mut(),
            },
        };
        let ctx = ShaderContext {
            transform: &self.transform,
            uniforms: &self.uniforms,
            textures: &self.textures,
            texture_units: &self.texture_units,
            format: self.format,
            blend_state: self.blend_state,
        };
        (ctx, target)
    }

    /// Box-filter the supersample target into the primary target. No-op while
    /// anti-aliasing is off.
    pub fn resolve_supersample(&mut self) {
        if let Some(ss) = &self.supersample {
            let (w, h) = (self.primary.width, self.primary.height);
            downsample_2x2(ss.color(), ss.width, &mut self.primary.color[..w * h], w, h, self.format);
        }
    }

    /// Copy the primary color plane out
    pub fn copy_colorbuffer(&self, dst: &mut [u32]) -> Result<(), DeviceError> {
        copy_plane(self.primary.color(), dst)
    }

    // --------------------------------------------------------- framebuffers

    /// Claim the first free offscreen framebuffer
    pub fn gen_framebuffer(&mut self) -> Result<FramebufferId, DeviceError> {
        match self.framebuffers.iter_mut().position(|slot| !slot.is_used) {
            Some(i) => {
                self.framebuffers[i].is_used = true;
                Ok(FramebufferId(i))
            }
            None => {
                log::warn!("framebuffer pool exhausted ({} slots)", MAX_FRAMEBUFFER_NUM);
                Err(DeviceError::FramebufferPoolExhausted)
            }
        }
    }

    /// Release a framebuffer slot, unbinding it first if needed
    pub fn delete_framebuffer(&mut self, id: FramebufferId) -> Result<(), DeviceError> {
        self.check_framebuffer(id)?;
        if self.bound_framebuffer == Some(id.0) {
            self.bound_framebuffer = None;
        }
        self.framebuffers[id.0].is_used = false;
        Ok(())
    }

    fn check_framebuffer(&self, id: FramebufferId) -> Result<(), DeviceError> {
        match self.framebuffers.get(id.0) {
            Some(slot) if slot.is_used => Ok(()),
            _ => {
                log::warn!("rejected framebuffer handle {}", id.0);
                Err(DeviceError::InvalidFramebuffer(id.0))
            }
        }
    }

    pub fn bind_framebuffer(&mut self, id: FramebufferId) -> Result<(), DeviceError> {
        self.check_framebuffer(id)?;
        self.bound_framebuffer = Some(id.0);
        Ok(())
    }

    /// Return drawing to the default target. There is no bind stack.
    pub fn unbind_framebuffer(&mut self, id: FramebufferId) -> Result<(), DeviceError> {
        self.check_framebuffer(id)?;
        self.bound_framebuffer = None;
        Ok(())
    }

    pub fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.bound_framebuffer.map(FramebufferId)
    }

    pub fn framebuffer(&self, id: FramebufferId) -> Result<&RenderTarget<'static>, DeviceError> {
        self.check_framebuffer(id)?;
        Ok(&self.framebuffers[id.0].target)
    }

    pub fn clear_framebuffer(&mut self, id: FramebufferId, mode: ClearMode) -> Result<(), DeviceError> {
        self.check_framebuffer(id)?;
        let (background, format) = (self.background, self.format);
        self.framebuffers[id.0].target.clear(mode, background, format);
        Ok(())
    }

    pub fn copy_framebuffer(&self, id: FramebufferId, dst: &mut [u32]) -> Result<(), DeviceError> {
        self.check_framebuffer(id)?;
        copy_plane(self.framebuffers[id.0].target.color(), dst)
    }

    pub fn copy_framebuffer_z(&self, id: FramebufferId, dst: &mut [f32]) -> Result<(), DeviceError> {
        self.check_framebuffer(id)?;
        copy_plane(self.framebuffers[id.0].target.depth(), dst)
    }

    // ------------------------------------------------------------- textures

    /// Claim the first free texture slot
    pub fn gen_texture(&mut self) -> Result<TextureId, DeviceError> {
        match self.textures.iter_mut().position(|t| !t.is_used) {
            Some(i) => {
                self.textures[i].is_used = true;
                Ok(TextureId(i))
            }
            None => {
                log::warn!("texture pool exhausted ({} slots)", MAX_TEXTURE_NUM);
                Err(DeviceError::TexturePoolExhausted)
            }
        }
    }

    pub fn delete_texture(&mut self, id: TextureId) -> Result<(), DeviceError> {
        self.check_texture(id)?;
        self.textures[id.0] = Texture::placeholder();
        Ok(())
    }

    fn check_texture(&self, id: TextureId) -> Result<(), DeviceError> {
        match self.textures.get(id.0) {
            Some(t) if t.is_used => Ok(()),
            _ => {
                log::warn!("rejected texture handle {}", id.0);
                Err(DeviceError::InvalidTexture(id.0))
            }
        }
    }

    /// Load texels into a generated slot. `pitch` is the distance between
    /// rows of `bits`, in texels. Textures above 1024x1024 are a programming
    /// error and panic.
    pub fn set_texture(
        &mut self,
        bits: &[u32],
        pitch: usize,
        width: usize,
        height: usize,
        id: TextureId,
    ) -> Result<(), DeviceError> {
        assert!(
            width > 0 && height > 0 && width <= MAX_TEXTURE_SIZE && height <= MAX_TEXTURE_SIZE,
            "texture size {}x{} outside 1..={}",
            width,
            height,
            MAX_TEXTURE_SIZE
        );
        assert!(pitch >= width, "texture pitch {} shorter than width {}", pitch, width);
        self.check_texture(id)?;

        let needed = pitch * (height - 1) + width;
        if bits.len() < needed {
            return Err(DeviceError::BufferTooSmall { needed, got: bits.len() });
        }

        let texture = &mut self.textures[id.0];
        texture.texels.clear();
        for row in 0..height {
            texture.texels.extend_from_slice(&bits[row * pitch..row * pitch + width]);
        }
        texture.width = width;
        texture.height = height;
        texture.max_u = (width - 1) as f32;
        texture.max_v = (height - 1) as f32;
        Ok(())
    }

    /// Point texture unit `unit` at texture `id`
    pub fn bind_texture(&mut self, unit: usize, id: TextureId) -> Result<(), DeviceError> {
        self.check_texture(id)?;
        let slot = self
            .texture_units
            .get_mut(unit)
            .ok_or(DeviceError::InvalidTextureUnit(unit))?;
        *slot = id.0;
        Ok(())
    }

    pub fn texture(&self, id: TextureId) -> Result<&Texture, DeviceError> {
        self.check_texture(id)?;
        Ok(&self.textures[id.0])
    }

    pub fn texture_read(&self, u: f32, v: f32, id: TextureId) -> Result<u32, DeviceError> {
        Ok(self.texture(id)?.read(u, v))
    }

    pub fn texture_read_float(&self, u: f32, v: f32, id: TextureId) -> Result<f32, DeviceError> {
        Ok(self.texture(id)?.read_float(u, v))
    }
}

fn copy_plane<T: Copy>(src: &[T], dst: &mut [T]) -> Result<(), DeviceError> {
    if dst.len() < src.len() {
        return Err(DeviceError::BufferTooSmall { needed: src.len(), got: dst.len() });
    }
    dst[..src.len()].copy_from_slice(src);
    Ok(())
}

/// Resolve a 2x supersampled image: each destination pixel is the average of
/// its 2x2 source block, every channel quartered then summed and clamped
pub fn downsample_2x2(
    src: &[u32],
    src_width: usize,
    dst: &mut [u32],
    dst_width: usize,
    dst_height: usize,
    format: PixelFormat,
) {
    for y in 0..dst_height {
        for x in 0..dst_width {
            let (sx, sy) = (x * 2, y * 2);
            let block = [
                src[sy * src_width + sx],
                src[sy * src_width + sx + 1],
                src[(sy + 1) * src_width + sx],
                src[(sy + 1) * src_width + sx + 1],
            ];
            let (mut r, mut g, mut b, mut a) = (0i32, 0i32, 0i32, 0i32);
            for texel in block {
                let c = Color::unpack(texel, format);
                r += c.r as i32 / 4;
                g += c.g as i32 / 4;
                b += c.b as i32 / 4;
                a += c.a as i32 / 4;
            }
            dst[y * dst_width + x] = Color::clamped(r, g, b, a).pack(format);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framebuffer_pool() {
        let mut device = Device::new(8, 8, None, PixelFormat::Rgba8888);
        let mut ids = Vec::new();
        for _ in 0..MAX_FRAMEBUFFER_NUM {
            ids.push(device.gen_framebuffer().unwrap());
        }
        assert_eq!(device.gen_framebuffer(), Err(DeviceError::FramebufferPoolExhausted));

        device.delete_framebuffer(ids[1]).unwrap();
        assert_eq!(device.gen_framebuffer(), Ok(ids[1]));
    }

    #[test]
    fn test_bind_unbind_validation() {
        let mut device = Device::new(8, 8, None, PixelFormat::Rgba8888);
        assert_eq!(
            device.bind_framebuffer(FramebufferId(0)),
            Err(DeviceError::InvalidFramebuffer(0))
        );
        assert_eq!(
            device.unbind_framebuffer(FramebufferId(MAX_FRAMEBUFFER_NUM)),
            Err(DeviceError::InvalidFramebuffer(MAX_FRAMEBUFFER_NUM))
        );

        let id = device.gen_framebuffer().unwrap();
        device.bind_framebuffer(id).unwrap();
        assert_eq!(device.bound_framebuffer(), Some(id));
        device.unbind_framebuffer(id).unwrap();
        assert_eq!(device.bound_framebuffer(), None);
    }

    #[test]
    fn test_clear_modes() {
        let mut device = Device::new(4, 3, None, PixelFormat::Rgba8888);
        device.clear(ClearMode::Background);
        assert!(device.primary().color().iter().all(|&p| p == 0xc0c0c0ff));
        assert!(device.primary().depth().iter().all(|&z| z == 0.0));

        device.clear(ClearMode::Gradient);
        let color = device.primary().color();
        assert_eq!(Color::unpack(color[0], PixelFormat::Rgba8888), Color::gray(230));
        assert_eq!(Color::unpack(color[4 * 2], PixelFormat::Rgba8888), Color::gray(0));
    }

    #[test]
    fn test_external_primary_buffer() {
        let mut pixels = vec![0u32; 16];
        {
            let mut device = Device::new(4, 4, Some(&mut pixels), PixelFormat::Xrgb8888);
            device.clear(ClearMode::Background);
        }
        assert!(pixels.iter().all(|&p| p == 0x00c0c0c0));
    }

    #[test]
    fn test_texture_clamp_addressing() {
        let mut device = Device::new(4, 4, None, PixelFormat::Rgba8888);
        let id = device.gen_texture().unwrap();
        let texels = [1u32, 2, 3, 4];
        device.set_texture(&texels, 2, 2, 2, id).unwrap();

        let edge = device.texture_read(1.0, 0.0, id).unwrap();
        assert_eq!(edge, 2);
        assert_eq!(device.texture_read(1.5, 0.0, id).unwrap(), edge);
        assert_eq!(device.texture_read(-0.7, 1.0, id).unwrap(), 3);
        assert_eq!(device.texture_read(4.0, 9.0, id).unwrap(), 4);
    }

    #[test]
    fn test_texture_pitch_and_float() {
        let mut device = Device::new(4, 4, None, PixelFormat::Rgba8888);
        let id = device.gen_texture().unwrap();
        // Two rows of two texels with one padding texel per row
        let bits = [0.25f32.to_bits(), 0.5f32.to_bits(), 99, 0.75f32.to_bits(), 1.0f32.to_bits()];
        device.set_texture(&bits, 3, 2, 2, id).unwrap();
        assert_eq!(device.texture_read_float(0.0, 1.0, id).unwrap(), 0.75);
        assert_eq!(device.texture_read_float(1.0, 0.0, id).unwrap(), 0.5);
    }

    #[test]
    fn test_texture_handles() {
        let mut device = Device::new(4, 4, None, PixelFormat::Rgba8888);
        assert_eq!(device.texture_read(0.0, 0.0, TextureId(0)), Err(DeviceError::InvalidTexture(0)));
        let id = device.gen_texture().unwrap();
        assert_eq!(device.bind_texture(MAX_TEXTURE_UNITS, id), Err(DeviceError::InvalidTextureUnit(MAX_TEXTURE_UNITS)));
        device.bind_texture(1, id).unwrap();
        for _ in 1..MAX_TEXTURE_NUM {
            device.gen_texture().unwrap();
        }
        assert_eq!(device.gen_texture(), Err(DeviceError::TexturePoolExhausted));
        device.delete_texture(id).unwrap();
        assert_eq!(device.gen_texture(), Ok(id));
    }

    #[test]
    #[should_panic]
    fn test_oversized_texture_panics() {
        let mut device = Device::new(4, 4, None, PixelFormat::Rgba8888);
        let id = device.gen_texture().unwrap();
        let bits = vec![0u32; 1025];
        let _ = device.set_texture(&bits, 1025, 1025, 1, id);
    }

    #[test]
    fn test_copy_framebuffer_planes() {
        let mut device = Device::new(3, 2, None, PixelFormat::Rgba8888);
        let id = device.gen_framebuffer().unwrap();
        device.clear_framebuffer(id, ClearMode::Background).unwrap();

        let mut color = vec![0u32; 6];
        device.copy_framebuffer(id, &mut color).unwrap();
        assert!(color.iter().all(|&p| p == 0xc0c0c0ff));

        let mut depth = vec![1.0f32; 6];
        device.copy_framebuffer_z(id, &mut depth).unwrap();
        assert!(depth.iter().all(|&z| z == 0.0));

        let mut short = vec![0f32; 5];
        assert_eq!(
            device.copy_framebuffer_z(id, &mut short),
            Err(DeviceError::BufferTooSmall { needed: 6, got: 5 })
        );
    }

    #[test]
    fn test_copy_colorbuffer_snapshots_primary() {
        let mut device = Device::new(4, 2, None, PixelFormat::Xrgb8888);
        device.clear(ClearMode::Gradient);

        let mut snapshot = vec![0u32; 8];
        device.copy_colorbuffer(&mut snapshot).unwrap();
        assert_eq!(snapshot, device.primary().color());
        assert_eq!(snapshot[0], 0x00e6e6e6);
        assert_eq!(snapshot[7], 0);

        let mut short = vec![0u32; 7];
        assert_eq!(
            device.copy_colorbuffer(&mut short),
            Err(DeviceError::BufferTooSmall { needed: 8, got: 7 })
        );
    }

    #[test_log::test]
    fn test_supersample_toggle() {
        let mut device = Device::new(16, 8, None, PixelFormat::Rgba8888);
        device.enable_render_func_state(FuncState::ANTI_ALIAS_FSAA).unwrap();
        assert_eq!((device.width(), device.height()), (32, 16));
        assert_eq!(device.transform.w, 32.0);
        assert_eq!(device.active_target().width(), 32);

        let id = device.gen_framebuffer().unwrap();
        assert_eq!(device.framebuffer(id).unwrap().width(), 32);

        device.disable_render_func_state(FuncState::ANTI_ALIAS_FSAA);
        assert_eq!((device.width(), device.height()), (16, 8));
        assert_eq!(device.framebuffer(id).unwrap().height(), 8);
        assert!(!device.is_enabled(FuncState::ANTI_ALIAS_FSAA));
    }

    #[test_log::test]
    fn test_supersample_too_large() {
        let mut device = Device::new(MAX_BUFFER_WIDTH, 4, None, PixelFormat::Rgba8888);
        let err = device.enable_render_func_state(FuncState::ANTI_ALIAS_FSAA);
        assert_eq!(
            err,
            Err(DeviceError::SupersampleTooLarge { width: MAX_BUFFER_WIDTH * 2, height: 8 })
        );
        assert_eq!(device.width(), MAX_BUFFER_WIDTH);
        assert!(!device.is_enabled(FuncState::ANTI_ALIAS_FSAA));
    }

    #[test]
    fn test_downsample_averages_block() {
        let f = PixelFormat::Rgba8888;
        let src = [
            Color::with_alpha(200, 0, 40, 255).pack(f),
            Color::with_alpha(200, 0, 40, 255).pack(f),
            Color::with_alpha(0, 100, 40, 255).pack(f),
            Color::with_alpha(0, 100, 40, 255).pack(f),
        ];
        let mut dst = [0u32; 1];
        downsample_2x2(&src, 2, &mut dst, 1, 1, f);
        let c = Color::unpack(dst[0], f);
        assert_eq!((c.r, c.g, c.b), (100, 50, 40));
        assert_eq!(c.a, 252);
    }

    #[test]
    fn test_resolve_supersample_into_primary() {
        let mut device = Device::new(2, 2, None, PixelFormat::Rgba8888);
        device.enable_render_func_state(FuncState::ANTI_ALIAS_FSAA).unwrap();
        device.clear(ClearMode::Background);
        device.resolve_supersample();
        let expected = Color::clamped(0xc0, 0xc0, 0xc0, 0xff / 4 * 4).pack(PixelFormat::Rgba8888);
        assert!(device.primary().color().iter().all(|&p| p == expected));
    }

    #[test]
    fn test_render_mode_bits_rejected() {
        let mut device = Device::new(2, 2, None, PixelFormat::Rgba8888);
        assert_eq!(device.set_render_mode_bits(3), Err(DeviceError::UnknownRenderMode(3)));
        device.set_render_mode_bits(4).unwrap();
        assert_eq!(device.render_mode(), RenderMode::Color);
    }
}
