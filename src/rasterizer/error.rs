use thiserror::Error;

/// Recoverable failures reported by the render device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("all offscreen framebuffer slots are in use")]
    FramebufferPoolExhausted,
    #[error("all texture slots are in use")]
    TexturePoolExhausted,
    #[error("framebuffer {0} is out of range or not allocated")]
    InvalidFramebuffer(usize),
    #[error("texture {0} is out of range or not allocated")]
    InvalidTexture(usize),
    #[error("texture unit {0} does not exist")]
    InvalidTextureUnit(usize),
    #[error("destination holds {got} elements, {needed} required")]
    BufferTooSmall { needed: usize, got: usize },
    #[error("supersampled target {width}x{height} exceeds the maximum buffer size")]
    SupersampleTooLarge { width: usize, height: usize },
    #[error("unknown render mode value {0}")]
    UnknownRenderMode(u32),
}
