//! Software rasterization pipeline
//!
//! - Row-vector math (`y = x * M`), left-handed projection
//! - Near-plane clipping in clip space
//! - Perspective-correct trapezoid/scanline fill
//! - rhw depth buffer, larger is nearer
//! - Built-in shader variants selected by render mode
//! - Offscreen framebuffers for shadow maps, optional 2x2 supersampling

mod blend;
mod camera;
mod device;
mod error;
mod geometry;
mod math;
pub mod mesh;
mod render;
mod shader;
mod transform;
mod types;

pub use blend::*;
pub use camera::*;
pub use device::*;
pub use error::*;
pub use geometry::*;
pub use math::*;
pub use render::*;
pub use shader::*;
pub use transform::*;
pub use types::*;

/// Default window edge in pixels
pub const WINDOW_SIZE: usize = 512;

pub const MAX_TEXTURE_NUM: usize = 16;
pub const MAX_TEXTURE_UNITS: usize = 4;
pub const MAX_TEXTURE_SIZE: usize = 1024;
pub const MAX_FRAMEBUFFER_NUM: usize = 4;
pub const MAX_UNIFORM_NUM: usize = 16;

/// Largest drawing resolution, supersampled targets included
pub const MAX_BUFFER_WIDTH: usize = 2048;
pub const MAX_BUFFER_HEIGHT: usize = 2048;
