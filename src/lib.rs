//! mini3d: a small software 3D renderer
//!
//! The `rasterizer` module is the whole pipeline and has no platform
//! dependencies. `app` drives it frame by frame from abstract input
//! commands; the binary supplies the window and the blit.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod app;
pub mod config;
pub mod logging;
pub mod rasterizer;
pub mod texture_file;
