//! Run configuration, stored as RON
//!
//! Every field has a default, so a config file only needs the values it
//! changes: `(width: 640, render_mode: PhongLightTexture)`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rasterizer::{
    PixelFormat, RenderMode, Vector, MAX_BUFFER_HEIGHT, MAX_BUFFER_WIDTH, WINDOW_SIZE,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("window size {width}x{height} must be between 1x1 and {max_width}x{max_height}")]
    InvalidSize {
        width: usize,
        height: usize,
        max_width: usize,
        max_height: usize,
    },
}

/// Directional light
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Direction towards the light
    pub direction: [f32; 3],
    /// Per-channel intensity
    pub energy: [f32; 3],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            direction: [1.0, 1.0, 1.0],
            energy: [1.0, 1.0, 1.0],
        }
    }
}

impl LightConfig {
    pub fn direction(&self) -> Vector {
        Vector::direction(self.direction[0], self.direction[1], self.direction[2])
    }

    pub fn energy(&self) -> Vector {
        Vector::direction(self.energy[0], self.energy[1], self.energy[2])
    }
}

/// Phong material coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    /// Diffuse weight
    pub kd: f32,
    /// Specular weight
    pub ks: f32,
    /// Specular exponent
    pub kq: f32,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self { kd: 1.0, ks: 2.0, kq: 1.0 }
    }
}

impl MaterialConfig {
    pub fn as_vector(&self) -> Vector {
        Vector::direction(self.kd, self.ks, self.kq)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    pub pixel_format: PixelFormat,
    pub render_mode: RenderMode,
    pub cull_back: bool,
    pub anti_alias: bool,
    /// Camera sits at (d, d, d)
    pub camera_distance: f32,
    pub light: LightConfig,
    pub material: MaterialConfig,
    /// Image replacing the checkerboard on the cube
    pub texture_path: Option<String>,
    /// `env_logger` filter; falls back to `RUST_LOG`
    pub log_filter: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: WINDOW_SIZE,
            height: WINDOW_SIZE,
            pixel_format: PixelFormat::Rgba8888,
            render_mode: RenderMode::Wireframe,
            cull_back: true,
            anti_alias: false,
            camera_distance: 5.0,
            light: LightConfig::default(),
            material: MaterialConfig::default(),
            texture_path: None,
            log_filter: None,
        }
    }
}

impl RenderConfig {
    fn validate(self) -> Result<Self, ConfigError> {
        if self.width == 0 || self.height == 0 || self.width > MAX_BUFFER_WIDTH || self.height > MAX_BUFFER_HEIGHT {
            return Err(ConfigError::InvalidSize {
                width: self.width,
                height: self.height,
                max_width: MAX_BUFFER_WIDTH,
                max_height: MAX_BUFFER_HEIGHT,
            });
        }
        Ok(self)
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RenderConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

pub fn load_config_from_str(s: &str) -> Result<RenderConfig, ConfigError> {
    let config: RenderConfig = ron::from_str(s)?;
    config.validate()
}

pub fn save_config<P: AsRef<Path>>(config: &RenderConfig, path: P) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new().indentor("  ".to_string());
    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}
