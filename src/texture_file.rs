//! Diffuse textures from image files

use std::path::Path;

use image::{DynamicImage, GenericImageView};
use thiserror::Error;

use crate::rasterizer::{Color, PixelFormat, MAX_TEXTURE_SIZE};

#[derive(Debug, Error)]
pub enum TextureFileError {
    #[error("failed to load {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image is {width}x{height}, textures must be between 1x1 and {max}x{max}")]
    TooLarge { width: u32, height: u32, max: usize },
}

/// Texels packed in a device pixel format, rows tightly packed
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: usize,
    pub height: usize,
    pub texels: Vec<u32>,
}

impl TextureImage {
    pub fn from_file<P: AsRef<Path>>(path: P, format: PixelFormat) -> Result<Self, TextureFileError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| TextureFileError::Load {
            path: path.display().to_string(),
            source,
        })?;
        let texture = Self::from_image(&img, format)?;
        log::info!("loaded texture {} ({}x{})", path.display(), texture.width, texture.height);
        Ok(texture)
    }

    pub fn from_bytes(bytes: &[u8], format: PixelFormat) -> Result<Self, TextureFileError> {
        let img = image::load_from_memory(bytes)?;
        Self::from_image(&img, format)
    }

    fn from_image(img: &DynamicImage, format: PixelFormat) -> Result<Self, TextureFileError> {
        let (width, height) = img.dimensions();
        let max = MAX_TEXTURE_SIZE as u32;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(TextureFileError::TooLarge {
                width,
                height,
                max: MAX_TEXTURE_SIZE,
            });
        }

        let texels = img
            .to_rgba8()
            .pixels()
            .map(|p| Color::with_alpha(p[0], p[1], p[2], p[3]).pack(format))
            .collect();

        Ok(Self {
            width: width as usize,
            height: height as usize,
            texels,
        })
    }
}
