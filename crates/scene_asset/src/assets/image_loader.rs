//! Texture image decoding
//!
//! Decodes texture files referenced by scene materials into RGBA8 pixels ready
//! for [`GraphicsDevice::create_texture`](crate::render::GraphicsDevice::create_texture).

use std::path::Path;

use crate::error::{SceneError, SceneResult};

/// Decoded texture pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// RGBA pixel data, row by row
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Number of color channels, always 4
    pub channels: u8,
}

impl ImageData {
    /// Decode an image file
    pub fn from_file<P: AsRef<Path>>(path: P) -> SceneResult<Self> {
        let path = path.as_ref();
        log::debug!("Decoding texture {:?}", path);

        let image = image::open(path)
            .map_err(|e| SceneError::Texture(format!("{}: {}", path.display(), e)))?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();

        log::debug!("Decoded texture {}x{} from {:?}", width, height, path);
        Ok(Self {
            data: rgba.into_raw(),
            width,
            height,
            channels: 4,
        })
    }

    /// Decode an image held in memory
    pub fn from_bytes(bytes: &[u8]) -> SceneResult<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| SceneError::Texture(format!("in-memory image: {}", e)))?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(Self {
            data: rgba.into_raw(),
            width,
            height,
            channels: 4,
        })
    }

    /// Single-color image
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;
        Self {
            data: color.repeat(pixel_count),
            width,
            height,
            channels: 4,
        }
    }

    /// Size of the pixel data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color_image() {
        let image = ImageData::solid_color(4, 2, [255, 0, 0, 128]);
        assert_eq!((image.width, image.height, image.channels), (4, 2, 4));
        assert_eq!(image.size_bytes(), 4 * 2 * 4);
        assert_eq!(&image.data[4..8], &[255, 0, 0, 128]);
    }

    #[test]
    fn test_decode_png_file() {
        let path = std::env::temp_dir().join(format!("scene_asset_decode_{}.png", std::process::id()));
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let decoded = ImageData::from_file(&path).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(&decoded.data[0..4], &[10, 20, 30, 255]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_undecodable_bytes() {
        let result = ImageData::from_bytes(b"not an image");
        assert!(matches!(result, Err(SceneError::Texture(_))));
    }
}
