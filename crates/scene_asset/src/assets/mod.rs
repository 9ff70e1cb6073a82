//! Asset lookup and decoding
//!
//! Scene files reference textures by filename. [`MediaResolver`] turns such a
//! filename into a path by walking the media search path, and [`ImageData`]
//! decodes the file into RGBA pixels for the device.

pub mod image_loader;
pub mod media;

pub use image_loader::ImageData;
pub use media::{process_media_root, MediaResolver, MEDIA_ROOT_ENV};

use crate::error::SceneResult;
use crate::render::{DeviceTexture, GraphicsDevice};

/// Resolve, decode and upload one texture
///
/// Fails with `MediaNotFound` when no search-path entry holds the file,
/// `Texture` when it cannot be decoded, and with the device's error when the
/// upload fails.
pub fn load_texture(
    device: &mut dyn GraphicsDevice,
    resolver: &MediaResolver,
    filename: &str,
) -> SceneResult<Box<dyn DeviceTexture>> {
    let path = resolver.find(filename)?;
    let image = ImageData::from_file(&path)?;
    Ok(device.create_texture(filename, &image)?)
}
