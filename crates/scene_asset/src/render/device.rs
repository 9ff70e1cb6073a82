//! Graphics device abstraction traits
//!
//! This module defines the traits a rendering backend must implement to host
//! a scene. Device resources are owned objects: dropping a
//! [`DeviceMesh`] or [`DeviceTexture`] releases it on the device.

use std::any::Any;
use std::fmt;

use thiserror::Error;

use crate::assets::ImageData;
use crate::foundation::math::Mat4;
use crate::geometry::{MeshGeometry, VertexFormat};
use crate::render::Material;

/// Errors reported by a graphics device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device was lost; resources must be invalidated and restored after a reset
    #[error("Device lost")]
    DeviceLost,

    /// The device ran out of memory
    #[error("Out of device memory")]
    OutOfMemory,

    /// The call was not valid for this device or resource
    #[error("Invalid call: {0}")]
    InvalidCall(String),

    /// Backend-specific failure
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Transform slot on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformState {
    /// Object-to-world transform
    World,
    /// World-to-view transform
    View,
    /// View-to-clip transform
    Projection,
}

/// Blend factor applied to source or destination color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// Factor of zero
    Zero,
    /// Factor of one
    One,
    /// Source alpha
    SourceAlpha,
    /// One minus source alpha
    InverseSourceAlpha,
}

/// Alpha blending render state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendState {
    /// Blending off
    #[default]
    Disabled,
    /// Blending on with the given factors
    Enabled {
        /// Factor for the incoming fragment
        source: BlendFactor,
        /// Factor for the stored color
        destination: BlendFactor,
    },
}

impl BlendState {
    /// Conventional alpha blending: source alpha over inverse source alpha
    pub const ALPHA: Self = Self::Enabled {
        source: BlendFactor::SourceAlpha,
        destination: BlendFactor::InverseSourceAlpha,
    };

    /// Whether blending is on
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }
}

/// Device-resident copy of a mesh
///
/// Created by [`GraphicsDevice::create_mesh`]; released when dropped.
pub trait DeviceMesh: fmt::Debug {
    /// Vertex layout the copy was created with
    fn vertex_format(&self) -> VertexFormat;

    /// Number of subsets that can be drawn
    fn subset_count(&self) -> usize;

    /// Downcast to the concrete backend type
    fn as_any(&self) -> &dyn Any;
}

/// Device-resident texture
///
/// Created by [`GraphicsDevice::create_texture`]; released when dropped.
pub trait DeviceTexture: fmt::Debug {
    /// Name the texture was created under, usually its filename
    fn name(&self) -> &str;

    /// Width and height in pixels
    fn dimensions(&self) -> (u32, u32);

    /// Downcast to the concrete backend type
    fn as_any(&self) -> &dyn Any;
}

/// Graphics device capability consumed by meshes, frames and scenes
///
/// All calls happen on the thread that owns the device. The device is never
/// asked to recreate resources on its own: after a reset the caller restores
/// every mesh explicitly.
pub trait GraphicsDevice {
    /// Clone host-resident geometry into device memory
    fn create_mesh(&mut self, geometry: &MeshGeometry) -> DeviceResult<Box<dyn DeviceMesh>>;

    /// Create a texture from decoded pixel data
    fn create_texture(&mut self, name: &str, image: &ImageData) -> DeviceResult<Box<dyn DeviceTexture>>;

    /// Currently active matrix of a transform slot
    fn transform(&self, state: TransformState) -> Mat4;

    /// Replace the matrix of a transform slot
    fn set_transform(&mut self, state: TransformState, matrix: &Mat4);

    /// Bind a material for subsequent draws
    fn set_material(&mut self, material: &Material);

    /// Bind a texture (or none) to a texture stage
    fn set_texture(&mut self, stage: u32, texture: Option<&dyn DeviceTexture>);

    /// Set the alpha blending state
    fn set_blend_state(&mut self, state: BlendState);

    /// Draw one subset of a device-resident mesh with the current state
    fn draw_subset(&mut self, mesh: &dyn DeviceMesh, subset: u32) -> DeviceResult<()>;
}
