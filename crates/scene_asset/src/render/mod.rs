//! Rendering abstractions
//!
//! The scene code never talks to a concrete graphics API. It consumes the
//! [`GraphicsDevice`] capability defined here; any backend that can upload a
//! mesh, create a texture, draw a subset and hold transform and blend state
//! can host a scene. [`RecordingDevice`] is a headless implementation that
//! records every command.

pub mod device;
pub mod material;
pub mod recording;

pub use device::{
    BlendFactor, BlendState, DeviceError, DeviceMesh, DeviceResult, DeviceTexture,
    GraphicsDevice, TransformState,
};
pub use material::Material;
pub use recording::{DeviceCommand, DrawCall, RecordingDevice};
