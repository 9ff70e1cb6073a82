//! Headless graphics device that records every command
//!
//! [`RecordingDevice`] implements [`GraphicsDevice`] without any GPU. It keeps
//! the transform and blend state a real device would, hands out mesh and
//! texture handles whose drop is counted, and can be put into a lost state to
//! exercise invalidate/restore cycles.

use std::any::Any;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::assets::ImageData;
use crate::foundation::math::Mat4;
use crate::geometry::{MeshGeometry, VertexFormat};
use crate::render::device::{
    BlendState, DeviceError, DeviceMesh, DeviceResult, DeviceTexture, GraphicsDevice,
    TransformState,
};
use crate::render::Material;

/// One recorded draw
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Identifier of the device mesh that was drawn
    pub mesh: u64,
    /// Subset index
    pub subset: u32,
    /// World transform active at draw time
    pub world: Mat4,
    /// Blend state active at draw time
    pub blend: BlendState,
    /// Diffuse alpha of the bound material, if one was bound since the last draw setup
    pub material_alpha: Option<f32>,
    /// Texture bound to stage 0
    pub texture: Option<String>,
}

/// Command issued against a [`RecordingDevice`]
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// A mesh was uploaded
    CreateMesh {
        /// Assigned identifier
        mesh: u64,
        /// Vertex count of the uploaded geometry
        vertices: usize,
        /// Face count of the uploaded geometry
        faces: usize,
        /// Vertex layout
        format: VertexFormat,
    },
    /// A texture was created
    CreateTexture {
        /// Texture name
        name: String,
    },
    /// A transform slot changed
    SetTransform(TransformState, Mat4),
    /// A material was bound
    SetMaterial(Material),
    /// A texture stage changed
    SetTexture {
        /// Stage index
        stage: u32,
        /// Name of the bound texture
        texture: Option<String>,
    },
    /// Blend state changed
    SetBlendState(BlendState),
    /// A subset was drawn
    Draw(DrawCall),
}

#[derive(Debug)]
struct RecordedMesh {
    id: u64,
    format: VertexFormat,
    subset_count: usize,
    live: Rc<Cell<usize>>,
}

impl DeviceMesh for RecordedMesh {
    fn vertex_format(&self) -> VertexFormat {
        self.format
    }

    fn subset_count(&self) -> usize {
        self.subset_count
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for RecordedMesh {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

#[derive(Debug)]
struct RecordedTexture {
    name: String,
    width: u32,
    height: u32,
    live: Rc<Cell<usize>>,
}

impl DeviceTexture for RecordedTexture {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for RecordedTexture {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

/// Graphics device that records commands instead of rendering
#[derive(Debug)]
pub struct RecordingDevice {
    commands: Vec<DeviceCommand>,
    transforms: HashMap<TransformState, Mat4>,
    blend: BlendState,
    bound_alpha: Option<f32>,
    bound_texture: Option<String>,
    next_id: u64,
    live_meshes: Rc<Cell<usize>>,
    live_textures: Rc<Cell<usize>>,
    failing_mesh_creations: usize,
    lost: bool,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDevice {
    /// Create a device with identity transforms and blending disabled
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            transforms: HashMap::new(),
            blend: BlendState::Disabled,
            bound_alpha: None,
            bound_texture: None,
            next_id: 1,
            live_meshes: Rc::new(Cell::new(0)),
            live_textures: Rc::new(Cell::new(0)),
            failing_mesh_creations: 0,
            lost: false,
        }
    }

    /// Put the device into the lost state: creation and draw calls fail with `DeviceLost`
    pub fn lose_device(&mut self) {
        log::info!("Recording device lost");
        self.lost = true;
    }

    /// Leave the lost state
    pub fn reset(&mut self) {
        log::info!("Recording device reset");
        self.lost = false;
    }

    /// Whether the device is currently lost
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// Make the next `count` mesh uploads fail with `OutOfMemory`
    pub fn fail_next_mesh_creations(&mut self, count: usize) {
        self.failing_mesh_creations = count;
    }

    /// Every command recorded so far
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Forget the recorded commands; device state is kept
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Recorded draws, in issue order
    pub fn draws(&self) -> Vec<&DrawCall> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DeviceCommand::Draw(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    /// Device meshes created and not yet dropped
    pub fn live_mesh_count(&self) -> usize {
        self.live_meshes.get()
    }

    /// Device textures created and not yet dropped
    pub fn live_texture_count(&self) -> usize {
        self.live_textures.get()
    }

    /// Current blend state
    pub fn blend_state(&self) -> BlendState {
        self.blend
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_mesh(&mut self, geometry: &MeshGeometry) -> DeviceResult<Box<dyn DeviceMesh>> {
        if self.lost {
            return Err(DeviceError::DeviceLost);
        }
        if self.failing_mesh_creations > 0 {
            self.failing_mesh_creations -= 1;
            return Err(DeviceError::OutOfMemory);
        }

        let id = self.allocate_id();
        self.commands.push(DeviceCommand::CreateMesh {
            mesh: id,
            vertices: geometry.vertex_count(),
            faces: geometry.face_count(),
            format: geometry.format(),
        });
        self.live_meshes.set(self.live_meshes.get() + 1);

        Ok(Box::new(RecordedMesh {
            id,
            format: geometry.format(),
            subset_count: geometry.subset_count(),
            live: Rc::clone(&self.live_meshes),
        }))
    }

    fn create_texture(&mut self, name: &str, image: &ImageData) -> DeviceResult<Box<dyn DeviceTexture>> {
        if self.lost {
            return Err(DeviceError::DeviceLost);
        }

        self.commands.push(DeviceCommand::CreateTexture { name: name.to_string() });
        self.live_textures.set(self.live_textures.get() + 1);

        Ok(Box::new(RecordedTexture {
            name: name.to_string(),
            width: image.width,
            height: image.height,
            live: Rc::clone(&self.live_textures),
        }))
    }

    fn transform(&self, state: TransformState) -> Mat4 {
        self.transforms.get(&state).copied().unwrap_or_else(Mat4::identity)
    }

    fn set_transform(&mut self, state: TransformState, matrix: &Mat4) {
        self.transforms.insert(state, *matrix);
        self.commands.push(DeviceCommand::SetTransform(state, *matrix));
    }

    fn set_material(&mut self, material: &Material) {
        self.bound_alpha = Some(material.alpha());
        self.commands.push(DeviceCommand::SetMaterial(*material));
    }

    fn set_texture(&mut self, stage: u32, texture: Option<&dyn DeviceTexture>) {
        let name = texture.map(|texture| texture.name().to_string());
        if stage == 0 {
            self.bound_texture.clone_from(&name);
        }
        self.commands.push(DeviceCommand::SetTexture { stage, texture: name });
    }

    fn set_blend_state(&mut self, state: BlendState) {
        self.blend = state;
        self.commands.push(DeviceCommand::SetBlendState(state));
    }

    fn draw_subset(&mut self, mesh: &dyn DeviceMesh, subset: u32) -> DeviceResult<()> {
        if self.lost {
            return Err(DeviceError::DeviceLost);
        }

        let recorded = mesh
            .as_any()
            .downcast_ref::<RecordedMesh>()
            .ok_or_else(|| DeviceError::InvalidCall("mesh was not created by this device".to_string()))?;
        if subset as usize >= recorded.subset_count {
            return Err(DeviceError::InvalidCall(format!(
                "subset {} out of range for mesh {} with {} subsets",
                subset, recorded.id, recorded.subset_count
            )));
        }

        log::trace!("Draw mesh {} subset {}", recorded.id, subset);
        let call = DrawCall {
            mesh: recorded.id,
            subset,
            world: self.transform(TransformState::World),
            blend: self.blend,
            material_alpha: self.bound_alpha.take(),
            texture: self.bound_texture.clone(),
        };
        self.commands.push(DeviceCommand::Draw(call));
        Ok(())
    }
}
