//! Scene mesh with host and device geometry
//!
//! A [`Mesh`] keeps its geometry in system memory for its whole life and
//! derives a device-resident copy from it on demand. The device copy only
//! exists between [`Mesh::restore_device_objects`] and the next
//! [`Mesh::invalidate_device_objects`] or [`Mesh::destroy`]; callers drive
//! these transitions around device resets.
//!
//! A mesh is split into subsets, one per material. Each subset carries the
//! material and an optional texture, and rendering draws them in an opaque
//! and an alpha pass.

use crate::assets::{load_texture, MediaResolver};
use crate::error::{SceneError, SceneResult, TextureResolutionWarning};
use crate::format::MeshPayload;
use crate::geometry::{MeshGeometry, VertexFormat};
use crate::render::{DeviceMesh, DeviceTexture, GraphicsDevice, Material};

/// Material and texture of one subset
#[derive(Debug)]
pub struct Subset {
    material: Material,
    texture_filename: Option<String>,
    texture: Option<Box<dyn DeviceTexture>>,
}

impl Subset {
    /// Surface material
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Texture filename requested by the scene file
    pub fn texture_filename(&self) -> Option<&str> {
        self.texture_filename.as_deref()
    }

    /// Loaded texture; empty when the file could not be resolved
    pub fn texture(&self) -> Option<&dyn DeviceTexture> {
        self.texture.as_deref()
    }
}

/// Geometry attached to a frame
#[derive(Debug)]
pub struct Mesh {
    name: String,
    system_geometry: Option<MeshGeometry>,
    device_geometry: Option<Box<dyn DeviceMesh>>,
    subsets: Vec<Subset>,
    use_materials: bool,
    texture_warnings: Vec<TextureResolutionWarning>,
}

impl Mesh {
    /// Build a mesh from a scene-file payload
    ///
    /// Validates and optimizes the geometry (face adjacency is required) and
    /// loads the texture of every material through `resolver`. A texture that
    /// cannot be found or decoded leaves its subset untextured and is recorded
    /// as a [`TextureResolutionWarning`]. Loss of the device or of device
    /// memory while creating a texture still fails the call.
    ///
    /// The new mesh has no device copy; call
    /// [`restore_device_objects`](Self::restore_device_objects) before
    /// rendering it.
    pub fn create(
        device: &mut dyn GraphicsDevice,
        name: &str,
        payload: &MeshPayload,
        resolver: &MediaResolver,
    ) -> SceneResult<Self> {
        let materials = payload.effective_materials();
        let geometry_error = |source| SceneError::GeometryLoad {
            mesh: name.to_string(),
            source,
        };

        let mut geometry = MeshGeometry::from_payload(payload, materials.len()).map_err(geometry_error)?;
        geometry
            .optimize_in_place(payload.adjacency.as_deref())
            .map_err(geometry_error)?;

        let mut subsets = Vec::with_capacity(materials.len());
        let mut texture_warnings = Vec::new();
        for (index, desc) in materials.into_iter().enumerate() {
            let texture_filename = desc.texture_filename.filter(|filename| !filename.is_empty());
            let texture = match &texture_filename {
                Some(filename) => match load_texture(device, resolver, filename) {
                    Ok(texture) => Some(texture),
                    Err(error @ (SceneError::DeviceLost | SceneError::OutOfMemory)) => return Err(error),
                    Err(error) => {
                        let warning = TextureResolutionWarning {
                            mesh: name.to_string(),
                            subset: index,
                            filename: filename.clone(),
                            reason: error.to_string(),
                        };
                        log::warn!("{}", warning);
                        texture_warnings.push(warning);
                        None
                    }
                },
                None => None,
            };

            subsets.push(Subset {
                material: desc.material,
                texture_filename,
                texture,
            });
        }

        log::debug!(
            "Created mesh '{}': {} vertices, {} faces, {} subsets",
            name,
            geometry.vertex_count(),
            geometry.face_count(),
            subsets.len()
        );

        Ok(Self {
            name: name.to_string(),
            system_geometry: Some(geometry),
            device_geometry: None,
            subsets,
            use_materials: true,
            texture_warnings,
        })
    }

    /// Mesh name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of subsets
    pub fn subset_count(&self) -> usize {
        self.subsets.len()
    }

    /// Subsets in material order
    pub fn subsets(&self) -> &[Subset] {
        &self.subsets
    }

    /// Material of subset `index`
    pub fn material(&self, index: usize) -> Option<&Material> {
        self.subsets.get(index).map(Subset::material)
    }

    /// Host-resident geometry; `None` after [`destroy`](Self::destroy)
    pub fn geometry(&self) -> Option<&MeshGeometry> {
        self.system_geometry.as_ref()
    }

    /// Vertex layout of the host geometry
    pub fn vertex_format(&self) -> Option<VertexFormat> {
        self.system_geometry.as_ref().map(MeshGeometry::format)
    }

    /// Whether a device copy is present
    pub fn is_restored(&self) -> bool {
        self.device_geometry.is_some()
    }

    /// Whether rendering binds materials and separates translucent subsets
    pub fn use_materials(&self) -> bool {
        self.use_materials
    }

    /// Enable or disable material binding
    pub fn set_use_materials(&mut self, use_materials: bool) {
        self.use_materials = use_materials;
    }

    /// Textures that could not be loaded while the mesh was built
    pub fn texture_warnings(&self) -> &[TextureResolutionWarning] {
        &self.texture_warnings
    }

    /// Convert the mesh to another vertex layout
    ///
    /// Both the host geometry and, when present, the device copy are rebuilt
    /// in the new layout, with normals recomputed if the layout has them. If
    /// any step fails the mesh is left exactly as it was.
    pub fn set_vertex_format(&mut self, device: &mut dyn GraphicsDevice, format: VertexFormat) -> SceneResult<()> {
        let source = self
            .system_geometry
            .as_ref()
            .ok_or_else(|| SceneError::NoSourceGeometry(self.name.clone()))?;

        let mut system_clone = source.clone_with_format(format).map_err(|source| SceneError::GeometryLoad {
            mesh: self.name.clone(),
            source,
        })?;
        system_clone.compute_normals();

        let device_clone = match self.device_geometry {
            Some(_) => Some(device.create_mesh(&system_clone)?),
            None => None,
        };

        log::debug!("Mesh '{}' converted to vertex format {:?}", self.name, format);
        self.system_geometry = Some(system_clone);
        if device_clone.is_some() {
            self.device_geometry = device_clone;
        }
        Ok(())
    }

    /// Create the device copy from the host geometry
    ///
    /// Any existing device copy is released first, so calling this twice in a
    /// row leaves exactly one copy.
    pub fn restore_device_objects(&mut self, device: &mut dyn GraphicsDevice) -> SceneResult<()> {
        let geometry = self
            .system_geometry
            .as_ref()
            .ok_or_else(|| SceneError::NoSourceGeometry(self.name.clone()))?;

        self.device_geometry = None;
        self.device_geometry = Some(device.create_mesh(geometry)?);
        log::debug!("Restored mesh '{}'", self.name);
        Ok(())
    }

    /// Release the device copy, if any
    pub fn invalidate_device_objects(&mut self) {
        if self.device_geometry.take().is_some() {
            log::debug!("Invalidated mesh '{}'", self.name);
        }
    }

    /// Release every resource the mesh holds
    ///
    /// Safe to call more than once. Dropping the mesh releases the same
    /// resources.
    pub fn destroy(&mut self) {
        self.invalidate_device_objects();
        for subset in &mut self.subsets {
            subset.texture = None;
        }
        self.subsets.clear();
        self.system_geometry = None;
    }

    /// Draw the mesh with the device's current world transform
    ///
    /// With materials in use, the opaque pass draws subsets whose diffuse
    /// alpha is 1.0 or more and the alpha pass draws the rest, each after
    /// binding its material and texture. With materials off, the opaque pass
    /// draws every subset unbound and the alpha pass draws nothing.
    pub fn render(&self, device: &mut dyn GraphicsDevice, draw_opaque: bool, draw_alpha: bool) -> SceneResult<()> {
        let device_mesh = self
            .device_geometry
            .as_deref()
            .ok_or_else(|| SceneError::NotRestored(self.name.clone()))?;

        if draw_opaque {
            for (index, subset) in self.subsets.iter().enumerate() {
                if self.use_materials {
                    if subset.material.is_translucent() {
                        continue;
                    }
                    bind_subset(device, subset);
                }
                device.draw_subset(device_mesh, index as u32)?;
            }
        }

        if draw_alpha && self.use_materials {
            for (index, subset) in self.subsets.iter().enumerate() {
                if subset.material.is_translucent() {
                    bind_subset(device, subset);
                    device.draw_subset(device_mesh, index as u32)?;
                }
            }
        }

        Ok(())
    }
}

fn bind_subset(device: &mut dyn GraphicsDevice, subset: &Subset) {
    device.set_material(&subset.material);
    device.set_texture(0, subset.texture());
}
