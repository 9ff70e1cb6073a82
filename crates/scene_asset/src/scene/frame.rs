//! Transform frame hierarchy
//!
//! A [`Frame`] is a named node with a local transform, at most one mesh and an
//! ordered list of child frames it owns. Traversals visit a frame's own mesh
//! first and then its children in list order.

use crate::error::{SceneError, SceneResult};
use crate::foundation::math::Mat4;
use crate::geometry::VertexFormat;
use crate::render::{GraphicsDevice, TransformState};
use crate::scene::Mesh;

/// Case-insensitive name comparison used by frame and mesh lookups
pub fn names_match(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Scene graph node
#[derive(Debug)]
pub struct Frame {
    name: String,
    local_transform: Mat4,
    mesh: Option<Mesh>,
    children: Vec<Frame>,
}

impl Frame {
    /// Create an empty frame with an identity transform
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local_transform: Mat4::identity(),
            mesh: None,
            children: Vec::new(),
        }
    }

    /// Frame name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transform relative to the parent frame
    pub fn local_transform(&self) -> &Mat4 {
        &self.local_transform
    }

    /// Replace the local transform
    pub fn set_local_transform(&mut self, transform: Mat4) {
        self.local_transform = transform;
    }

    /// Mesh owned by this frame
    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    /// Mutable access to the owned mesh
    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        self.mesh.as_mut()
    }

    /// Attach a mesh; a frame holds at most one
    pub fn set_mesh(&mut self, mesh: Mesh) -> SceneResult<()> {
        if self.mesh.is_some() {
            return Err(SceneError::DuplicateMesh {
                frame: self.name.clone(),
                mesh: mesh.name().to_string(),
            });
        }
        self.mesh = Some(mesh);
        Ok(())
    }

    /// Child frames, most recently added first
    pub fn children(&self) -> &[Frame] {
        &self.children
    }

    /// Add a child frame at the front of the child list
    pub fn add_child(&mut self, child: Frame) {
        self.children.insert(0, child);
    }

    /// Visit every mesh in the subtree, own mesh first, then children in order
    pub fn for_each_mesh<F: FnMut(&Mesh)>(&self, mut visitor: F) {
        self.visit_meshes(&mut visitor);
    }

    fn visit_meshes(&self, visitor: &mut dyn FnMut(&Mesh)) {
        if let Some(mesh) = &self.mesh {
            visitor(mesh);
        }
        for child in &self.children {
            child.visit_meshes(visitor);
        }
    }

    /// Mutable form of [`for_each_mesh`](Self::for_each_mesh)
    pub fn for_each_mesh_mut<F: FnMut(&mut Mesh)>(&mut self, mut visitor: F) {
        self.visit_meshes_mut(&mut visitor);
    }

    fn visit_meshes_mut(&mut self, visitor: &mut dyn FnMut(&mut Mesh)) {
        if let Some(mesh) = &mut self.mesh {
            visitor(mesh);
        }
        for child in &mut self.children {
            child.visit_meshes_mut(visitor);
        }
    }

    /// Number of meshes in the subtree
    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.for_each_mesh(|_| count += 1);
        count
    }

    /// Number of frames in the subtree, this one included
    pub fn frame_count(&self) -> usize {
        1 + self.children.iter().map(Frame::frame_count).sum::<usize>()
    }

    /// First mesh in traversal order whose name matches, ignoring case
    pub fn find_mesh(&self, name: &str) -> Option<&Mesh> {
        if let Some(mesh) = self.mesh.as_ref().filter(|mesh| names_match(mesh.name(), name)) {
            return Some(mesh);
        }
        self.children.iter().find_map(|child| child.find_mesh(name))
    }

    /// Mutable form of [`find_mesh`](Self::find_mesh)
    pub fn find_mesh_mut(&mut self, name: &str) -> Option<&mut Mesh> {
        if self.mesh.as_ref().is_some_and(|mesh| names_match(mesh.name(), name)) {
            return self.mesh.as_mut();
        }
        self.children.iter_mut().find_map(|child| child.find_mesh_mut(name))
    }

    /// First frame in traversal order whose name matches, ignoring case
    pub fn find_frame(&self, name: &str) -> Option<&Frame> {
        if names_match(&self.name, name) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_frame(name))
    }

    /// Mutable form of [`find_frame`](Self::find_frame)
    pub fn find_frame_mut(&mut self, name: &str) -> Option<&mut Frame> {
        if names_match(&self.name, name) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_frame_mut(name))
    }

    /// Restore device copies of every mesh in the subtree
    ///
    /// Stops at the first failure. Meshes restored before it keep their new
    /// copies; calling this again is safe.
    pub fn restore_device_objects(&mut self, device: &mut dyn GraphicsDevice) -> SceneResult<()> {
        if let Some(mesh) = &mut self.mesh {
            mesh.restore_device_objects(device)?;
        }
        for child in &mut self.children {
            child.restore_device_objects(device)?;
        }
        Ok(())
    }

    /// Release device copies of every mesh in the subtree
    pub fn invalidate_device_objects(&mut self) {
        self.for_each_mesh_mut(Mesh::invalidate_device_objects);
    }

    /// Convert every mesh in the subtree to another vertex layout
    pub fn set_vertex_format(&mut self, device: &mut dyn GraphicsDevice, format: VertexFormat) -> SceneResult<()> {
        if let Some(mesh) = &mut self.mesh {
            mesh.set_vertex_format(device, format)?;
        }
        for child in &mut self.children {
            child.set_vertex_format(device, format)?;
        }
        Ok(())
    }

    /// Enable or disable material binding for every mesh in the subtree
    pub fn set_use_materials(&mut self, use_materials: bool) {
        self.for_each_mesh_mut(|mesh| mesh.set_use_materials(use_materials));
    }

    /// Render the subtree
    ///
    /// The frame's world transform is `inherited * local`, where `inherited`
    /// defaults to the device's world transform on entry. The entry transform
    /// is put back before returning, whether rendering succeeded or not.
    pub fn render(
        &self,
        device: &mut dyn GraphicsDevice,
        draw_opaque: bool,
        draw_alpha: bool,
        inherited: Option<&Mat4>,
    ) -> SceneResult<()> {
        let saved = device.transform(TransformState::World);
        let world = inherited.unwrap_or(&saved) * self.local_transform;

        device.set_transform(TransformState::World, &world);
        let result = self.render_contents(device, draw_opaque, draw_alpha, &world);
        device.set_transform(TransformState::World, &saved);
        result
    }

    fn render_contents(
        &self,
        device: &mut dyn GraphicsDevice,
        draw_opaque: bool,
        draw_alpha: bool,
        world: &Mat4,
    ) -> SceneResult<()> {
        if let Some(mesh) = &self.mesh {
            mesh.render(device, draw_opaque, draw_alpha)?;
        }
        for child in &self.children {
            child.render(device, draw_opaque, draw_alpha, Some(world))?;
        }
        Ok(())
    }

    /// Release the subtree: meshes first, then children
    pub fn destroy(&mut self) {
        if let Some(mesh) = &mut self.mesh {
            mesh.destroy();
        }
        self.mesh = None;
        for child in &mut self.children {
            child.destroy();
        }
        self.children.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{mat4_from_file_layout, translation_of, Vec3};
    use crate::render::RecordingDevice;
    use crate::scene::test_support::{empty_resolver, quads, translation};
    use approx::assert_relative_eq;

    fn mesh(device: &mut RecordingDevice, name: &str) -> Mesh {
        Mesh::create(device, name, &quads(&[1.0]), &empty_resolver()).unwrap()
    }

    fn frame_with_mesh(device: &mut RecordingDevice, name: &str, mesh_name: &str) -> Frame {
        let mut frame = Frame::new(name);
        frame.set_mesh(mesh(device, mesh_name)).unwrap();
        frame
    }

    #[test]
    fn test_add_child_prepends() {
        let mut parent = Frame::new("parent");
        parent.add_child(Frame::new("a"));
        parent.add_child(Frame::new("b"));
        parent.add_child(Frame::new("c"));

        let names: Vec<&str> = parent.children().iter().map(Frame::name).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
        assert_eq!(parent.frame_count(), 4);
    }

    #[test]
    fn test_second_mesh_is_rejected() {
        let mut device = RecordingDevice::new();
        let mut frame = frame_with_mesh(&mut device, "ship", "hull");

        let result = frame.set_mesh(mesh(&mut device, "wing"));
        assert!(matches!(result, Err(SceneError::DuplicateMesh { frame, mesh }) if frame == "ship" && mesh == "wing"));
        assert_eq!(frame.mesh().map(Mesh::name), Some("hull"));
    }

    #[test]
    fn test_traversal_visits_each_mesh_once_in_preorder() {
        let mut device = RecordingDevice::new();
        let mut root = frame_with_mesh(&mut device, "root", "root_mesh");
        let mut left = frame_with_mesh(&mut device, "left", "left_mesh");
        left.add_child(frame_with_mesh(&mut device, "leaf", "leaf_mesh"));
        root.add_child(frame_with_mesh(&mut device, "right", "right_mesh"));
        root.add_child(left);
        root.add_child(Frame::new("empty"));

        let mut visited = Vec::new();
        root.for_each_mesh(|mesh| visited.push(mesh.name().to_string()));
        assert_eq!(visited, vec!["root_mesh", "left_mesh", "leaf_mesh", "right_mesh"]);
        assert_eq!(root.mesh_count(), 4);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut device = RecordingDevice::new();
        let mut root = Frame::new("Root");
        root.add_child(frame_with_mesh(&mut device, "Turret", "Barrel"));

        assert_eq!(root.find_frame("TURRET").map(Frame::name), Some("Turret"));
        assert_eq!(root.find_mesh("barrel").map(Mesh::name), Some("Barrel"));
        assert!(root.find_frame("tower").is_none());

        root.find_mesh_mut("BARREL").unwrap().set_use_materials(false);
        assert!(!root.find_mesh("Barrel").unwrap().use_materials());
        root.find_frame_mut("turret").unwrap().set_local_transform(Mat4::identity() * 2.0);
    }

    #[test]
    fn test_world_transform_composition() {
        let mut device = RecordingDevice::new();
        let mut parent = Frame::new("parent");
        parent.set_local_transform(mat4_from_file_layout(&translation(0.0, 2.0, 0.0)));
        let mut child = frame_with_mesh(&mut device, "child", "child_mesh");
        child.set_local_transform(mat4_from_file_layout(&translation(1.0, 0.0, 0.0)));
        parent.add_child(child);
        parent.restore_device_objects(&mut device).unwrap();

        parent.render(&mut device, true, false, None).unwrap();
        let draws = device.draws();
        assert_eq!(draws.len(), 1);
        assert_relative_eq!(translation_of(&draws[0].world), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_render_restores_entry_transform() {
        let mut device = RecordingDevice::new();
        let entry = Mat4::new_translation(&Vec3::new(5.0, 0.0, 0.0));
        device.set_transform(TransformState::World, &entry);

        let mut parent = frame_with_mesh(&mut device, "parent", "restored");
        parent.set_local_transform(mat4_from_file_layout(&translation(0.0, 1.0, 0.0)));
        parent.restore_device_objects(&mut device).unwrap();

        parent.render(&mut device, true, false, None).unwrap();
        assert_relative_eq!(translation_of(&device.draws()[0].world), Vec3::new(5.0, 1.0, 0.0));
        assert_eq!(device.transform(TransformState::World), entry);

        // A child that was never restored fails the render
        parent.add_child(frame_with_mesh(&mut device, "child", "never_restored"));
        let result = parent.render(&mut device, true, false, None);
        assert!(matches!(result, Err(SceneError::NotRestored(name)) if name == "never_restored"));
        assert_eq!(device.transform(TransformState::World), entry);
    }

    #[test]
    fn test_restore_and_invalidate_cascade() {
        let mut device = RecordingDevice::new();
        let mut root = frame_with_mesh(&mut device, "root", "a");
        root.add_child(frame_with_mesh(&mut device, "child", "b"));

        root.restore_device_objects(&mut device).unwrap();
        assert_eq!(device.live_mesh_count(), 2);
        root.invalidate_device_objects();
        assert_eq!(device.live_mesh_count(), 0);

        root.restore_device_objects(&mut device).unwrap();
        root.destroy();
        assert_eq!(device.live_mesh_count(), 0);
        assert!(root.children().is_empty());
        assert!(root.mesh().is_none());
    }
}
