//! Load, restore, render and reset a scene through the public API

use scene_asset::format::ron_reader;
use scene_asset::foundation::math::{translation_of, Vec3};
use scene_asset::prelude::*;
use scene_asset::render::{DeviceCommand, DeviceError};

use approx::assert_relative_eq;
use std::path::PathBuf;

const FLEET: &str = r#"
Scene(nodes: [
    Frame(name: "Carrier", children: [
        Matrix([1.0, 0.0, 0.0, 0.0,  0.0, 1.0, 0.0, 0.0,  0.0, 0.0, 1.0, 0.0,  0.0, 2.0, 0.0, 1.0]),
        Mesh((
            name: "deck",
            positions: [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 1.0, 0.0), (0.0, 1.0, 0.0),
                        (2.0, 0.0, 0.0), (3.0, 0.0, 0.0), (3.0, 1.0, 0.0), (2.0, 1.0, 0.0)],
            tex_coords: Some([(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0),
                              (0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]),
            indices: [0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7],
            face_materials: [0, 0, 1, 1],
            materials: [
                (material: (diffuse: (0.8, 0.8, 0.8, 1.0)), texture: Some("deck.png")),
                (material: (diffuse: (0.3, 0.6, 1.0, 0.4)), texture: Some("missing_glass.png")),
            ],
            generate_adjacency: true,
        )),
        Frame(name: "Tower", children: [
            Matrix([1.0, 0.0, 0.0, 0.0,  0.0, 1.0, 0.0, 0.0,  0.0, 0.0, 1.0, 0.0,  1.0, 0.0, 0.0, 1.0]),
            Mesh((
                name: "radar",
                positions: [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)],
                indices: [0, 1, 2],
                generate_adjacency: true,
            )),
        ]),
    ]),
    Other(template: "AnimationSet", name: "idle"),
])
"#;

/// Directory holding the fleet scene and its deck texture
fn media_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("scene_asset_lifecycle_{}_{}", std::process::id(), name));
    std::fs::create_dir_all(&dir).unwrap();
    image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 200, 200, 255]))
        .save(dir.join("deck.png"))
        .unwrap();
    std::fs::write(dir.join("fleet.ron"), FLEET).unwrap();
    dir
}

#[test]
fn test_full_lifecycle() {
    let dir = media_dir("full");
    let resolver = MediaResolver::new(&dir);
    let config = AssetSearchConfig::default();
    let mut device = RecordingDevice::new();

    let mut scene = Scene::load_file(&mut device, "fleet.ron", &resolver, &config).unwrap();
    assert_eq!(scene.frame_count(), 2);
    assert_eq!(scene.mesh_count(), 2);

    let deck = scene.find_mesh("DECK").unwrap();
    assert!(deck.subsets()[0].texture().is_some());
    assert!(deck.subsets()[1].texture().is_none());
    assert_eq!(deck.texture_warnings().len(), 1);

    scene.restore_device_objects(&mut device).unwrap();
    assert_eq!(device.live_mesh_count(), 2);
    device.clear_commands();

    scene.render(&mut device, None).unwrap();
    let draws = device.draws();
    // deck opaque, radar opaque, then the translucent deck subset
    assert_eq!(draws.len(), 3);
    assert_eq!(draws[2].blend, BlendState::ALPHA);
    assert_eq!(draws[2].texture, None);
    assert_relative_eq!(translation_of(&draws[1].world), Vec3::new(1.0, 2.0, 0.0));

    // Device reset
    device.lose_device();
    assert!(matches!(scene.render(&mut device, None), Err(SceneError::DeviceLost)));
    scene.invalidate_device_objects();
    assert_eq!(device.live_mesh_count(), 0);
    device.reset();
    scene.restore_device_objects(&mut device).unwrap();
    device.clear_commands();
    scene.render(&mut device, None).unwrap();
    assert_eq!(device.draws().len(), 3);

    drop(scene);
    assert_eq!(device.live_mesh_count(), 0);
    assert_eq!(device.live_texture_count(), 0);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_vertex_format_change_after_restore() {
    let mut reader = ron_reader::parse_str(FLEET, &AssetSearchConfig::default()).unwrap();
    let resolver = MediaResolver::new(std::env::temp_dir().join("scene_asset_lifecycle_none"));
    let mut device = RecordingDevice::new();
    let mut scene = Scene::load(&mut device, &mut reader, &resolver, &AssetSearchConfig::default()).unwrap();
    scene.restore_device_objects(&mut device).unwrap();

    let format = VertexFormat::POSITION | VertexFormat::NORMAL | VertexFormat::TEX0;
    scene.set_vertex_format(&mut device, format).unwrap();
    scene.for_each_mesh(|mesh| assert_eq!(mesh.vertex_format(), Some(format)));
    assert_eq!(device.live_mesh_count(), 2);

    let uploads = device
        .commands()
        .iter()
        .filter(|command| matches!(command, DeviceCommand::CreateMesh { format: f, .. } if *f == format))
        .count();
    assert_eq!(uploads, 2);
}

#[test]
fn test_failed_sibling_yields_no_scene() {
    let source = r#"
        Scene(nodes: [
            Frame(name: "one"),
            Frame(name: "two"),
            Frame(name: "three", children: [Matrix([1.0, 2.0, 3.0])]),
            Frame(name: "four"),
            Frame(name: "five"),
        ])
    "#;
    assert!(matches!(ron_reader::parse_str(source, &AssetSearchConfig::default()), Err(SceneError::FormatCorrupt(_))));

    let mut nodes: Vec<FileNode> = ["one", "two", "three", "four", "five"]
        .iter()
        .map(|name| FileNode::frame(*name, Vec::new()))
        .collect();
    nodes[2].children.push(FileNode::mesh("bad", MeshPayload::default()));

    let mut device = RecordingDevice::new();
    let resolver = MediaResolver::new(std::env::temp_dir());
    let result = Scene::load(
        &mut device,
        &mut MemoryReader::new(nodes),
        &resolver,
        &AssetSearchConfig::default(),
    );
    assert!(matches!(result, Err(SceneError::GeometryLoad { mesh, .. }) if mesh == "bad"));
}

#[test]
fn test_device_error_reaches_caller() {
    let mut reader = ron_reader::parse_str(FLEET, &AssetSearchConfig::default()).unwrap();
    let resolver = MediaResolver::new(std::env::temp_dir().join("scene_asset_lifecycle_none"));
    let mut device = RecordingDevice::new();
    let mut scene = Scene::load(&mut device, &mut reader, &resolver, &AssetSearchConfig::default()).unwrap();

    device.fail_next_mesh_creations(1);
    let error = scene.restore_device_objects(&mut device).unwrap_err();
    assert!(matches!(error, SceneError::OutOfMemory));
    assert_eq!(SceneError::from(DeviceError::DeviceLost).to_string(), "Graphics device lost");

    // Retrying after the failure restores everything
    scene.restore_device_objects(&mut device).unwrap();
    assert_eq!(device.live_mesh_count(), 2);
}

fn frame_chain(depth: usize) -> String {
    let mut source = String::from("Scene(nodes: [");
    for level in 0..depth {
        source.push_str(&format!("Frame(name: \"level{}\", children: [", level));
    }
    source.push_str("Mesh((name: \"tip\", positions: [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)], indices: [0, 1, 2], generate_adjacency: true)),");
    for _ in 0..depth {
        source.push_str("]),");
    }
    source.push_str("])");
    source
}

#[test]
fn test_deep_ron_scene_hits_loader_limit() {
    let resolver = MediaResolver::new(std::env::temp_dir().join("scene_asset_lifecycle_none"));
    let mut device = RecordingDevice::new();
    let config = AssetSearchConfig {
        max_nesting_depth: 36,
        ..Default::default()
    };

    let mut reader = ron_reader::parse_str(&frame_chain(36), &config).unwrap();
    let scene = Scene::load(&mut device, &mut reader, &resolver, &config).unwrap();
    assert_eq!(scene.frame_count(), 36);
    assert!(scene.find_frame("level35").and_then(Frame::mesh).is_some());

    let mut reader = ron_reader::parse_str(&frame_chain(37), &config).unwrap();
    let result = Scene::load(&mut device, &mut reader, &resolver, &config);
    assert!(matches!(
        result,
        Err(SceneError::NestingTooDeep { node, limit: 36 }) if node == "level36"
    ));
}
