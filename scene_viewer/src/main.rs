//! Scene viewer
//!
//! Loads a RON scene, renders a few frames through the recording device,
//! runs one device reset cycle and logs what was drawn.
//!
//! ```text
//! scene_viewer [scene.ron] [config.toml]
//! ```
//!
//! Both arguments default to the files under `scene_viewer/resources`.

use scene_asset::config::ConfigError;
use scene_asset::foundation::logging;
use scene_asset::prelude::*;
use scene_asset::render::DrawCall;
use thiserror::Error;

const DEFAULT_SCENE: &str = "scene_viewer/resources/scenes/demo.ron";
const DEFAULT_CONFIG: &str = "scene_viewer/resources/viewer.toml";
const FRAMES_PER_PHASE: u32 = 3;

#[derive(Error, Debug)]
enum ViewerError {
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Expected the device to report loss, but frame {0} rendered")]
    LossNotReported(u32),
}

struct ViewerApp {
    device: RecordingDevice,
    scene: Scene,
    frame_number: u32,
}

impl ViewerApp {
    fn new(scene_file: &str, config: &AssetSearchConfig) -> Result<Self, ViewerError> {
        let resolver = MediaResolver::from_environment(config)?;
        let mut device = RecordingDevice::new();

        let mut scene = Scene::load_file(&mut device, scene_file, &resolver, config)?;
        scene.restore_device_objects(&mut device)?;

        let mut warnings = 0;
        scene.for_each_mesh(|mesh| warnings += mesh.texture_warnings().len());
        log::info!(
            "Scene ready: {} frames, {} meshes, {} texture warnings",
            scene.frame_count(),
            scene.mesh_count(),
            warnings
        );

        Ok(Self {
            device,
            scene,
            frame_number: 0,
        })
    }

    fn render_frame(&mut self) -> SceneResult<()> {
        let angle = self.frame_number as f32 * 0.1;
        let world = Mat4::from_euler_angles(0.0, angle, 0.0);
        self.frame_number += 1;

        self.device.clear_commands();
        self.scene.render(&mut self.device, Some(&world))?;
        log_draws(self.frame_number, &self.device.draws());
        Ok(())
    }

    fn run(&mut self) -> Result<(), ViewerError> {
        for _ in 0..FRAMES_PER_PHASE {
            self.render_frame()?;
        }

        log::info!("Simulating device loss");
        self.device.lose_device();
        match self.render_frame() {
            Err(SceneError::DeviceLost) => log::info!("Render reported device loss"),
            Err(other) => return Err(other.into()),
            Ok(()) => return Err(ViewerError::LossNotReported(self.frame_number)),
        }

        self.scene.invalidate_device_objects();
        self.device.reset();
        self.scene.restore_device_objects(&mut self.device)?;

        for _ in 0..FRAMES_PER_PHASE {
            self.render_frame()?;
        }

        log::info!(
            "Rendered {} frames, {} live device meshes, {} live textures",
            self.frame_number,
            self.device.live_mesh_count(),
            self.device.live_texture_count()
        );
        Ok(())
    }
}

fn log_draws(frame: u32, draws: &[&DrawCall]) {
    let blended = draws.iter().filter(|call| call.blend.is_enabled()).count();
    log::info!(
        "Frame {}: {} draws ({} opaque, {} blended)",
        frame,
        draws.len(),
        draws.len() - blended,
        blended
    );
    for call in draws {
        log::debug!(
            "  mesh {} subset {} at {:?} texture {:?}",
            call.mesh,
            call.subset,
            scene_asset::foundation::math::translation_of(&call.world),
            call.texture
        );
    }
}

fn main() {
    logging::init("info");

    let mut args = std::env::args().skip(1);
    let scene_file = args.next().unwrap_or_else(|| DEFAULT_SCENE.to_string());
    let config_file = args.next().unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    let result = AssetSearchConfig::load_from_file(&config_file)
        .map_err(ViewerError::from)
        .and_then(|config| ViewerApp::new(&scene_file, &config))
        .and_then(|mut app| app.run());

    match result {
        Ok(()) => log::info!("Scene viewer finished"),
        Err(e) => {
            log::error!("Scene viewer failed: {}", e);
            std::process::exit(1);
        }
    }
}
