//! Media file search path
//!
//! Scene files and textures are referenced by bare or relative filenames. A
//! [`MediaResolver`] looks for them in a fixed order of directories around the
//! working directory and the executable, then in the configured media root.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::AssetSearchConfig;
use crate::error::{SceneError, SceneResult};

/// Environment key naming the process-wide media root
pub const MEDIA_ROOT_ENV: &str = "SCENE_ASSET_MEDIA_ROOT";

static MEDIA_ROOT: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Media root taken from [`MEDIA_ROOT_ENV`], read once per process
pub fn process_media_root() -> Option<&'static Path> {
    MEDIA_ROOT
        .get_or_init(|| env::var_os(MEDIA_ROOT_ENV).map(PathBuf::from))
        .as_deref()
}

/// Ordered media search path
///
/// For a filename `name` with final component `leaf`, candidates are tried in
/// this order and the first existing file wins:
///
/// 1. `<working_dir>/<name>`
/// 2. `<working_dir>/../<leaf>`
/// 3. `<working_dir>/../../<leaf>`
/// 4. `<exe_dir>/<leaf>`
/// 5. `<exe_dir>/../<leaf>`
/// 6. `<exe_dir>/../../<leaf>`
/// 7. `<exe_dir>/../<exe_stem>/<leaf>`
/// 8. `<media_root>/<media_subfolder>/<leaf>`
///
/// Entries whose base is unknown (no executable, no media root) are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaResolver {
    working_dir: PathBuf,
    executable: Option<PathBuf>,
    media_root: Option<PathBuf>,
    media_subfolder: String,
}

impl MediaResolver {
    /// Resolver searching only around `working_dir`
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            executable: None,
            media_root: None,
            media_subfolder: crate::config::DEFAULT_MEDIA_SUBFOLDER.to_string(),
        }
    }

    /// Also search around the given executable path
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = Some(executable.into());
        self
    }

    /// Search `<root>/<subfolder>` last
    pub fn with_media_root(mut self, root: Option<PathBuf>, subfolder: impl Into<String>) -> Self {
        self.media_root = root;
        self.media_subfolder = subfolder.into();
        self
    }

    /// Resolver for the running process
    ///
    /// Uses the current working directory and executable. The media root comes
    /// from `config`, or from [`process_media_root`] when the config leaves it
    /// unset.
    pub fn from_environment(config: &AssetSearchConfig) -> SceneResult<Self> {
        let working_dir = env::current_dir()?;
        let media_root = config
            .media_root
            .clone()
            .or_else(|| process_media_root().map(Path::to_path_buf));

        let mut resolver = Self::new(working_dir).with_media_root(media_root, config.media_subfolder.clone());
        if let Ok(executable) = env::current_exe() {
            resolver = resolver.with_executable(executable);
        }
        Ok(resolver)
    }

    /// Media root searched last, if any
    pub fn media_root(&self) -> Option<&Path> {
        self.media_root.as_deref()
    }

    /// Candidate paths for `filename`, in search order
    pub fn search_paths(&self, filename: &str) -> Vec<PathBuf> {
        // Scene files written on Windows use backslash separators
        let normalized = filename.replace('\\', "/");
        let requested = Path::new(&normalized);
        let leaf = requested
            .file_name()
            .map_or_else(|| PathBuf::from(&normalized), PathBuf::from);

        let mut paths = vec![
            self.working_dir.join(requested),
            self.working_dir.join("..").join(&leaf),
            self.working_dir.join("..").join("..").join(&leaf),
        ];

        if let Some(executable) = &self.executable {
            if let Some(exe_dir) = executable.parent() {
                paths.push(exe_dir.join(&leaf));
                paths.push(exe_dir.join("..").join(&leaf));
                paths.push(exe_dir.join("..").join("..").join(&leaf));
                if let Some(stem) = executable.file_stem() {
                    paths.push(exe_dir.join("..").join(stem).join(&leaf));
                }
            }
        }

        if let Some(root) = &self.media_root {
            paths.push(root.join(&self.media_subfolder).join(&leaf));
        }

        paths
    }

    /// First existing candidate for `filename`
    pub fn find(&self, filename: &str) -> SceneResult<PathBuf> {
        let found = self
            .search_paths(filename)
            .into_iter()
            .find(|candidate| candidate.is_file());

        match found {
            Some(path) => {
                log::trace!("Resolved media '{}' to {:?}", filename, path);
                Ok(path)
            }
            None => Err(SceneError::MediaNotFound(filename.to_string())),
        }
    }
}
