//! Logging setup
//!
//! The crate logs through the `log` facade: `info!` for scene loads and
//! device reset cycles, `debug!` for per-mesh work, `trace!` for node dispatch
//! and draw calls, `warn!` for textures that could not be loaded.

pub use log::{debug, info, warn, error, trace};

/// Install `env_logger`, using `default_filter` when `RUST_LOG` is unset
pub fn init(default_filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}
