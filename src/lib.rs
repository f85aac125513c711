#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Octree Engine
//!
//! The spatial core of a chunked voxel world: a dynamic octree over each
//! chunk's solid voxels, a packed per-voxel store ready for GPU upload, and
//! frustum-based chunk selection driven by a camera pose.
//!
//! ## Key Modules
//!
//! * `config` - Engine configuration, loadable from JSON
//! * `core` - Concurrency primitives used throughout the engine
//! * `engine_state` - The per-frame coordinator with camera, voxels and task management
//! * `error` - Recoverable error types
//!
//! ## Architecture
//!
//! The engine is a library driven by a host application loop. Each frame the
//! host hands in a [`camera::ViewState`]; the engine culls chunks against the
//! view frustum, loads and unloads chunks in the background, and keeps the
//! voxel under the view ray selected. Rendering is left to the host, which
//! reads the visible set, the view/projection matrices and each chunk's
//! packed voxel array.
//!
//! ## Usage
//!
//! ```rust
//! use cgmath::{Deg, Point3};
//! use voxel_octree_engine::{camera::ViewState, EngineConfig, EngineState};
//!
//! voxel_octree_engine::init_logger();
//!
//! let mut config = EngineConfig::default();
//! config.world.chunk_size = 8;
//! config.world.render_distance = 1;
//!
//! let mut engine = EngineState::new(config).unwrap();
//! let view = ViewState::from_yaw_pitch(Point3::new(0.0, 40.0, 0.0), Deg(45.0), Deg(-30.0));
//! let frame = engine.update(view);
//! println!("{} chunks visible", frame.visible.len());
//! ```

pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

pub use config::EngineConfig;
pub use engine_state::camera_state as camera;
pub use engine_state::voxels;
pub use engine_state::{EngineState, FrameUpdate};
pub use error::{EngineError, EngineResult};

/// Initialises `env_logger` on stdout, filtered by `RUST_LOG`.
///
/// Calling it more than once is harmless.
pub fn init_logger() {
    let mut log_builder = env_logger::Builder::new();
    let initialised = log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .try_init()
        .is_ok();

    if initialised {
        log::info!("Logger initialized");
    }
}
