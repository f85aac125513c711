//! # Engine Configuration
//!
//! Tunable settings for the world, camera projection, background workers and
//! chunk caching. Every section has sensible defaults so a partial JSON file
//! only needs to name the values it overrides.
//!
//! ## Example
//!
//! ```json
//! {
//!   "world": { "chunk_size": 32, "render_distance": 3 },
//!   "cache": { "kind": "Directory", "directory": "saves/world0" }
//! }
//! ```

use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Highest light intensity a 4-bit face nibble can hold.
pub const LIGHT_NIBBLE_MAX: u8 = 15;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chunk dimensions, view range and terrain generation
    pub world: WorldConfig,
    /// Perspective projection parameters
    pub camera: CameraConfig,
    /// Background worker pool
    pub tasks: TaskConfig,
    /// Where unloaded chunks are kept
    pub cache: CacheConfig,
}

/// Settings that shape the voxel world itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Edge length of a chunk in voxels. Must be a power of two.
    pub chunk_size: i32,
    /// Number of chunks considered on each side of the camera's chunk.
    pub render_distance: i32,
    /// Maximum per-face light intensity (at most [`LIGHT_NIBBLE_MAX`]).
    pub max_light: u8,
    /// Terrain supplier used on cache misses.
    pub generation: GenerationMethod,
    /// Ray hits farther than this from the eye are not selected.
    pub max_selection_distance: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            render_distance: 2,
            max_light: LIGHT_NIBBLE_MAX,
            generation: GenerationMethod::default(),
            max_selection_distance: 8.0,
        }
    }
}

/// The method used to generate chunks that are not found in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GenerationMethod {
    /// 3D Perlin noise with caves and overhangs
    Perlin { seed: u32 },
    /// Solid ground up to (but excluding) a world-space height
    Flat { height: i32 },
    /// Alternating solid and air voxels
    Checkerboard,
    /// Every voxel solid
    Solid,
    /// Every voxel air
    Empty,
    /// Randomly scattered voxels; `sparseness` is the probability of air
    Random { sparseness: f64 },
}

impl Default for GenerationMethod {
    fn default() -> Self {
        GenerationMethod::Perlin { seed: 0 }
    }
}

/// Perspective projection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fovy_degrees: f32,
    /// Width divided by height of the viewport
    pub aspect: f32,
    /// Near clipping distance
    pub znear: f32,
    /// Far clipping distance
    pub zfar: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fovy_degrees: 45.0,
            aspect: 16.0 / 9.0,
            znear: 0.1,
            zfar: 100.0,
        }
    }
}

/// Background worker pool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Number of worker threads. A single worker keeps completion order FIFO.
    pub worker_count: usize,
    /// Jobs that may wait for a free worker before publishing is refused.
    pub queue_capacity: usize,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            queue_capacity: 256,
        }
    }
}

/// Which chunk cache backs load/unload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheKind {
    /// Bounded in-memory LRU cache
    Memory,
    /// One file per chunk inside `CacheConfig::directory`
    Directory,
    /// Never cache; every load regenerates
    Disabled,
}

/// Chunk cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub kind: CacheKind,
    /// Number of chunks the memory cache retains
    pub memory_capacity: usize,
    /// Root directory for [`CacheKind::Directory`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            kind: CacheKind::Memory,
            memory_capacity: 64,
            directory: None,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Arguments
    /// * `path` - Location of a JSON configuration file
    ///
    /// # Returns
    /// The validated configuration, or the I/O, parse or validation error.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&contents)?;
        log::info!("Loaded engine configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Checks the cross-field constraints serde cannot express.
    pub fn validate(&self) -> EngineResult<()> {
        let world = &self.world;
        if world.chunk_size <= 0 || (world.chunk_size & (world.chunk_size - 1)) != 0 {
            return Err(EngineError::Config(format!(
                "chunk_size must be a positive power of two, got {}",
                world.chunk_size
            )));
        }
        if world.render_distance < 0 {
            return Err(EngineError::Config(format!(
                "render_distance must not be negative, got {}",
                world.render_distance
            )));
        }
        if world.max_light > LIGHT_NIBBLE_MAX {
            return Err(EngineError::Config(format!(
                "max_light must be at most {}, got {}",
                LIGHT_NIBBLE_MAX, world.max_light
            )));
        }
        if !(world.max_selection_distance > 0.0) {
            return Err(EngineError::Config(format!(
                "max_selection_distance must be positive, got {}",
                world.max_selection_distance
            )));
        }
        if let GenerationMethod::Random { sparseness } = world.generation {
            if !(0.0..=1.0).contains(&sparseness) {
                return Err(EngineError::Config(format!(
                    "random sparseness must lie in [0, 1], got {}",
                    sparseness
                )));
            }
        }

        let camera = &self.camera;
        if camera.znear <= 0.0 || camera.znear >= camera.zfar {
            return Err(EngineError::Config(format!(
                "clip planes must satisfy 0 < znear < zfar, got {} and {}",
                camera.znear, camera.zfar
            )));
        }
        if !(camera.fovy_degrees > 0.0 && camera.fovy_degrees < 180.0) || camera.aspect <= 0.0 {
            return Err(EngineError::Config(format!(
                "invalid projection: fovy {} degrees, aspect {}",
                camera.fovy_degrees, camera.aspect
            )));
        }

        if self.tasks.worker_count == 0 || self.tasks.queue_capacity == 0 {
            return Err(EngineError::Config(
                "worker_count and queue_capacity must both be at least 1".to_string(),
            ));
        }

        match self.cache.kind {
            CacheKind::Memory if self.cache.memory_capacity == 0 => Err(EngineError::Config(
                "memory cache needs a capacity of at least 1 chunk".to_string(),
            )),
            CacheKind::Directory if self.cache.directory.is_none() => Err(EngineError::Config(
                "directory cache needs a `directory`".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        EngineConfig::default().validate().expect("defaults should validate");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "world": { "chunk_size": 32, "generation": { "Flat": { "height": 4 } } } }"#,
        )
        .expect("should parse");
        assert_eq!(config.world.chunk_size, 32);
        assert_eq!(config.world.render_distance, 2);
        assert_eq!(config.world.generation, GenerationMethod::Flat { height: 4 });
        assert_eq!(config.tasks, TaskConfig::default());
    }

    #[test]
    fn test_rejects_non_power_of_two_chunk() {
        let result = EngineConfig::from_json_str(r#"{ "world": { "chunk_size": 12 } }"#);
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_rejects_light_above_nibble() {
        let mut config = EngineConfig::default();
        config.world.max_light = 16;
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_rejects_inverted_clip_planes() {
        let mut config = EngineConfig::default();
        config.camera.znear = 10.0;
        config.camera.zfar = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_directory_cache_requires_path() {
        let mut config = EngineConfig::default();
        config.cache.kind = CacheKind::Directory;
        assert!(config.validate().is_err());
        config.cache.directory = Some(PathBuf::from("chunks"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let result = EngineConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(EngineError::Serialization(_))));
    }
}
