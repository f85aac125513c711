//! # Chunk Load Task
//!
//! This module defines the `ChunkLoadTask` which restores a chunk from the
//! cache or generates it on a worker thread. This task is scheduled when a
//! chunk enters the view frustum.

use std::sync::Arc;

use crate::engine_state::{
    task_management::task::{Task, TaskResult},
    voxels::{
        chunk::{chunk_cache::ChunkCache, chunk_generation::ChunkGenerator, Chunk},
        coordinates::ChunkCoordinate,
        world::{fetch_chunk, World},
    },
};

/// A task that produces chunk data asynchronously.
///
/// The task owns handles to the generator and cache, never the world. The
/// finished chunk is adopted by the world when the result is handled.
pub struct ChunkLoadTask {
    generator: Arc<dyn ChunkGenerator>,
    cache: Arc<dyn ChunkCache>,
    /// The position of the chunk to load (in chunk coordinates)
    position: ChunkCoordinate,
    chunk_size: i32,
    max_light: u8,
}

impl ChunkLoadTask {
    /// Creates a load task using the world's own generator, cache and sizes.
    ///
    /// # Arguments
    /// * `world` - The world the chunk is destined for
    /// * `position` - The chunk coordinates to load
    pub fn for_world(world: &World, position: ChunkCoordinate) -> Self {
        ChunkLoadTask {
            generator: world.generator(),
            cache: world.cache(),
            position,
            chunk_size: world.chunk_size(),
            max_light: world.config().max_light,
        }
    }

    pub fn position(&self) -> ChunkCoordinate {
        self.position
    }
}

impl Task for ChunkLoadTask {
    fn process(&self) -> Box<dyn TaskResult> {
        let chunk = fetch_chunk(
            self.generator.as_ref(),
            self.cache.as_ref(),
            self.position,
            self.chunk_size,
            self.max_light,
        );
        Box::new(ChunkLoadTaskResult { chunk })
    }

    fn cancelled(&self) -> Box<dyn TaskResult> {
        Box::new(ChunkLoadCancelledResult {
            position: self.position,
        })
    }
}

/// The loaded chunk, waiting to be adopted by the world.
pub struct ChunkLoadTaskResult {
    chunk: Chunk,
}

impl TaskResult for ChunkLoadTaskResult {
    fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task>> {
        let position = self.chunk.position();
        if !world.is_pending(position) {
            // Unloaded or cancelled while the worker was busy.
            log::trace!("Discarding stale chunk {:?}", position);
            return Vec::new();
        }
        world.insert_chunk(self.chunk);
        Vec::new()
    }
}

/// Releases the pending mark of a load that never ran.
pub struct ChunkLoadCancelledResult {
    position: ChunkCoordinate,
}

impl TaskResult for ChunkLoadCancelledResult {
    fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task>> {
        world.clear_pending(self.position);
        Vec::new()
    }
}
