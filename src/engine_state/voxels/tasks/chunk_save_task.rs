//! # Chunk Save Task
//!
//! Writes a modified chunk that left the view back to the cache on a worker
//! thread. A failed write is logged and the chunk is dropped. The world keeps
//! the position marked as saving until the result comes back, so the chunk is
//! not reloaded from a stale cache entry meanwhile. A cancelled save hands the
//! chunk back to the world unsaved instead of losing its edits.

use std::sync::Arc;

use crate::engine_state::{
    task_management::task::{Task, TaskResult},
    voxels::{
        chunk::{chunk_cache::ChunkCache, Chunk},
        coordinates::ChunkCoordinate,
        world::World,
    },
};

pub struct ChunkSaveTask {
    cache: Arc<dyn ChunkCache>,
    chunk: Chunk,
}

impl ChunkSaveTask {
    pub fn new(cache: Arc<dyn ChunkCache>, chunk: Chunk) -> Self {
        ChunkSaveTask { cache, chunk }
    }

    fn finished(&self) -> Box<dyn TaskResult> {
        Box::new(ChunkSaveTaskResult {
            position: self.chunk.position(),
        })
    }
}

impl Task for ChunkSaveTask {
    fn process(&self) -> Box<dyn TaskResult> {
        match self.cache.save(&self.chunk) {
            Ok(()) => log::debug!("Saved chunk {:?}", self.chunk.position()),
            Err(error) => log::warn!(
                "Failed to save chunk {:?}, changes are lost: {}",
                self.chunk.position(),
                error
            ),
        }
        self.finished()
    }

    fn cancelled(&self) -> Box<dyn TaskResult> {
        log::debug!("Save of chunk {:?} was cancelled", self.chunk.position());
        Box::new(ChunkSaveCancelledResult {
            chunk: self.chunk.clone(),
        })
    }
}

/// Returns an unsaved chunk to the world; the next visibility pass unloads it
/// again if it is still out of view.
///
/// If the position was loaded again in the meantime, an unmodified copy is
/// replaced by the returned edits. A copy with edits of its own wins.
pub struct ChunkSaveCancelledResult {
    chunk: Chunk,
}

impl TaskResult for ChunkSaveCancelledResult {
    fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task>> {
        let position = self.chunk.position();
        world.finish_save(position);
        if world.chunk(position).map_or(false, |loaded| !loaded.is_modified()) {
            log::debug!("Replacing reloaded chunk {:?} with its unsaved edits", position);
            world.detach_chunk(position);
        }
        if !world.insert_chunk(self.chunk) {
            log::warn!(
                "Chunk {:?} was edited again while its save was pending, discarding the older edits",
                position
            );
        }
        Vec::new()
    }
}

/// Lets the world reload the chunk again.
pub struct ChunkSaveTaskResult {
    position: ChunkCoordinate,
}

impl TaskResult for ChunkSaveTaskResult {
    fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task>> {
        world.finish_save(self.position);
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::config::WorldConfig;
    use crate::engine_state::voxels::chunk::{
        chunk_cache::MemoryChunkCache, chunk_generation::EmptyGenerator,
    };

    #[test]
    fn test_save_writes_to_cache() {
        let cache = Arc::new(MemoryChunkCache::new(4).expect("capacity"));
        let mut chunk = Chunk::at(Point3::new(0, -1, 0), 2, 15);
        chunk.set_block_type(Point3::new(1, -1, 0), 3);

        let config = WorldConfig {
            chunk_size: 2,
            ..WorldConfig::default()
        };
        let mut world = World::new(config, Arc::new(EmptyGenerator), cache.clone());
        world.begin_save(Point3::new(0, -1, 0));

        let task = ChunkSaveTask::new(cache.clone(), chunk);
        task.process().handle_result(&mut world);
        assert!(!world.is_saving(Point3::new(0, -1, 0)));

        let restored = cache
            .load(Point3::new(0, -1, 0), 2)
            .expect("load")
            .expect("cached");
        assert_eq!(restored.block_type(Point3::new(1, -1, 0)), 3);
    }

    #[test]
    fn test_cancelled_save_returns_chunk_to_world() {
        let cache = Arc::new(MemoryChunkCache::new(4).expect("capacity"));
        let config = WorldConfig {
            chunk_size: 2,
            ..WorldConfig::default()
        };
        let mut world = World::new(config, Arc::new(EmptyGenerator), cache.clone());
        let mut chunk = Chunk::at(Point3::new(1, 0, 0), 2, 15);
        chunk.set_block_type(Point3::new(2, 0, 0), 5);
        world.begin_save(Point3::new(1, 0, 0));

        let task = ChunkSaveTask::new(cache.clone(), chunk);
        task.cancelled().handle_result(&mut world);

        assert!(cache.is_empty());
        assert!(!world.is_saving(Point3::new(1, 0, 0)));
        assert_eq!(world.block_at(Point3::new(2, 0, 0)), Some(5));
        assert!(world.chunk(Point3::new(1, 0, 0)).map_or(false, |c| c.is_modified()));
    }

    #[test]
    fn test_cancelled_save_replaces_unmodified_reload() {
        let cache = Arc::new(MemoryChunkCache::new(4).expect("capacity"));
        let config = WorldConfig {
            chunk_size: 2,
            ..WorldConfig::default()
        };
        let mut world = World::new(config, Arc::new(EmptyGenerator), cache.clone());
        let position = Point3::new(0, 0, 0);
        let mut edited = Chunk::at(position, 2, 15);
        edited.set_block_type(Point3::new(1, 1, 1), 4);
        world.begin_save(position);
        world.insert_chunk(Chunk::at(position, 2, 15));

        ChunkSaveTask::new(cache.clone(), edited)
            .cancelled()
            .handle_result(&mut world);

        assert_eq!(world.block_at(Point3::new(1, 1, 1)), Some(4));
        assert!(world.chunk(position).map_or(false, |c| c.is_modified()));
    }

    #[test]
    fn test_cancelled_save_keeps_newer_edits() {
        let cache = Arc::new(MemoryChunkCache::new(4).expect("capacity"));
        let config = WorldConfig {
            chunk_size: 2,
            ..WorldConfig::default()
        };
        let mut world = World::new(config, Arc::new(EmptyGenerator), cache.clone());
        let position = Point3::new(0, 0, 0);
        let mut older = Chunk::at(position, 2, 15);
        older.set_block_type(Point3::new(1, 1, 1), 4);
        world.begin_save(position);
        world.insert_chunk(Chunk::at(position, 2, 15));
        world.set_block(Point3::new(0, 0, 0), 2);

        ChunkSaveTask::new(cache.clone(), older)
            .cancelled()
            .handle_result(&mut world);

        assert_eq!(world.block_at(Point3::new(0, 0, 0)), Some(2));
        assert_eq!(world.block_at(Point3::new(1, 1, 1)), Some(0));
        assert!(!world.is_saving(position));
    }
}
