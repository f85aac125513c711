//! # Chunk Cache Module
//!
//! This module provides storage for chunks that leave the view so they can be
//! restored later instead of regenerated. Caches store [`ChunkSnapshot`]s, so
//! a restored chunk has no octree until the world adopts it.
//!
//! Caches are shared with background workers and must be `Send + Sync`.

use std::{
    fs,
    io::ErrorKind,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use lru::LruCache;

use crate::{
    config::{CacheConfig, CacheKind},
    core::MtResource,
    engine_state::voxels::coordinates::{chunk_origin, ChunkCoordinate},
    error::{EngineError, EngineResult},
};

use super::{Chunk, ChunkSnapshot};

/// Persists chunks between unload and reload.
pub trait ChunkCache: Send + Sync {
    /// Looks up the chunk at chunk coordinate `position`.
    ///
    /// # Returns
    /// `Ok(None)` on a miss. `ChunkSizeMismatch` if the stored chunk was saved
    /// with a different edge length.
    fn load(&self, position: ChunkCoordinate, chunk_size: i32) -> EngineResult<Option<Chunk>>;

    /// Stores a copy of `chunk`'s data, replacing any previous entry.
    fn save(&self, chunk: &Chunk) -> EngineResult<()>;
}

/// Validates a stored snapshot against the request that found it.
fn restore(snapshot: ChunkSnapshot, position: ChunkCoordinate, chunk_size: i32) -> EngineResult<Chunk> {
    if snapshot.size != chunk_size {
        return Err(EngineError::ChunkSizeMismatch {
            expected: chunk_size,
            actual: snapshot.size,
        });
    }
    let chunk = Chunk::from_snapshot(snapshot)?;
    if chunk.origin() != chunk_origin(position, chunk_size) {
        return Err(EngineError::CorruptChunk(format!(
            "entry for {:?} holds the chunk at origin {:?}",
            position,
            chunk.origin()
        )));
    }
    Ok(chunk)
}

/// Bounded in-memory cache; the least recently used chunk is evicted first.
pub struct MemoryChunkCache {
    entries: MtResource<LruCache<ChunkCoordinate, ChunkSnapshot>>,
}

impl MemoryChunkCache {
    /// # Errors
    /// `Config` if `capacity` is zero.
    pub fn new(capacity: usize) -> EngineResult<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| EngineError::Config("memory cache capacity must be at least 1".into()))?;
        Ok(MemoryChunkCache {
            entries: MtResource::new(LruCache::new(capacity)),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.get().is_empty()
    }
}

impl ChunkCache for MemoryChunkCache {
    fn load(&self, position: ChunkCoordinate, chunk_size: i32) -> EngineResult<Option<Chunk>> {
        let snapshot = match self.entries.get_mut().get(&position) {
            Some(snapshot) => snapshot.clone(),
            None => return Ok(None),
        };
        restore(snapshot, position, chunk_size).map(Some)
    }

    fn save(&self, chunk: &Chunk) -> EngineResult<()> {
        if let Some((evicted, _)) = self
            .entries
            .get_mut()
            .push(chunk.position(), chunk.to_snapshot())
        {
            if evicted != chunk.position() {
                log::debug!("Evicted chunk {:?} from memory cache", evicted);
            }
        }
        Ok(())
    }
}

/// One JSON file per chunk, named `x_y_z.json`, inside a root directory.
pub struct DirectoryChunkCache {
    root: PathBuf,
}

impl DirectoryChunkCache {
    /// Creates the root directory if it does not exist yet.
    pub fn new<P: AsRef<Path>>(root: P) -> EngineResult<Self> {
        fs::create_dir_all(root.as_ref())?;
        Ok(DirectoryChunkCache {
            root: root.as_ref().to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, position: ChunkCoordinate) -> PathBuf {
        self.root
            .join(format!("{}_{}_{}.json", position.x, position.y, position.z))
    }
}

impl ChunkCache for DirectoryChunkCache {
    fn load(&self, position: ChunkCoordinate, chunk_size: i32) -> EngineResult<Option<Chunk>> {
        let contents = match fs::read_to_string(self.path_for(position)) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        let snapshot: ChunkSnapshot = serde_json::from_str(&contents)?;
        restore(snapshot, position, chunk_size).map(Some)
    }

    fn save(&self, chunk: &Chunk) -> EngineResult<()> {
        let json = serde_json::to_string(&chunk.to_snapshot())?;
        fs::write(self.path_for(chunk.position()), json)?;
        Ok(())
    }
}

/// Forgets everything; every load is a miss.
pub struct NoChunkCache;

impl ChunkCache for NoChunkCache {
    fn load(&self, _position: ChunkCoordinate, _chunk_size: i32) -> EngineResult<Option<Chunk>> {
        Ok(None)
    }

    fn save(&self, _chunk: &Chunk) -> EngineResult<()> {
        Ok(())
    }
}

/// Builds the cache selected in the configuration.
///
/// # Errors
/// `Config` if the directory cache has no directory, or the directory cannot
/// be created.
pub fn cache_for(config: &CacheConfig) -> EngineResult<Box<dyn ChunkCache>> {
    match config.kind {
        CacheKind::Memory => Ok(Box::new(MemoryChunkCache::new(config.memory_capacity)?)),
        CacheKind::Directory => {
            let directory = config.directory.as_ref().ok_or_else(|| {
                EngineError::Config("directory cache needs a directory".into())
            })?;
            Ok(Box::new(DirectoryChunkCache::new(directory)?))
        }
        CacheKind::Disabled => Ok(Box::new(NoChunkCache)),
    }
}
