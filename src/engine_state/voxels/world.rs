//! # World Module
//!
//! This module provides the `World` struct which manages the collection of
//! loaded chunks. It serves as the central coordinator for chunk loading,
//! unloading, block access and voxel selection.
//!
//! ## Architecture
//!
//! The world uses a sparse storage approach where only chunks inside the view
//! frustum are kept in memory. Chunks that leave the view are handed to a
//! [`ChunkCache`]; chunks that enter it are restored from the cache or, on a
//! miss, produced by a [`ChunkGenerator`].
//!
//! Every loaded chunk carries an octree over its solid voxels. Block edits go
//! through the world so that the flat data, the octree and the adjacency masks
//! of the edited voxel and its six neighbours stay consistent, even across
//! chunk borders.
//!
//! ## Ownership
//!
//! A `World` is owned by exactly one thread and has no internal locking.
//! Background work only ever produces whole chunks, which the owner adopts
//! with [`World::insert_chunk`].

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use cgmath::{Point3, Vector3};

use crate::config::WorldConfig;
use crate::engine_state::camera_state::{visible_chunks, Projection, ViewState};

use super::{
    block::{block_side::BlockSide, BlockTypeSize},
    chunk::{chunk_cache::ChunkCache, chunk_generation::ChunkGenerator, Chunk},
    coordinates::{chunk_coordinate_of, chunk_origin, ChunkCoordinate, VoxelCoordinate},
    octree::{closest_voxel, RayIntersection},
};

/// Result of a visibility pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilityUpdate {
    /// Chunks that passed frustum culling
    pub visible: HashSet<ChunkCoordinate>,
    /// Visible chunks that are neither loaded nor being loaded, nearest first
    pub to_load: Vec<ChunkCoordinate>,
    /// Loaded chunks that are no longer visible
    pub to_unload: Vec<ChunkCoordinate>,
}

/// Restores a chunk from `cache`, falling back to `generator`.
///
/// A failing cache read is logged and treated as a miss.
pub fn fetch_chunk(
    generator: &dyn ChunkGenerator,
    cache: &dyn ChunkCache,
    position: ChunkCoordinate,
    chunk_size: i32,
    max_light: u8,
) -> Chunk {
    match cache.load(position, chunk_size) {
        Ok(Some(chunk)) => {
            log::debug!("Restored chunk {:?} from cache", position);
            return chunk;
        }
        Ok(None) => {}
        Err(error) => {
            log::warn!(
                "Failed to load chunk {:?} from cache, regenerating: {}",
                position,
                error
            );
        }
    }
    generator.generate_chunk(position, chunk_size, max_light)
}

/// Represents a voxel world composed of multiple chunks.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use cgmath::Point3;
/// use voxel_octree_engine::config::WorldConfig;
/// use voxel_octree_engine::voxels::chunk::chunk_cache::NoChunkCache;
/// use voxel_octree_engine::voxels::chunk::chunk_generation::SolidGenerator;
/// use voxel_octree_engine::voxels::world::World;
///
/// let config = WorldConfig { chunk_size: 4, ..WorldConfig::default() };
/// let mut world = World::new(config, Arc::new(SolidGenerator), Arc::new(NoChunkCache));
/// world.load_chunk(Point3::new(0, 0, 0));
/// assert_eq!(world.block_at(Point3::new(1, 2, 3)), Some(1));
/// assert_eq!(world.block_at(Point3::new(9, 0, 0)), None);
/// ```
pub struct World {
    config: WorldConfig,
    /// A mapping from chunk coordinates to chunk data.
    chunks: HashMap<ChunkCoordinate, Chunk>,
    generator: Arc<dyn ChunkGenerator>,
    cache: Arc<dyn ChunkCache>,
    /// Chunks requested from a background worker but not yet adopted
    pending: HashSet<ChunkCoordinate>,
    /// Chunks whose background save has not finished yet
    saving: HashSet<ChunkCoordinate>,
    /// Output of the last visibility pass
    visible: HashSet<ChunkCoordinate>,
    selection: Option<RayIntersection>,
}

impl World {
    /// Creates a new, empty world.
    ///
    /// # Panics
    /// Panics if the configured chunk size is not positive.
    pub fn new(
        config: WorldConfig,
        generator: Arc<dyn ChunkGenerator>,
        cache: Arc<dyn ChunkCache>,
    ) -> Self {
        assert!(
            config.chunk_size > 0,
            "chunk size must be positive, got {}",
            config.chunk_size
        );
        World {
            config,
            chunks: HashMap::new(),
            generator,
            cache,
            pending: HashSet::new(),
            saving: HashSet::new(),
            visible: HashSet::new(),
            selection: None,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn chunk_size(&self) -> i32 {
        self.config.chunk_size
    }

    pub fn generator(&self) -> Arc<dyn ChunkGenerator> {
        self.generator.clone()
    }

    pub fn cache(&self) -> Arc<dyn ChunkCache> {
        self.cache.clone()
    }

    pub fn chunk(&self, position: ChunkCoordinate) -> Option<&Chunk> {
        self.chunks.get(&position)
    }

    pub fn is_loaded(&self, position: ChunkCoordinate) -> bool {
        self.chunks.contains_key(&position)
    }

    pub fn loaded_chunks(&self) -> impl Iterator<Item = ChunkCoordinate> + '_ {
        self.chunks.keys().copied()
    }

    pub fn loaded_count(&self) -> usize {
        self.chunks.len()
    }

    /// Records that a background load for `position` is in flight.
    ///
    /// # Returns
    /// `false` if the chunk is already loaded or pending.
    pub fn mark_pending(&mut self, position: ChunkCoordinate) -> bool {
        !self.chunks.contains_key(&position) && self.pending.insert(position)
    }

    /// Forgets an in-flight load, e.g. when its job was cancelled.
    pub fn clear_pending(&mut self, position: ChunkCoordinate) {
        self.pending.remove(&position);
    }

    pub fn is_pending(&self, position: ChunkCoordinate) -> bool {
        self.pending.contains(&position)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Records that a detached chunk is being written by a background worker.
    /// It is not reloaded until [`World::finish_save`] so the load cannot race
    /// the write.
    pub fn begin_save(&mut self, position: ChunkCoordinate) {
        self.saving.insert(position);
    }

    pub fn finish_save(&mut self, position: ChunkCoordinate) {
        self.saving.remove(&position);
    }

    pub fn is_saving(&self, position: ChunkCoordinate) -> bool {
        self.saving.contains(&position)
    }

    /// Writes every modified loaded chunk to the cache on the calling thread.
    ///
    /// # Returns
    /// The number of chunks saved; failures are logged and skipped.
    pub fn save_modified(&mut self) -> usize {
        let mut saved = 0;
        for (position, chunk) in self.chunks.iter_mut() {
            if !chunk.is_modified() {
                continue;
            }
            match self.cache.save(chunk) {
                Ok(()) => {
                    chunk.mark_saved();
                    saved += 1;
                }
                Err(error) => log::warn!("Failed to save chunk {:?}: {}", position, error),
            }
        }
        saved
    }

    /// Loads the chunk at `position` on the calling thread if needed.
    pub fn load_chunk(&mut self, position: ChunkCoordinate) -> &Chunk {
        if !self.chunks.contains_key(&position) {
            let chunk = fetch_chunk(
                self.generator.as_ref(),
                self.cache.as_ref(),
                position,
                self.config.chunk_size,
                self.config.max_light,
            );
            self.insert_chunk(chunk);
        }
        &self.chunks[&position]
    }

    /// Adopts a chunk prepared elsewhere: builds its octree and stitches its
    /// border adjacency to the loaded neighbours.
    ///
    /// # Returns
    /// `false` (and drops `chunk`) if a chunk is already loaded at that
    /// position, so in-memory edits are never overwritten.
    ///
    /// # Panics
    /// Panics if the chunk's size differs from the world's chunk size.
    pub fn insert_chunk(&mut self, mut chunk: Chunk) -> bool {
        assert_eq!(
            chunk.size(),
            self.config.chunk_size,
            "chunk size does not match the world"
        );
        let position = chunk.position();
        self.pending.remove(&position);
        if self.chunks.contains_key(&position) {
            log::debug!("Chunk {:?} is already loaded, dropping duplicate", position);
            return false;
        }

        if chunk.octree().is_none() {
            chunk.init_octree();
        }
        self.chunks.insert(position, chunk);

        for side in BlockSide::all() {
            self.refresh_face(position, side);
            let neighbour = position + side.offset();
            if self.chunks.contains_key(&neighbour) {
                self.refresh_face(neighbour, side.opposite());
            }
        }
        log::trace!("Loaded chunk {:?}", position);
        true
    }

    /// Removes a chunk from the world without persisting it.
    ///
    /// Loaded neighbours see the vacated space as air afterwards.
    pub fn detach_chunk(&mut self, position: ChunkCoordinate) -> Option<Chunk> {
        let chunk = self.chunks.remove(&position)?;
        for side in BlockSide::all() {
            let neighbour = position + side.offset();
            if self.chunks.contains_key(&neighbour) {
                self.refresh_face(neighbour, side.opposite());
            }
        }
        Some(chunk)
    }

    /// Removes a chunk, saving it to the cache first if it was modified.
    ///
    /// A failed save is logged; the chunk is dropped either way.
    ///
    /// # Returns
    /// `true` if a chunk was loaded at `position`.
    pub fn unload_chunk(&mut self, position: ChunkCoordinate) -> bool {
        let Some(mut chunk) = self.detach_chunk(position) else {
            return false;
        };
        if chunk.is_modified() {
            match self.cache.save(&chunk) {
                Ok(()) => chunk.mark_saved(),
                Err(error) => log::warn!("Failed to save chunk {:?}: {}", position, error),
            }
        }
        true
    }

    /// Block type at `voxel`, or `None` if its chunk is not loaded.
    pub fn block_at(&self, voxel: VoxelCoordinate) -> Option<BlockTypeSize> {
        self.chunk_for(voxel).map(|chunk| chunk.block_type(voxel))
    }

    /// Returns `true` if `voxel` is loaded and not air.
    pub fn is_solid(&self, voxel: VoxelCoordinate) -> bool {
        self.chunk_for(voxel).map_or(false, |chunk| !chunk.is_air(voxel))
    }

    /// Writes a block type, updating the octree and neighbour adjacency.
    ///
    /// # Returns
    /// The previous block type, or `None` if the chunk is not loaded.
    pub fn set_block(&mut self, voxel: VoxelCoordinate, block_type: BlockTypeSize) -> Option<BlockTypeSize> {
        let position = chunk_coordinate_of(voxel, self.config.chunk_size);
        let chunk = self.chunks.get_mut(&position)?;
        let previous = chunk.block_type(voxel);
        chunk.set_block_type(voxel, block_type);
        self.refresh_around(voxel);
        Some(previous)
    }

    /// Turns a solid voxel into air.
    ///
    /// # Returns
    /// The removed block type, or `None` if the chunk is not loaded or the
    /// voxel was already air.
    pub fn remove_block(&mut self, voxel: VoxelCoordinate) -> Option<BlockTypeSize> {
        let position = chunk_coordinate_of(voxel, self.config.chunk_size);
        let chunk = self.chunks.get_mut(&position)?;
        if chunk.is_air(voxel) {
            return None;
        }
        let previous = chunk.block_type(voxel);
        chunk.remove_voxel(voxel);
        self.refresh_around(voxel);
        Some(previous)
    }

    /// Runs frustum culling and diffs the result against the loaded set.
    pub fn update_visibility(&mut self, view: &ViewState, projection: &Projection) -> VisibilityUpdate {
        let chunk_size = self.config.chunk_size;
        let visible = visible_chunks(view, projection, self.config.render_distance, chunk_size);

        let center = view.chunk_position(chunk_size);
        let mut to_load: Vec<ChunkCoordinate> = visible
            .iter()
            .filter(|position| {
                !self.chunks.contains_key(position)
                    && !self.pending.contains(position)
                    && !self.saving.contains(position)
            })
            .copied()
            .collect();
        to_load.sort_by_key(|position| {
            let d = *position - center;
            (d.x * d.x + d.y * d.y + d.z * d.z, position.x, position.y, position.z)
        });

        let mut to_unload: Vec<ChunkCoordinate> = self
            .chunks
            .keys()
            .filter(|position| !visible.contains(position))
            .copied()
            .collect();
        to_unload.sort_by_key(|position| (position.x, position.y, position.z));

        self.visible = visible.clone();
        VisibilityUpdate {
            visible,
            to_load,
            to_unload,
        }
    }

    /// Chunks found visible by the last [`World::update_visibility`].
    pub fn visible_chunks(&self) -> &HashSet<ChunkCoordinate> {
        &self.visible
    }

    /// Finds the voxel a ray enters first across every loaded chunk.
    ///
    /// No distance cutoff is applied; ties keep whichever hit was found first.
    pub fn select_voxel(&self, eye: Point3<f32>, direction: Vector3<f32>) -> Option<RayIntersection> {
        let mut best: Option<RayIntersection> = None;
        for chunk in self.chunks.values() {
            let hit = chunk
                .octree()
                .and_then(|octree| octree.closest_intersect(eye, direction));
            if let Some(hit) = hit {
                if best.map_or(true, |current| hit.distance < current.distance) {
                    best = Some(hit);
                }
            }
        }
        best
    }

    /// Collects every voxel whose cube the ray touches, then picks the one
    /// whose centre is nearest to `eye` in straight-line distance.
    pub fn select_voxel_nearest(&self, eye: Point3<f32>, direction: Vector3<f32>) -> Option<VoxelCoordinate> {
        let touched: Vec<VoxelCoordinate> = self
            .chunks
            .values()
            .filter_map(|chunk| chunk.octree())
            .flat_map(|octree| octree.find(|node| node.aabc().intersect_ray(eye, direction).is_some()))
            .collect();
        closest_voxel(&touched, eye)
    }

    pub fn set_selection(&mut self, selection: Option<RayIntersection>) {
        self.selection = selection;
    }

    /// The selection stored by the last frame update.
    pub fn selection(&self) -> Option<RayIntersection> {
        self.selection
    }

    fn chunk_for(&self, voxel: VoxelCoordinate) -> Option<&Chunk> {
        self.chunks
            .get(&chunk_coordinate_of(voxel, self.config.chunk_size))
    }

    /// Adjacency mask of `voxel` using every loaded chunk.
    fn adjacency_mask(&self, voxel: VoxelCoordinate) -> u8 {
        BlockSide::all().iter().fold(0, |mask, side| {
            if self.is_solid(voxel + side.offset()) {
                mask | side.bit()
            } else {
                mask
            }
        })
    }

    fn refresh_voxel(&mut self, voxel: VoxelCoordinate) {
        let mask = self.adjacency_mask(voxel);
        let position = chunk_coordinate_of(voxel, self.config.chunk_size);
        if let Some(chunk) = self.chunks.get_mut(&position) {
            chunk.store_adjacency(voxel, mask);
        }
    }

    fn refresh_around(&mut self, voxel: VoxelCoordinate) {
        self.refresh_voxel(voxel);
        for side in BlockSide::all() {
            self.refresh_voxel(voxel + side.offset());
        }
    }

    /// Recomputes adjacency for the layer of `position` facing `side`.
    fn refresh_face(&mut self, position: ChunkCoordinate, side: BlockSide) {
        for voxel in face_voxels(position, self.config.chunk_size, side) {
            self.refresh_voxel(voxel);
        }
    }
}

/// Voxels of chunk `position` on its face towards `side`.
fn face_voxels(position: ChunkCoordinate, chunk_size: i32, side: BlockSide) -> Vec<VoxelCoordinate> {
    let origin = chunk_origin(position, chunk_size);
    let offset = side.offset();
    let layer = |direction: i32| if direction < 0 { 0 } else { chunk_size - 1 };

    let mut voxels = Vec::with_capacity((chunk_size * chunk_size) as usize);
    for a in 0..chunk_size {
        for b in 0..chunk_size {
            let local = if offset.x != 0 {
                Vector3::new(layer(offset.x), a, b)
            } else if offset.y != 0 {
                Vector3::new(a, layer(offset.y), b)
            } else {
                Vector3::new(a, b, layer(offset.z))
            };
            voxels.push(origin + local);
        }
    }
    voxels
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Quaternion};

    use super::*;
    use crate::engine_state::voxels::{
        block::block_type::BlockType,
        chunk::{
            chunk_cache::{MemoryChunkCache, NoChunkCache},
            chunk_generation::{EmptyGenerator, SolidGenerator},
        },
    };
    use crate::error::{EngineError, EngineResult};

    struct FailingChunkCache;

    impl ChunkCache for FailingChunkCache {
        fn load(&self, _position: ChunkCoordinate, _chunk_size: i32) -> EngineResult<Option<Chunk>> {
            Err(EngineError::CorruptChunk("unreadable".into()))
        }

        fn save(&self, _chunk: &Chunk) -> EngineResult<()> {
            Err(EngineError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
        }
    }

    fn config(chunk_size: i32) -> WorldConfig {
        WorldConfig {
            chunk_size,
            render_distance: 1,
            ..WorldConfig::default()
        }
    }

    fn empty_world(chunk_size: i32) -> World {
        World::new(config(chunk_size), Arc::new(EmptyGenerator), Arc::new(NoChunkCache))
    }

    fn voxel(x: i32, y: i32, z: i32) -> VoxelCoordinate {
        Point3::new(x, y, z)
    }

    #[test]
    fn test_load_builds_octree() {
        let mut world = World::new(config(2), Arc::new(SolidGenerator), Arc::new(NoChunkCache));
        let chunk = world.load_chunk(Point3::new(0, 0, 0));
        assert_eq!(chunk.octree().map(|octree| octree.len()), Some(8));
        assert!(world.is_loaded(Point3::new(0, 0, 0)));
        assert_eq!(world.loaded_count(), 1);
    }

    #[test]
    fn test_set_block_updates_cross_chunk_adjacency() {
        let mut world = empty_world(4);
        world.load_chunk(Point3::new(0, 0, 0));
        world.load_chunk(Point3::new(1, 0, 0));

        assert_eq!(world.set_block(voxel(3, 0, 0), BlockType::STONE.id()), Some(0));
        assert_eq!(world.set_block(voxel(4, 0, 0), BlockType::DIRT.id()), Some(0));

        let left = world.chunk(Point3::new(0, 0, 0)).expect("loaded");
        let right = world.chunk(Point3::new(1, 0, 0)).expect("loaded");
        assert_eq!(left.adjacency(voxel(3, 0, 0)), BlockSide::BACK.bit());
        assert_eq!(right.adjacency(voxel(4, 0, 0)), BlockSide::FRONT.bit());
        assert!(right.octree().map_or(false, |octree| octree.contains(voxel(4, 0, 0))));

        assert_eq!(world.remove_block(voxel(4, 0, 0)), Some(BlockType::DIRT.id()));
        assert_eq!(world.remove_block(voxel(4, 0, 0)), None);
        let left = world.chunk(Point3::new(0, 0, 0)).expect("loaded");
        assert_eq!(left.adjacency(voxel(3, 0, 0)), 0);
    }

    #[test]
    fn test_edits_outside_loaded_chunks_are_ignored() {
        let mut world = empty_world(4);
        assert_eq!(world.set_block(voxel(0, 0, 0), 1), None);
        assert_eq!(world.remove_block(voxel(0, 0, 0)), None);
        assert!(!world.is_solid(voxel(0, 0, 0)));
    }

    #[test]
    fn test_neighbour_load_and_unload_stitch_borders() {
        let mut world = World::new(config(2), Arc::new(SolidGenerator), Arc::new(NoChunkCache));
        world.load_chunk(Point3::new(0, 0, 0));
        let edge = voxel(1, 0, 0);
        assert_eq!(world.chunk(Point3::new(0, 0, 0)).map(|c| c.adjacency(edge) & BlockSide::BACK.bit()), Some(0));

        world.load_chunk(Point3::new(1, 0, 0));
        let mask = world.chunk(Point3::new(0, 0, 0)).map(|c| c.adjacency(edge));
        assert_eq!(mask.map(|m| m & BlockSide::BACK.bit()), Some(BlockSide::BACK.bit()));
        assert!(!world.chunk(Point3::new(0, 0, 0)).map_or(true, |c| c.is_modified()));

        assert!(world.unload_chunk(Point3::new(1, 0, 0)));
        let mask = world.chunk(Point3::new(0, 0, 0)).map(|c| c.adjacency(edge));
        assert_eq!(mask.map(|m| m & BlockSide::BACK.bit()), Some(0));
    }

    #[test]
    fn test_unload_saves_modified_chunks() {
        let cache = Arc::new(MemoryChunkCache::new(8).expect("capacity"));
        let mut world = World::new(config(2), Arc::new(EmptyGenerator), cache.clone());
        world.load_chunk(Point3::new(0, 0, 0));
        world.load_chunk(Point3::new(5, 0, 0));
        world.set_block(voxel(1, 1, 1), BlockType::WOOD.id());

        assert!(world.unload_chunk(Point3::new(0, 0, 0)));
        assert!(world.unload_chunk(Point3::new(5, 0, 0)));
        assert!(!world.unload_chunk(Point3::new(5, 0, 0)));
        assert_eq!(cache.len(), 1);

        world.load_chunk(Point3::new(0, 0, 0));
        assert_eq!(world.block_at(voxel(1, 1, 1)), Some(BlockType::WOOD.id()));
        assert!(world.chunk(Point3::new(0, 0, 0)).map_or(false, |c| c.octree().is_some()));
    }

    #[test]
    fn test_failing_cache_degrades_to_generation() {
        let mut world = World::new(config(2), Arc::new(SolidGenerator), Arc::new(FailingChunkCache));
        world.load_chunk(Point3::new(0, 0, 0));
        assert!(world.is_solid(voxel(0, 0, 0)));
        world.set_block(voxel(0, 0, 0), BlockType::GRASS.id());
        assert!(world.unload_chunk(Point3::new(0, 0, 0)));
        assert!(!world.is_loaded(Point3::new(0, 0, 0)));
    }

    #[test]
    fn test_insert_never_replaces_loaded_chunk() {
        let mut world = empty_world(2);
        world.load_chunk(Point3::new(0, 0, 0));
        world.set_block(voxel(0, 0, 0), 3);
        assert!(world.mark_pending(Point3::new(1, 0, 0)));
        assert!(!world.mark_pending(Point3::new(1, 0, 0)));
        assert!(!world.mark_pending(Point3::new(0, 0, 0)));

        let stale = SolidGenerator.generate_chunk(Point3::new(0, 0, 0), 2, 15);
        assert!(!world.insert_chunk(stale));
        assert_eq!(world.block_at(voxel(0, 0, 1)), Some(0));

        let fresh = SolidGenerator.generate_chunk(Point3::new(1, 0, 0), 2, 15);
        assert!(world.insert_chunk(fresh));
        assert!(!world.is_pending(Point3::new(1, 0, 0)));
    }

    #[test]
    fn test_visibility_diff() {
        let mut world = empty_world(1);
        world.load_chunk(Point3::new(0, 0, 0));
        world.load_chunk(Point3::new(0, 0, 5));
        world.mark_pending(Point3::new(0, 0, -1));

        let view = ViewState::new(Point3::new(0.5, 0.5, 0.5), Quaternion::new(1.0, 0.0, 0.0, 0.0));
        let projection = Projection::with_aspect(1.0, Deg(33.4), 0.1, 10.0);
        let update = world.update_visibility(&view, &projection);

        assert_eq!(update.visible.len(), 2);
        assert!(update.to_load.is_empty());
        assert_eq!(update.to_unload, vec![Point3::new(0, 0, 5)]);
        assert_eq!(world.visible_chunks(), &update.visible);
    }

    #[test]
    fn test_chunks_being_saved_are_not_reloaded() {
        let mut world = empty_world(1);
        world.begin_save(Point3::new(0, 0, -1));
        let view = ViewState::new(Point3::new(0.5, 0.5, 0.5), Quaternion::new(1.0, 0.0, 0.0, 0.0));
        let projection = Projection::with_aspect(1.0, Deg(33.4), 0.1, 10.0);

        let update = world.update_visibility(&view, &projection);
        assert_eq!(update.to_load, vec![Point3::new(0, 0, 0)]);

        world.finish_save(Point3::new(0, 0, -1));
        assert!(!world.is_saving(Point3::new(0, 0, -1)));
        let update = world.update_visibility(&view, &projection);
        assert_eq!(update.to_load, vec![Point3::new(0, 0, 0), Point3::new(0, 0, -1)]);
    }

    #[test]
    fn test_save_modified_skips_clean_chunks() {
        let cache = Arc::new(MemoryChunkCache::new(8).expect("capacity"));
        let mut world = World::new(config(2), Arc::new(EmptyGenerator), cache.clone());
        world.load_chunk(Point3::new(0, 0, 0));
        world.load_chunk(Point3::new(1, 0, 0));
        world.set_block(voxel(2, 0, 0), BlockType::WHITE.id());

        assert_eq!(world.save_modified(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(world.save_modified(), 0);
    }

    #[test]
    fn test_selection_across_chunks() {
        let mut world = empty_world(2);
        for x in -1..=0 {
            for z in -2..=0 {
                world.load_chunk(Point3::new(x, 0, z));
            }
        }
        world.set_block(voxel(0, 0, -3), 1);
        world.set_block(voxel(0, 0, -1), 1);
        world.set_block(voxel(-1, 0, -1), 1);

        let eye = Point3::new(0.5, 0.5, 0.5);
        let forward = Vector3::new(0.0, 0.0, -1.0);
        let hit = world.select_voxel(eye, forward).expect("column ahead");
        assert_eq!(hit.coordinate, voxel(0, 0, -1));
        assert!((hit.distance - 0.5).abs() < 1e-6);
        assert_eq!(world.select_voxel_nearest(eye, forward), Some(voxel(0, 0, -1)));

        world.remove_block(voxel(0, 0, -1));
        let hit = world.select_voxel(eye, forward).expect("farther voxel");
        assert_eq!(hit.coordinate, voxel(0, 0, -3));
        assert!((hit.distance - 2.5).abs() < 1e-6);
        assert!(world.select_voxel(eye, Vector3::new(0.0, 1.0, 0.0)).is_none());

        world.set_selection(Some(hit));
        assert_eq!(world.selection(), Some(hit));
    }

    #[test]
    fn test_face_voxels_cover_one_layer() {
        let voxels = face_voxels(Point3::new(-1, 0, 0), 4, BlockSide::BACK);
        assert_eq!(voxels.len(), 16);
        assert!(voxels.iter().all(|v| v.x == -1));
        let voxels = face_voxels(Point3::new(0, 0, 0), 4, BlockSide::BOTTOM);
        assert!(voxels.iter().all(|v| v.y == 0));
    }
}
