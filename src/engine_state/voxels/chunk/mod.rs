//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a fixed-size cube of voxels stored
//! as one flat array of packed [`VoxelRecord`]s, plus an optional octree over
//! its non-air voxels.
//!
//! ## Memory Layout
//!
//! The record for the voxel at chunk-local `(i, j, k)` lives at index
//! `i + k * size + j * size²`: X varies fastest, then Z, then Y, so a chunk
//! is a stack of horizontal planes. Each record is two 32-bit words (see
//! [`VoxelRecord`]), so the array can be uploaded to the GPU unchanged via
//! [`Chunk::as_bytes`] or [`Chunk::as_f32_slice`].
//!
//! ## Invariants
//!
//! Every accessor takes a world-space [`VoxelCoordinate`] and panics if it lies
//! outside the chunk. Out-of-range adjacency masks, block types and light
//! values panic too. A chunk's octree, once initialised, is kept in sync with
//! the block types in the flat array.

use cgmath::Point3;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::{
    aabc::Aabc,
    block::{block_side::BlockSide, block_type::BlockType, BlockTypeSize, VoxelRecord},
    coordinates::{chunk_coordinate_of, chunk_origin, ChunkCoordinate, VoxelCoordinate},
    octree::Octree,
};
use crate::config::LIGHT_NIBBLE_MAX;

pub mod chunk_cache;
pub mod chunk_creation;
pub mod chunk_generation;
pub mod chunk_iteration;

use chunk_iteration::SolidVoxelIterator;

/// A cube of `size³` voxels.
#[derive(Clone, Debug)]
pub struct Chunk {
    /// World-space minimum corner
    origin: VoxelCoordinate,
    /// Edge length in voxels
    size: i32,
    /// Highest light intensity accepted by `set_lighting`
    max_light: u8,
    /// One record per voxel, laid out as described in the module docs
    records: Vec<VoxelRecord>,
    /// Index over the non-air voxels, payload = block type
    octree: Option<Octree<BlockTypeSize>>,
    /// Set by every mutation, cleared by `mark_saved`
    modified: bool,
}

impl Chunk {
    /// Creates an all-air chunk whose minimum corner is `origin`.
    ///
    /// # Arguments
    /// * `origin` - World-space minimum corner
    /// * `size` - Edge length in voxels
    /// * `max_light` - Highest light intensity accepted, at most 15
    ///
    /// # Panics
    /// Panics if `size` is not positive or `max_light` exceeds a nibble.
    pub fn new(origin: VoxelCoordinate, size: i32, max_light: u8) -> Self {
        assert!(size > 0, "chunk size must be positive, got {}", size);
        assert!(
            max_light <= LIGHT_NIBBLE_MAX,
            "max light {} does not fit in a nibble",
            max_light
        );
        let volume = (size as usize).pow(3);
        Chunk {
            origin,
            size,
            max_light,
            records: vec![VoxelRecord::default(); volume],
            octree: None,
            modified: false,
        }
    }

    /// Creates an all-air chunk at chunk-space coordinate `position`.
    pub fn at(position: ChunkCoordinate, size: i32, max_light: u8) -> Self {
        Self::new(chunk_origin(position, size), size, max_light)
    }

    pub fn origin(&self) -> VoxelCoordinate {
        self.origin
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn max_light(&self) -> u8 {
        self.max_light
    }

    /// Chunk-space coordinate of this chunk.
    pub fn position(&self) -> ChunkCoordinate {
        chunk_coordinate_of(self.origin, self.size)
    }

    /// The cube of voxel space the chunk covers.
    pub fn aabc(&self) -> Aabc {
        Aabc::new(self.origin, self.size)
    }

    /// Returns `true` if `voxel` lies inside the chunk.
    pub fn contains(&self, voxel: VoxelCoordinate) -> bool {
        self.aabc().contains(voxel)
    }

    pub fn block_type(&self, voxel: VoxelCoordinate) -> BlockTypeSize {
        self.records[self.offset(voxel)].block_type()
    }

    /// Writes a voxel's block type, keeping the octree (if any) in sync.
    ///
    /// # Panics
    /// Panics if `voxel` is outside the chunk or `block_type` needs more than
    /// 26 bits.
    pub fn set_block_type(&mut self, voxel: VoxelCoordinate, block_type: BlockTypeSize) {
        let offset = self.offset(voxel);
        self.records[offset].set_block_type(block_type);
        self.modified = true;

        if let Some(octree) = self.octree.as_mut() {
            if block_type == BlockType::AIR.id() {
                octree.remove(voxel);
            } else {
                octree.insert(voxel, block_type);
            }
        }
    }

    pub fn is_air(&self, voxel: VoxelCoordinate) -> bool {
        self.records[self.offset(voxel)].is_air()
    }

    pub fn adjacency(&self, voxel: VoxelCoordinate) -> u8 {
        self.records[self.offset(voxel)].adjacency()
    }

    /// # Panics
    /// Panics if `voxel` is outside the chunk or `mask` uses more than 6 bits.
    pub fn set_adjacency(&mut self, voxel: VoxelCoordinate, mask: u8) {
        let offset = self.offset(voxel);
        self.records[offset].set_adjacency(mask);
        self.modified = true;
    }

    pub fn lighting(&self, voxel: VoxelCoordinate, side: BlockSide) -> u8 {
        self.records[self.offset(voxel)].lighting(side)
    }

    /// # Panics
    /// Panics if `voxel` is outside the chunk or `intensity` exceeds the
    /// chunk's maximum light.
    pub fn set_lighting(&mut self, voxel: VoxelCoordinate, side: BlockSide, intensity: u8) {
        assert!(
            intensity <= self.max_light,
            "light intensity {} exceeds maximum {}",
            intensity,
            self.max_light
        );
        let offset = self.offset(voxel);
        self.records[offset].set_lighting(side, intensity);
        self.modified = true;
    }

    /// Adjacency mask of `voxel` as seen from this chunk's own data.
    ///
    /// Neighbours outside the chunk are resolved by `outside_is_solid`.
    pub fn compute_adjacency<F>(&self, voxel: VoxelCoordinate, mut outside_is_solid: F) -> u8
    where
        F: FnMut(VoxelCoordinate) -> bool,
    {
        BlockSide::all().iter().fold(0, |mask, side| {
            let neighbour = voxel + side.offset();
            let solid = if self.contains(neighbour) {
                !self.is_air(neighbour)
            } else {
                outside_is_solid(neighbour)
            };
            if solid {
                mask | side.bit()
            } else {
                mask
            }
        })
    }

    /// Recomputes one voxel's adjacency mask, treating the outside as air.
    ///
    /// Adjacency is derived from block types, so refreshing it does not mark
    /// the chunk modified.
    pub fn refresh_adjacency(&mut self, voxel: VoxelCoordinate) {
        let mask = self.compute_adjacency(voxel, |_| false);
        self.store_adjacency(voxel, mask);
    }

    /// Recomputes every adjacency mask, treating the outside as air.
    pub fn refresh_all_adjacency(&mut self) {
        for index in 0..self.records.len() {
            let voxel = self.voxel_at_index(index);
            let mask = self.compute_adjacency(voxel, |_| false);
            self.records[index].set_adjacency(mask);
        }
    }

    /// Writes a derived adjacency mask without touching the modified flag.
    pub(crate) fn store_adjacency(&mut self, voxel: VoxelCoordinate, mask: u8) {
        let offset = self.offset(voxel);
        self.records[offset].set_adjacency(mask);
    }

    /// Builds the octree over the chunk's current non-air voxels.
    ///
    /// # Panics
    /// Panics if the chunk already has an octree.
    pub fn init_octree(&mut self) {
        assert!(
            self.octree.is_none(),
            "chunk at {:?} already has an octree",
            self.origin
        );
        self.octree = Some(Octree::from_voxels(self.iter_solid()));
    }

    pub fn octree(&self) -> Option<&Octree<BlockTypeSize>> {
        self.octree.as_ref()
    }

    /// Turns `voxel` into air and removes it from the octree.
    ///
    /// # Returns
    /// `true` if the octree held the voxel.
    ///
    /// # Panics
    /// Panics if the chunk has no octree or `voxel` is outside the chunk.
    pub fn remove_voxel(&mut self, voxel: VoxelCoordinate) -> bool {
        let offset = self.offset(voxel);
        let octree = match self.octree.as_mut() {
            Some(octree) => octree,
            None => panic!(
                "cannot remove {:?}: chunk at {:?} has no octree",
                voxel, self.origin
            ),
        };
        let removed = octree.remove(voxel).is_some();
        self.records[offset].set_block_type(BlockType::AIR.id());
        self.modified = true;
        removed
    }

    /// Iterates over `(voxel, block_type)` for every non-air voxel.
    pub fn iter_solid(&self) -> SolidVoxelIterator<'_> {
        SolidVoxelIterator::new(self)
    }

    /// Number of non-air voxels.
    pub fn solid_count(&self) -> usize {
        self.records.iter().filter(|record| !record.is_air()).count()
    }

    /// The flat record array, in layout order.
    pub fn records(&self) -> &[VoxelRecord] {
        &self.records
    }

    /// The flat record array as raw bytes, ready for a GPU buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.records)
    }

    /// The flat record array as two bit-reinterpreted floats per voxel.
    pub fn as_f32_slice(&self) -> &[f32] {
        bytemuck::cast_slice(&self.records)
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Clears the modified flag after the chunk has been persisted.
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// World-space voxel stored at flat index `index`.
    pub fn voxel_at_index(&self, index: usize) -> VoxelCoordinate {
        let size = self.size as usize;
        let i = index % size;
        let k = (index / size) % size;
        let j = index / (size * size);
        Point3::new(
            self.origin.x + i as i32,
            self.origin.y + j as i32,
            self.origin.z + k as i32,
        )
    }

    /// Flat index of `voxel`.
    ///
    /// # Panics
    /// Panics if `voxel` is outside the chunk.
    fn offset(&self, voxel: VoxelCoordinate) -> usize {
        assert!(
            self.contains(voxel),
            "voxel {:?} is outside chunk at {:?} with size {}",
            voxel,
            self.origin,
            self.size
        );
        let i = (voxel.x - self.origin.x) as usize;
        let j = (voxel.y - self.origin.y) as usize;
        let k = (voxel.z - self.origin.z) as usize;
        let size = self.size as usize;
        i + j * size * size + k * size
    }

    /// Captures the chunk's data (not its octree) for a cache.
    pub fn to_snapshot(&self) -> ChunkSnapshot {
        ChunkSnapshot {
            origin: self.origin.into(),
            size: self.size,
            max_light: self.max_light,
            records: self.records.clone(),
        }
    }

    /// Rebuilds a chunk from a snapshot. The result has no octree and is not
    /// marked modified.
    ///
    /// # Errors
    /// `CorruptChunk` if the snapshot's record count does not match its size
    /// or its light maximum does not fit a nibble.
    pub fn from_snapshot(snapshot: ChunkSnapshot) -> EngineResult<Self> {
        if snapshot.size <= 0 {
            return Err(EngineError::CorruptChunk(format!(
                "non-positive chunk size {}",
                snapshot.size
            )));
        }
        if snapshot.max_light > LIGHT_NIBBLE_MAX {
            return Err(EngineError::CorruptChunk(format!(
                "max light {} does not fit in a nibble",
                snapshot.max_light
            )));
        }
        let expected = (snapshot.size as usize).pow(3);
        if snapshot.records.len() != expected {
            return Err(EngineError::CorruptChunk(format!(
                "expected {} records, found {}",
                expected,
                snapshot.records.len()
            )));
        }
        Ok(Chunk {
            origin: snapshot.origin.into(),
            size: snapshot.size,
            max_light: snapshot.max_light,
            records: snapshot.records,
            octree: None,
            modified: false,
        })
    }
}

/// Serializable form of a chunk's flat data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkSnapshot {
    pub origin: [i32; 3],
    pub size: i32,
    #[serde(default = "default_max_light")]
    pub max_light: u8,
    pub records: Vec<VoxelRecord>,
}

fn default_max_light() -> u8 {
    LIGHT_NIBBLE_MAX
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voxel(x: i32, y: i32, z: i32) -> VoxelCoordinate {
        Point3::new(x, y, z)
    }

    #[test]
    fn test_new_chunk_is_air() {
        let chunk = Chunk::at(Point3::new(1, -1, 0), 4, 15);
        assert_eq!(chunk.origin(), voxel(4, -4, 0));
        assert_eq!(chunk.position(), Point3::new(1, -1, 0));
        assert_eq!(chunk.records().len(), 64);
        assert_eq!(chunk.solid_count(), 0);
        assert!(!chunk.is_modified());
    }

    #[test]
    fn test_record_offsets_follow_layout() {
        let mut chunk = Chunk::new(voxel(10, 20, 30), 4, 15);
        chunk.set_block_type(voxel(11, 22, 33), 7);
        // i = 1, j = 2, k = 3 -> 1 + 2 * 16 + 3 * 4
        assert_eq!(chunk.records()[45].block_type(), 7);
        assert_eq!(chunk.voxel_at_index(45), voxel(11, 22, 33));
    }

    #[test]
    fn test_fields_do_not_disturb_each_other() {
        let mut chunk = Chunk::new(voxel(0, 0, 0), 2, 15);
        let v = voxel(1, 0, 1);
        chunk.set_block_type(v, BlockType::STONE.id());
        chunk.set_adjacency(v, 0b01_0110);
        chunk.set_lighting(v, BlockSide::TOP, 11);
        chunk.set_lighting(v, BlockSide::FRONT, 4);
        assert_eq!(chunk.block_type(v), BlockType::STONE.id());
        assert_eq!(chunk.adjacency(v), 0b01_0110);
        assert_eq!(chunk.lighting(v, BlockSide::TOP), 11);
        assert_eq!(chunk.lighting(v, BlockSide::FRONT), 4);

        chunk.set_block_type(v, BlockType::GRASS.id());
        assert_eq!(chunk.adjacency(v), 0b01_0110);
        assert_eq!(chunk.lighting(v, BlockSide::TOP), 11);
        assert_eq!(chunk.block_type(voxel(0, 0, 0)), BlockType::AIR.id());
    }

    #[test]
    fn test_every_face_and_intensity_round_trips() {
        let mut chunk = Chunk::new(voxel(0, 0, 0), 1, 15);
        let v = voxel(0, 0, 0);
        for side in BlockSide::all() {
            for intensity in 0..=15 {
                chunk.set_lighting(v, side, intensity);
                assert_eq!(chunk.lighting(v, side), intensity);
            }
            chunk.set_lighting(v, side, side.index() as u8);
        }
        for side in BlockSide::all() {
            assert_eq!(chunk.lighting(v, side), side.index() as u8);
        }
    }

    #[test]
    #[should_panic(expected = "outside chunk")]
    fn test_out_of_bounds_access_panics() {
        let chunk = Chunk::new(voxel(-1, -1, -1), 2, 15);
        chunk.block_type(voxel(-1, -1, 1));
    }

    #[test]
    #[should_panic(expected = "exceeds maximum")]
    fn test_light_above_configured_maximum_panics() {
        let mut chunk = Chunk::new(voxel(0, 0, 0), 2, 8);
        chunk.set_lighting(voxel(0, 0, 0), BlockSide::TOP, 9);
    }

    #[test]
    #[should_panic(expected = "6 bits")]
    fn test_invalid_adjacency_panics() {
        let mut chunk = Chunk::new(voxel(0, 0, 0), 2, 15);
        chunk.set_adjacency(voxel(0, 0, 0), 64);
    }

    #[test]
    fn test_adjacency_tracks_in_chunk_neighbours() {
        let mut chunk = Chunk::new(voxel(0, 0, 0), 3, 15);
        let center = voxel(1, 1, 1);
        chunk.set_block_type(center, BlockType::DIRT.id());
        chunk.set_block_type(voxel(1, 2, 1), BlockType::DIRT.id());
        chunk.set_block_type(voxel(0, 1, 1), BlockType::DIRT.id());
        chunk.refresh_all_adjacency();
        assert_eq!(
            chunk.adjacency(center),
            BlockSide::TOP.bit() | BlockSide::FRONT.bit()
        );
        assert_eq!(chunk.adjacency(voxel(1, 2, 1)), BlockSide::BOTTOM.bit());
        let edge_mask = chunk.compute_adjacency(voxel(0, 1, 1), |_| true);
        assert_eq!(edge_mask, BlockSide::BACK.bit() | BlockSide::FRONT.bit());
    }

    #[test]
    fn test_refresh_adjacency_updates_one_voxel_only() {
        let mut chunk = Chunk::new(voxel(0, 0, 0), 3, 15);
        let center = voxel(1, 1, 1);
        chunk.set_block_type(center, BlockType::DIRT.id());
        chunk.set_block_type(voxel(1, 2, 1), BlockType::DIRT.id());
        chunk.refresh_all_adjacency();
        chunk.mark_saved();

        chunk.set_block_type(voxel(1, 2, 1), BlockType::AIR.id());
        chunk.set_block_type(voxel(0, 1, 1), BlockType::DIRT.id());
        chunk.mark_saved();
        chunk.refresh_adjacency(center);

        assert_eq!(chunk.adjacency(center), BlockSide::FRONT.bit());
        // The voxel above keeps its stale mask.
        assert_eq!(chunk.adjacency(voxel(1, 2, 1)), BlockSide::BOTTOM.bit());
        assert!(!chunk.is_modified());
    }

    #[test]
    fn test_octree_follows_block_changes() {
        let mut chunk = Chunk::new(voxel(0, 0, 0), 4, 15);
        chunk.set_block_type(voxel(1, 1, 1), BlockType::WOOD.id());
        chunk.init_octree();
        let octree = chunk.octree().expect("initialised");
        assert_eq!(octree.get(voxel(1, 1, 1)), Some(&BlockType::WOOD.id()));

        chunk.set_block_type(voxel(2, 3, 0), BlockType::DIRT.id());
        assert!(chunk.octree().map_or(false, |tree| tree.contains(voxel(2, 3, 0))));

        chunk.set_block_type(voxel(2, 3, 0), BlockType::AIR.id());
        assert!(!chunk.octree().map_or(true, |tree| tree.contains(voxel(2, 3, 0))));

        assert!(chunk.remove_voxel(voxel(1, 1, 1)));
        assert!(chunk.is_air(voxel(1, 1, 1)));
        assert!(chunk.octree().map_or(false, |tree| tree.is_empty()));
        assert!(!chunk.remove_voxel(voxel(3, 3, 3)));
    }

    #[test]
    #[should_panic(expected = "already has an octree")]
    fn test_double_octree_initialisation_panics() {
        let mut chunk = Chunk::new(voxel(0, 0, 0), 2, 15);
        chunk.init_octree();
        chunk.init_octree();
    }

    #[test]
    #[should_panic(expected = "has no octree")]
    fn test_remove_without_octree_panics() {
        let mut chunk = Chunk::new(voxel(0, 0, 0), 2, 15);
        chunk.remove_voxel(voxel(0, 0, 0));
    }

    #[test]
    fn test_snapshot_round_trip_keeps_data() {
        let mut chunk = Chunk::new(voxel(-8, 0, 8), 2, 15);
        chunk.set_block_type(voxel(-7, 1, 9), 42);
        chunk.set_lighting(voxel(-8, 0, 8), BlockSide::RIGHT, 15);
        let restored = Chunk::from_snapshot(chunk.to_snapshot()).expect("valid snapshot");
        assert_eq!(restored.records(), chunk.records());
        assert_eq!(restored.max_light(), 15);
        assert_eq!(restored.origin(), chunk.origin());
        assert!(!restored.is_modified());
        assert!(restored.octree().is_none());
    }

    #[test]
    fn test_truncated_snapshot_is_rejected() {
        let mut snapshot = Chunk::new(voxel(0, 0, 0), 2, 15).to_snapshot();
        snapshot.records.pop();
        assert!(matches!(
            Chunk::from_snapshot(snapshot),
            Err(EngineError::CorruptChunk(_))
        ));
    }

    #[test]
    fn test_gpu_views_cover_two_words_per_voxel() {
        let chunk = Chunk::new(voxel(0, 0, 0), 4, 15);
        assert_eq!(chunk.as_f32_slice().len(), 64 * VoxelRecord::WIDTH);
        assert_eq!(chunk.as_bytes().len(), 64 * 8);
    }
}
