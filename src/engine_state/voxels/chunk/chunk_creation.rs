//! # Chunk Creation Module
//!
//! This module provides a builder that fills a chunk one block type at a time in
//! record layout order (X fastest, then Z, then Y). Terrain generators use it so
//! they only have to produce a stream of block types.

use cgmath::Point3;

use crate::engine_state::voxels::{block::block_type::BlockType, coordinates::VoxelCoordinate};

use super::Chunk;

/// A builder that populates a chunk sequentially.
pub struct ChunkCreationIterator {
    /// The chunk being filled
    chunk: Chunk,
    /// Current X position within the chunk
    local_x: i32,
    /// Current Y position within the chunk
    local_y: i32,
    /// Current Z position within the chunk
    local_z: i32,
}

impl ChunkCreationIterator {
    /// Creates a builder for an all-air chunk at `origin`.
    ///
    /// # Arguments
    /// * `origin` - World-space minimum corner of the chunk
    /// * `size` - Edge length in voxels
    /// * `max_light` - Highest light intensity the chunk accepts
    pub fn new(origin: VoxelCoordinate, size: i32, max_light: u8) -> Self {
        ChunkCreationIterator {
            chunk: Chunk::new(origin, size, max_light),
            local_x: 0,
            local_y: 0,
            local_z: 0,
        }
    }

    /// World-space coordinate of the voxel the next push writes, or `None`
    /// once the chunk is full.
    pub fn current_voxel(&self) -> Option<VoxelCoordinate> {
        if self.is_full() {
            return None;
        }
        let origin = self.chunk.origin();
        Some(Point3::new(
            origin.x + self.local_x,
            origin.y + self.local_y,
            origin.z + self.local_z,
        ))
    }

    pub fn is_full(&self) -> bool {
        self.local_y >= self.chunk.size()
    }

    /// Writes `block_type` at the current position and advances.
    ///
    /// # Panics
    /// Panics if the chunk is already full.
    pub fn push_block_type(&mut self, block_type: BlockType) {
        let voxel = match self.current_voxel() {
            Some(voxel) => voxel,
            None => panic!("chunk at {:?} is already full", self.chunk.origin()),
        };
        if block_type.is_solid() {
            self.chunk.set_block_type(voxel, block_type.id());
        }

        self.local_x += 1;
        if self.local_x == self.chunk.size() {
            self.local_x = 0;
            self.local_z += 1;
            if self.local_z == self.chunk.size() {
                self.local_z = 0;
                self.local_y += 1;
            }
        }
    }

    /// Finalizes the chunk: computes in-chunk adjacency and clears the modified
    /// flag, since a freshly generated chunk has nothing to persist yet.
    ///
    /// Positions never pushed stay air.
    pub fn return_chunk(mut self) -> Chunk {
        self.chunk.refresh_all_adjacency();
        self.chunk.mark_saved();
        self.chunk
    }
}
