//! # Chunk Iteration Module
//!
//! This module provides an iterator over the non-air voxels of a chunk. It walks
//! the flat record array in layout order and skips air records, yielding the
//! world-space coordinate of each solid voxel together with its block type.

use crate::engine_state::voxels::{block::BlockTypeSize, coordinates::VoxelCoordinate};

use super::Chunk;

/// An iterator over all non-air voxels in a chunk.
pub struct SolidVoxelIterator<'a> {
    /// Reference to the chunk being iterated over
    chunk_ref: &'a Chunk,
    /// Next index into the record array to inspect
    current_offset: usize,
}

impl<'a> SolidVoxelIterator<'a> {
    /// Creates an iterator positioned before the first record of `chunk_ref`.
    pub fn new(chunk_ref: &'a Chunk) -> Self {
        SolidVoxelIterator {
            chunk_ref,
            current_offset: 0,
        }
    }
}

impl Iterator for SolidVoxelIterator<'_> {
    type Item = (VoxelCoordinate, BlockTypeSize);

    fn next(&mut self) -> Option<Self::Item> {
        let records = self.chunk_ref.records();
        while self.current_offset < records.len() {
            let offset = self.current_offset;
            self.current_offset += 1;
            let record = &records[offset];
            if !record.is_air() {
                return Some((self.chunk_ref.voxel_at_index(offset), record.block_type()));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.chunk_ref.records().len() - self.current_offset;
        (0, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;

    #[test]
    fn test_iteration_skips_air_and_follows_layout() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0), 2, 15);
        chunk.set_block_type(Point3::new(0, 1, 0), 3);
        chunk.set_block_type(Point3::new(1, 0, 1), 2);
        chunk.set_block_type(Point3::new(1, 0, 0), 1);

        let solid: Vec<_> = chunk.iter_solid().collect();
        assert_eq!(
            solid,
            vec![
                (Point3::new(1, 0, 0), 1),
                (Point3::new(1, 0, 1), 2),
                (Point3::new(0, 1, 0), 3),
            ]
        );
    }

    #[test]
    fn test_empty_chunk_yields_nothing() {
        let chunk = Chunk::new(Point3::new(-4, -4, -4), 4, 15);
        assert_eq!(chunk.iter_solid().next(), None);
    }
}
