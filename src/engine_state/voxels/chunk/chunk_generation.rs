//! # Chunk Generation Module
//!
//! This module provides the terrain generators that produce new chunks when the
//! world has nothing cached for a chunk coordinate. Every generator fills a
//! [`ChunkCreationIterator`] in record layout order.
//!
//! Multiple terrain generation strategies are supported:
//! - Perlin noise for natural-looking terrain with caves and overhangs
//! - Flat ground at a fixed height
//! - Checkerboard pattern for testing
//! - Solid chunks (all blocks filled)
//! - Empty chunks (all blocks air)
//! - Random sparse blocks

use noise::{NoiseFn, Perlin};

use crate::config::GenerationMethod;
use crate::engine_state::voxels::{
    block::block_type::BlockType,
    coordinates::{chunk_origin, ChunkCoordinate, VoxelCoordinate},
};

use super::{chunk_creation::ChunkCreationIterator, Chunk};

/// Threshold above which Perlin noise is considered solid for terrain generation.
pub const PERLIN_POSITIVE_THRESHOLD: f64 = 0.2;
/// Threshold below which Perlin noise is considered solid for terrain generation.
pub const PERLIN_NEGATIVE_THRESHOLD: f64 = -0.2;
/// Scaling factor applied to world coordinates when sampling Perlin noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;

/// Produces the initial contents of a chunk.
///
/// Generators are shared with background workers, so they must be `Send + Sync`
/// and must not rely on any world state.
pub trait ChunkGenerator: Send + Sync {
    /// Generates the chunk at chunk-space coordinate `position`.
    ///
    /// # Arguments
    /// * `position` - Chunk coordinate of the new chunk
    /// * `chunk_size` - Edge length in voxels
    /// * `max_light` - Highest light intensity the chunk accepts
    ///
    /// # Returns
    /// A chunk with in-chunk adjacency computed, no octree and a clear modified
    /// flag.
    fn generate_chunk(&self, position: ChunkCoordinate, chunk_size: i32, max_light: u8) -> Chunk;
}

/// Fills every voxel by asking `block_at` for its block type.
fn generate_with<F>(position: ChunkCoordinate, chunk_size: i32, max_light: u8, mut block_at: F) -> Chunk
where
    F: FnMut(VoxelCoordinate) -> BlockType,
{
    let mut cci = ChunkCreationIterator::new(chunk_origin(position, chunk_size), chunk_size, max_light);
    while let Some(voxel) = cci.current_voxel() {
        cci.push_block_type(block_at(voxel));
    }
    cci.return_chunk()
}

/// Terrain from thresholded 3D Perlin noise.
pub struct PerlinGenerator {
    seed: u32,
    perlin: Perlin,
}

impl PerlinGenerator {
    pub fn new(seed: u32) -> Self {
        PerlinGenerator {
            seed,
            perlin: Perlin::new(seed),
        }
    }

    /// Converts a world-space voxel coordinate to a Perlin sampling position.
    fn to_perlin_pos(pos: VoxelCoordinate, scale_factor: f64) -> [f64; 3] {
        [
            (pos.x as f64 * scale_factor),
            (pos.y as f64 * scale_factor),
            (pos.z as f64 * scale_factor),
        ]
    }

    /// Per-chunk RNG seed, so regenerating a chunk yields the same block types.
    fn chunk_seed(&self, position: ChunkCoordinate) -> u64 {
        let mut seed = self.seed as u64;
        for component in [position.x, position.y, position.z] {
            seed = seed
                .wrapping_mul(0x9E37_79B9_7F4A_7C15)
                .wrapping_add(component as u32 as u64);
        }
        seed
    }
}

impl ChunkGenerator for PerlinGenerator {
    fn generate_chunk(&self, position: ChunkCoordinate, chunk_size: i32, max_light: u8) -> Chunk {
        let mut rng = fastrand::Rng::with_seed(self.chunk_seed(position));
        generate_with(position, chunk_size, max_light, |voxel| {
            let perlin_sample = self
                .perlin
                .get(Self::to_perlin_pos(voxel, PERLIN_SCALE_FACTOR));
            if !(PERLIN_NEGATIVE_THRESHOLD..=PERLIN_POSITIVE_THRESHOLD).contains(&perlin_sample) {
                BlockType::get_random_type(&mut rng)
            } else {
                BlockType::AIR
            }
        })
    }
}

/// Flat ground: everything below `height` is solid.
///
/// The top layer is grass, the three below it dirt, the rest stone.
pub struct FlatGenerator {
    height: i32,
}

impl FlatGenerator {
    pub fn new(height: i32) -> Self {
        FlatGenerator { height }
    }
}

impl ChunkGenerator for FlatGenerator {
    fn generate_chunk(&self, position: ChunkCoordinate, chunk_size: i32, max_light: u8) -> Chunk {
        generate_with(position, chunk_size, max_light, |voxel| {
            let depth = self.height - 1 - voxel.y;
            match depth {
                d if d < 0 => BlockType::AIR,
                0 => BlockType::GRASS,
                1..=3 => BlockType::DIRT,
                _ => BlockType::STONE,
            }
        })
    }
}

/// Alternates solid and air voxels in a 3D grid.
pub struct CheckerboardGenerator;

impl ChunkGenerator for CheckerboardGenerator {
    fn generate_chunk(&self, position: ChunkCoordinate, chunk_size: i32, max_light: u8) -> Chunk {
        generate_with(position, chunk_size, max_light, |voxel| {
            if (voxel.x + voxel.y + voxel.z).rem_euclid(2) == 0 {
                BlockType::DIRT
            } else {
                BlockType::AIR
            }
        })
    }
}

/// Every voxel is dirt.
pub struct SolidGenerator;

impl ChunkGenerator for SolidGenerator {
    fn generate_chunk(&self, position: ChunkCoordinate, chunk_size: i32, max_light: u8) -> Chunk {
        generate_with(position, chunk_size, max_light, |_| BlockType::DIRT)
    }
}

/// Every voxel is air.
pub struct EmptyGenerator;

impl ChunkGenerator for EmptyGenerator {
    fn generate_chunk(&self, position: ChunkCoordinate, chunk_size: i32, max_light: u8) -> Chunk {
        Chunk::at(position, chunk_size, max_light)
    }
}

/// Random dirt blocks; `sparseness` is the probability of air.
pub struct RandomGenerator {
    sparseness: f64,
}

impl RandomGenerator {
    pub fn new(sparseness: f64) -> Self {
        RandomGenerator { sparseness }
    }
}

impl ChunkGenerator for RandomGenerator {
    fn generate_chunk(&self, position: ChunkCoordinate, chunk_size: i32, max_light: u8) -> Chunk {
        let mut rng = fastrand::Rng::new();
        generate_with(position, chunk_size, max_light, |_| {
            if rng.f64() < self.sparseness {
                BlockType::AIR
            } else {
                BlockType::DIRT
            }
        })
    }
}

/// Builds the generator selected in the world configuration.
pub fn generator_for(method: &GenerationMethod) -> Box<dyn ChunkGenerator> {
    match method {
        GenerationMethod::Perlin { seed } => Box::new(PerlinGenerator::new(*seed)),
        GenerationMethod::Flat { height } => Box::new(FlatGenerator::new(*height)),
        GenerationMethod::Checkerboard => Box::new(CheckerboardGenerator),
        GenerationMethod::Solid => Box::new(SolidGenerator),
        GenerationMethod::Empty => Box::new(EmptyGenerator),
        GenerationMethod::Random { sparseness } => Box::new(RandomGenerator::new(*sparseness)),
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;

    #[test]
    fn test_solid_and_empty_fill_whole_chunk() {
        let solid = SolidGenerator.generate_chunk(Point3::new(0, 0, 0), 4, 15);
        assert_eq!(solid.solid_count(), 64);
        assert_eq!(solid.adjacency(Point3::new(1, 1, 1)), 0b11_1111);
        assert_eq!(solid.adjacency(Point3::new(0, 0, 0)).count_ones(), 3);

        let empty = EmptyGenerator.generate_chunk(Point3::new(3, -2, 1), 4, 15);
        assert_eq!(empty.solid_count(), 0);
        assert_eq!(empty.origin(), Point3::new(12, -8, 4));
    }

    #[test]
    fn test_checkerboard_alternates() {
        let chunk = CheckerboardGenerator.generate_chunk(Point3::new(-1, 0, 0), 4, 15);
        assert_eq!(chunk.solid_count(), 32);
        assert!(!chunk.is_air(Point3::new(-4, 0, 0)));
        assert!(chunk.is_air(Point3::new(-3, 0, 0)));
        assert!(chunk.is_air(Point3::new(-4, 1, 0)));
        assert_eq!(chunk.adjacency(Point3::new(-4, 0, 0)), 0);
    }

    #[test]
    fn test_flat_layers() {
        let generator = FlatGenerator::new(6);
        let chunk = generator.generate_chunk(Point3::new(0, 0, 0), 8, 15);
        assert_eq!(chunk.block_type(Point3::new(0, 5, 0)), BlockType::GRASS.id());
        assert_eq!(chunk.block_type(Point3::new(0, 4, 0)), BlockType::DIRT.id());
        assert_eq!(chunk.block_type(Point3::new(0, 1, 0)), BlockType::STONE.id());
        assert!(chunk.is_air(Point3::new(0, 6, 0)));
        assert_eq!(chunk.solid_count(), 6 * 64);
    }

    #[test]
    fn test_perlin_is_deterministic_per_seed() {
        let first = PerlinGenerator::new(7).generate_chunk(Point3::new(2, 0, -1), 8, 15);
        let second = PerlinGenerator::new(7).generate_chunk(Point3::new(2, 0, -1), 8, 15);
        assert_eq!(first.records(), second.records());
        assert!(!first.is_modified());
    }

    #[test]
    fn test_random_extremes() {
        let all_air = RandomGenerator::new(1.0).generate_chunk(Point3::new(0, 0, 0), 4, 15);
        assert_eq!(all_air.solid_count(), 0);
        let all_dirt = RandomGenerator::new(0.0).generate_chunk(Point3::new(0, 0, 0), 4, 15);
        assert_eq!(all_dirt.solid_count(), 64);
    }

    #[test]
    fn test_generator_for_follows_config() {
        let chunk = generator_for(&GenerationMethod::Solid).generate_chunk(Point3::new(0, 0, 0), 2, 15);
        assert_eq!(chunk.solid_count(), 8);
        let chunk = generator_for(&GenerationMethod::Empty).generate_chunk(Point3::new(0, 0, 0), 2, 15);
        assert_eq!(chunk.solid_count(), 0);
    }
}
