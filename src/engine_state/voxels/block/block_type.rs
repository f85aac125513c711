//! # Block Type Module
//!
//! This module defines the named block types of the voxel world and their
//! conversion to and from the raw identifiers stored in chunk records.

use num_derive::FromPrimitive;

use super::{BlockTypeSize, MAX_BLOCK_TYPE};

/// Enumerates the built-in block types.
///
/// The `FromPrimitive` derive allows conversion from the raw identifiers in
/// the packed chunk records. Identifiers without a named variant are still
/// legal in a chunk; they simply have no `BlockType`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// An air block, which is non-solid and transparent.
    AIR = 0,

    /// A basic dirt block, used as a common building material.
    DIRT = 1,

    /// A grass block with different textures on top and sides.
    GRASS = 2,

    /// A wooden block with a bark texture on all sides.
    WOOD = 3,

    /// A plain white block, often used for testing.
    WHITE = 4,

    /// Bare rock, the filler of generated terrain.
    STONE = 5,
}

impl BlockType {
    /// Converts a raw block identifier to a `BlockType`.
    ///
    /// # Returns
    /// `None` for identifiers that have no named variant.
    pub fn from_id(id: BlockTypeSize) -> Option<Self> {
        num::FromPrimitive::from_u32(id)
    }

    /// The raw identifier stored in chunk records.
    pub fn id(self) -> BlockTypeSize {
        let id = self as BlockTypeSize;
        debug_assert!(id <= MAX_BLOCK_TYPE);
        id
    }

    /// Returns `true` for every type except air.
    pub fn is_solid(self) -> bool {
        self != BlockType::AIR
    }

    /// Generates a random solid block type (excluding AIR).
    ///
    /// Used by the random and Perlin terrain generators.
    pub fn get_random_type(rng: &mut fastrand::Rng) -> Self {
        Self::from_id(rng.u32(1..=5)).unwrap_or(BlockType::DIRT)
    }
}
