//! # Block Module
//!
//! This module provides the block-level vocabulary of the voxel engine: block
//! type identifiers, voxel faces, and the packed per-voxel record that chunks
//! store and hand to the GPU.

pub mod block_side;
pub mod block_type;

use block_side::BlockSide;

/// The underlying integer type used to represent block types in memory.
///
/// Only the low 26 bits are usable; the record packs them above the
/// adjacency mask.
pub type BlockTypeSize = u32;

/// Largest block identifier that fits the 26-bit block-type field.
pub const MAX_BLOCK_TYPE: BlockTypeSize = (1 << 26) - 1;

/// Largest valid adjacency mask (one bit per face).
pub const MAX_ADJACENCY: u8 = 0b11_1111;

const ADJACENCY_BITS: u32 = 6;
const ADJACENCY_MASK: u32 = (1 << ADJACENCY_BITS) - 1;
const LIGHT_BITS: u32 = 4;
const LIGHT_MASK: u32 = (1 << LIGHT_BITS) - 1;

/// One voxel slot of a chunk's flat array.
///
/// # Memory Layout
/// Two 32-bit words, uploaded to the GPU as-is:
///
/// * `vbits`: bits 0-5 adjacency mask (bit `i` = face `i` touches a
///   non-air neighbour), bits 6-31 block type
/// * `lbits`: six 4-bit light intensities, nibble `i` for face `i`
///
/// The `#[repr(C)]` attribute keeps the layout stable so the whole array can
/// be reinterpreted as bytes or as two `f32` per voxel.
#[repr(C)]
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable, serde::Serialize,
    serde::Deserialize,
)]
pub struct VoxelRecord {
    pub vbits: u32,
    pub lbits: u32,
}

impl VoxelRecord {
    /// Number of 32-bit words per record.
    pub const WIDTH: usize = 2;

    pub fn block_type(&self) -> BlockTypeSize {
        self.vbits >> ADJACENCY_BITS
    }

    /// Replaces the block type, leaving the adjacency bits untouched.
    ///
    /// # Panics
    /// Panics if `block_type` does not fit in 26 bits.
    pub fn set_block_type(&mut self, block_type: BlockTypeSize) {
        assert!(
            block_type <= MAX_BLOCK_TYPE,
            "block type {} does not fit in 26 bits",
            block_type
        );
        self.vbits = (self.vbits & ADJACENCY_MASK) | (block_type << ADJACENCY_BITS);
    }

    pub fn adjacency(&self) -> u8 {
        (self.vbits & ADJACENCY_MASK) as u8
    }

    /// Replaces the adjacency mask, leaving the block type untouched.
    ///
    /// # Panics
    /// Panics if `mask` has bits above the six face bits.
    pub fn set_adjacency(&mut self, mask: u8) {
        assert!(
            mask <= MAX_ADJACENCY,
            "adjacency mask {:#b} uses more than 6 bits",
            mask
        );
        self.vbits = (self.vbits & !ADJACENCY_MASK) | mask as u32;
    }

    pub fn lighting(&self, side: BlockSide) -> u8 {
        ((self.lbits >> Self::light_shift(side)) & LIGHT_MASK) as u8
    }

    /// Replaces one face's light nibble, leaving the other five untouched.
    ///
    /// # Panics
    /// Panics if `intensity` does not fit in a nibble. Chunks enforce their
    /// configured maximum before calling this.
    pub fn set_lighting(&mut self, side: BlockSide, intensity: u8) {
        assert!(
            intensity as u32 <= LIGHT_MASK,
            "light intensity {} does not fit in 4 bits",
            intensity
        );
        let shift = Self::light_shift(side);
        self.lbits = (self.lbits & !(LIGHT_MASK << shift)) | ((intensity as u32) << shift);
    }

    pub fn is_air(&self) -> bool {
        self.block_type() == block_type::BlockType::AIR.id()
    }

    fn light_shift(side: BlockSide) -> u32 {
        side.index() as u32 * LIGHT_BITS
    }
}
