//! # Block Side Module
//!
//! This module defines the six faces of a voxel. The face order is shared by
//! the adjacency mask (one bit per face) and the lighting nibbles (four bits
//! per face) of the packed chunk records.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// The discriminant is the face index used by the packed voxel records:
/// bit `i` of the adjacency mask and nibble `i` of the light field.
///
/// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The front face (facing negative X)
    FRONT = 0,

    /// The back face (facing positive X)
    BACK = 1,

    /// The bottom face (facing negative Y)
    BOTTOM = 2,

    /// The top face (facing positive Y)
    TOP = 3,

    /// The left face (facing negative Z)
    LEFT = 4,

    /// The right face (facing positive Z)
    RIGHT = 5,
}

/// Number of faces on a voxel.
pub const FACE_COUNT: usize = 6;

impl BlockSide {
    /// Returns an array containing all six block faces in face-index order.
    pub fn all() -> [BlockSide; FACE_COUNT] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// Converts a face index back into a face.
    ///
    /// # Returns
    /// `None` if `index` is not in `0..6`.
    pub fn from_index(index: usize) -> Option<BlockSide> {
        BlockSide::all().get(index).copied()
    }

    /// The face index, `0..6`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// This face's bit in the adjacency mask.
    pub fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Unit step from a voxel to the neighbour sharing this face.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::FRONT => Vector3::new(-1, 0, 0),
            BlockSide::BACK => Vector3::new(1, 0, 0),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::LEFT => Vector3::new(0, 0, -1),
            BlockSide::RIGHT => Vector3::new(0, 0, 1),
        }
    }

    /// The face on the neighbour that touches this one.
    pub fn opposite(self) -> BlockSide {
        match self {
            BlockSide::FRONT => BlockSide::BACK,
            BlockSide::BACK => BlockSide::FRONT,
            BlockSide::BOTTOM => BlockSide::TOP,
            BlockSide::TOP => BlockSide::BOTTOM,
            BlockSide::LEFT => BlockSide::RIGHT,
            BlockSide::RIGHT => BlockSide::LEFT,
        }
    }
}
