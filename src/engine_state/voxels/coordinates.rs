//! # Voxel and Chunk Coordinates
//!
//! Voxels are addressed by integer world-space coordinates, chunks by
//! integer chunk-space coordinates. Converting between the two uses floor
//! division so that voxel `-1` belongs to chunk `-1`, not chunk `0`.

use cgmath::{Point3, Vector3};

/// Integer world-space position of a single voxel.
pub type VoxelCoordinate = Point3<i32>;

/// Integer chunk-space position of a chunk (`floor(voxel / chunk_size)`).
pub type ChunkCoordinate = Point3<i32>;

/// Returns the chunk that owns `voxel`.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use voxel_octree_engine::voxels::coordinates::chunk_coordinate_of;
///
/// assert_eq!(chunk_coordinate_of(Point3::new(-1, 15, 16), 16), Point3::new(-1, 0, 1));
/// ```
pub fn chunk_coordinate_of(voxel: VoxelCoordinate, chunk_size: i32) -> ChunkCoordinate {
    Point3::new(
        voxel.x.div_euclid(chunk_size),
        voxel.y.div_euclid(chunk_size),
        voxel.z.div_euclid(chunk_size),
    )
}

/// Returns the minimum-corner voxel of `chunk`.
pub fn chunk_origin(chunk: ChunkCoordinate, chunk_size: i32) -> VoxelCoordinate {
    Point3::new(
        chunk.x * chunk_size,
        chunk.y * chunk_size,
        chunk.z * chunk_size,
    )
}

/// Returns `voxel`'s position relative to the origin of its owning chunk.
/// Every component lies in `0..chunk_size`.
pub fn local_offset(voxel: VoxelCoordinate, chunk_size: i32) -> Vector3<i32> {
    Vector3::new(
        voxel.x.rem_euclid(chunk_size),
        voxel.y.rem_euclid(chunk_size),
        voxel.z.rem_euclid(chunk_size),
    )
}

/// Returns the voxel that contains a world-space point.
pub fn voxel_containing(point: Point3<f32>) -> VoxelCoordinate {
    Point3::new(
        point.x.floor() as i32,
        point.y.floor() as i32,
        point.z.floor() as i32,
    )
}

/// Returns the chunk that contains a world-space point.
pub fn chunk_containing(point: Point3<f32>, chunk_size: i32) -> ChunkCoordinate {
    chunk_coordinate_of(voxel_containing(point), chunk_size)
}
