//! # Voxel World Core
//!
//! This module contains the core voxel functionality, providing the foundation
//! for representing, indexing and querying a chunked voxel world.
//!
//! ## Architecture
//!
//! The voxel system is organized into several key components:
//!
//! * **Coordinates**: Voxel and chunk addressing with floor semantics for negatives
//! * **Aabc**: Axis-aligned bounding cubes, the geometric primitive of the octree
//! * **Octree**: Arena-backed sparse index over a chunk's solid voxels
//! * **Block**: Block types, faces and the packed per-voxel record
//! * **Chunk**: Fixed-size flat voxel arrays plus generation and caching
//! * **World**: Coordinates chunks and provides a unified interface for the entire voxel space
//! * **Tasks**: Background chunk loading and saving
//!
//! ## Data Flow
//!
//! 1. The world receives a camera pose and culls chunks against the view frustum
//! 2. Newly visible chunks are restored from the cache or generated off-thread
//! 3. The owning thread adopts finished chunks and builds their octrees
//! 4. Block edits go through the world, keeping records, octrees and adjacency consistent
//! 5. Chunks leaving the view are saved if modified and dropped
//!
//! ## Thread Safety
//!
//! None of these types lock internally. A world and its chunks belong to one
//! thread; background tasks only ever hand over whole chunks.

pub mod aabc;
pub mod block;
pub mod chunk;
pub mod coordinates;
pub mod octree;
pub mod tasks;
pub mod world;
