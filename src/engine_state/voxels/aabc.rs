//! # Axis-Aligned Bounding Cubes
//!
//! An [`Aabc`] is a cube of voxel space given by its minimum corner and an
//! edge length. It spans `[origin, origin + size)` on every axis: the minimum
//! face is inside, the maximum face is not.
//!
//! Cubes are plain values. Growing towards a point or descending into an
//! octant always yields a fresh cube; nothing is mutated in place. The octree
//! relies on the two preconditions documented on [`Aabc::expand_towards`] and
//! [`Aabc::child_containing`] and violating either one panics.

use cgmath::{Point3, Vector3};

use super::coordinates::VoxelCoordinate;

/// Axis-aligned bounding cube in integer voxel space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Aabc {
    /// Minimum corner (inclusive)
    pub origin: VoxelCoordinate,
    /// Edge length, always positive
    pub size: i32,
}

impl Aabc {
    /// Creates a cube at `origin` with edge length `size`.
    ///
    /// # Panics
    /// Panics if `size` is not positive.
    pub fn new(origin: VoxelCoordinate, size: i32) -> Self {
        assert!(size > 0, "Aabc size must be positive, got {}", size);
        Aabc { origin, size }
    }

    /// The single-voxel cube at `voxel`.
    pub fn unit(voxel: VoxelCoordinate) -> Self {
        Aabc::new(voxel, 1)
    }

    /// Returns `true` if `target` lies inside this cube
    /// (`origin <= target < origin + size` on every axis).
    pub fn contains(&self, target: VoxelCoordinate) -> bool {
        let max = self.max();
        self.origin.x <= target.x
            && target.x < max.x
            && self.origin.y <= target.y
            && target.y < max.y
            && self.origin.z <= target.z
            && target.z < max.z
    }

    /// Returns `true` if `other` lies entirely inside this cube.
    pub fn encloses(&self, other: &Aabc) -> bool {
        let max = self.max();
        let other_max = other.max();
        self.contains(other.origin)
            && other_max.x <= max.x
            && other_max.y <= max.y
            && other_max.z <= max.z
    }

    /// Exclusive maximum corner.
    pub fn max(&self) -> VoxelCoordinate {
        self.origin + Vector3::new(self.size, self.size, self.size)
    }

    /// Number of voxels the cube covers.
    pub fn volume(&self) -> i64 {
        let size = self.size as i64;
        size * size * size
    }

    /// Doubles the cube so that it grows towards `target`.
    ///
    /// On each axis where `target` lies below the origin the new cube is
    /// shifted down by the old size; on the other axes the origin is kept.
    /// Used to grow an octree root until it covers a new voxel, which may
    /// take several calls.
    ///
    /// # Panics
    /// Panics if `target` is already inside the cube.
    pub fn expand_towards(&self, target: VoxelCoordinate) -> Aabc {
        assert!(
            !self.contains(target),
            "cannot expand {:?} towards {:?}: target is already contained",
            self,
            target
        );

        let shift = |origin: i32, target: i32| {
            if target < origin {
                origin - self.size
            } else {
                origin
            }
        };

        Aabc::new(
            Point3::new(
                shift(self.origin.x, target.x),
                shift(self.origin.y, target.y),
                shift(self.origin.z, target.z),
            ),
            self.size * 2,
        )
    }

    /// Returns the half-size octant of this cube that contains `target`.
    ///
    /// # Panics
    /// Panics if `target` is outside the cube, or if the cube is a single
    /// voxel and cannot be subdivided.
    pub fn child_containing(&self, target: VoxelCoordinate) -> Aabc {
        assert!(
            self.contains(target),
            "cannot descend from {:?} towards {:?}: target is outside",
            self,
            target
        );

        let half = self.size / 2;
        let pick = |origin: i32, target: i32| {
            if target >= origin + half {
                origin + half
            } else {
                origin
            }
        };

        Aabc::new(
            Point3::new(
                pick(self.origin.x, target.x),
                pick(self.origin.y, target.y),
                pick(self.origin.z, target.z),
            ),
            half,
        )
    }

    /// Minimum corner in floating point.
    pub fn min_f32(&self) -> Point3<f32> {
        Point3::new(
            self.origin.x as f32,
            self.origin.y as f32,
            self.origin.z as f32,
        )
    }

    /// Maximum corner in floating point.
    pub fn max_f32(&self) -> Point3<f32> {
        let size = self.size as f32;
        self.min_f32() + Vector3::new(size, size, size)
    }

    /// Centre of the cube in floating point.
    pub fn center_f32(&self) -> Point3<f32> {
        let half = self.size as f32 * 0.5;
        self.min_f32() + Vector3::new(half, half, half)
    }

    /// Slab-method ray intersection.
    ///
    /// Returns the entry parameter `t_min` when the ray hits, i.e. when
    /// `t_max >= t_min` and `t_max >= 0`. The entry parameter is negative when
    /// `ray_origin` is inside the cube; callers clamp it to zero.
    ///
    /// Zero direction components are divided through on purpose: the
    /// resulting infinities order correctly under `min`/`max`, so axis-aligned
    /// rays need no special case.
    ///
    /// The one exception is a ray starting exactly on one of the cube's faces
    /// while running parallel to it. That axis computes `0 * inf = NaN`, the
    /// entry parameter becomes infinite and the cube is reported as missed.
    /// Eyes placed on integer coordinates therefore select nothing along the
    /// grid planes they sit on.
    ///
    /// # Arguments
    /// * `ray_origin` - Start of the ray in world space
    /// * `ray_direction` - Direction of the ray; need not be normalised, the
    ///   returned parameter is in units of its length
    pub fn intersect_ray(
        &self,
        ray_origin: Point3<f32>,
        ray_direction: Vector3<f32>,
    ) -> Option<f32> {
        let min = self.min_f32();
        let max = self.max_f32();
        let inverse = Vector3::new(
            1.0 / ray_direction.x,
            1.0 / ray_direction.y,
            1.0 / ray_direction.z,
        );

        let tx1 = (min.x - ray_origin.x) * inverse.x;
        let tx2 = (max.x - ray_origin.x) * inverse.x;
        let mut t_min = tx1.min(tx2);
        let mut t_max = tx1.max(tx2);

        let ty1 = (min.y - ray_origin.y) * inverse.y;
        let ty2 = (max.y - ray_origin.y) * inverse.y;
        t_min = t_min.max(ty1.min(ty2));
        t_max = t_max.min(ty1.max(ty2));

        let tz1 = (min.z - ray_origin.z) * inverse.z;
        let tz2 = (max.z - ray_origin.z) * inverse.z;
        t_min = t_min.max(tz1.min(tz2));
        t_max = t_max.min(tz1.max(tz2));

        if t_max >= t_min && t_max >= 0.0 {
            Some(t_min)
        } else {
            None
        }
    }
}
