//! # Frustum Culling
//!
//! Builds the six planes of the camera's view volume and decides which chunks
//! around the camera are potentially visible.
//!
//! Each plane is stored as a triangle of three world-space points wound so
//! that the triangle's normal points out of the frustum. A point is inside a
//! plane when the scalar triple product `(b - a) × (c - a) · (p - a)` is not
//! positive. A chunk survives culling when, for every plane, at least one of
//! its eight corners is inside. The test is conservative: it can keep chunks
//! that graze a frustum edge, but never drops a chunk that overlaps it.

use std::collections::HashSet;

use cgmath::{InnerSpace, Point3};

use crate::engine_state::voxels::{aabc::Aabc, coordinates::{chunk_origin, ChunkCoordinate}};

use super::camera::{Projection, ViewState};

/// A frustum plane given by three points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub a: Point3<f32>,
    pub b: Point3<f32>,
    pub c: Point3<f32>,
}

impl Plane {
    pub fn new(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Self {
        Plane { a, b, c }
    }

    /// Returns `true` if `point` lies on the plane or on its inner side.
    pub fn is_inside(&self, point: Point3<f32>) -> bool {
        let normal = (self.b - self.a).cross(self.c - self.a);
        normal.dot(point - self.a) <= 0.0
    }
}

/// Index of each plane inside [`Frustum::planes`].
pub const LEFT: usize = 0;
pub const TOP: usize = 1;
pub const RIGHT: usize = 2;
pub const BOTTOM: usize = 3;
pub const FAR: usize = 4;
pub const NEAR: usize = 5;

/// The camera's view volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Order: [left, top, right, bottom, far, near]
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Builds the frustum for a pose and projection.
    ///
    /// # Arguments
    /// * `view` - Camera position and orientation
    /// * `projection` - Vertical field of view, aspect ratio and clip distances
    pub fn new(view: &ViewState, projection: &Projection) -> Self {
        let forward = view.forward();
        let up = view.up();
        let right = view.right();

        let tan_half_fov = (projection.fovy().0 / 2.0).tan();
        let near_half_height = tan_half_fov * projection.znear();
        let near_half_width = near_half_height * projection.aspect();
        let far_half_height = tan_half_fov * projection.zfar();
        let far_half_width = far_half_height * projection.aspect();

        let near_center = view.position + forward * projection.znear();
        let far_center = view.position + forward * projection.zfar();

        let ntl = near_center + up * near_half_height - right * near_half_width;
        let ntr = near_center + up * near_half_height + right * near_half_width;
        let nbl = near_center - up * near_half_height - right * near_half_width;
        let nbr = near_center - up * near_half_height + right * near_half_width;
        let ftl = far_center + up * far_half_height - right * far_half_width;
        let ftr = far_center + up * far_half_height + right * far_half_width;
        let fbl = far_center - up * far_half_height - right * far_half_width;
        let fbr = far_center - up * far_half_height + right * far_half_width;

        Frustum {
            planes: [
                Plane::new(ntl, ftl, nbl),
                Plane::new(ntl, ntr, ftl),
                Plane::new(ntr, nbr, ftr),
                Plane::new(nbl, fbl, nbr),
                Plane::new(ftr, fbr, fbl),
                Plane::new(ntl, nbl, nbr),
            ],
        }
    }

    /// Returns `true` if `point` is inside every plane.
    pub fn contains_point(&self, point: Point3<f32>) -> bool {
        self.planes.iter().all(|plane| plane.is_inside(point))
    }

    /// Corner test: for every plane, at least one corner must be inside.
    pub fn intersects_aabc(&self, aabc: &Aabc) -> bool {
        let corners = corners(aabc);
        self.planes
            .iter()
            .all(|plane| corners.iter().any(|corner| plane.is_inside(*corner)))
    }
}

fn corners(aabc: &Aabc) -> [Point3<f32>; 8] {
    let min = aabc.min_f32();
    let max = aabc.max_f32();
    [
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(min.x, max.y, max.z),
        Point3::new(max.x, max.y, max.z),
    ]
}

/// Chunks within `render_distance` of the camera's chunk (on every axis)
/// whose cubes pass the frustum corner test.
pub fn visible_chunks(
    view: &ViewState,
    projection: &Projection,
    render_distance: i32,
    chunk_size: i32,
) -> HashSet<ChunkCoordinate> {
    let frustum = Frustum::new(view, projection);
    let center = view.chunk_position(chunk_size);
    let mut visible = HashSet::new();

    for x in -render_distance..=render_distance {
        for y in -render_distance..=render_distance {
            for z in -render_distance..=render_distance {
                let chunk = Point3::new(center.x + x, center.y + y, center.z + z);
                let cube = Aabc::new(chunk_origin(chunk, chunk_size), chunk_size);
                if frustum.intersects_aabc(&cube) {
                    visible.insert(chunk);
                }
            }
        }
    }

    visible
}
