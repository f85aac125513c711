//! # Camera Implementation
//!
//! This module contains the core camera implementation including:
//! - The camera pose consumed every frame (`ViewState`)
//! - Projection matrix handling
//! - GPU uniform buffer data
//!
//! ## Conventions
//! With an identity orientation the camera looks down negative Z, with
//! positive Y up and positive X to the right. The orientation quaternion
//! rotates these canonical vectors into world space.

use cgmath::*;

use crate::config::CameraConfig;
use crate::engine_state::voxels::coordinates::{chunk_containing, ChunkCoordinate};

/// Transformation matrix to convert from OpenGL's coordinate system to WGPU's.
///
/// WGPU uses a coordinate system where:
/// - X is right
/// - Y is up
/// - NDC (Normalized Device Coordinates) range from -1 to 1 in X and Y, and 0 to 1 in Z
///
/// This matrix performs two main transformations:
/// 1. Scales the Z coordinate from [-1, 1] to [-0.5, 0.5]
/// 2. Translates the Z coordinate from [-0.5, 0.5] to [0, 1]
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,  // Scale Z from [-1,1] to [-0.5,0.5]
    0.0, 0.0, 0.5, 1.0,  // Translate Z from [-0.5,0.5] to [0,1]
);

/// Camera pose in world space: an eye position and an orientation.
///
/// Hosts hand one of these to the engine every frame; the engine never reads
/// raw input itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    /// The eye position in world space
    pub position: Point3<f32>,
    /// Rotation applied to the canonical forward/up/right vectors
    pub orientation: Quaternion<f32>,
}

impl ViewState {
    pub fn new(position: Point3<f32>, orientation: Quaternion<f32>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Creates a pose from first-person angles.
    ///
    /// # Arguments
    /// * `position` - Eye position in world space
    /// * `yaw` - Rotation around the world Y axis; positive turns left
    /// * `pitch` - Rotation around the camera's X axis; positive looks up
    ///
    /// # Example
    /// ```rust
    /// use cgmath::{Deg, Point3};
    /// use voxel_octree_engine::camera::ViewState;
    ///
    /// let view = ViewState::from_yaw_pitch(Point3::new(0.0, 0.0, 0.0), Deg(90.0), Deg(0.0));
    /// assert!((view.forward().x + 1.0).abs() < 1e-5);
    /// ```
    pub fn from_yaw_pitch<Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: Point3<f32>,
        yaw: Y,
        pitch: P,
    ) -> Self {
        let orientation = Quaternion::from_angle_y(yaw.into()) * Quaternion::from_angle_x(pitch.into());
        Self::new(position, orientation)
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vector3<f32> {
        (self.orientation * -Vector3::unit_z()).normalize()
    }

    pub fn up(&self) -> Vector3<f32> {
        (self.orientation * Vector3::unit_y()).normalize()
    }

    pub fn right(&self) -> Vector3<f32> {
        (self.orientation * Vector3::unit_x()).normalize()
    }

    /// Calculates the view matrix for this pose.
    ///
    /// The view matrix transforms world coordinates to view (camera) space.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), self.up())
    }

    /// Chunk coordinate containing the eye.
    pub fn chunk_position(&self, chunk_size: i32) -> ChunkCoordinate {
        chunk_containing(self.position, chunk_size)
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.0, 0.0), Quaternion::new(1.0, 0.0, 0.0, 0.0))
    }
}

/// Represents a camera's projection matrix and related parameters.
///
/// This handles the perspective projection used to render the 3D scene.
/// It manages the aspect ratio, field of view, and near/far clipping planes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Aspect ratio (width / height)
    aspect: f32,
    /// Vertical field of view in radians
    fovy: Rad<f32>,
    /// Near clipping plane distance
    znear: f32,
    /// Far clipping plane distance
    zfar: f32,
}

impl Projection {
    /// Creates a new projection from a viewport size.
    ///
    /// # Arguments
    /// * `width` - Viewport width in pixels
    /// * `height` - Viewport height in pixels
    /// * `fovy` - Vertical field of view (can be any type convertible to `Rad<f32>`)
    /// * `znear` - Near clipping plane distance
    /// * `zfar` - Far clipping plane distance
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self::with_aspect(width as f32 / height as f32, fovy, znear, zfar)
    }

    /// Creates a new projection from an explicit aspect ratio.
    pub fn with_aspect<F: Into<Rad<f32>>>(aspect: f32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::with_aspect(config.aspect, Deg(config.fovy_degrees), config.znear, config.zfar)
    }

    /// Updates the projection's aspect ratio for viewport resizing.
    ///
    /// # Arguments
    /// * `width` - New viewport width in pixels
    /// * `height` - New viewport height in pixels
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fovy(&self) -> Rad<f32> {
        self.fovy
    }

    pub fn znear(&self) -> f32 {
        self.znear
    }

    pub fn zfar(&self) -> f32 {
        self.zfar
    }

    /// Calculates the projection matrix.
    ///
    /// Combines the perspective projection with the OpenGL to WGPU coordinate system transform.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// GPU-friendly representation of camera data for shaders.
///
/// This struct is used to pass camera data to the GPU in a format that matches
/// the layout expected by the shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    // We can't use cgmath with bytemuck directly so we'll have to convert the Matrix4 into a 4x4 f32 array
    view_proj: [[f32; 4]; 4],
    view_proj_inverse: [[f32; 4]; 4],
    position: [f32; 4],
}

impl CameraUniform {
    /// Creates a new camera uniform with identity matrices and zero position.
    pub fn new() -> Self {
        Self {
            view_proj: cgmath::Matrix4::identity().into(),
            view_proj_inverse: cgmath::Matrix4::identity().into(),
            position: [0.0, 0.0, 0.0, 0.0],
        }
    }

    /// Updates the view-projection matrix and position from a pose.
    ///
    /// # Arguments
    /// * `view` - The pose to get the view matrix and position from
    /// * `projection` - The projection to use
    pub fn update_view_proj_and_pos(&mut self, view: &ViewState, projection: &Projection) {
        let viewproj = projection.calc_matrix() * view.view_matrix();
        self.view_proj = viewproj.into();
        self.view_proj_inverse = viewproj.invert().unwrap_or_else(Matrix4::identity).into();
        let pos3: [f32; 3] = view.position.into();

        self.position = [pos3[0], pos3[1], pos3[2], 0.0];
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.view_proj.into()
    }

    pub fn position(&self) -> Point3<f32> {
        Point3::new(self.position[0], self.position[1], self.position[2])
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}
