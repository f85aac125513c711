//! # Camera State Management
//!
//! This module handles all camera-related functionality including:
//! - Camera pose tracking
//! - View and projection matrix calculations
//! - Chunk visibility determination based on camera position
//!
//! ## Core Components
//! - `ViewState`: The camera's position and orientation in 3D space
//! - `Projection`: Manages the camera's projection matrix
//! - `CameraUniform`: GPU representation of camera data for shaders
//! - `Frustum`: The view volume used for chunk culling

use cgmath::{Matrix4, Point3};

use crate::config::CameraConfig;

pub mod camera;
pub mod frustum;

pub use camera::{CameraUniform, Projection, ViewState};
pub use frustum::{visible_chunks, Frustum};

/// Owns the current camera pose, projection and GPU uniform.
///
/// # Fields
/// - `view`: The pose handed in by the host on the last update
/// - `projection`: Perspective projection settings
/// - `camera_uniform`: GPU-optimized camera data for shaders
#[derive(Debug, Clone)]
pub struct CameraState {
    view: ViewState,
    projection: Projection,
    camera_uniform: CameraUniform,
}

impl CameraState {
    /// Creates a camera at the origin looking down negative Z.
    pub fn new(config: &CameraConfig) -> Self {
        let view = ViewState::default();
        let projection = Projection::from_config(config);
        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj_and_pos(&view, &projection);

        CameraState {
            view,
            projection,
            camera_uniform,
        }
    }

    /// Adopts a new pose.
    ///
    /// # Returns
    /// `true` if the pose differs from the previous one.
    pub fn update(&mut self, view: ViewState) -> bool {
        if view == self.view {
            return false;
        }
        self.view = view;
        self.camera_uniform
            .update_view_proj_and_pos(&self.view, &self.projection);
        true
    }

    /// Updates the aspect ratio for a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
        self.camera_uniform
            .update_view_proj_and_pos(&self.view, &self.projection);
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn camera_uniform(&self) -> &CameraUniform {
        &self.camera_uniform
    }

    pub fn position(&self) -> Point3<f32> {
        self.view.position
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view.view_matrix()
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection.calc_matrix()
    }
}
