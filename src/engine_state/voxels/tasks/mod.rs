//! # Voxel Task System
//!
//! This module contains tasks related to chunk loading and persistence.
//! These tasks run on the task manager's workers so that generation and cache
//! I/O never stall the thread that owns the world.

pub mod chunk_load_task;
pub mod chunk_save_task;
