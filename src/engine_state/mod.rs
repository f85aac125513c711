//! # Engine State Module
//!
//! The core engine module that manages the state of the voxel world and
//! drives it once per frame from a host application loop.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container for the engine
//! * `camera_state` - Camera pose, projection and frustum culling
//! * `task_management` - Manages asynchronous tasks and worker threads
//! * `voxels` - Handles voxel data, chunks, and world generation
//!
//! ## Architecture
//!
//! The `EngineState` struct serves as the central coordinator. It owns the
//! world and is the only code that mutates it; workers produce chunks and
//! write caches, and their results are applied here during `update()` or
//! `process_tasks()`.
//!
//! ## Frame Update
//!
//! 1. Adopt the host's camera pose
//! 2. Cull chunks against the view frustum
//! 3. Detach chunks that left the view, saving modified ones in the background
//! 4. Schedule background loads for newly visible chunks, nearest first
//! 5. Apply completed task results
//! 6. Cast the selection ray along the view direction

use std::collections::HashSet;
use std::sync::Arc;

use camera_state::{CameraState, CameraUniform, ViewState};
use cgmath::{InnerSpace, Matrix4, Point3, Vector3};
use task_management::TaskManager;
use voxels::{
    block::{block_side::BlockSide, block_type::BlockType, BlockTypeSize},
    chunk::{chunk_cache::cache_for, chunk_generation::generator_for},
    coordinates::{ChunkCoordinate, VoxelCoordinate},
    octree::RayIntersection,
    tasks::{chunk_load_task::ChunkLoadTask, chunk_save_task::ChunkSaveTask},
    world::World,
};
use web_time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

pub mod camera_state;
pub mod task_management;
pub mod voxels;

/// Summary of one call to [`EngineState::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameUpdate {
    /// Whether the pose differed from the previous frame's
    pub view_changed: bool,
    /// Chunks that passed frustum culling
    pub visible: HashSet<ChunkCoordinate>,
    /// Chunks whose background load was scheduled this frame
    pub loading: Vec<ChunkCoordinate>,
    /// Chunks removed from the world this frame
    pub unloaded: Vec<ChunkCoordinate>,
    /// Task results applied this frame
    pub results_applied: usize,
    /// The voxel under the view ray, within the selection distance
    pub selection: Option<RayIntersection>,
    /// Wall-clock time spent in the update
    pub elapsed: Duration,
}

/// The main state container for the voxel engine
///
/// # Examples
///
/// ```
/// use cgmath::{Deg, Point3};
/// use voxel_octree_engine::camera::ViewState;
/// use voxel_octree_engine::config::{EngineConfig, GenerationMethod};
/// use voxel_octree_engine::EngineState;
///
/// let mut config = EngineConfig::default();
/// config.world.chunk_size = 4;
/// config.world.render_distance = 1;
/// config.world.generation = GenerationMethod::Empty;
///
/// let mut engine = EngineState::new(config).unwrap();
/// let view = ViewState::from_yaw_pitch(Point3::new(0.5, 0.5, 0.5), Deg(0.0), Deg(0.0));
/// let frame = engine.update(view);
/// assert!(!frame.visible.is_empty());
/// ```
pub struct EngineState {
    config: EngineConfig,
    camera_state: CameraState,
    /// Task manager for asynchronous operations
    task_manager: TaskManager,
    /// The voxel world containing all chunk data
    world: World,
}

impl EngineState {
    /// Creates a new engine state with all subsystems initialized.
    ///
    /// # Errors
    /// - `Config` if the configuration is invalid
    /// - `Io` if the cache directory or a worker thread cannot be created
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;

        let generator = Arc::from(generator_for(&config.world.generation));
        let cache = Arc::from(cache_for(&config.cache)?);
        let world = World::new(config.world.clone(), generator, cache);
        let camera_state = CameraState::new(&config.camera);
        let task_manager = TaskManager::new(config.tasks.worker_count, config.tasks.queue_capacity)?;

        log::info!(
            "Engine ready: chunk size {}, render distance {}, {:?} generation",
            config.world.chunk_size,
            config.world.render_distance,
            config.world.generation
        );

        Ok(Self {
            config,
            camera_state,
            task_manager,
            world,
        })
    }

    /// Advances the engine by one frame for the given camera pose.
    pub fn update(&mut self, view: ViewState) -> FrameUpdate {
        let start = Instant::now();
        let view_changed = self.camera_state.update(view);

        let visibility = self
            .world
            .update_visibility(self.camera_state.view(), self.camera_state.projection());

        let mut unloaded = Vec::with_capacity(visibility.to_unload.len());
        for position in visibility.to_unload {
            if self.unload_chunk(position) {
                unloaded.push(position);
            }
        }

        let mut loading = Vec::new();
        for position in visibility.to_load {
            if !self.world.mark_pending(position) {
                continue;
            }
            let task = Box::new(ChunkLoadTask::for_world(&self.world, position));
            match self.task_manager.publish_task(task) {
                Ok(_) => loading.push(position),
                Err(EngineError::TaskQueueFull { capacity }) => {
                    self.world.clear_pending(position);
                    log::warn!(
                        "Task queue full ({} tasks), deferring remaining chunk loads",
                        capacity
                    );
                    break;
                }
                Err(error) => {
                    self.world.clear_pending(position);
                    log::error!("Could not schedule load of chunk {:?}: {}", position, error);
                }
            }
        }

        let results_applied = self.process_tasks();
        let selection = self.refresh_selection();

        let elapsed = start.elapsed();
        log::trace!(
            "Frame: {} visible, {} loading, {} unloaded, {} results, {:?}",
            visibility.visible.len(),
            loading.len(),
            unloaded.len(),
            results_applied,
            elapsed
        );

        FrameUpdate {
            view_changed,
            visible: visibility.visible,
            loading,
            unloaded,
            results_applied,
            selection,
            elapsed,
        }
    }

    /// Detaches a chunk, writing it back in the background if it was modified.
    fn unload_chunk(&mut self, position: ChunkCoordinate) -> bool {
        let Some(chunk) = self.world.detach_chunk(position) else {
            return false;
        };
        if !chunk.is_modified() {
            log::trace!("Unloaded chunk {:?}", position);
            return true;
        }

        if !self.task_manager.has_capacity() {
            log::warn!("No background capacity, saving chunk {:?} on the owning thread", position);
            if let Err(error) = self.world.cache().save(&chunk) {
                log::warn!("Failed to save chunk {:?}: {}", position, error);
            }
            return true;
        }

        self.world.begin_save(position);
        let task = Box::new(ChunkSaveTask::new(self.world.cache(), chunk));
        if let Err((error, task)) = self.task_manager.try_publish_task(task) {
            log::warn!(
                "Could not schedule save of chunk {:?} ({}), saving on the owning thread",
                position,
                error
            );
            // The refused task hands its chunk back; unload it again synchronously.
            task.cancelled().handle_result(&mut self.world);
            self.world.unload_chunk(position);
        }
        true
    }

    /// Applies completed task results and refills idle workers.
    ///
    /// # Returns
    /// The number of results applied.
    pub fn process_tasks(&mut self) -> usize {
        self.task_manager.process_completed_tasks(&mut self.world)
    }

    /// Cancels every background job that has not started yet.
    pub fn cancel_background_work(&mut self) {
        self.task_manager.cancel_pending(&mut self.world);
    }

    /// Blocks until all background work has finished or `timeout` passes.
    ///
    /// # Returns
    /// `true` if no task is left queued or in flight.
    pub fn wait_for_background_work(&mut self, timeout: Duration) -> bool {
        self.task_manager.wait_until_idle(&mut self.world, timeout)
    }

    /// Waits for background work, then writes every modified loaded chunk.
    ///
    /// Hosts call this before shutting down; dropping the engine does not save.
    ///
    /// # Returns
    /// The number of chunks written on the calling thread.
    pub fn flush(&mut self, timeout: Duration) -> usize {
        if !self.wait_for_background_work(timeout) {
            log::warn!("Background work still running after {:?}", timeout);
        }
        self.world.save_modified()
    }

    /// Places a block against the face of the selected voxel the view ray
    /// entered through.
    ///
    /// # Returns
    /// The voxel written, or `None` if nothing is selected, the eye is inside
    /// the selected voxel, or the target is not empty loaded space.
    pub fn place_block(&mut self, block_type: BlockType) -> Option<VoxelCoordinate> {
        let hit = self.world.selection()?;
        let view = *self.camera_state.view();
        let side = entry_side(hit, view.position, view.forward())?;
        let target = hit.coordinate + side.offset();
        if self.world.block_at(target) != Some(BlockType::AIR.id()) {
            return None;
        }
        self.world.set_block(target, block_type.id());
        self.refresh_selection();
        Some(target)
    }

    /// Writes a block at an explicit voxel.
    ///
    /// # Returns
    /// The previous block type, or `None` if the chunk is not loaded.
    pub fn set_block(&mut self, voxel: VoxelCoordinate, block_type: BlockTypeSize) -> Option<BlockTypeSize> {
        let previous = self.world.set_block(voxel, block_type);
        if previous.is_some() {
            self.refresh_selection();
        }
        previous
    }

    /// Removes the selected voxel.
    ///
    /// # Returns
    /// The removed block type, or `None` if nothing is selected.
    pub fn break_block(&mut self) -> Option<BlockTypeSize> {
        let hit = self.world.selection()?;
        let removed = self.world.remove_block(hit.coordinate);
        self.refresh_selection();
        removed
    }

    /// Recomputes the selection along the current view ray.
    fn refresh_selection(&mut self) -> Option<RayIntersection> {
        let view = self.camera_state.view();
        let max_distance = self.config.world.max_selection_distance;
        let selection = self
            .world
            .select_voxel(view.position, view.forward())
            .filter(|hit| hit.distance <= max_distance);
        self.world.set_selection(selection);
        selection
    }

    /// Updates the projection for a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera_state.resize(width, height);
    }

    pub fn selection(&self) -> Option<RayIntersection> {
        self.world.selection()
    }

    pub fn visible_chunks(&self) -> &HashSet<ChunkCoordinate> {
        self.world.visible_chunks()
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.camera_state.view_matrix()
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.camera_state.projection_matrix()
    }

    pub fn camera_uniform(&self) -> &CameraUniform {
        self.camera_state.camera_uniform()
    }

    pub fn camera_position(&self) -> Point3<f32> {
        self.camera_state.position()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn task_manager(&self) -> &TaskManager {
        &self.task_manager
    }
}

/// The face of `hit` the ray crossed to enter it.
///
/// The entry axis is the one whose near slab plane is reached last.
fn entry_side(hit: RayIntersection, eye: Point3<f32>, direction: Vector3<f32>) -> Option<BlockSide> {
    if hit.distance <= 0.0 || direction.magnitude2() == 0.0 {
        return None;
    }
    let min = hit.coordinate.cast::<f32>()?;

    let mut entry: Option<(f32, Vector3<i32>)> = None;
    let axes = [
        (direction.x, eye.x, min.x, Vector3::unit_x()),
        (direction.y, eye.y, min.y, Vector3::unit_y()),
        (direction.z, eye.z, min.z, Vector3::unit_z()),
    ];
    for (d, origin, lower, axis) in axes {
        if d == 0.0 {
            continue;
        }
        let (plane, normal) = if d > 0.0 { (lower, -axis) } else { (lower + 1.0, axis) };
        let t = (plane - origin) / d;
        if entry.map_or(true, |(best, _)| t > best) {
            entry = Some((t, normal));
        }
    }

    let (_, normal) = entry?;
    BlockSide::all().into_iter().find(|side| side.offset() == normal)
}
