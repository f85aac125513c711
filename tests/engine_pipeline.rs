//! Drives `EngineState` frame by frame with background workers.

use cgmath::{Deg, Point3};
use voxel_octree_engine::camera::ViewState;
use voxel_octree_engine::config::{CacheKind, EngineConfig, GenerationMethod};
use voxel_octree_engine::voxels::block::block_type::BlockType;
use voxel_octree_engine::EngineState;
use web_time::Duration;

fn config(generation: GenerationMethod, workers: usize) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.world.chunk_size = 4;
    config.world.render_distance = 2;
    config.world.generation = generation;
    config.tasks.worker_count = workers;
    config.cache.kind = CacheKind::Memory;
    config
}

fn settle(engine: &mut EngineState, view: ViewState) {
    for _ in 0..4 {
        engine.update(view);
        assert!(engine.wait_for_background_work(Duration::from_secs(10)));
    }
}

#[test]
fn test_flat_world_loads_and_selects_surface() {
    voxel_octree_engine::init_logger();
    let mut engine = EngineState::new(config(GenerationMethod::Flat { height: 1 }, 2)).expect("engine");
    let view = ViewState::from_yaw_pitch(Point3::new(1.5, 2.5, 1.5), Deg(0.0), Deg(-90.0));
    settle(&mut engine, view);

    let frame = engine.update(view);
    assert!(frame.loading.is_empty());
    assert!(frame.visible.iter().all(|p| engine.world().is_loaded(*p)));
    let hit = frame.selection.expect("surface below");
    assert_eq!(hit.coordinate, Point3::new(1, 0, 1));
    assert!((hit.distance - 1.5).abs() < 1e-4);

    assert_eq!(engine.break_block(), Some(BlockType::GRASS.id()));
    assert_eq!(engine.selection().map(|h| h.coordinate), Some(Point3::new(1, -1, 1)));
}

#[test]
fn test_moving_camera_unloads_chunks_left_behind() {
    let mut engine = EngineState::new(config(GenerationMethod::Solid, 1)).expect("engine");
    let start = ViewState::from_yaw_pitch(Point3::new(2.0, 2.0, 2.0), Deg(0.0), Deg(0.0));
    settle(&mut engine, start);
    assert!(engine.world().is_loaded(Point3::new(0, 0, -1)));

    let far_away = ViewState::from_yaw_pitch(Point3::new(2.0, 2.0, 402.0), Deg(0.0), Deg(0.0));
    let frame = engine.update(far_away);
    assert!(frame.unloaded.contains(&Point3::new(0, 0, -1)));
    assert!(!engine.world().is_loaded(Point3::new(0, 0, -1)));
    assert!(frame.view_changed);

    settle(&mut engine, far_away);
    assert!(engine.world().loaded_chunks().all(|p| p.z > 50));
}

#[test]
fn test_flush_persists_edits_before_shutdown() {
    let mut engine = EngineState::new(config(GenerationMethod::Empty, 1)).expect("engine");
    let view = ViewState::from_yaw_pitch(Point3::new(0.5, 0.5, 0.5), Deg(0.0), Deg(0.0));
    settle(&mut engine, view);

    assert_eq!(engine.set_block(Point3::new(0, 0, -2), BlockType::STONE.id()), Some(0));
    assert_eq!(engine.flush(Duration::from_secs(10)), 1);
    assert_eq!(engine.flush(Duration::from_secs(10)), 0);
}
