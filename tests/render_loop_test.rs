use futures::executor::block_on;
use product_viewer::{
    config::ViewerConfig,
    render::RenderLoop,
    viewer::Viewer,
    viewport::Viewport,
};

use crate::common::test_utils::{CountingScheduler, FakeLoader, RecordingTarget, two_cubes};

mod common;

#[test]
fn should_present_clear_only_frames_before_load() {
    let viewer = Viewer::new(ViewerConfig::default());
    let scheduler = CountingScheduler::default();
    let mut target = RecordingTarget::default();
    let mut render_loop = RenderLoop::new();

    for _ in 0..3 {
        render_loop.step(&scheduler, &mut target, &viewer).unwrap();
    }

    assert_eq!(render_loop.frames(), 3);
    assert_eq!(scheduler.scheduled(), 3);
    assert!(target.frames.iter().all(|frame| frame.is_empty()));
    assert!(
        target
            .frames
            .iter()
            .all(|frame| frame.clear_colour == wgpu::Color::TRANSPARENT)
    );
}

#[test]
fn should_draw_model_after_load_without_mutating_state() {
    let mut viewer = Viewer::new(ViewerConfig::default());
    viewer.resize(Viewport::new(1200.0, 800.0));
    block_on(viewer.load(&FakeLoader::serving(two_cubes()))).unwrap();
    let before = viewer.state().clone();
    let scheduler = CountingScheduler::default();
    let mut target = RecordingTarget::default();
    let mut render_loop = RenderLoop::new();

    render_loop.step(&scheduler, &mut target, &viewer).unwrap();
    render_loop.step(&scheduler, &mut target, &viewer).unwrap();

    assert_eq!(*viewer.state(), before);
    assert_eq!(target.frames.len(), 2);
    assert_eq!(target.frames[0], target.frames[1]);
    assert_eq!(target.frames[0], viewer.frame());
    assert!(!target.frames[0].is_empty());
}

#[test]
fn should_pick_up_placement_changes_on_next_frame() {
    let mut viewer = Viewer::new(ViewerConfig::default());
    viewer.resize(Viewport::new(1200.0, 800.0));
    block_on(viewer.load(&FakeLoader::serving(two_cubes()))).unwrap();
    let scheduler = CountingScheduler::default();
    let mut target = RecordingTarget::default();
    let mut render_loop = RenderLoop::new();

    render_loop.step(&scheduler, &mut target, &viewer).unwrap();
    viewer.resize(Viewport::new(600.0, 800.0));
    render_loop.step(&scheduler, &mut target, &viewer).unwrap();

    assert_ne!(target.frames[0].transform, target.frames[1].transform);
    assert_eq!(target.frames[1], viewer.frame());
}

#[test]
fn should_keep_scheduling_when_present_fails() {
    let viewer = Viewer::new(ViewerConfig::default());
    let scheduler = CountingScheduler::default();
    let mut target = RecordingTarget {
        fail: true,
        ..Default::default()
    };
    let mut render_loop = RenderLoop::new();

    let result = render_loop.step(&scheduler, &mut target, &viewer);

    assert!(result.is_err());
    assert_eq!(scheduler.scheduled(), 1);
    assert_eq!(render_loop.frames(), 0);
}
