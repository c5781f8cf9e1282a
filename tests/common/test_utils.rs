use std::cell::Cell;

use anyhow::anyhow;
use product_viewer::{
    data_structures::{
        scene_graph::{MeshData, SceneAsset, SceneNode},
        transform::Transform,
    },
    render::{Frame, FrameScheduler, FrameTarget},
    resources::AssetLoader,
    viewport::SurfaceResize,
};

/// Two unit cubes, one at the origin and one at (2, 0, 0).
pub(crate) fn two_cubes() -> SceneAsset {
    let mut root = SceneNode::container("two cubes");
    root.add_child(SceneNode::with_mesh("left", MeshData::cube(1.0)));
    root.add_child(
        SceneNode::with_mesh("right", MeshData::cube(1.0))
            .with_transform(Transform::from(cgmath::Vector3::new(2.0, 0.0, 0.0))),
    );
    SceneAsset::new(root)
}

/// Serves a fixed asset, or fails like a missing file would.
pub(crate) struct FakeLoader {
    asset: Option<SceneAsset>,
    calls: Cell<u32>,
}

impl FakeLoader {
    pub(crate) fn serving(asset: SceneAsset) -> Self {
        Self {
            asset: Some(asset),
            calls: Cell::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            asset: None,
            calls: Cell::new(0),
        }
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl AssetLoader for FakeLoader {
    async fn load(&self, path: &str) -> anyhow::Result<SceneAsset> {
        self.calls.set(self.calls.get() + 1);
        self.asset
            .clone()
            .ok_or_else(|| anyhow!("{} not found", path))
    }
}

#[derive(Default)]
pub(crate) struct RecordingSurface {
    pub(crate) sizes: Vec<(u32, u32)>,
}

impl SurfaceResize for RecordingSurface {
    fn resize_surface(&mut self, width: u32, height: u32) {
        self.sizes.push((width, height));
    }
}

#[derive(Default)]
pub(crate) struct CountingScheduler {
    scheduled: Cell<u32>,
}

impl CountingScheduler {
    pub(crate) fn scheduled(&self) -> u32 {
        self.scheduled.get()
    }
}

impl FrameScheduler for CountingScheduler {
    fn schedule_next_frame(&self) {
        self.scheduled.set(self.scheduled.get() + 1);
    }
}

/// Records every presented frame; fails every present when `fail` is set.
#[derive(Default)]
pub(crate) struct RecordingTarget {
    pub(crate) frames: Vec<Frame>,
    pub(crate) fail: bool,
}

impl FrameTarget for RecordingTarget {
    type Error = String;

    fn present(&mut self, frame: &Frame) -> Result<(), Self::Error> {
        if self.fail {
            return Err("surface lost".to_string());
        }
        self.frames.push(*frame);
        Ok(())
    }
}

pub(crate) fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {} to be close to {}",
        actual,
        expected
    );
}

/// Rotations are equal when the quaternions agree up to sign.
pub(crate) fn assert_rotation_close(actual: cgmath::Quaternion<f32>, expected: cgmath::Quaternion<f32>) {
    use cgmath::InnerSpace;
    assert!(
        (actual.dot(expected).abs() - 1.0).abs() < 1e-5,
        "expected rotation {:?} to be close to {:?}",
        actual,
        expected
    );
}
