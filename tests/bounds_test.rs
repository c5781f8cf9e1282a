use cgmath::{Deg, Quaternion, Rotation3, Vector3};
use product_viewer::data_structures::{
    bounds::compute_bounds,
    scene_graph::{MeshData, SceneNode},
    transform::Transform,
};

use crate::common::test_utils::{assert_close, two_cubes};

mod common;

#[test]
fn should_enclose_all_meshes_of_the_hierarchy() {
    let asset = two_cubes();
    let bounds = compute_bounds(&asset.root);

    assert_eq!(bounds.min, Vector3::new(-0.5, -0.5, -0.5));
    assert_eq!(bounds.max, Vector3::new(2.5, 0.5, 0.5));
    assert_eq!(bounds.center, Vector3::new(1.0, 0.0, 0.0));
    assert_eq!(bounds.size, Vector3::new(3.0, 1.0, 1.0));
    assert_eq!(bounds.max_extent(), 3.0);
}

#[test]
fn should_accumulate_nested_transforms() {
    let leaf = SceneNode::with_mesh("leaf", MeshData::cube(2.0)).with_transform(Transform {
        position: Vector3::new(1.0, 0.0, 0.0),
        rotation: Quaternion::from_angle_z(Deg(0.0)),
        scale: Vector3::new(1.0, 1.0, 1.0),
    });
    let mut group = SceneNode::container("group").with_transform(Transform {
        position: Vector3::new(0.0, 3.0, 0.0),
        rotation: Quaternion::from_angle_z(Deg(0.0)),
        scale: Vector3::new(2.0, 2.0, 2.0),
    });
    group.add_child(leaf);
    let mut root = SceneNode::container("root");
    root.add_child(group);

    let bounds = compute_bounds(&root);

    // leaf spans [0, 2] in x, scaled by 2 and lifted by 3
    assert_close(bounds.min.x, 0.0);
    assert_close(bounds.max.x, 4.0);
    assert_close(bounds.min.y, 1.0);
    assert_close(bounds.max.y, 5.0);
    assert_close(bounds.min.z, -2.0);
    assert_close(bounds.max.z, 2.0);
}

#[test]
fn should_follow_rotations() {
    let rotated = SceneNode::with_mesh("bar", MeshData::new(
        vec![[-2.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.5, 0.0]],
        vec![0, 1, 2],
    ))
    .with_transform(Transform {
        position: Vector3::new(0.0, 0.0, 0.0),
        rotation: Quaternion::from_angle_z(Deg(90.0)),
        scale: Vector3::new(1.0, 1.0, 1.0),
    });

    let bounds = compute_bounds(&rotated);

    assert_close(bounds.size.x, 0.5);
    assert_close(bounds.size.y, 4.0);
}

#[test]
fn should_give_zero_box_for_empty_graph() {
    let mut root = SceneNode::container("empty");
    root.add_child(SceneNode::container("still empty"));

    let bounds = compute_bounds(&root);

    assert_eq!(bounds.center, Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(bounds.size, Vector3::new(0.0, 0.0, 0.0));
}

#[test]
fn should_be_deterministic() {
    let asset = two_cubes();
    assert_eq!(compute_bounds(&asset.root), compute_bounds(&asset.root));
}
