//! Axis-aligned bounding geometry of a scene graph.

use cgmath::{EuclideanSpace, Transform as _};

use crate::data_structures::scene_graph::SceneNode;

/// An axis-aligned box that may be empty.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: cgmath::Vector3<f32>,
    pub max: cgmath::Vector3<f32>,
}

impl Aabb {
    /// The empty box: `min` is +inf and `max` is -inf so any point extends it.
    pub fn empty() -> Self {
        Self {
            min: cgmath::Vector3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: cgmath::Vector3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    pub fn extend(&mut self, point: cgmath::Vector3<f32>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

/// Bounding box of a loaded asset together with its derived center and size.
///
/// Computed once after a successful load and never mutated afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingInfo {
    pub min: cgmath::Vector3<f32>,
    pub max: cgmath::Vector3<f32>,
    pub center: cgmath::Vector3<f32>,
    pub size: cgmath::Vector3<f32>,
}

impl BoundingInfo {
    /// Largest of the three box dimensions.
    pub fn max_extent(&self) -> f32 {
        self.size.x.max(self.size.y).max(self.size.z)
    }
}

impl From<Aabb> for BoundingInfo {
    /// An empty box collapses to a zero-sized box at the origin.
    fn from(aabb: Aabb) -> Self {
        let (min, max) = if aabb.is_empty() {
            (cgmath::Vector3::new(0.0, 0.0, 0.0), cgmath::Vector3::new(0.0, 0.0, 0.0))
        } else {
            (aabb.min, aabb.max)
        };
        Self {
            min,
            max,
            center: (min + max) * 0.5,
            size: max - min,
        }
    }
}

/// Box enclosing every vertex of `node`'s subtree, in the space `node` lives in.
pub fn compute_aabb(node: &SceneNode) -> Aabb {
    let mut aabb = Aabb::empty();
    node.traverse(cgmath::Matrix4::from_scale(1.0), &mut |node, world| {
        for mesh in &node.meshes {
            for position in &mesh.positions {
                let point = world.transform_point(cgmath::Point3::from(*position));
                aabb.extend(point.to_vec());
            }
        }
    });
    aabb
}

/// Bounds of the whole hierarchy below (and including) `node`.
pub fn compute_bounds(node: &SceneNode) -> BoundingInfo {
    compute_aabb(node).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extending_empty_box_spans_single_point() {
        let mut aabb = Aabb::empty();
        aabb.extend(cgmath::Vector3::new(1.0, 2.0, 3.0));
        assert!(!aabb.is_empty());
        assert_eq!(aabb.min, cgmath::Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.max, aabb.min);
    }

    #[test]
    fn empty_box_collapses_to_origin() {
        let info = BoundingInfo::from(Aabb::empty());
        assert_eq!(info.size, cgmath::Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(info.center, cgmath::Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(info.max_extent(), 0.0);
    }
}
