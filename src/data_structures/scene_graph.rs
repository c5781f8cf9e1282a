//! Scene graph and hierarchical scene organization.
//!
//! A loaded asset is a tree of [`SceneNode`]s. Each node carries a local
//! [`Transform`] and optionally the CPU-side geometry of one mesh. Nothing in
//! here touches the GPU; the renderer uploads the tree separately (see
//! [`crate::data_structures::model::Model::upload`]).

use std::sync::Arc;

use log::warn;

use crate::data_structures::transform::Transform;

/// CPU-side triangle geometry of one mesh primitive.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    /// First texture coordinate set, empty when the primitive has none.
    pub tex_coords: Vec<[f32; 2]>,
    /// Linear RGBA base colour of the primitive's material.
    pub base_colour: [f32; 4],
    /// Decoded base colour map, multiplied with `base_colour` when drawn.
    pub base_colour_texture: Option<Arc<image::RgbaImage>>,
}

impl MeshData {
    /// Builds a mesh from positions and indices, computing smooth normals.
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        let normals = smooth_normals(&positions, &indices);
        Self {
            positions,
            normals,
            indices,
            tex_coords: Vec::new(),
            base_colour: [1.0; 4],
            base_colour_texture: None,
        }
    }

    /// An axis-aligned cube with edge length `edge`, centered on the local origin.
    pub fn cube(edge: f32) -> Self {
        let h = edge / 2.0;
        let positions = vec![
            [-h, -h, -h],
            [h, -h, -h],
            [h, h, -h],
            [-h, h, -h],
            [-h, -h, h],
            [h, -h, h],
            [h, h, h],
            [-h, h, h],
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // back
            4, 5, 6, 4, 6, 7, // front
            0, 1, 5, 0, 5, 4, // bottom
            3, 7, 6, 3, 6, 2, // top
            0, 4, 7, 0, 7, 3, // left
            1, 2, 6, 1, 6, 5, // right
        ];
        Self::new(positions, indices)
    }

    /// Maps `texture` onto the mesh, one coordinate per position.
    pub fn with_texture(mut self, tex_coords: Vec<[f32; 2]>, texture: Arc<image::RgbaImage>) -> Self {
        self.tex_coords = tex_coords;
        self.base_colour_texture = Some(texture);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }
}

/// A node in the asset hierarchy.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub meshes: Vec<MeshData>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// A node without geometry, used to group children.
    pub fn container(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_mesh(name: impl Into<String>, mesh: MeshData) -> Self {
        Self {
            meshes: vec![mesh],
            ..Self::container(name)
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /**
     * Depth-first walk over the hierarchy.
     *
     * `visit` receives every node together with its accumulated transform matrix,
     * i.e. `parent_matrix * ... * node.transform`.
     */
    pub fn traverse(
        &self,
        parent_matrix: cgmath::Matrix4<f32>,
        visit: &mut dyn FnMut(&SceneNode, &cgmath::Matrix4<f32>),
    ) {
        let world = parent_matrix * self.transform.to_matrix();
        visit(self, &world);
        for child in &self.children {
            child.traverse(world, visit);
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(SceneNode::node_count)
            .sum::<usize>()
    }

    /// Number of non-empty meshes in this subtree.
    pub fn mesh_count(&self) -> usize {
        self.meshes.iter().filter(|mesh| !mesh.is_empty()).count()
            + self
                .children
                .iter()
                .map(SceneNode::mesh_count)
                .sum::<usize>()
    }
}

/// A fully loaded asset: the root of its node hierarchy.
///
/// The root's transform is what the placement pipeline writes to.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneAsset {
    pub root: SceneNode,
}

impl SceneAsset {
    pub fn new(root: SceneNode) -> Self {
        Self { root }
    }
}

/**
 * Converts a glTF node and its subtree.
 *
 * `buf` holds the resolved buffers and `images` the decoded images, both in
 * document order. Images that failed to decode are `None` and leave the
 * material untextured.
 */
pub fn to_scene_node(
    node: gltf::scene::Node,
    buf: &[Vec<u8>],
    images: &[Option<Arc<image::RgbaImage>>],
) -> SceneNode {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));
    let mut meshes = Vec::new();
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                warn!(
                    "Skipping primitive {} of mesh {:?}: mode {:?} is not supported.",
                    primitive.index(),
                    mesh.name(),
                    primitive.mode()
                );
                continue;
            }
            let reader = primitive.reader(|buffer| buf.get(buffer.index()).map(Vec::as_slice));

            let positions: Vec<[f32; 3]> = match reader.read_positions() {
                Some(positions) => positions.collect(),
                None => {
                    warn!(
                        "Skipping primitive {} of mesh {:?}: it has no positions.",
                        primitive.index(),
                        mesh.name()
                    );
                    continue;
                }
            };
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            let normals = match reader.read_normals() {
                Some(normals) => {
                    let normals: Vec<[f32; 3]> = normals.collect();
                    if normals.len() == positions.len() {
                        normals
                    } else {
                        smooth_normals(&positions, &indices)
                    }
                }
                None => smooth_normals(&positions, &indices),
            };
            let pbr = primitive.material().pbr_metallic_roughness();
            let base_colour = pbr.base_color_factor();
            let base_colour_texture = pbr.base_color_texture().and_then(|info| {
                if info.tex_coord() != 0 {
                    warn!(
                        "Mesh {:?} samples its base colour from TEXCOORD_{}, only TEXCOORD_0 is supported.",
                        mesh.name(),
                        info.tex_coord()
                    );
                }
                images
                    .get(info.texture().source().index())
                    .cloned()
                    .flatten()
            });
            let tex_coords: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
                Some(tex_coords) => tex_coords.into_f32().collect(),
                None => Vec::new(),
            };

            meshes.push(MeshData {
                positions,
                normals,
                indices,
                tex_coords,
                base_colour,
                base_colour_texture,
            });
        }
    }

    let (translation, [x, y, z, w], scale) = node.transform().decomposed();
    let transform = Transform {
        position: translation.into(),
        rotation: cgmath::Quaternion::new(w, x, y, z),
        scale: scale.into(),
    };

    SceneNode {
        name,
        transform,
        meshes,
        children: node
            .children()
            .map(|child| to_scene_node(child, buf, images))
            .collect(),
    }
}

/**
 * Area-weighted per-vertex normals.
 *
 * Used when an asset ships without normals, so that directional lighting still
 * has something to work with. Triangles referencing out-of-range vertices are ignored.
 */
pub fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    use cgmath::InnerSpace;

    let mut normals = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); positions.len()];
    for c in indices.chunks_exact(3) {
        let (i0, i1, i2) = (c[0] as usize, c[1] as usize, c[2] as usize);
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        let pos0: cgmath::Vector3<f32> = positions[i0].into();
        let pos1: cgmath::Vector3<f32> = positions[i1].into();
        let pos2: cgmath::Vector3<f32> = positions[i2].into();
        // the cross product's length is twice the triangle area
        let face = (pos1 - pos0).cross(pos2 - pos0);
        normals[i0] += face;
        normals[i1] += face;
        normals[i2] += face;
    }
    normals
        .into_iter()
        .map(|n| {
            if n.magnitude2() > 0.0 {
                n.normalize().into()
            } else {
                [0.0, 0.0, 1.0]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_normals_point_outwards() {
        let cube = MeshData::cube(1.0);
        for (position, normal) in cube.positions.iter().zip(cube.normals.iter()) {
            let dot = position[0] * normal[0] + position[1] * normal[1] + position[2] * normal[2];
            assert!(dot > 0.0, "normal {:?} at {:?} points inwards", normal, position);
        }
    }

    #[test]
    fn counts_nodes_and_meshes_of_nested_graph() {
        let mut root = SceneNode::container("root");
        let mut group = SceneNode::container("group");
        group.add_child(SceneNode::with_mesh("a", MeshData::cube(1.0)));
        group.add_child(SceneNode::with_mesh("b", MeshData::new(Vec::new(), Vec::new())));
        root.add_child(group);

        assert_eq!(root.node_count(), 4);
        assert_eq!(root.mesh_count(), 1);
    }

    #[test]
    fn textured_meshes_share_their_image() {
        let image = Arc::new(image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255])));
        let uv = vec![[0.0, 0.0]; 8];
        let a = MeshData::cube(1.0).with_texture(uv.clone(), image.clone());
        let b = MeshData::cube(2.0).with_texture(uv, image.clone());

        assert_eq!(Arc::strong_count(&image), 3);
        assert_eq!(a.tex_coords.len(), a.positions.len());
        assert!(Arc::ptr_eq(
            a.base_colour_texture.as_ref().unwrap(),
            b.base_colour_texture.as_ref().unwrap()
        ));
    }
}
