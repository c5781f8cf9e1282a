//! Loading of the product asset from external files.
//!
//! [`AssetLoader`] is the seam the viewer loads through. [`GltfLoader`] reads a
//! glTF/GLB file (native: from disk below an asset root, web: relative to the
//! page origin) and turns its default scene into a [`SceneAsset`].

use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use log::warn;

use crate::data_structures::scene_graph::{SceneAsset, SceneNode, to_scene_node};

#[allow(async_fn_in_trait)]
pub trait AssetLoader {
    /// Fetches and parses the asset at `path`. Called at most once per viewer.
    async fn load(&self, path: &str) -> anyhow::Result<SceneAsset>;
}

#[derive(Clone, Debug)]
pub struct GltfLoader {
    root: String,
}

impl GltfLoader {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> String {
        if self.root.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", self.root.trim_end_matches('/'), path)
        }
    }
}

impl Default for GltfLoader {
    fn default() -> Self {
        Self::new("assets")
    }
}

impl AssetLoader for GltfLoader {
    async fn load(&self, path: &str) -> anyhow::Result<SceneAsset> {
        let file_name = self.resolve(path);
        let bytes = load_binary(&file_name)
            .await
            .with_context(|| format!("Could not read {}", file_name))?;
        let gltf = gltf::Gltf::from_slice(&bytes)
            .with_context(|| format!("{} is not a valid glTF asset", file_name))?;

        // External buffers are resolved next to the asset itself
        let base_dir = match file_name.rfind('/') {
            Some(idx) => &file_name[..=idx],
            None => "",
        };
        let mut buffer_data = Vec::new();
        for buffer in gltf.buffers() {
            match buffer.source() {
                gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                    Some(blob) => buffer_data.push(blob.to_vec()),
                    None => bail!("{} references a binary chunk it does not contain", file_name),
                },
                gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                    bail!("{}: embedded data URIs are not supported", file_name)
                }
                gltf::buffer::Source::Uri(uri) => {
                    let bin = load_binary(&format!("{}{}", base_dir, uri)).await?;
                    buffer_data.push(bin);
                }
            }
        }

        let mut images = Vec::new();
        for image in gltf.images() {
            images.push(load_image(image.source(), &buffer_data, base_dir).await);
        }

        let scene = gltf
            .default_scene()
            .or_else(|| gltf.scenes().next())
            .ok_or_else(|| anyhow!("{} contains no scene", file_name))?;

        let mut root = SceneNode::container(scene.name().unwrap_or("scene"));
        for node in scene.nodes() {
            root.add_child(to_scene_node(node, &buffer_data, &images));
        }
        log::info!(
            "Loaded {}: {} nodes, {} meshes",
            file_name,
            root.node_count(),
            root.mesh_count()
        );

        Ok(SceneAsset::new(root))
    }
}

/// Decodes one glTF image into RGBA8. A texture that fails to load leaves its
/// material untextured instead of failing the whole asset.
async fn load_image(
    source: gltf::image::Source<'_>,
    buffer_data: &[Vec<u8>],
    base_dir: &str,
) -> Option<Arc<image::RgbaImage>> {
    let (bytes, origin) = match source {
        gltf::image::Source::View { view, .. } => {
            let buffer = buffer_data.get(view.buffer().index())?;
            let start = view.offset();
            let end = start + view.length();
            match buffer.get(start..end) {
                Some(bytes) => (bytes.to_vec(), format!("buffer view {}", view.index())),
                None => {
                    warn!("Image buffer view {} is out of range", view.index());
                    return None;
                }
            }
        }
        gltf::image::Source::Uri { uri, .. } if uri.starts_with("data:") => {
            warn!("Embedded data URI images are not supported");
            return None;
        }
        gltf::image::Source::Uri { uri, .. } => {
            let file_name = format!("{}{}", base_dir, uri);
            match load_binary(&file_name).await {
                Ok(bytes) => (bytes, file_name),
                Err(e) => {
                    warn!("Could not read texture {}: {:#}", file_name, e);
                    return None;
                }
            }
        }
    };
    match image::load_from_memory(&bytes) {
        Ok(img) => Some(Arc::new(img.to_rgba8())),
        Err(e) => {
            warn!("Could not decode texture from {}: {}", origin, e);
            None
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow!("no window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow!("no page origin: {:?}", e))?;
    let base = reqwest::Url::parse(&format!("{}/", origin))?;
    Ok(base.join(file_name)?)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url)
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = tokio::fs::read(std::path::Path::new(file_name)).await?;

    Ok(data)
}
