//! The viewer controller and the state it exclusively owns.
//!
//! [`Viewer`] is the single writer of [`ViewerState`]: the asset attachment
//! (which computes bounds and the first placement) and the resize handling are
//! the only paths that mutate model or camera. Everything else, in particular
//! the render loop, reads a [`Frame`] snapshot.

use anyhow::{Context as _, anyhow};
use cgmath::{Euler, Quaternion, Rad, Vector3};

use crate::{
    camera::{Camera, CameraUniform, Projection},
    config::ViewerConfig,
    data_structures::{
        bounds::{BoundingInfo, compute_bounds},
        scene_graph::SceneAsset,
        transform::Transform,
    },
    pipelines::transform::TransformUniform,
    placement::{Placement, solve},
    render::Frame,
    resources::AssetLoader,
    viewport::Viewport,
};

/// Everything the presentation pipeline knows about the current page.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerState {
    asset: Option<SceneAsset>,
    bounds: Option<BoundingInfo>,
    /// Orientation of the root as loaded. Placement only replaces its z angle.
    base_orientation: Euler<Rad<f32>>,
    placement: Option<Placement>,
    camera: Camera,
    projection: Projection,
    viewport: Viewport,
}

impl ViewerState {
    fn new(config: &ViewerConfig) -> Self {
        Self {
            asset: None,
            bounds: None,
            base_orientation: Euler::new(Rad(0.0), Rad(0.0), Rad(0.0)),
            placement: None,
            camera: Camera::default(),
            projection: Projection::new(1, 1, config.fovy, config.znear, config.zfar),
            viewport: Viewport::default(),
        }
    }

    pub fn asset(&self) -> Option<&SceneAsset> {
        self.asset.as_ref()
    }

    pub fn bounds(&self) -> Option<&BoundingInfo> {
        self.bounds.as_ref()
    }

    /// The last placement that was applied.
    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    /// Transform of the asset root, the node placements are written to.
    pub fn model_transform(&self) -> Option<&Transform> {
        self.asset.as_ref().map(|asset| &asset.root.transform)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_loaded(&self) -> bool {
        self.asset.is_some() && self.bounds.is_some()
    }
}

#[derive(Debug)]
pub struct Viewer {
    config: ViewerConfig,
    state: ViewerState,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        let state = ViewerState::new(&config);
        Self { config, state }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    /**
     * Fetches the configured asset and attaches it.
     *
     * This is the whole load continuation in one place: on success bounds are
     * computed and the first placement is applied before this returns.
     */
    pub async fn load<L: AssetLoader + ?Sized>(&mut self, loader: &L) -> anyhow::Result<()> {
        let path = self.config.asset_path.clone();
        let loaded = loader.load(&path).await;
        self.attach_asset(loaded)
    }

    /**
     * Attaches the result of the one asset load.
     *
     * On failure nothing changes and the error is handed back for reporting.
     * A second successful load is rejected; the first asset stays.
     */
    pub fn attach_asset(&mut self, loaded: anyhow::Result<SceneAsset>) -> anyhow::Result<()> {
        let asset =
            loaded.with_context(|| format!("Failed to load asset {}", self.config.asset_path))?;
        if self.state.asset.is_some() {
            return Err(anyhow!(
                "An asset is already attached; ignoring {} ({} nodes)",
                self.config.asset_path,
                asset.root.node_count()
            ));
        }

        let bounds = compute_bounds(&asset.root);
        log::info!(
            "Attached {} with {} nodes and {} meshes, bounds {:?} .. {:?}",
            self.config.asset_path,
            asset.root.node_count(),
            asset.root.mesh_count(),
            bounds.min,
            bounds.max
        );
        self.state.bounds = Some(bounds);
        self.state.base_orientation = Euler::from(asset.root.transform.rotation);
        self.state.asset = Some(asset);
        self.resolve();
        Ok(())
    }

    /// Tracks a new viewport size: projection aspect first, then placement.
    pub fn resize(&mut self, viewport: Viewport) {
        self.state.viewport = viewport;
        self.state.projection.resize(viewport.width, viewport.height);
        self.resolve();
    }

    /**
     * Re-solves and applies the placement for the current viewport.
     *
     * A no-op returning `None` until both asset and bounds are present, so it is
     * safe to call on every resize, including those before the load finished.
     */
    pub fn resolve(&mut self) -> Option<Placement> {
        let bounds = self.state.bounds?;
        let asset = self.state.asset.as_mut()?;

        let placement = solve(&bounds, self.state.viewport, self.config.camera_distance);

        let root = &mut asset.root.transform;
        root.position = placement.model_position;
        // x and y tilt authored into the root survive every re-solve
        root.rotation = Quaternion::from(Euler {
            z: placement.model_rotation_z,
            ..self.state.base_orientation
        });

        self.state.camera.position = placement.camera_position;
        self.state.camera.look_at(placement.camera_look_at);

        self.state.placement = Some(placement);
        Some(placement)
    }

    /// Read-only snapshot of what the next frame should show.
    pub fn frame(&self) -> Frame {
        Frame {
            clear_colour: self.config.clear_colour,
            camera: CameraUniform::from((&self.state.camera, &self.state.projection)),
            transform: self.state.model_transform().map(TransformUniform::from),
        }
    }

    /// World-space position of the model root, if one is attached.
    pub fn model_position(&self) -> Option<Vector3<f32>> {
        self.state.model_transform().map(|transform| transform.position)
    }
}
