//! product-viewer
//!
//! Presents a single glTF product model on a page or in a window and keeps it
//! framed as the viewport changes. The model is pushed aside and tilted on wide
//! (desktop) viewports to leave room for overlaid content, and shown frontally
//! on narrow (mobile) ones. Runs natively and as WASM in the browser.
//!
//! High-level modules
//! - `camera`: perspective camera, projection and their GPU uniform
//! - `config`: tunables of the viewer with the product page defaults
//! - `context`: GPU device, surface and the renderer drawing the model
//! - `data_structures`: scene graph, bounds, transforms and GPU meshes
//! - `flow`: the winit event loop wiring window, loading and rendering
//! - `pipelines`: the render pipeline, its shader and uniforms
//! - `placement`: viewport-dependent model and camera placement
//! - `render`: the per-frame draw step and the frame snapshot it presents
//! - `resources`: asset loading
//! - `viewer`: the controller owning model and camera state
//! - `viewport`: viewport classification and resize handling
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod placement;
pub mod render;
pub mod resources;
pub mod viewer;
pub mod viewport;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::dpi::PhysicalSize;
pub use winit::event::WindowEvent;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Entry point when loaded as a WASM module.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let config = config::ViewerConfig::default();
    let loader = resources::GltfLoader::new(config.asset_root.clone());
    flow::run(config, loader).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
