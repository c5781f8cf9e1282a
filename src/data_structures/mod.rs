//! Viewer data structures: scene graphs, bounds, transforms and GPU models.
//!
//! - `scene_graph` is the CPU-side node hierarchy a loaded asset consists of
//! - `bounds` computes axis-aligned bounding geometry of a scene graph
//! - `transform` holds per-node position/rotation/scale
//! - `model` contains GPU vertex/index buffers uploaded from a scene graph
//! - `texture` wraps the depth texture used while rendering

pub mod bounds;
pub mod model;
pub mod scene_graph;
pub mod texture;
pub mod transform;
