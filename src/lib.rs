//! haloview
//!
//! A small, cross-platform viewer engine for native and WASM targets. It
//! loads one 3-D model, recenters it under a pivot, wraps it in a procedural
//! glow sprite, and lets an orbit camera circle the result. Construction and
//! teardown are explicit: a viewer owns its whole scene and releases every
//! GPU resource exactly once on close.
//!
//! High-level modules
//! - `camera`: camera, projection, orbit controller and uniforms
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: scene graph, bounds, transforms, textures, meshes
//! - `stage`: scene assembly, asset attachment and the teardown contract
//! - `tween`: the entrance animation interpolator
//! - `pipelines`: definitions for the mesh and glow-sprite render pipelines
//! - `resources`: helpers to load models and textures from external files
//! - `render`: per-frame render composition
//! - `viewer`: the window event loop driving a stage
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod stage;
pub mod tween;
pub mod viewer;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::*;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;

pub use stage::{Stage, StageOptions};
pub use viewer::run;
