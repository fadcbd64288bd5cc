//! Engine data structures: models, textures, scene graphs, and transforms.
//!
//! This module contains the core data types for scene representation:
//!
//! - `bounds` contains axis-aligned boxes and asset recentering
//! - `model` contains mesh, material and vertex definitions
//! - `scene_graph` enables hierarchical scene organization with tagged node kinds
//! - `texture` contains the GPU texture wrapper and the glow gradient builder
//! - `transform` holds node-local transformation data

pub mod bounds;
pub mod model;
pub mod scene_graph;
pub mod texture;
pub mod transform;
