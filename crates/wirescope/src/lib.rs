//! # Wirescope — glTF Model Inspector
//!
//! Loads a glTF 2.0 asset (`.glb`, or `.gltf` with its companion files),
//! merges its geometry into one recentered mesh and shows it in an orbit
//! viewer with wireframe, vertex-normal, PBR and material-channel views.
//!
//! ```text
//!  named files ─▶ asset::parse ─▶ Mesh::build ─▶ Renderer::upload_mesh
//!                 (loader thread)                 (frame loop)
//! ```
//!
//! The library is GPU-free up to [`mesh`]; [`render`] and [`window`] need a
//! device and a window.

pub mod asset;
pub mod camera;
pub mod error;
pub mod input;
pub mod loader;
pub mod math;
pub mod mesh;
pub mod render;
pub mod settings;
pub mod time;
pub mod window;

pub use error::{DeviceInitError, LoadError, RunError};
pub use mesh::Mesh;
