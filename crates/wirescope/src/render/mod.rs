//! # Render — wgpu Back End
//!
//! ```text
//!  GraphicsContext ── device, queue, surface
//!        │
//!  Renderer ──┬── LinePipeline      wireframe + normal overlay
//!             ├── SolidPipelines    Lambert fallback (colored / textured)
//!             ├── PbrPipeline?      Cook-Torrance + channel views
//!             ├── DefaultTextures   neutral maps, matcap, BRDF LUT
//!             └── AxisGizmo         orientation indicator
//! ```
//!
//! [`shading`] is a CPU copy of the PBR fragment math used to test the
//! shader's formulas without a GPU.
//!
//! ## Comparison
//!
//! - **three.js**: `WebGLRenderer` plus one material object per draw mode.
//! - **Our approach**: one renderer owning a fixed pipeline set, selected per
//!   frame from [`RenderSettings`](crate::settings::RenderSettings).

pub mod axis;
pub mod draw;
pub mod gpu;
pub mod pipeline;
pub mod shading;
pub mod texture;
pub mod vertex;

pub use draw::Renderer;
pub use gpu::GraphicsContext;
